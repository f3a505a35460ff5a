//! Data streams attached to a connection.

use crate::error::{Error, Result};
use crate::handle::{Handle, Kind};

/// A stream obtained from [`Connect::stream_new`](crate::Connect::stream_new),
/// used as the data channel for console access.
pub struct Stream {
    handle: Handle,
}

impl Stream {
    pub(crate) fn wrap(handle: Handle) -> Stream {
        Stream { handle }
    }

    /// Wrap an existing stream handle, checking its kind.
    pub fn from_handle(handle: Handle) -> Result<Stream> {
        if handle.kind() != Kind::Stream {
            return Err(Error::bad_arg(format!(
                "expected a stream handle, got a {} handle",
                handle.kind()
            )));
        }
        Ok(Stream { handle })
    }

    /// The underlying resource handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Consume the wrapper, returning the resource handle.
    pub fn into_handle(self) -> Handle {
        self.handle
    }
}
