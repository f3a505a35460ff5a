//! Hypervisor connections.

use std::ptr;

use tracing::debug;

use crate::args::CBytes;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::ffi;
use crate::handle::{Handle, Kind};
use crate::stream::Stream;

/// A connection to a hypervisor driver.
///
/// Domains and streams obtained from a connection keep it alive until
/// they are dropped; the native connection is closed when the last
/// reference goes away.
///
/// # Example
///
/// ```
/// use virt::Connect;
///
/// let conn = Connect::open(Some("test:///default"))?;
/// let dom = conn.domain_lookup_by_name("test")?;
/// assert_eq!(dom.id()?, 1);
/// # Ok::<(), virt::Error>(())
/// ```
#[derive(Debug)]
pub struct Connect {
    handle: Handle,
}

impl Connect {
    /// Open a connection to the hypervisor at `uri`, or to the default
    /// driver when `None`.
    pub fn open(uri: Option<&str>) -> Result<Connect> {
        let uri = match uri {
            Some(u) => Some(CBytes::from_slice(u.as_bytes())?),
            None => None,
        };
        Self::open_bytes(uri.as_ref())
    }

    pub(crate) fn open_bytes(uri: Option<&CBytes>) -> Result<Connect> {
        let handle = Handle::allocate(Kind::Connect, None);
        // SAFETY: the uri buffer is NUL-terminated, or null for the
        // default driver.
        let ptr = unsafe { ffi::virConnectOpen(uri.map_or(ptr::null(), |u| u.as_ptr())) };
        let ptr = ffi::cvt_ptr(ptr)?;
        handle.bind(ptr.cast());
        debug!("opened hypervisor connection");
        Ok(Connect { handle })
    }

    pub(crate) fn wrap(handle: Handle) -> Connect {
        Connect { handle }
    }

    /// Wrap an existing connection handle, checking its kind.
    pub fn from_handle(handle: Handle) -> Result<Connect> {
        if handle.kind() != Kind::Connect {
            return Err(Error::bad_arg(format!(
                "expected a connection handle, got a {} handle",
                handle.kind()
            )));
        }
        Ok(Connect { handle })
    }

    /// The underlying resource handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Consume the wrapper, returning the resource handle.
    pub fn into_handle(self) -> Handle {
        self.handle
    }

    /// Close the connection now instead of waiting for the last
    /// reference to drop. Further calls through this connection fail
    /// with `BadArgument`.
    pub fn close(&self) {
        self.handle.release();
    }

    fn as_ptr(&self) -> Result<ffi::virConnectPtr> {
        Ok(self.handle.as_ptr()?.cast())
    }

    // ========== Domain lookup and definition ==========

    /// Look up a running domain by its numeric id.
    pub fn domain_lookup_by_id(&self, id: i32) -> Result<Domain> {
        let conn = self.as_ptr()?;
        let dom = Handle::allocate(Kind::Domain, Some(&self.handle));
        // SAFETY: conn is a live connection pointer.
        let ptr = ffi::cvt_ptr(unsafe { ffi::virDomainLookupByID(conn, id) })?;
        dom.bind(ptr.cast());
        Ok(Domain::wrap(dom))
    }

    /// Look up a domain by name.
    pub fn domain_lookup_by_name(&self, name: &str) -> Result<Domain> {
        self.domain_lookup_by_name_bytes(&CBytes::from_slice(name.as_bytes())?)
    }

    pub(crate) fn domain_lookup_by_name_bytes(&self, name: &CBytes) -> Result<Domain> {
        let conn = self.as_ptr()?;
        let dom = Handle::allocate(Kind::Domain, Some(&self.handle));
        // SAFETY: conn is live and name is NUL-terminated.
        let ptr = ffi::cvt_ptr(unsafe { ffi::virDomainLookupByName(conn, name.as_ptr()) })?;
        dom.bind(ptr.cast());
        Ok(Domain::wrap(dom))
    }

    /// Look up a domain by its raw UUID.
    pub fn domain_lookup_by_uuid(&self, uuid: &[u8; ffi::VIR_UUID_BUFLEN]) -> Result<Domain> {
        let conn = self.as_ptr()?;
        let dom = Handle::allocate(Kind::Domain, Some(&self.handle));
        // SAFETY: conn is live and uuid holds exactly VIR_UUID_BUFLEN bytes.
        let ptr = ffi::cvt_ptr(unsafe { ffi::virDomainLookupByUUID(conn, uuid.as_ptr()) })?;
        dom.bind(ptr.cast());
        Ok(Domain::wrap(dom))
    }

    /// Define a persistent domain from an XML description without
    /// starting it.
    pub fn domain_define_xml(&self, xml: &str) -> Result<Domain> {
        self.domain_define_xml_bytes(&CBytes::from_slice(xml.as_bytes())?)
    }

    pub(crate) fn domain_define_xml_bytes(&self, xml: &CBytes) -> Result<Domain> {
        let conn = self.as_ptr()?;
        let dom = Handle::allocate(Kind::Domain, Some(&self.handle));
        // SAFETY: conn is live and xml is NUL-terminated.
        let ptr = ffi::cvt_ptr(unsafe { ffi::virDomainDefineXML(conn, xml.as_ptr()) })?;
        dom.bind(ptr.cast());
        Ok(Domain::wrap(dom))
    }

    /// Restore a domain from a save file produced by
    /// [`Domain::save`](crate::Domain::save).
    pub fn domain_restore(&self, path: &str) -> Result<()> {
        self.domain_restore_bytes(&CBytes::from_slice(path.as_bytes())?)
    }

    pub(crate) fn domain_restore_bytes(&self, path: &CBytes) -> Result<()> {
        let conn = self.as_ptr()?;
        // SAFETY: conn is live and path is NUL-terminated.
        ffi::cvt(unsafe { ffi::virDomainRestore(conn, path.as_ptr()) })?;
        Ok(())
    }

    // ========== Streams ==========

    /// Create a new stream on this connection.
    pub fn stream_new(&self, flags: u32) -> Result<Stream> {
        let conn = self.as_ptr()?;
        let stream = Handle::allocate(Kind::Stream, Some(&self.handle));
        // SAFETY: conn is a live connection pointer.
        let ptr = ffi::cvt_ptr(unsafe { ffi::virStreamNew(conn, flags) })?;
        stream.bind(ptr.cast());
        Ok(Stream::wrap(stream))
    }
}
