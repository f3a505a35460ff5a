//! Reference-counted ownership of native libvirt objects.
//!
//! A [`Handle`] pairs one opaque native pointer with the kind of object
//! it refers to. The pointer starts out null (unbound), is installed at
//! most once after a successful native call, and is passed to the
//! kind's native release function exactly once: either explicitly
//! through [`Handle::release`] or when the last clone of the handle is
//! dropped. A handle that was never bound releases nothing.

use std::fmt;
use std::os::raw::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::ffi;

/// The kind of native object a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Connect,
    Domain,
    Stream,
    Network,
    StoragePool,
    Interface,
    NodeDevice,
    Secret,
    NwFilter,
}

impl Kind {
    /// Every resource kind, in declaration order.
    pub const ALL: [Kind; 9] = [
        Kind::Connect,
        Kind::Domain,
        Kind::Stream,
        Kind::Network,
        Kind::StoragePool,
        Kind::Interface,
        Kind::NodeDevice,
        Kind::Secret,
        Kind::NwFilter,
    ];

    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Connect => "connection",
            Kind::Domain => "domain",
            Kind::Stream => "stream",
            Kind::Network => "network",
            Kind::StoragePool => "storage pool",
            Kind::Interface => "interface",
            Kind::NodeDevice => "node device",
            Kind::Secret => "secret",
            Kind::NwFilter => "nwfilter",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Resource {
    kind: Kind,
    ptr: AtomicPtr<c_void>,
    /// Keeps the owning connection alive for kinds that cannot outlive
    /// it (domains, streams).
    _owner: Option<Handle>,
}

impl Drop for Resource {
    fn drop(&mut self) {
        let ptr = *self.ptr.get_mut();
        if !ptr.is_null() {
            // SAFETY: the pointer was installed by bind and has not been
            // released anywhere else.
            unsafe { free_native(self.kind, ptr) };
            debug!(kind = %self.kind, "released native object");
        }
    }
}

/// A cloneable, kind-tagged owner of one native pointer.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<Resource>,
}

impl Handle {
    /// Allocate an unbound handle of `kind`, owned by `owner`'s
    /// connection where the kind requires one.
    pub fn allocate(kind: Kind, owner: Option<&Handle>) -> Handle {
        Handle {
            inner: Arc::new(Resource {
                kind,
                ptr: AtomicPtr::new(ptr::null_mut()),
                _owner: owner.cloned(),
            }),
        }
    }

    /// Install the native pointer obtained from a successful native
    /// call. A handle is bound at most once.
    pub(crate) fn bind(&self, ptr: *mut c_void) {
        let prev = self.inner.ptr.swap(ptr, Ordering::AcqRel);
        debug_assert!(prev.is_null(), "handle bound twice");
    }

    /// The kind of object this handle refers to.
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Whether a native pointer is currently installed.
    pub fn is_bound(&self) -> bool {
        !self.inner.ptr.load(Ordering::Acquire).is_null()
    }

    /// The installed native pointer, or `BadArgument` for a handle that
    /// is unbound or already released.
    pub(crate) fn as_ptr(&self) -> Result<*mut c_void> {
        let ptr = self.inner.ptr.load(Ordering::Acquire);
        if ptr.is_null() {
            Err(Error::bad_arg(format!(
                "use of released {} handle",
                self.inner.kind
            )))
        } else {
            Ok(ptr)
        }
    }

    /// Release the native pointer through the kind's release function.
    /// Idempotent; an unbound handle releases nothing.
    pub fn release(&self) {
        let ptr = self.inner.ptr.swap(ptr::null_mut(), Ordering::AcqRel);
        if !ptr.is_null() {
            // SAFETY: this swap is the only path that takes the pointer
            // out, so the release function runs exactly once.
            unsafe { free_native(self.inner.kind, ptr) };
            debug!(kind = %self.inner.kind, "released native object");
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.inner.kind)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// The single release path: one native free function per kind.
unsafe fn free_native(kind: Kind, ptr: *mut c_void) {
    match kind {
        Kind::Connect => {
            ffi::virConnectClose(ptr.cast());
        }
        Kind::Domain => {
            ffi::virDomainFree(ptr.cast());
        }
        Kind::Stream => {
            ffi::virStreamFree(ptr.cast());
        }
        Kind::Network => {
            ffi::virNetworkFree(ptr.cast());
        }
        Kind::StoragePool => {
            ffi::virStoragePoolFree(ptr.cast());
        }
        Kind::Interface => {
            ffi::virInterfaceFree(ptr.cast());
        }
        Kind::NodeDevice => {
            ffi::virNodeDeviceFree(ptr.cast());
        }
        Kind::Secret => {
            ffi::virSecretFree(ptr.cast());
        }
        Kind::NwFilter => {
            ffi::virNWFilterFree(ptr.cast());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_handle_state() {
        for kind in Kind::ALL {
            let handle = Handle::allocate(kind, None);
            assert_eq!(handle.kind(), kind);
            assert!(!handle.is_bound());
            let err = handle.as_ptr().unwrap_err();
            assert!(err.is_bad_argument(), "unexpected error: {err}");
        }
    }

    #[cfg(not(feature = "libvirt"))]
    #[test]
    fn test_unbound_handle_never_releases() {
        crate::ffi::mock::take_calls();
        let handle = Handle::allocate(Kind::Domain, None);
        handle.release();
        drop(handle);
        assert!(crate::ffi::mock::take_calls().is_empty());
    }

    #[cfg(not(feature = "libvirt"))]
    #[test]
    fn test_bound_handle_releases_exactly_once() {
        // Kinds the test driver never hands out have record-only
        // release functions, so a placeholder address is safe here.
        static PLACEHOLDER: u8 = 0;
        let ptr = &PLACEHOLDER as *const u8 as *mut c_void;

        crate::ffi::mock::take_calls();
        let handle = Handle::allocate(Kind::Network, None);
        handle.bind(ptr);
        assert!(handle.is_bound());
        assert_eq!(handle.as_ptr().unwrap(), ptr);

        handle.release();
        assert!(!handle.is_bound());
        assert!(handle.as_ptr().is_err());
        handle.release();
        drop(handle);

        assert_eq!(crate::ffi::mock::take_calls(), vec!["virNetworkFree"]);
    }

    #[cfg(not(feature = "libvirt"))]
    #[test]
    fn test_drop_of_last_clone_releases() {
        static PLACEHOLDER: u8 = 0;
        let ptr = &PLACEHOLDER as *const u8 as *mut c_void;

        crate::ffi::mock::take_calls();
        let handle = Handle::allocate(Kind::Secret, None);
        handle.bind(ptr);
        let clone = handle.clone();
        drop(handle);
        assert!(crate::ffi::mock::take_calls().is_empty());
        drop(clone);
        assert_eq!(crate::ffi::mock::take_calls(), vec!["virSecretFree"]);
    }
}
