//! Rust bindings for the libvirt virtualization API.
//!
//! This crate wraps the libvirt C API behind safe, reference-counted
//! resource objects. Connections, domains and streams are owned
//! [`Handle`]s: the native object is freed exactly once, when the last
//! reference is dropped. Struct results cross the boundary as opaque
//! byte buffers with exactly the native struct size ([`StructBuffer`]),
//! and every failure is returned as a tagged [`Error`] built from
//! libvirt's own last-error state.
//!
//! Two surfaces are provided:
//!
//! * typed wrappers ([`Connect`], [`Domain`], [`Stream`]) for direct
//!   use from Rust, and
//! * a uniform [`dispatch`] surface, driven by a declarative table of
//!   operations ([`OPS`]), for embedders that route calls dynamically:
//!   positional [`Value`] arguments in, a tagged [`Reply`] out.
//!
//! # Example
//!
//! ```
//! use virt::Connect;
//!
//! fn main() -> virt::Result<()> {
//!     let conn = Connect::open(Some("test:///default"))?;
//!
//!     let dom = conn.domain_lookup_by_name("test")?;
//!     println!("domain {} (id {})", dom.name()?, dom.id()?);
//!
//!     let info = dom.info()?;
//!     assert_eq!(info.len(), virt::DOMAIN_INFO_RECORD_SIZE);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Linking
//!
//! By default the crate carries a built-in in-process test driver and
//! needs no native library; `--features libvirt` links against the
//! installed libvirt instead (set `LIBVIRT_LIB_DIR` for non-standard
//! locations). Optional calls missing from older libraries fail with
//! [`Error::Unsupported`]; availability is probed once at startup from
//! the library version (see [`caps`]).

pub mod args;
pub mod caps;
pub mod connect;
pub mod domain;
pub mod error;
mod ffi;
pub mod handle;
pub mod marshal;
pub mod ops;
pub mod stream;

// Re-export main types at the crate root
pub use args::{Args, CBytes, Value};
pub use caps::{Capability, CapabilitySet};
pub use connect::Connect;
pub use domain::Domain;
pub use error::{Error, NativeError, Result};
pub use handle::{Handle, Kind};
pub use marshal::{DomainInfoRecord, StructBuffer, DOMAIN_INFO_RECORD_SIZE};
pub use ops::{dispatch, dispatch_with, OpSpec, Reply, Shape, OPS};
pub use stream::Stream;

pub use ffi::raw::{VIR_UUID_BUFLEN, VIR_UUID_STRING_BUFLEN};

#[cfg(not(feature = "libvirt"))]
pub use ffi::mock;

use std::os::raw::c_ulong;
use std::ptr;

/// Version of the linked libvirt library, encoded as
/// `major * 1_000_000 + minor * 1_000 + micro`.
pub fn lib_version() -> Result<u64> {
    let mut version: c_ulong = 0;
    // SAFETY: the out-pointer is valid; the type arguments are unused.
    let rc = unsafe { ffi::virGetVersion(&mut version, ptr::null(), ptr::null_mut()) };
    if rc < 0 {
        return Err(ffi::last_error());
    }
    Ok(version as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lib_version() {
        let version = lib_version().expect("version is readable");
        assert!(version > 0);
    }

    #[test]
    fn test_active_capabilities_match_version() {
        let version = lib_version().unwrap();
        let active = caps::active();
        for capability in Capability::ALL {
            assert_eq!(
                active.has(capability),
                version >= capability.min_version()
            );
        }
    }
}
