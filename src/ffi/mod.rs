//! FFI surface for libvirt.
//!
//! `raw` declares the types, constants and (with the `libvirt` feature)
//! the extern functions; without the feature the same functions come
//! from the in-process `mock` driver. Users should prefer the safe
//! wrappers in the parent modules.

pub mod error;
#[cfg(not(feature = "libvirt"))]
pub mod mock;
pub mod raw;

pub(crate) use error::{cvt, cvt_ptr, last_error};
#[cfg(not(feature = "libvirt"))]
pub use mock::*;
pub use raw::*;

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

/// Copy a libvirt-owned string without freeing it.
///
/// # Safety
///
/// `ptr` must point at a NUL-terminated string.
pub(crate) unsafe fn borrow_string(ptr: *const c_char) -> String {
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Copy a caller-owned string, then release it with the C allocator as
/// the library documents.
///
/// # Safety
///
/// `ptr` must point at a NUL-terminated string allocated with `malloc`.
pub(crate) unsafe fn take_string(ptr: *mut c_char) -> String {
    let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    libc::free(ptr as *mut c_void);
    s
}
