//! Error capture for FFI calls.
//!
//! Every entry point ends with the same check: a negative return, a
//! null pointer, or a sentinel value means failure, and the description
//! is read from libvirt's thread-local last-error state immediately,
//! before any other native call can overwrite it.

use std::ffi::CStr;
use std::os::raw::c_int;

use crate::error::{Error, NativeError, Result};

const UNKNOWN_ERROR: &str = "an unknown libvirt error occurred";

/// Capture the current thread's libvirt error as an [`Error`].
pub(crate) fn last_error() -> Error {
    // SAFETY: the returned pointer refers to thread-local storage that
    // stays valid until the next libvirt call on this thread.
    let err = unsafe { super::virGetLastError() };
    if err.is_null() {
        return Error::Native(NativeError {
            code: 0,
            domain: 0,
            level: 0,
            message: UNKNOWN_ERROR.to_string(),
        });
    }

    // SAFETY: non-null virErrorPtr points at a populated record.
    unsafe {
        let e = &*err;
        let message = if e.message.is_null() {
            UNKNOWN_ERROR.to_string()
        } else {
            CStr::from_ptr(e.message).to_string_lossy().into_owned()
        };
        Error::Native(NativeError {
            code: e.code,
            domain: e.domain,
            level: e.level,
            message,
        })
    }
}

/// Map a negative return code to the captured last error.
pub(crate) fn cvt(ret: c_int) -> Result<c_int> {
    if ret < 0 {
        Err(last_error())
    } else {
        Ok(ret)
    }
}

/// Map a null pointer result to the captured last error.
pub(crate) fn cvt_ptr<T>(ptr: *mut T) -> Result<*mut T> {
    if ptr.is_null() {
        Err(last_error())
    } else {
        Ok(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvt() {
        assert_eq!(cvt(0), Ok(0));
        assert_eq!(cvt(7), Ok(7));
        assert!(cvt(-1).is_err());
    }

    #[test]
    fn test_cvt_ptr() {
        let mut value = 0u8;
        let ptr: *mut u8 = &mut value;
        assert!(cvt_ptr(ptr).is_ok());
        assert!(cvt_ptr(std::ptr::null_mut::<u8>()).is_err());
    }
}
