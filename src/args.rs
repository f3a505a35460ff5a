//! Call-argument extraction for the dispatch surface.
//!
//! Every dispatched operation receives a fixed positional argument
//! list; each argument is a resource handle, an integer, or a byte
//! sequence. Extraction is purely local: it either produces the typed
//! value or fails with a `BadArgument` naming the argument and the
//! reason, before any native call is made.

use std::os::raw::c_char;

use crate::connect::Connect;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::ffi::VIR_UUID_BUFLEN;
use crate::handle::{Handle, Kind};
use crate::stream::Stream;

/// One positional argument in the uniform call convention.
#[derive(Debug, Clone)]
pub enum Value {
    Handle(Handle),
    Int(i64),
    Bytes(Vec<u8>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Handle(_) => "resource",
            Value::Int(_) => "integer",
            Value::Bytes(_) => "byte sequence",
        }
    }
}

impl From<Handle> for Value {
    fn from(handle: Handle) -> Value {
        Value::Handle(handle)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Value {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Value {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

/// Borrowed view over a call's positional arguments.
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Args<'a> {
        Args { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value(&self, index: usize) -> Result<&'a Value> {
        self.values
            .get(index)
            .ok_or_else(|| Error::bad_arg(format!("argument {}: missing", index)))
    }

    /// Extract a handle of exactly `kind`, borrowed for this call.
    pub fn handle(&self, index: usize, kind: Kind) -> Result<&'a Handle> {
        match self.value(index)? {
            Value::Handle(h) if h.kind() == kind => Ok(h),
            Value::Handle(h) => Err(Error::bad_arg(format!(
                "argument {}: expected a {} resource, got a {} resource",
                index,
                kind,
                h.kind()
            ))),
            other => Err(Error::bad_arg(format!(
                "argument {}: expected a {} resource, got {}",
                index,
                kind,
                other.type_name()
            ))),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.value(index)? {
            Value::Int(value) => Ok(*value),
            other => Err(Error::bad_arg(format!(
                "argument {}: expected an integer, got {}",
                index,
                other.type_name()
            ))),
        }
    }

    /// Extract an integer narrowed to the native parameter type.
    pub fn int_as<T: TryFrom<i64>>(&self, index: usize) -> Result<T> {
        T::try_from(self.int(index)?)
            .map_err(|_| Error::bad_arg(format!("argument {}: integer out of range", index)))
    }

    pub fn bytes(&self, index: usize) -> Result<&'a [u8]> {
        match self.value(index)? {
            Value::Bytes(bytes) => Ok(bytes),
            other => Err(Error::bad_arg(format!(
                "argument {}: expected a byte sequence, got {}",
                index,
                other.type_name()
            ))),
        }
    }

    /// Extract a byte sequence as a NUL-terminated C string buffer.
    pub fn c_bytes(&self, index: usize) -> Result<CBytes> {
        CBytes::from_slice(self.bytes(index)?)
    }

    /// Extract a raw UUID, which is always exactly
    /// [`VIR_UUID_BUFLEN`](crate::VIR_UUID_BUFLEN) bytes.
    pub fn uuid(&self, index: usize) -> Result<[u8; VIR_UUID_BUFLEN]> {
        let bytes = self.bytes(index)?;
        bytes.try_into().map_err(|_| {
            Error::bad_arg(format!(
                "argument {}: expected a {}-byte uuid, got {} bytes",
                index,
                VIR_UUID_BUFLEN,
                bytes.len()
            ))
        })
    }

    /// Extract a connection, borrowed for this call.
    pub fn connect(&self, index: usize) -> Result<Connect> {
        Ok(Connect::wrap(self.handle(index, Kind::Connect)?.clone()))
    }

    /// Extract a domain, borrowed for this call.
    pub fn domain(&self, index: usize) -> Result<Domain> {
        Ok(Domain::wrap(self.handle(index, Kind::Domain)?.clone()))
    }

    /// Extract a stream, borrowed for this call.
    pub fn stream(&self, index: usize) -> Result<Stream> {
        Ok(Stream::wrap(self.handle(index, Kind::Stream)?.clone()))
    }
}

/// A byte buffer guaranteed to end in a NUL terminator, suitable for
/// native C-string parameters.
///
/// The terminator is appended only when the source bytes lack one; the
/// native side reads up to the first NUL either way.
#[derive(Debug, Clone)]
pub struct CBytes {
    bytes: Vec<u8>,
}

impl CBytes {
    /// Copy `src`, appending a terminator unless it already ends in one.
    pub fn from_slice(src: &[u8]) -> Result<CBytes> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(src.len() + 1)
            .map_err(|_| Error::OutOfMemory)?;
        bytes.extend_from_slice(src);
        if bytes.last() != Some(&0) {
            bytes.push(0);
        }
        Ok(CBytes { bytes })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.bytes.as_ptr() as *const c_char
    }

    /// The buffer contents, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_check_matrix() {
        for expected in Kind::ALL {
            for actual in Kind::ALL {
                let handle = Handle::allocate(actual, None);
                let values = [Value::Handle(handle)];
                let args = Args::new(&values);
                let result = args.handle(0, expected);
                if actual == expected {
                    assert!(result.is_ok());
                } else {
                    let err = result.unwrap_err();
                    assert!(err.is_bad_argument(), "unexpected error: {err}");
                }
            }
        }
    }

    #[test]
    fn test_type_and_arity_errors() {
        let values = [Value::Int(3)];
        let args = Args::new(&values);
        assert!(args.handle(0, Kind::Domain).unwrap_err().is_bad_argument());
        assert!(args.bytes(0).unwrap_err().is_bad_argument());
        assert!(args.int(1).unwrap_err().is_bad_argument());
        assert_eq!(args.int(0).unwrap(), 3);
    }

    #[test]
    fn test_int_narrowing() {
        let values = [Value::Int(-1), Value::Int(i64::from(u32::MAX) + 1)];
        let args = Args::new(&values);
        assert_eq!(args.int_as::<i32>(0).unwrap(), -1);
        assert!(args.int_as::<u32>(0).unwrap_err().is_bad_argument());
        assert!(args.int_as::<u32>(1).unwrap_err().is_bad_argument());
    }

    #[test]
    fn test_c_bytes_always_terminated() {
        let cases: [&[u8]; 4] = [b"", b"name", b"name\0", b"a\0b"];
        for case in cases {
            let c = CBytes::from_slice(case).unwrap();
            assert_eq!(c.as_bytes().last(), Some(&0), "case {case:?}");
        }
        // A terminator is appended only when missing.
        assert_eq!(CBytes::from_slice(b"name").unwrap().as_bytes(), b"name\0");
        assert_eq!(CBytes::from_slice(b"name\0").unwrap().as_bytes(), b"name\0");
    }

    #[test]
    fn test_uuid_length_check() {
        let values = [
            Value::Bytes(vec![0u8; VIR_UUID_BUFLEN]),
            Value::Bytes(vec![0u8; 4]),
        ];
        let args = Args::new(&values);
        assert!(args.uuid(0).is_ok());
        assert!(args.uuid(1).unwrap_err().is_bad_argument());
    }
}
