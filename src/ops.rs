//! The uniform entry-point table and dispatcher.
//!
//! Every operation is one table row: the native call name, the declared
//! parameter shapes, the capability gating it, and a thin entry
//! function composing argument extraction, one native call, struct
//! marshaling and error signaling. [`dispatch`] validates the argument
//! list against the declared shapes and applies the capability gate
//! before an entry runs, so gated operations on an older library fail
//! with `Unsupported` without any native call.

use tracing::trace;

use crate::args::{Args, Value};
use crate::caps::{self, Capability, CapabilitySet};
use crate::connect::Connect;
use crate::error::{Error, Result};
use crate::handle::{Handle, Kind};
use crate::marshal::{self, StructBuffer};

/// Declared shape of one positional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Resource(Kind),
    Int,
    Bytes,
}

/// Tagged result of a dispatched operation.
#[derive(Debug)]
pub enum Reply {
    /// Bare success.
    Ok,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    /// A verbatim struct copy.
    Buffer(StructBuffer),
    /// Variable-count records plus the record count.
    Parameter { buf: StructBuffer, count: i32 },
    /// A newly created resource.
    Handle(Handle),
}

/// One dispatchable entry point.
pub struct OpSpec {
    /// Native call name, e.g. `virDomainGetInfo`.
    pub name: &'static str,
    /// Positional parameter shapes, checked before the entry runs.
    pub params: &'static [Shape],
    /// Capability gate, if the call is optional.
    pub capability: Option<Capability>,
    exec: fn(&Args) -> Result<Reply>,
}

const CONN: Shape = Shape::Resource(Kind::Connect);
const DOM: Shape = Shape::Resource(Kind::Domain);
const STREAM: Shape = Shape::Resource(Kind::Stream);

/// All entry points, keyed by native call name.
pub static OPS: &[OpSpec] = &[
    OpSpec {
        name: "virConnectOpen",
        params: &[Shape::Bytes],
        capability: None,
        exec: connect_open,
    },
    OpSpec {
        name: "virConnectClose",
        params: &[CONN],
        capability: None,
        exec: connect_close,
    },
    OpSpec {
        name: "virStreamNew",
        params: &[CONN, Shape::Int],
        capability: None,
        exec: stream_new,
    },
    OpSpec {
        name: "virDomainLookupByID",
        params: &[CONN, Shape::Int],
        capability: None,
        exec: domain_lookup_by_id,
    },
    OpSpec {
        name: "virDomainLookupByName",
        params: &[CONN, Shape::Bytes],
        capability: None,
        exec: domain_lookup_by_name,
    },
    OpSpec {
        name: "virDomainLookupByUUID",
        params: &[CONN, Shape::Bytes],
        capability: None,
        exec: domain_lookup_by_uuid,
    },
    OpSpec {
        name: "virDomainDefineXML",
        params: &[CONN, Shape::Bytes],
        capability: None,
        exec: domain_define_xml,
    },
    OpSpec {
        name: "virDomainRestore",
        params: &[CONN, Shape::Bytes],
        capability: None,
        exec: domain_restore,
    },
    OpSpec {
        name: "virDomainCreate",
        params: &[DOM, Shape::Int],
        capability: None,
        exec: domain_create,
    },
    OpSpec {
        name: "virDomainShutdown",
        params: &[DOM],
        capability: None,
        exec: domain_shutdown,
    },
    OpSpec {
        name: "virDomainSuspend",
        params: &[DOM],
        capability: None,
        exec: domain_suspend,
    },
    OpSpec {
        name: "virDomainResume",
        params: &[DOM],
        capability: None,
        exec: domain_resume,
    },
    OpSpec {
        name: "virDomainUndefine",
        params: &[DOM],
        capability: None,
        exec: domain_undefine,
    },
    OpSpec {
        name: "virDomainDestroy",
        params: &[DOM],
        capability: None,
        exec: domain_destroy,
    },
    OpSpec {
        name: "virDomainSave",
        params: &[DOM, Shape::Bytes],
        capability: None,
        exec: domain_save,
    },
    OpSpec {
        name: "virDomainGetMaxVcpus",
        params: &[DOM],
        capability: None,
        exec: domain_get_max_vcpus,
    },
    OpSpec {
        name: "virDomainGetAutostart",
        params: &[DOM],
        capability: None,
        exec: domain_get_autostart,
    },
    OpSpec {
        name: "virDomainSetAutostart",
        params: &[DOM, Shape::Int],
        capability: None,
        exec: domain_set_autostart,
    },
    OpSpec {
        name: "virDomainGetID",
        params: &[DOM],
        capability: None,
        exec: domain_get_id,
    },
    OpSpec {
        name: "virDomainGetInfo",
        params: &[DOM],
        capability: None,
        exec: domain_get_info,
    },
    OpSpec {
        name: "virDomainGetBlockInfo",
        params: &[DOM, Shape::Bytes],
        capability: Some(Capability::DomainGetBlockInfo),
        exec: domain_get_block_info,
    },
    OpSpec {
        name: "virDomainGetJobInfo",
        params: &[DOM],
        capability: Some(Capability::DomainGetJobInfo),
        exec: domain_get_job_info,
    },
    OpSpec {
        name: "virDomainGetMaxMemory",
        params: &[DOM],
        capability: None,
        exec: domain_get_max_memory,
    },
    OpSpec {
        name: "virDomainGetMemoryParameters",
        params: &[DOM],
        capability: Some(Capability::DomainGetMemoryParameters),
        exec: domain_get_memory_parameters,
    },
    OpSpec {
        name: "virDomainGetName",
        params: &[DOM],
        capability: None,
        exec: domain_get_name,
    },
    OpSpec {
        name: "virDomainGetOSType",
        params: &[DOM],
        capability: None,
        exec: domain_get_os_type,
    },
    OpSpec {
        name: "virDomainGetSchedulerType",
        params: &[DOM],
        capability: None,
        exec: domain_get_scheduler_type,
    },
    OpSpec {
        name: "virDomainGetSchedulerParameters",
        params: &[DOM],
        capability: None,
        exec: domain_get_scheduler_parameters,
    },
    OpSpec {
        name: "virDomainGetSecurityLabel",
        params: &[DOM],
        capability: None,
        exec: domain_get_security_label,
    },
    OpSpec {
        name: "virDomainGetUUID",
        params: &[DOM],
        capability: None,
        exec: domain_get_uuid,
    },
    OpSpec {
        name: "virDomainGetUUIDString",
        params: &[DOM],
        capability: None,
        exec: domain_get_uuid_string,
    },
    OpSpec {
        name: "virDomainGetXMLDesc",
        params: &[DOM, Shape::Int],
        capability: None,
        exec: domain_get_xml_desc,
    },
    OpSpec {
        name: "virDomainOpenConsole",
        params: &[DOM, Shape::Bytes, STREAM],
        capability: Some(Capability::DomainOpenConsole),
        exec: domain_open_console,
    },
];

/// Look up an operation by its native call name.
pub fn find(name: &str) -> Option<&'static OpSpec> {
    OPS.iter().find(|op| op.name == name)
}

/// Dispatch `name` with `argv`, using the probed capability set.
pub fn dispatch(name: &str, argv: &[Value]) -> Result<Reply> {
    dispatch_with(caps::active(), name, argv)
}

/// Dispatch `name` with `argv` against an explicit capability set.
pub fn dispatch_with(caps: &CapabilitySet, name: &str, argv: &[Value]) -> Result<Reply> {
    let op = find(name).ok_or_else(|| Error::bad_arg(format!("unknown operation {}", name)))?;
    check_shapes(op, argv)?;
    if let Some(capability) = op.capability {
        if !caps.has(capability) {
            return Err(Error::Unsupported);
        }
    }
    trace!(op = op.name, argc = argv.len(), "dispatch");
    (op.exec)(&Args::new(argv))
}

fn check_shapes(op: &OpSpec, argv: &[Value]) -> Result<()> {
    if argv.len() != op.params.len() {
        return Err(Error::bad_arg(format!(
            "{}: expected {} arguments, got {}",
            op.name,
            op.params.len(),
            argv.len()
        )));
    }
    let args = Args::new(argv);
    for (index, shape) in op.params.iter().enumerate() {
        match shape {
            Shape::Resource(kind) => {
                args.handle(index, *kind)?;
            }
            Shape::Int => {
                args.int(index)?;
            }
            Shape::Bytes => {
                args.bytes(index)?;
            }
        }
    }
    Ok(())
}

// ========== Entry functions ==========

fn connect_open(args: &Args) -> Result<Reply> {
    let uri = args.bytes(0)?;
    let conn = if uri.is_empty() {
        Connect::open_bytes(None)?
    } else {
        Connect::open_bytes(Some(&args.c_bytes(0)?))?
    };
    Ok(Reply::Handle(conn.into_handle()))
}

fn connect_close(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    conn.close();
    Ok(Reply::Ok)
}

fn stream_new(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let flags = args.int_as::<u32>(1)?;
    let stream = conn.stream_new(flags)?;
    Ok(Reply::Handle(stream.into_handle()))
}

fn domain_lookup_by_id(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let id = args.int_as::<i32>(1)?;
    let dom = conn.domain_lookup_by_id(id)?;
    Ok(Reply::Handle(dom.into_handle()))
}

fn domain_lookup_by_name(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let name = args.c_bytes(1)?;
    let dom = conn.domain_lookup_by_name_bytes(&name)?;
    Ok(Reply::Handle(dom.into_handle()))
}

fn domain_lookup_by_uuid(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let uuid = args.uuid(1)?;
    let dom = conn.domain_lookup_by_uuid(&uuid)?;
    Ok(Reply::Handle(dom.into_handle()))
}

fn domain_define_xml(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let xml = args.c_bytes(1)?;
    let dom = conn.domain_define_xml_bytes(&xml)?;
    Ok(Reply::Handle(dom.into_handle()))
}

fn domain_restore(args: &Args) -> Result<Reply> {
    let conn = args.connect(0)?;
    let path = args.c_bytes(1)?;
    conn.domain_restore_bytes(&path)?;
    Ok(Reply::Ok)
}

fn domain_create(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let flags = args.int_as::<u32>(1)?;
    dom.create(flags)?;
    Ok(Reply::Ok)
}

fn domain_shutdown(args: &Args) -> Result<Reply> {
    args.domain(0)?.shutdown()?;
    Ok(Reply::Ok)
}

fn domain_suspend(args: &Args) -> Result<Reply> {
    args.domain(0)?.suspend()?;
    Ok(Reply::Ok)
}

fn domain_resume(args: &Args) -> Result<Reply> {
    args.domain(0)?.resume()?;
    Ok(Reply::Ok)
}

fn domain_undefine(args: &Args) -> Result<Reply> {
    args.domain(0)?.undefine()?;
    Ok(Reply::Ok)
}

fn domain_destroy(args: &Args) -> Result<Reply> {
    args.domain(0)?.destroy()?;
    Ok(Reply::Ok)
}

fn domain_save(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let path = args.c_bytes(1)?;
    dom.save_bytes(&path)?;
    Ok(Reply::Ok)
}

fn domain_get_max_vcpus(args: &Args) -> Result<Reply> {
    Ok(Reply::Int(i64::from(args.domain(0)?.max_vcpus()?)))
}

fn domain_get_autostart(args: &Args) -> Result<Reply> {
    Ok(Reply::Bool(args.domain(0)?.autostart()?))
}

fn domain_set_autostart(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let autostart = args.int(1)? != 0;
    dom.set_autostart(autostart)?;
    Ok(Reply::Ok)
}

fn domain_get_id(args: &Args) -> Result<Reply> {
    Ok(Reply::UInt(u64::from(args.domain(0)?.id()?)))
}

fn domain_get_info(args: &Args) -> Result<Reply> {
    Ok(Reply::Buffer(args.domain(0)?.info()?))
}

fn domain_get_block_info(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let disk = args.c_bytes(1)?;
    Ok(Reply::Buffer(dom.block_info_bytes(&disk)?))
}

fn domain_get_job_info(args: &Args) -> Result<Reply> {
    Ok(Reply::Buffer(args.domain(0)?.job_info()?))
}

fn domain_get_max_memory(args: &Args) -> Result<Reply> {
    Ok(Reply::UInt(args.domain(0)?.max_memory()?))
}

fn domain_get_memory_parameters(args: &Args) -> Result<Reply> {
    let (buf, count) = args.domain(0)?.memory_parameters()?;
    Ok(Reply::Parameter { buf, count })
}

fn domain_get_name(args: &Args) -> Result<Reply> {
    Ok(Reply::Str(args.domain(0)?.name()?))
}

fn domain_get_os_type(args: &Args) -> Result<Reply> {
    Ok(Reply::Str(args.domain(0)?.os_type()?))
}

fn domain_get_scheduler_type(args: &Args) -> Result<Reply> {
    let (name, count) = args.domain(0)?.scheduler_type()?;
    Ok(Reply::Parameter {
        buf: marshal::copy_bytes(name.as_bytes())?,
        count,
    })
}

fn domain_get_scheduler_parameters(args: &Args) -> Result<Reply> {
    Ok(Reply::Buffer(args.domain(0)?.scheduler_parameters()?))
}

fn domain_get_security_label(args: &Args) -> Result<Reply> {
    Ok(Reply::Buffer(args.domain(0)?.security_label()?))
}

fn domain_get_uuid(args: &Args) -> Result<Reply> {
    let uuid = args.domain(0)?.uuid()?;
    Ok(Reply::Buffer(marshal::copy_bytes(&uuid)?))
}

fn domain_get_uuid_string(args: &Args) -> Result<Reply> {
    Ok(Reply::Str(args.domain(0)?.uuid_string()?))
}

fn domain_get_xml_desc(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let flags = args.int_as::<u32>(1)?;
    Ok(Reply::Str(dom.xml_desc(flags)?))
}

fn domain_open_console(args: &Args) -> Result<Reply> {
    let dom = args.domain(0)?;
    let dev_name = args.bytes(1)?;
    let stream = args.stream(2)?;
    let dev_name = if dev_name.is_empty() {
        None
    } else {
        Some(args.c_bytes(1)?)
    };
    dom.open_console_bytes(dev_name.as_ref(), &stream)?;
    Ok(Reply::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_op_has_a_unique_name() {
        for (i, op) in OPS.iter().enumerate() {
            assert!(
                OPS.iter().skip(i + 1).all(|other| other.name != op.name),
                "duplicate op {}",
                op.name
            );
        }
        assert!(find("virDomainGetInfo").is_some());
        assert!(find("virDomainMigrate").is_none());
    }

    #[test]
    fn test_unknown_operation_is_bad_argument() {
        let err = dispatch("virDomainMigrate", &[]).unwrap_err();
        assert!(err.is_bad_argument());
    }

    #[test]
    fn test_arity_is_checked() {
        let err = dispatch("virDomainGetInfo", &[]).unwrap_err();
        assert!(err.is_bad_argument());
        let err = dispatch("virDomainGetInfo", &[Value::Int(1), Value::Int(2)]).unwrap_err();
        assert!(err.is_bad_argument());
    }

    #[test]
    fn test_shapes_are_checked_before_execution() {
        // An integer where a domain resource is declared.
        let err = dispatch("virDomainGetInfo", &[Value::Int(1)]).unwrap_err();
        assert!(err.is_bad_argument());

        // A handle of the wrong kind.
        let conn = Handle::allocate(Kind::Connect, None);
        let err = dispatch("virDomainGetInfo", &[Value::Handle(conn)]).unwrap_err();
        assert!(err.is_bad_argument());
    }

    #[cfg(not(feature = "libvirt"))]
    #[test]
    fn test_capability_gate_skips_the_native_call() {
        let dom = Handle::allocate(Kind::Domain, None);
        let old = CapabilitySet::for_version(7_000);
        crate::ffi::mock::take_calls();
        let err = dispatch_with(&old, "virDomainGetJobInfo", &[Value::Handle(dom)]).unwrap_err();
        assert!(err.is_unsupported());
        assert!(crate::ffi::mock::take_calls().is_empty());
    }
}
