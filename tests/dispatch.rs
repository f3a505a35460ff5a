//! Dispatch-surface tests against the built-in test driver.
//!
//! These run without any native library; `--features libvirt` swaps the
//! driver out and this suite is skipped (see `live.rs` instead).

#![cfg(not(feature = "libvirt"))]

use std::os::raw::c_ulong;

use virt::{
    dispatch, dispatch_with, mock, CapabilitySet, Error, Handle, Reply, Value,
    DOMAIN_INFO_RECORD_SIZE, VIR_UUID_BUFLEN,
};

fn open() -> Handle {
    match dispatch("virConnectOpen", &[Value::from("test:///default")]) {
        Ok(Reply::Handle(handle)) => handle,
        other => panic!("expected a connection handle, got {other:?}"),
    }
}

fn lookup(conn: &Handle, name: &str) -> Handle {
    let argv = [Value::Handle(conn.clone()), Value::from(name)];
    match dispatch("virDomainLookupByName", &argv) {
        Ok(Reply::Handle(handle)) => handle,
        other => panic!("expected a domain handle, got {other:?}"),
    }
}

fn domain_state(dom: &Handle) -> u8 {
    match dispatch("virDomainGetInfo", &[Value::Handle(dom.clone())]) {
        Ok(Reply::Buffer(buf)) => buf.as_bytes()[0],
        other => panic!("expected an info buffer, got {other:?}"),
    }
}

fn read_word(bytes: &[u8]) -> u64 {
    match bytes.len() {
        4 => u64::from(u32::from_ne_bytes(bytes.try_into().unwrap())),
        8 => u64::from_ne_bytes(bytes.try_into().unwrap()),
        n => panic!("unexpected word width {n}"),
    }
}

#[test]
fn test_get_info_record_layout() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let buf = match dispatch("virDomainGetInfo", &[Value::Handle(dom)]) {
        Ok(Reply::Buffer(buf)) => buf,
        other => panic!("expected an info buffer, got {other:?}"),
    };
    assert_eq!(buf.len(), DOMAIN_INFO_RECORD_SIZE);

    // state u8, max-mem word, memory word, vcpus u16, cpu-time u64,
    // packed in declared order.
    let bytes = buf.as_bytes();
    let word = std::mem::size_of::<c_ulong>();
    assert_eq!(bytes[0], 1, "running");
    assert_eq!(read_word(&bytes[1..1 + word]), 524_288);
    assert_eq!(read_word(&bytes[1 + word..1 + 2 * word]), 262_144);
    let off = 1 + 2 * word;
    assert_eq!(
        u16::from_ne_bytes(bytes[off..off + 2].try_into().unwrap()),
        2
    );
    assert_eq!(
        u64::from_ne_bytes(bytes[off + 2..off + 10].try_into().unwrap()),
        123_456_789
    );
}

#[test]
fn test_lookup_missing_domain_reports_native_error() {
    let conn = open();
    mock::take_calls();
    let argv = [Value::Handle(conn.clone()), Value::from("missing-domain")];
    let err = dispatch("virDomainLookupByName", &argv).unwrap_err();
    match err {
        Error::Native(e) => {
            assert_eq!(e.code, 42);
            assert!(e.message.contains("missing-domain"), "{}", e.message);
        }
        other => panic!("expected a native error, got {other}"),
    }
    // The failed lookup must not leave a bound domain handle behind:
    // the only native call was the lookup itself, never a free.
    assert_eq!(mock::take_calls(), vec!["virDomainLookupByName"]);
}

#[test]
fn test_lookup_by_uuid_roundtrip() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let uuid = match dispatch("virDomainGetUUID", &[Value::Handle(dom)]) {
        Ok(Reply::Buffer(buf)) => buf,
        other => panic!("expected a uuid buffer, got {other:?}"),
    };
    assert_eq!(uuid.len(), VIR_UUID_BUFLEN);

    let argv = [
        Value::Handle(conn.clone()),
        Value::Bytes(uuid.into_vec()),
    ];
    let again = match dispatch("virDomainLookupByUUID", &argv) {
        Ok(Reply::Handle(handle)) => handle,
        other => panic!("expected a domain handle, got {other:?}"),
    };
    match dispatch("virDomainGetName", &[Value::Handle(again)]) {
        Ok(Reply::Str(name)) => assert_eq!(name, "test"),
        other => panic!("expected a name, got {other:?}"),
    }
}

#[test]
fn test_lookup_by_uuid_rejects_short_buffers() {
    let conn = open();
    let argv = [Value::Handle(conn.clone()), Value::Bytes(vec![0u8; 4])];
    let err = dispatch("virDomainLookupByUUID", &argv).unwrap_err();
    assert!(err.is_bad_argument());
}

#[test]
fn test_uuid_string_is_fixed_length() {
    let conn = open();
    let dom = lookup(&conn, "test");
    match dispatch("virDomainGetUUIDString", &[Value::Handle(dom)]) {
        Ok(Reply::Str(s)) => assert_eq!(s.len(), 36),
        other => panic!("expected a uuid string, got {other:?}"),
    }
}

#[test]
fn test_unsupported_capability_makes_no_native_call() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let old = CapabilitySet::for_version(8_002);
    mock::take_calls();
    let err = dispatch_with(
        &old,
        "virDomainGetMemoryParameters",
        &[Value::Handle(dom.clone())],
    )
    .unwrap_err();
    assert!(err.is_unsupported());
    let err =
        dispatch_with(&old, "virDomainOpenConsole", &[Value::Handle(dom)]).unwrap_err();
    // Wrong arity is still an argument error, never a native call.
    assert!(err.is_bad_argument());
    assert!(mock::take_calls().is_empty());
}

#[test]
fn test_memory_parameters_running_and_idle() {
    let conn = open();
    let dom = lookup(&conn, "test");

    match dispatch("virDomainGetMemoryParameters", &[Value::Handle(dom)]) {
        Ok(Reply::Parameter { buf, count }) => {
            assert_eq!(count, 3);
            assert!(!buf.is_empty());
            assert_eq!(buf.len() % 3, 0);
        }
        other => panic!("expected parameter records, got {other:?}"),
    }

    // A defined-but-never-started domain reports zero records, which is
    // a failure rather than an empty success.
    let argv = [
        Value::Handle(conn.clone()),
        Value::from("<domain><name>idle</name></domain>"),
    ];
    let idle = match dispatch("virDomainDefineXML", &argv) {
        Ok(Reply::Handle(handle)) => handle,
        other => panic!("expected a domain handle, got {other:?}"),
    };
    let err =
        dispatch("virDomainGetMemoryParameters", &[Value::Handle(idle)]).unwrap_err();
    assert!(err.is_native(), "unexpected error: {err}");
}

#[test]
fn test_scheduler_type_parameter_reply() {
    let conn = open();
    let dom = lookup(&conn, "test");
    match dispatch("virDomainGetSchedulerType", &[Value::Handle(dom)]) {
        Ok(Reply::Parameter { buf, count }) => {
            assert_eq!(buf.as_bytes(), b"fair");
            assert_eq!(count, 1);
        }
        other => panic!("expected the scheduler type, got {other:?}"),
    }
}

#[test]
fn test_lookups_hand_out_independent_handles() {
    let conn = open();
    let first = lookup(&conn, "test");
    let second = lookup(&conn, "test");

    first.release();
    // Releasing one handle leaves the other fully usable.
    match dispatch("virDomainGetName", &[Value::Handle(second)]) {
        Ok(Reply::Str(name)) => assert_eq!(name, "test"),
        other => panic!("expected a name, got {other:?}"),
    }
    // The released handle is rejected before any native call.
    let err = dispatch("virDomainGetName", &[Value::Handle(first)]).unwrap_err();
    assert!(err.is_bad_argument());
}

#[test]
fn test_save_restore_roundtrip() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let argv = [Value::Handle(dom.clone()), Value::from("/tmp/test.save")];
    assert!(matches!(dispatch("virDomainSave", &argv), Ok(Reply::Ok)));
    assert_eq!(domain_state(&dom), 5, "shut off after save");

    let argv = [Value::Handle(conn.clone()), Value::from("/tmp/test.save")];
    assert!(matches!(dispatch("virDomainRestore", &argv), Ok(Reply::Ok)));
    assert_eq!(domain_state(&dom), 1, "running after restore");

    // The save image is consumed; a second restore fails natively.
    let argv = [Value::Handle(conn.clone()), Value::from("/tmp/test.save")];
    let err = dispatch("virDomainRestore", &argv).unwrap_err();
    assert!(err.is_native());
}

#[test]
fn test_autostart_and_scalars() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let argv = [Value::Handle(dom.clone()), Value::Int(1)];
    assert!(matches!(dispatch("virDomainSetAutostart", &argv), Ok(Reply::Ok)));
    assert!(matches!(
        dispatch("virDomainGetAutostart", &[Value::Handle(dom.clone())]),
        Ok(Reply::Bool(true))
    ));

    assert!(matches!(
        dispatch("virDomainGetMaxMemory", &[Value::Handle(dom.clone())]),
        Ok(Reply::UInt(524_288))
    ));
    assert!(matches!(
        dispatch("virDomainGetMaxVcpus", &[Value::Handle(dom.clone())]),
        Ok(Reply::Int(16))
    ));
    assert!(matches!(
        dispatch("virDomainGetID", &[Value::Handle(dom)]),
        Ok(Reply::UInt(1))
    ));
}

#[test]
fn test_xml_and_os_type() {
    let conn = open();
    let dom = lookup(&conn, "test");

    match dispatch("virDomainGetOSType", &[Value::Handle(dom.clone())]) {
        Ok(Reply::Str(os)) => assert_eq!(os, "linux"),
        other => panic!("expected an os type, got {other:?}"),
    }
    let argv = [Value::Handle(dom), Value::Int(0)];
    match dispatch("virDomainGetXMLDesc", &argv) {
        Ok(Reply::Str(xml)) => assert!(xml.contains("<name>test</name>"), "{xml}"),
        other => panic!("expected xml, got {other:?}"),
    }
}

#[test]
fn test_open_console_with_stream() {
    let conn = open();
    let dom = lookup(&conn, "test");

    let argv = [Value::Handle(conn.clone()), Value::Int(0)];
    let stream = match dispatch("virStreamNew", &argv) {
        Ok(Reply::Handle(handle)) => handle,
        other => panic!("expected a stream handle, got {other:?}"),
    };

    // An empty device name selects the default console device.
    let argv = [
        Value::Handle(dom),
        Value::Bytes(Vec::new()),
        Value::Handle(stream),
    ];
    assert!(matches!(dispatch("virDomainOpenConsole", &argv), Ok(Reply::Ok)));
}

#[test]
fn test_closed_connection_is_rejected() {
    let conn = open();
    assert!(matches!(
        dispatch("virConnectClose", &[Value::Handle(conn.clone())]),
        Ok(Reply::Ok)
    ));
    let argv = [Value::Handle(conn), Value::Int(1)];
    let err = dispatch("virDomainLookupByID", &argv).unwrap_err();
    assert!(err.is_bad_argument());
}
