//! Typed-API tests against the built-in test driver.

#![cfg(not(feature = "libvirt"))]

use virt::{Connect, Error};

fn open() -> Connect {
    Connect::open(Some("test:///default")).expect("test driver opens")
}

fn state_of(dom: &virt::Domain) -> u8 {
    dom.info().expect("info is readable").as_bytes()[0]
}

#[test]
fn test_lookup_variants_agree() {
    let conn = open();
    let by_name = conn.domain_lookup_by_name("test").unwrap();
    let by_id = conn.domain_lookup_by_id(1).unwrap();
    let by_uuid = conn.domain_lookup_by_uuid(&by_name.uuid().unwrap()).unwrap();

    assert_eq!(by_name.name().unwrap(), "test");
    assert_eq!(by_id.name().unwrap(), "test");
    assert_eq!(by_uuid.name().unwrap(), "test");
    assert_eq!(by_name.uuid_string().unwrap(), by_id.uuid_string().unwrap());
}

#[test]
fn test_lifecycle_transitions() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();
    assert_eq!(state_of(&dom), 1);

    dom.suspend().unwrap();
    assert_eq!(state_of(&dom), 3);

    // Suspending twice is an error reported by the driver.
    let err = dom.suspend().unwrap_err();
    match &err {
        Error::Native(e) => assert_eq!(e.code, 55),
        other => panic!("expected a native error, got {other}"),
    }

    dom.resume().unwrap();
    assert_eq!(state_of(&dom), 1);

    dom.shutdown().unwrap();
    assert_eq!(state_of(&dom), 5);

    dom.create(0).unwrap();
    assert_eq!(state_of(&dom), 1);

    dom.destroy().unwrap();
    assert_eq!(state_of(&dom), 5);
}

#[test]
fn test_save_and_restore() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();

    dom.save("/tmp/typed.save").unwrap();
    assert_eq!(state_of(&dom), 5);

    conn.domain_restore("/tmp/typed.save").unwrap();
    assert_eq!(state_of(&dom), 1);

    let err = conn.domain_restore("/tmp/typed.save").unwrap_err();
    assert!(err.is_native());
}

#[test]
fn test_define_and_undefine() {
    let conn = open();
    let dom = conn
        .domain_define_xml("<domain><name>ephemeral</name></domain>")
        .unwrap();
    assert_eq!(dom.name().unwrap(), "ephemeral");
    assert_eq!(state_of(&dom), 5);

    // The definition is visible to lookups until undefined.
    assert!(conn.domain_lookup_by_name("ephemeral").is_ok());
    dom.undefine().unwrap();
    let err = conn.domain_lookup_by_name("ephemeral").unwrap_err();
    assert!(err.is_native());
}

#[test]
fn test_undefine_active_domain_fails() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();
    let err = dom.undefine().unwrap_err();
    match err {
        Error::Native(e) => assert_eq!(e.code, 55),
        other => panic!("expected a native error, got {other}"),
    }
    // The domain is untouched.
    assert_eq!(state_of(&dom), 1);
}

#[test]
fn test_autostart() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();
    assert!(!dom.autostart().unwrap());
    dom.set_autostart(true).unwrap();
    assert!(dom.autostart().unwrap());
}

#[test]
fn test_console_needs_a_running_domain() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();
    let stream = conn.stream_new(0).unwrap();

    dom.open_console(None, &stream).unwrap();
    dom.open_console(Some("serial0"), &stream).unwrap();

    dom.destroy().unwrap();
    let err = dom.open_console(None, &stream).unwrap_err();
    assert!(err.is_native());
}

#[test]
fn test_scheduler_and_scalars() {
    let conn = open();
    let dom = conn.domain_lookup_by_name("test").unwrap();

    let (sched, nparams) = dom.scheduler_type().unwrap();
    assert_eq!(sched, "fair");
    assert_eq!(nparams, 1);
    assert!(!dom.scheduler_parameters().unwrap().is_empty());

    assert_eq!(dom.id().unwrap(), 1);
    assert_eq!(dom.max_memory().unwrap(), 524_288);
    assert_eq!(dom.max_vcpus().unwrap(), 16);
    assert_eq!(dom.os_type().unwrap(), "linux");
    assert!(dom.xml_desc(0).unwrap().contains("<name>test</name>"));
}

#[test]
fn test_independent_handles_release_independently() {
    let conn = open();
    let first = conn.domain_lookup_by_name("test").unwrap();
    let second = conn.domain_lookup_by_name("test").unwrap();

    drop(first);
    assert_eq!(second.name().unwrap(), "test");

    second.handle().release();
    let err = second.name().unwrap_err();
    assert!(err.is_bad_argument());
}

#[test]
fn test_connections_are_isolated() {
    let a = open();
    let b = open();

    let dom = a.domain_lookup_by_name("test").unwrap();
    dom.destroy().unwrap();
    assert_eq!(state_of(&dom), 5);

    // The same-named domain on another connection is untouched.
    let other = b.domain_lookup_by_name("test").unwrap();
    assert_eq!(state_of(&other), 1);
}
