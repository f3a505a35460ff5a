//! In-process test driver used when the `libvirt` feature is disabled.
//!
//! Provides the same functions as the native library, backed by a small
//! in-memory hypervisor model: every connection starts with one running
//! domain named `test`, lookups hand out independently freed domain
//! objects, and failures are reported through thread-local last-error
//! state exactly like the real library. Every call is appended to a
//! per-thread log so tests can assert which native calls happened.

#![allow(non_snake_case)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use super::raw::*;

/// Version the test driver reports through `virGetVersion` (10.3.0).
pub const MOCK_LIB_VERSION: c_ulong = 10_003_000;

/// UUID of the predefined `test` domain.
pub const TEST_DOMAIN_UUID: [u8; VIR_UUID_BUFLEN] = [
    0x66, 0x95, 0xeb, 0x01, 0xf6, 0xa4, 0x83, 0x04, 0x79, 0xaa, 0x97, 0xf2, 0x50, 0x2e, 0x19,
    0x3f,
];

struct DomainState {
    id: u32,
    uuid: [u8; VIR_UUID_BUFLEN],
    state: c_uchar,
    max_mem: u64,
    memory: u64,
    vcpus: u16,
    cpu_time: u64,
    autostart: bool,
    persistent: bool,
}

impl DomainState {
    fn is_active(&self) -> bool {
        matches!(
            self.state,
            VIR_DOMAIN_RUNNING | VIR_DOMAIN_BLOCKED | VIR_DOMAIN_PAUSED
        )
    }
}

struct ConnState {
    domains: HashMap<String, DomainState>,
    /// Save-file path to domain name, for `virDomainRestore`.
    saved: HashMap<String, String>,
    next_id: u32,
}

impl ConnState {
    fn new() -> ConnState {
        let mut domains = HashMap::new();
        domains.insert(
            "test".to_string(),
            DomainState {
                id: 1,
                uuid: TEST_DOMAIN_UUID,
                state: VIR_DOMAIN_RUNNING,
                max_mem: 524_288,
                memory: 262_144,
                vcpus: 2,
                cpu_time: 123_456_789,
                autostart: false,
                persistent: true,
            },
        );
        ConnState {
            domains,
            saved: HashMap::new(),
            next_id: 2,
        }
    }
}

struct MockConnect {
    id: u64,
}

struct MockDomain {
    conn: u64,
    name: CString,
}

struct MockStream {
    _conn: u64,
}

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

fn registry() -> &'static Mutex<HashMap<u64, ConnState>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, ConnState>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

struct ErrorSlot {
    // The virError.message field points into this buffer.
    _message: CString,
    error: virError,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<Box<ErrorSlot>>> = const { RefCell::new(None) };
    static CALL_LOG: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Drain the current thread's native-call log.
pub fn take_calls() -> Vec<&'static str> {
    CALL_LOG.with(|log| log.borrow_mut().split_off(0))
}

fn record(name: &'static str) {
    CALL_LOG.with(|log| log.borrow_mut().push(name));
}

fn set_error(code: c_int, message: String) {
    let message =
        CString::new(message).unwrap_or_else(|_| CString::new("invalid error message").expect("static string"));
    LAST_ERROR.with(|slot| {
        let mut error: virError = unsafe { std::mem::zeroed() };
        error.code = code;
        error.domain = VIR_FROM_DOM;
        error.level = VIR_ERR_ERROR;
        error.message = message.as_ptr() as *mut c_char;
        *slot.borrow_mut() = Some(Box::new(ErrorSlot {
            _message: message,
            error,
        }));
    });
}

fn no_domain(name: &str) {
    set_error(
        VIR_ERR_NO_DOMAIN,
        format!("Domain not found: no domain with matching name '{}'", name),
    );
}

fn invalid_conn() {
    set_error(VIR_ERR_INVALID_CONN, "invalid connection pointer".to_string());
}

/// Duplicate a string with the C allocator so callers can `free()` it.
fn c_string_dup(s: &str) -> *mut c_char {
    let bytes = s.as_bytes();
    let buf = unsafe { libc::malloc(bytes.len() + 1) } as *mut u8;
    if buf.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), buf, bytes.len());
        *buf.add(bytes.len()) = 0;
    }
    buf as *mut c_char
}

fn domain_ref(conn: u64, name: &str) -> virDomainPtr {
    let dom = Box::new(MockDomain {
        conn,
        name: CString::new(name).expect("domain name contains no NUL"),
    });
    Box::into_raw(dom) as virDomainPtr
}

fn uuid_for(name: &str) -> [u8; VIR_UUID_BUFLEN] {
    let mut uuid = [0u8; VIR_UUID_BUFLEN];
    for (i, b) in name.bytes().cycle().take(VIR_UUID_BUFLEN).enumerate() {
        uuid[i] = b;
    }
    uuid
}

fn uuid_display(uuid: &[u8; VIR_UUID_BUFLEN]) -> String {
    let h = |r: std::ops::Range<usize>| {
        uuid[r].iter().map(|b| format!("{:02x}", b)).collect::<String>()
    };
    format!(
        "{}-{}-{}-{}-{}",
        h(0..4),
        h(4..6),
        h(6..8),
        h(8..10),
        h(10..16)
    )
}

/// Run `f` against the state of the domain `dom` refers to, reporting
/// the usual errors when the connection or the domain is gone.
fn with_domain<R>(
    dom: virDomainPtr,
    f: impl FnOnce(&mut ConnState, &str) -> Option<R>,
) -> Option<R> {
    let (conn, name) = unsafe {
        let d = &*(dom as *const MockDomain);
        (d.conn, d.name.to_string_lossy().into_owned())
    };
    let mut registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get_mut(&conn) else {
        invalid_conn();
        return None;
    };
    if !state.domains.contains_key(&name) {
        no_domain(&name);
        return None;
    }
    f(state, &name)
}

// ========== Version and error state ==========

pub unsafe extern "C" fn virGetVersion(
    libVer: *mut c_ulong,
    _type: *const c_char,
    typeVer: *mut c_ulong,
) -> c_int {
    record("virGetVersion");
    if !libVer.is_null() {
        *libVer = MOCK_LIB_VERSION;
    }
    if !typeVer.is_null() {
        *typeVer = MOCK_LIB_VERSION;
    }
    0
}

pub unsafe extern "C" fn virGetLastError() -> virErrorPtr {
    LAST_ERROR.with(|slot| match slot.borrow_mut().as_mut() {
        Some(slot) => &mut slot.error as virErrorPtr,
        None => ptr::null_mut(),
    })
}

pub unsafe extern "C" fn virResetLastError() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

// ========== Connections ==========

pub unsafe extern "C" fn virConnectOpen(name: *const c_char) -> virConnectPtr {
    record("virConnectOpen");
    let uri = if name.is_null() {
        "test:///default".to_string()
    } else {
        CStr::from_ptr(name).to_string_lossy().into_owned()
    };
    if !uri.starts_with("test:") {
        set_error(
            VIR_ERR_NO_CONNECT,
            format!("no connection driver available for {}", uri),
        );
        return ptr::null_mut();
    }
    let id = NEXT_CONN_ID.fetch_add(1, Ordering::SeqCst);
    registry()
        .lock()
        .expect("mock registry poisoned")
        .insert(id, ConnState::new());
    Box::into_raw(Box::new(MockConnect { id })) as virConnectPtr
}

pub unsafe extern "C" fn virConnectClose(conn: virConnectPtr) -> c_int {
    record("virConnectClose");
    let conn = Box::from_raw(conn as *mut MockConnect);
    registry()
        .lock()
        .expect("mock registry poisoned")
        .remove(&conn.id);
    0
}

// ========== Streams ==========

pub unsafe extern "C" fn virStreamNew(conn: virConnectPtr, _flags: c_uint) -> virStreamPtr {
    record("virStreamNew");
    let id = (*(conn as *const MockConnect)).id;
    if !registry()
        .lock()
        .expect("mock registry poisoned")
        .contains_key(&id)
    {
        invalid_conn();
        return ptr::null_mut();
    }
    Box::into_raw(Box::new(MockStream { _conn: id })) as virStreamPtr
}

pub unsafe extern "C" fn virStreamFree(stream: virStreamPtr) -> c_int {
    record("virStreamFree");
    drop(Box::from_raw(stream as *mut MockStream));
    0
}

// ========== Domain lookup and definition ==========

pub unsafe extern "C" fn virDomainLookupByID(conn: virConnectPtr, id: c_int) -> virDomainPtr {
    record("virDomainLookupByID");
    let conn_id = (*(conn as *const MockConnect)).id;
    let registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get(&conn_id) else {
        invalid_conn();
        return ptr::null_mut();
    };
    let found = state
        .domains
        .iter()
        .find(|(_, d)| d.is_active() && id >= 0 && d.id == id as u32)
        .map(|(name, _)| name.clone());
    drop(registry);
    match found {
        Some(name) => domain_ref(conn_id, &name),
        None => {
            set_error(
                VIR_ERR_NO_DOMAIN,
                format!("Domain not found: no domain with matching id {}", id),
            );
            ptr::null_mut()
        }
    }
}

pub unsafe extern "C" fn virDomainLookupByName(
    conn: virConnectPtr,
    name: *const c_char,
) -> virDomainPtr {
    record("virDomainLookupByName");
    let conn_id = (*(conn as *const MockConnect)).id;
    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    let registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get(&conn_id) else {
        invalid_conn();
        return ptr::null_mut();
    };
    if state.domains.contains_key(&name) {
        drop(registry);
        domain_ref(conn_id, &name)
    } else {
        drop(registry);
        no_domain(&name);
        ptr::null_mut()
    }
}

pub unsafe extern "C" fn virDomainLookupByUUID(
    conn: virConnectPtr,
    uuid: *const c_uchar,
) -> virDomainPtr {
    record("virDomainLookupByUUID");
    let conn_id = (*(conn as *const MockConnect)).id;
    let mut wanted = [0u8; VIR_UUID_BUFLEN];
    wanted.copy_from_slice(std::slice::from_raw_parts(uuid, VIR_UUID_BUFLEN));
    let registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get(&conn_id) else {
        invalid_conn();
        return ptr::null_mut();
    };
    let found = state
        .domains
        .iter()
        .find(|(_, d)| d.uuid == wanted)
        .map(|(name, _)| name.clone());
    drop(registry);
    match found {
        Some(name) => domain_ref(conn_id, &name),
        None => {
            set_error(
                VIR_ERR_NO_DOMAIN,
                format!(
                    "Domain not found: no domain with matching uuid '{}'",
                    uuid_display(&wanted)
                ),
            );
            ptr::null_mut()
        }
    }
}

pub unsafe extern "C" fn virDomainDefineXML(
    conn: virConnectPtr,
    xml: *const c_char,
) -> virDomainPtr {
    record("virDomainDefineXML");
    let conn_id = (*(conn as *const MockConnect)).id;
    let xml = CStr::from_ptr(xml).to_string_lossy().into_owned();
    let name = match tag_text(&xml, "name") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            set_error(
                VIR_ERR_XML_ERROR,
                "missing domain name in XML definition".to_string(),
            );
            return ptr::null_mut();
        }
    };
    let mut registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get_mut(&conn_id) else {
        invalid_conn();
        return ptr::null_mut();
    };
    state
        .domains
        .entry(name.clone())
        .or_insert_with(|| DomainState {
            id: 0,
            uuid: uuid_for(&name),
            state: VIR_DOMAIN_SHUTOFF,
            max_mem: 524_288,
            memory: 262_144,
            vcpus: 1,
            cpu_time: 0,
            autostart: false,
            persistent: true,
        });
    drop(registry);
    domain_ref(conn_id, &name)
}

fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim())
}

pub unsafe extern "C" fn virDomainRestore(conn: virConnectPtr, from: *const c_char) -> c_int {
    record("virDomainRestore");
    let conn_id = (*(conn as *const MockConnect)).id;
    let path = CStr::from_ptr(from).to_string_lossy().into_owned();
    let mut registry = registry().lock().expect("mock registry poisoned");
    let Some(state) = registry.get_mut(&conn_id) else {
        invalid_conn();
        return -1;
    };
    match state.saved.remove(&path) {
        Some(name) => {
            let id = state.next_id;
            state.next_id += 1;
            if let Some(dom) = state.domains.get_mut(&name) {
                dom.state = VIR_DOMAIN_RUNNING;
                dom.id = id;
            }
            0
        }
        None => {
            set_error(
                VIR_ERR_OPERATION_FAILED,
                format!("no saved domain image at '{}'", path),
            );
            -1
        }
    }
}

pub unsafe extern "C" fn virDomainFree(domain: virDomainPtr) -> c_int {
    record("virDomainFree");
    drop(Box::from_raw(domain as *mut MockDomain));
    0
}

// ========== Domain lifecycle ==========

pub unsafe extern "C" fn virDomainCreate(domain: virDomainPtr) -> c_int {
    record("virDomainCreate");
    start_domain(domain)
}

pub unsafe extern "C" fn virDomainCreateWithFlags(domain: virDomainPtr, _flags: c_uint) -> c_int {
    record("virDomainCreateWithFlags");
    start_domain(domain)
}

fn start_domain(domain: virDomainPtr) -> c_int {
    with_domain(domain, |state, name| {
        let id = state.next_id;
        {
            let dom = state.domains.get_mut(name)?;
            if dom.is_active() {
                set_error(
                    VIR_ERR_OPERATION_INVALID,
                    "domain is already running".to_string(),
                );
                return None;
            }
            dom.id = id;
            dom.state = VIR_DOMAIN_RUNNING;
        }
        state.next_id = id + 1;
        Some(0)
    })
    .unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainShutdown(domain: virDomainPtr) -> c_int {
    record("virDomainShutdown");
    transition(domain, VIR_DOMAIN_RUNNING, VIR_DOMAIN_SHUTOFF, "domain is not running")
}

pub unsafe extern "C" fn virDomainSuspend(domain: virDomainPtr) -> c_int {
    record("virDomainSuspend");
    transition(domain, VIR_DOMAIN_RUNNING, VIR_DOMAIN_PAUSED, "domain is not running")
}

pub unsafe extern "C" fn virDomainResume(domain: virDomainPtr) -> c_int {
    record("virDomainResume");
    transition(domain, VIR_DOMAIN_PAUSED, VIR_DOMAIN_RUNNING, "domain is not paused")
}

fn transition(domain: virDomainPtr, from: c_uchar, to: c_uchar, msg: &str) -> c_int {
    with_domain(domain, |state, name| {
        let dom = state.domains.get_mut(name)?;
        if dom.state != from {
            set_error(VIR_ERR_OPERATION_INVALID, msg.to_string());
            return None;
        }
        dom.state = to;
        Some(0)
    })
    .unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainUndefine(domain: virDomainPtr) -> c_int {
    record("virDomainUndefine");
    with_domain(domain, |state, name| {
        let dom = state.domains.get(name)?;
        if dom.is_active() {
            set_error(
                VIR_ERR_OPERATION_INVALID,
                "cannot undefine an active domain".to_string(),
            );
            return None;
        }
        if !dom.persistent {
            set_error(
                VIR_ERR_OPERATION_INVALID,
                "cannot undefine a transient domain".to_string(),
            );
            return None;
        }
        state.domains.remove(name);
        Some(0)
    })
    .unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainDestroy(domain: virDomainPtr) -> c_int {
    record("virDomainDestroy");
    with_domain(domain, |state, name| {
        let persistent = {
            let dom = state.domains.get_mut(name)?;
            if !dom.is_active() {
                set_error(
                    VIR_ERR_OPERATION_INVALID,
                    "domain is not running".to_string(),
                );
                return None;
            }
            if dom.persistent {
                dom.state = VIR_DOMAIN_SHUTOFF;
            }
            dom.persistent
        };
        if !persistent {
            state.domains.remove(name);
        }
        Some(0)
    })
    .unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainSave(domain: virDomainPtr, to: *const c_char) -> c_int {
    record("virDomainSave");
    let path = CStr::from_ptr(to).to_string_lossy().into_owned();
    with_domain(domain, |state, name| {
        let dom = state.domains.get_mut(name)?;
        if !dom.is_active() {
            set_error(
                VIR_ERR_OPERATION_INVALID,
                "domain is not running".to_string(),
            );
            return None;
        }
        dom.state = VIR_DOMAIN_SHUTOFF;
        state.saved.insert(path, name.to_string());
        Some(0)
    })
    .unwrap_or(-1)
}

// ========== Domain queries ==========

pub unsafe extern "C" fn virDomainGetMaxVcpus(domain: virDomainPtr) -> c_int {
    record("virDomainGetMaxVcpus");
    with_domain(domain, |_, _| Some(16)).unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainGetAutostart(
    domain: virDomainPtr,
    autostart: *mut c_int,
) -> c_int {
    record("virDomainGetAutostart");
    match with_domain(domain, |state, name| {
        state.domains.get(name).map(|d| d.autostart)
    }) {
        Some(value) => {
            *autostart = value as c_int;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainSetAutostart(domain: virDomainPtr, autostart: c_int) -> c_int {
    record("virDomainSetAutostart");
    with_domain(domain, |state, name| {
        let dom = state.domains.get_mut(name)?;
        dom.autostart = autostart != 0;
        Some(0)
    })
    .unwrap_or(-1)
}

pub unsafe extern "C" fn virDomainGetID(domain: virDomainPtr) -> c_uint {
    record("virDomainGetID");
    // Inactive domains have no id; the sentinel is reported without an
    // error record, matching the native call.
    with_domain(domain, |state, name| {
        let dom = state.domains.get(name)?;
        if dom.is_active() {
            Some(dom.id as c_uint)
        } else {
            None
        }
    })
    .unwrap_or(c_uint::MAX)
}

pub unsafe extern "C" fn virDomainGetInfo(domain: virDomainPtr, info: *mut virDomainInfo) -> c_int {
    record("virDomainGetInfo");
    match with_domain(domain, |state, name| {
        let d = state.domains.get(name)?;
        Some((d.state, d.max_mem, d.memory, d.vcpus, d.cpu_time))
    }) {
        Some((state, max_mem, memory, vcpus, cpu_time)) => {
            (*info).state = state;
            (*info).maxMem = max_mem as c_ulong;
            (*info).memory = memory as c_ulong;
            (*info).nrVirtCpu = vcpus;
            (*info).cpuTime = cpu_time;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetBlockInfo(
    domain: virDomainPtr,
    _disk: *const c_char,
    info: *mut virDomainBlockInfo,
    _flags: c_uint,
) -> c_int {
    record("virDomainGetBlockInfo");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => {
            (*info).capacity = 1 << 30;
            (*info).allocation = 1 << 29;
            (*info).physical = 1 << 30;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetJobInfo(
    domain: virDomainPtr,
    info: *mut virDomainJobInfo,
) -> c_int {
    record("virDomainGetJobInfo");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => {
            *info = std::mem::zeroed();
            (*info).type_ = VIR_DOMAIN_JOB_NONE;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetMaxMemory(domain: virDomainPtr) -> c_ulong {
    record("virDomainGetMaxMemory");
    with_domain(domain, |state, name| {
        state.domains.get(name).map(|d| d.max_mem as c_ulong)
    })
    .unwrap_or(0)
}

pub unsafe extern "C" fn virDomainGetMemoryParameters(
    domain: virDomainPtr,
    params: virMemoryParameterPtr,
    nparams: *mut c_int,
    _flags: c_uint,
) -> c_int {
    record("virDomainGetMemoryParameters");
    let available = match with_domain(domain, |state, name| {
        state.domains.get(name).map(|d| d.is_active())
    }) {
        // Memory tunables are only reported while the domain runs.
        Some(active) => {
            if active {
                3
            } else {
                0
            }
        }
        None => return -1,
    };
    if params.is_null() {
        *nparams = available;
        return 0;
    }
    let names = [
        VIR_DOMAIN_MEMORY_HARD_LIMIT,
        VIR_DOMAIN_MEMORY_SOFT_LIMIT,
        VIR_DOMAIN_MEMORY_SWAP_HARD_LIMIT,
    ];
    let n = (*nparams).min(available).max(0);
    for (i, field_name) in names.iter().take(n as usize).enumerate() {
        let p = params.add(i);
        *p = std::mem::zeroed();
        ptr::copy_nonoverlapping(
            field_name.as_ptr(),
            (*p).field.as_mut_ptr() as *mut u8,
            field_name.len().min(VIR_TYPED_PARAM_FIELD_LENGTH - 1),
        );
        (*p).type_ = VIR_TYPED_PARAM_ULLONG;
        (*p).value.ul = VIR_DOMAIN_MEMORY_PARAM_UNLIMITED;
    }
    *nparams = n;
    0
}

pub unsafe extern "C" fn virDomainGetName(domain: virDomainPtr) -> *const c_char {
    record("virDomainGetName");
    (*(domain as *const MockDomain)).name.as_ptr()
}

pub unsafe extern "C" fn virDomainGetOSType(domain: virDomainPtr) -> *mut c_char {
    record("virDomainGetOSType");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => c_string_dup("linux"),
        None => ptr::null_mut(),
    }
}

pub unsafe extern "C" fn virDomainGetSchedulerType(
    domain: virDomainPtr,
    nparams: *mut c_int,
) -> *mut c_char {
    record("virDomainGetSchedulerType");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => {
            if !nparams.is_null() {
                *nparams = 1;
            }
            c_string_dup("fair")
        }
        None => ptr::null_mut(),
    }
}

pub unsafe extern "C" fn virDomainGetSchedulerParameters(
    domain: virDomainPtr,
    params: virSchedParameterPtr,
    nparams: *mut c_int,
) -> c_int {
    record("virDomainGetSchedulerParameters");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => {
            if *nparams < 1 {
                set_error(
                    VIR_ERR_INVALID_ARG,
                    "nparams too small for scheduler parameters".to_string(),
                );
                return -1;
            }
            let p = params;
            *p = std::mem::zeroed();
            let field = b"weight";
            ptr::copy_nonoverlapping(
                field.as_ptr(),
                (*p).field.as_mut_ptr() as *mut u8,
                field.len(),
            );
            (*p).type_ = VIR_TYPED_PARAM_UINT;
            (*p).value.ui = 50;
            *nparams = 1;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetSecurityLabel(
    domain: virDomainPtr,
    seclabel: *mut virSecurityLabel,
) -> c_int {
    record("virDomainGetSecurityLabel");
    match with_domain(domain, |_, _| Some(())) {
        Some(()) => {
            *seclabel = std::mem::zeroed();
            let label = b"none";
            ptr::copy_nonoverlapping(
                label.as_ptr(),
                (*seclabel).label.as_mut_ptr() as *mut u8,
                label.len(),
            );
            (*seclabel).enforcing = 0;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetUUID(domain: virDomainPtr, uuid: *mut c_uchar) -> c_int {
    record("virDomainGetUUID");
    match with_domain(domain, |state, name| state.domains.get(name).map(|d| d.uuid)) {
        Some(value) => {
            ptr::copy_nonoverlapping(value.as_ptr(), uuid, VIR_UUID_BUFLEN);
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetUUIDString(domain: virDomainPtr, buf: *mut c_char) -> c_int {
    record("virDomainGetUUIDString");
    match with_domain(domain, |state, name| state.domains.get(name).map(|d| d.uuid)) {
        Some(value) => {
            let display = uuid_display(&value);
            ptr::copy_nonoverlapping(display.as_ptr(), buf as *mut u8, display.len());
            *buf.add(display.len()) = 0;
            0
        }
        None => -1,
    }
}

pub unsafe extern "C" fn virDomainGetXMLDesc(domain: virDomainPtr, _flags: c_uint) -> *mut c_char {
    record("virDomainGetXMLDesc");
    let name = (*(domain as *const MockDomain))
        .name
        .to_string_lossy()
        .into_owned();
    match with_domain(domain, |state, name| {
        state
            .domains
            .get(name)
            .map(|d| (d.uuid, d.max_mem, d.vcpus))
    }) {
        Some((uuid, max_mem, vcpus)) => c_string_dup(&format!(
            "<domain type='test'>\n  <name>{}</name>\n  <uuid>{}</uuid>\n  \
             <memory>{}</memory>\n  <vcpu>{}</vcpu>\n  <os><type>linux</type></os>\n</domain>\n",
            name,
            uuid_display(&uuid),
            max_mem,
            vcpus
        )),
        None => ptr::null_mut(),
    }
}

pub unsafe extern "C" fn virDomainOpenConsole(
    domain: virDomainPtr,
    _dev_name: *const c_char,
    st: virStreamPtr,
    _flags: c_uint,
) -> c_int {
    record("virDomainOpenConsole");
    if st.is_null() {
        set_error(VIR_ERR_INVALID_ARG, "stream is required".to_string());
        return -1;
    }
    with_domain(domain, |state, name| {
        let dom = state.domains.get(name)?;
        if !dom.is_active() {
            set_error(
                VIR_ERR_OPERATION_INVALID,
                "domain is not running".to_string(),
            );
            return None;
        }
        Some(0)
    })
    .unwrap_or(-1)
}

// ========== Release functions for the remaining object kinds ==========
//
// Nothing in the test driver hands these objects out, so the release
// functions only record the call.

pub unsafe extern "C" fn virNetworkFree(_network: virNetworkPtr) -> c_int {
    record("virNetworkFree");
    0
}

pub unsafe extern "C" fn virStoragePoolFree(_pool: virStoragePoolPtr) -> c_int {
    record("virStoragePoolFree");
    0
}

pub unsafe extern "C" fn virInterfaceFree(_iface: virInterfacePtr) -> c_int {
    record("virInterfaceFree");
    0
}

pub unsafe extern "C" fn virNodeDeviceFree(_dev: virNodeDevicePtr) -> c_int {
    record("virNodeDeviceFree");
    0
}

pub unsafe extern "C" fn virSecretFree(_secret: virSecretPtr) -> c_int {
    record("virSecretFree");
    0
}

pub unsafe extern "C" fn virNWFilterFree(_nwfilter: virNWFilterPtr) -> c_int {
    record("virNWFilterFree");
    0
}
