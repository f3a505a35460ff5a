//! Raw C declarations for libvirt.
//!
//! Opaque object pointers, fixed-layout structs and constants shared by
//! the real library and the built-in test driver. The `extern` block is
//! only present when the `libvirt` feature links the system library;
//! otherwise the same functions are provided by [`super::mock`].
//!
//! Users should prefer the safe wrappers in the parent modules.

#![allow(non_camel_case_types, non_snake_case)]

use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_ulong, c_ulonglong, c_ushort};

/// Macro to declare an opaque libvirt object type and its pointer alias.
macro_rules! opaque {
    ($name:ident, $ptr:ident) => {
        /// Opaque libvirt object.
        #[repr(C)]
        pub struct $name {
            _private: [u8; 0],
        }

        pub type $ptr = *mut $name;
    };
}

opaque!(virConnect, virConnectPtr);
opaque!(virDomain, virDomainPtr);
opaque!(virStream, virStreamPtr);
opaque!(virNetwork, virNetworkPtr);
opaque!(virStoragePool, virStoragePoolPtr);
opaque!(virInterface, virInterfacePtr);
opaque!(virNodeDevice, virNodeDevicePtr);
opaque!(virSecret, virSecretPtr);
opaque!(virNWFilter, virNWFilterPtr);

/// Raw UUID length in bytes.
pub const VIR_UUID_BUFLEN: usize = 16;
/// Display form of a UUID, including the trailing NUL.
pub const VIR_UUID_STRING_BUFLEN: usize = 37;
/// Security label buffer, including the trailing NUL.
pub const VIR_SECURITY_LABEL_BUFLEN: usize = 4097;
/// Typed parameter field-name buffer.
pub const VIR_TYPED_PARAM_FIELD_LENGTH: usize = 80;

// virDomainState
pub const VIR_DOMAIN_NOSTATE: c_uchar = 0;
pub const VIR_DOMAIN_RUNNING: c_uchar = 1;
pub const VIR_DOMAIN_BLOCKED: c_uchar = 2;
pub const VIR_DOMAIN_PAUSED: c_uchar = 3;
pub const VIR_DOMAIN_SHUTDOWN: c_uchar = 4;
pub const VIR_DOMAIN_SHUTOFF: c_uchar = 5;
pub const VIR_DOMAIN_CRASHED: c_uchar = 6;

// virDomainJobType
pub const VIR_DOMAIN_JOB_NONE: c_int = 0;

// virTypedParameterType
pub const VIR_TYPED_PARAM_INT: c_int = 1;
pub const VIR_TYPED_PARAM_UINT: c_int = 2;
pub const VIR_TYPED_PARAM_LLONG: c_int = 3;
pub const VIR_TYPED_PARAM_ULLONG: c_int = 4;
pub const VIR_TYPED_PARAM_DOUBLE: c_int = 5;
pub const VIR_TYPED_PARAM_BOOLEAN: c_int = 6;

// Memory parameter field names and the "no limit" marker.
pub const VIR_DOMAIN_MEMORY_HARD_LIMIT: &str = "hard_limit";
pub const VIR_DOMAIN_MEMORY_SOFT_LIMIT: &str = "soft_limit";
pub const VIR_DOMAIN_MEMORY_SWAP_HARD_LIMIT: &str = "swap_hard_limit";
pub const VIR_DOMAIN_MEMORY_PARAM_UNLIMITED: c_ulonglong = 9_007_199_254_740_991;

// virErrorNumber (the subset used by the binding and the test driver)
pub const VIR_ERR_OK: c_int = 0;
pub const VIR_ERR_INTERNAL_ERROR: c_int = 1;
pub const VIR_ERR_NO_MEMORY: c_int = 2;
pub const VIR_ERR_NO_SUPPORT: c_int = 3;
pub const VIR_ERR_NO_CONNECT: c_int = 5;
pub const VIR_ERR_INVALID_CONN: c_int = 6;
pub const VIR_ERR_INVALID_DOMAIN: c_int = 7;
pub const VIR_ERR_INVALID_ARG: c_int = 8;
pub const VIR_ERR_OPERATION_FAILED: c_int = 9;
pub const VIR_ERR_XML_ERROR: c_int = 27;
pub const VIR_ERR_NO_DOMAIN: c_int = 42;
pub const VIR_ERR_OPERATION_INVALID: c_int = 55;

// virErrorLevel
pub const VIR_ERR_NONE: c_int = 0;
pub const VIR_ERR_WARNING: c_int = 1;
pub const VIR_ERR_ERROR: c_int = 2;

// virErrorDomain (subset)
pub const VIR_FROM_NONE: c_int = 0;
pub const VIR_FROM_DOM: c_int = 6;

/// Domain state, memory and scheduling summary.
#[repr(C)]
pub struct virDomainInfo {
    pub state: c_uchar,
    pub maxMem: c_ulong,
    pub memory: c_ulong,
    pub nrVirtCpu: c_ushort,
    pub cpuTime: c_ulonglong,
}

/// Disk usage information for one block device.
#[repr(C)]
pub struct virDomainBlockInfo {
    pub capacity: c_ulonglong,
    pub allocation: c_ulonglong,
    pub physical: c_ulonglong,
}

/// Progress of a background job (migration, save, dump).
#[repr(C)]
pub struct virDomainJobInfo {
    pub type_: c_int,
    pub timeElapsed: c_ulonglong,
    pub timeRemaining: c_ulonglong,
    pub dataTotal: c_ulonglong,
    pub dataProcessed: c_ulonglong,
    pub dataRemaining: c_ulonglong,
    pub memTotal: c_ulonglong,
    pub memProcessed: c_ulonglong,
    pub memRemaining: c_ulonglong,
    pub fileTotal: c_ulonglong,
    pub fileProcessed: c_ulonglong,
    pub fileRemaining: c_ulonglong,
}

/// Security label of a running domain.
#[repr(C)]
pub struct virSecurityLabel {
    pub label: [c_char; VIR_SECURITY_LABEL_BUFLEN],
    pub enforcing: c_int,
}

#[repr(C)]
pub union virTypedParameterValue {
    pub i: c_int,
    pub ui: c_uint,
    pub l: i64,
    pub ul: c_ulonglong,
    pub d: f64,
    pub b: c_char,
}

/// A name/type/value triple used by the scheduler and memory tunables.
#[repr(C)]
pub struct virTypedParameter {
    pub field: [c_char; VIR_TYPED_PARAM_FIELD_LENGTH],
    pub type_: c_int,
    pub value: virTypedParameterValue,
}

pub type virSchedParameter = virTypedParameter;
pub type virSchedParameterPtr = *mut virSchedParameter;
pub type virMemoryParameter = virTypedParameter;
pub type virMemoryParameterPtr = *mut virMemoryParameter;

/// Thread-local error record returned by `virGetLastError`.
#[repr(C)]
pub struct virError {
    pub code: c_int,
    pub domain: c_int,
    pub message: *mut c_char,
    pub level: c_int,
    pub conn: virConnectPtr,
    pub dom: virDomainPtr,
    pub str1: *mut c_char,
    pub str2: *mut c_char,
    pub str3: *mut c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub net: virNetworkPtr,
}

pub type virErrorPtr = *mut virError;

#[cfg(feature = "libvirt")]
extern "C" {
    // Library version and error state
    pub fn virGetVersion(
        libVer: *mut c_ulong,
        type_: *const c_char,
        typeVer: *mut c_ulong,
    ) -> c_int;
    pub fn virGetLastError() -> virErrorPtr;
    pub fn virResetLastError();

    // Connections
    pub fn virConnectOpen(name: *const c_char) -> virConnectPtr;
    pub fn virConnectClose(conn: virConnectPtr) -> c_int;

    // Streams
    pub fn virStreamNew(conn: virConnectPtr, flags: c_uint) -> virStreamPtr;
    pub fn virStreamFree(stream: virStreamPtr) -> c_int;

    // Domain lookup and definition
    pub fn virDomainLookupByID(conn: virConnectPtr, id: c_int) -> virDomainPtr;
    pub fn virDomainLookupByName(conn: virConnectPtr, name: *const c_char) -> virDomainPtr;
    pub fn virDomainLookupByUUID(conn: virConnectPtr, uuid: *const c_uchar) -> virDomainPtr;
    pub fn virDomainDefineXML(conn: virConnectPtr, xml: *const c_char) -> virDomainPtr;
    pub fn virDomainRestore(conn: virConnectPtr, from: *const c_char) -> c_int;
    pub fn virDomainFree(domain: virDomainPtr) -> c_int;

    // Domain lifecycle
    pub fn virDomainCreate(domain: virDomainPtr) -> c_int;
    pub fn virDomainCreateWithFlags(domain: virDomainPtr, flags: c_uint) -> c_int;
    pub fn virDomainShutdown(domain: virDomainPtr) -> c_int;
    pub fn virDomainSuspend(domain: virDomainPtr) -> c_int;
    pub fn virDomainResume(domain: virDomainPtr) -> c_int;
    pub fn virDomainUndefine(domain: virDomainPtr) -> c_int;
    pub fn virDomainDestroy(domain: virDomainPtr) -> c_int;
    pub fn virDomainSave(domain: virDomainPtr, to: *const c_char) -> c_int;

    // Domain queries
    pub fn virDomainGetMaxVcpus(domain: virDomainPtr) -> c_int;
    pub fn virDomainGetAutostart(domain: virDomainPtr, autostart: *mut c_int) -> c_int;
    pub fn virDomainSetAutostart(domain: virDomainPtr, autostart: c_int) -> c_int;
    pub fn virDomainGetID(domain: virDomainPtr) -> c_uint;
    pub fn virDomainGetInfo(domain: virDomainPtr, info: *mut virDomainInfo) -> c_int;
    pub fn virDomainGetBlockInfo(
        domain: virDomainPtr,
        disk: *const c_char,
        info: *mut virDomainBlockInfo,
        flags: c_uint,
    ) -> c_int;
    pub fn virDomainGetJobInfo(domain: virDomainPtr, info: *mut virDomainJobInfo) -> c_int;
    pub fn virDomainGetMaxMemory(domain: virDomainPtr) -> c_ulong;
    pub fn virDomainGetMemoryParameters(
        domain: virDomainPtr,
        params: virMemoryParameterPtr,
        nparams: *mut c_int,
        flags: c_uint,
    ) -> c_int;
    pub fn virDomainGetName(domain: virDomainPtr) -> *const c_char;
    pub fn virDomainGetOSType(domain: virDomainPtr) -> *mut c_char;
    pub fn virDomainGetSchedulerType(domain: virDomainPtr, nparams: *mut c_int) -> *mut c_char;
    pub fn virDomainGetSchedulerParameters(
        domain: virDomainPtr,
        params: virSchedParameterPtr,
        nparams: *mut c_int,
    ) -> c_int;
    pub fn virDomainGetSecurityLabel(domain: virDomainPtr, seclabel: *mut virSecurityLabel)
        -> c_int;
    pub fn virDomainGetUUID(domain: virDomainPtr, uuid: *mut c_uchar) -> c_int;
    pub fn virDomainGetUUIDString(domain: virDomainPtr, buf: *mut c_char) -> c_int;
    pub fn virDomainGetXMLDesc(domain: virDomainPtr, flags: c_uint) -> *mut c_char;
    pub fn virDomainOpenConsole(
        domain: virDomainPtr,
        dev_name: *const c_char,
        st: virStreamPtr,
        flags: c_uint,
    ) -> c_int;

    // Release functions for the remaining object kinds
    pub fn virNetworkFree(network: virNetworkPtr) -> c_int;
    pub fn virStoragePoolFree(pool: virStoragePoolPtr) -> c_int;
    pub fn virInterfaceFree(iface: virInterfacePtr) -> c_int;
    pub fn virNodeDeviceFree(dev: virNodeDevicePtr) -> c_int;
    pub fn virSecretFree(secret: virSecretPtr) -> c_int;
    pub fn virNWFilterFree(nwfilter: virNWFilterPtr) -> c_int;
}
