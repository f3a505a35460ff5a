//! Domain objects and operations.

use std::mem;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

use crate::args::CBytes;
use crate::caps::{self, Capability};
use crate::error::{Error, Result};
use crate::ffi;
use crate::handle::{Handle, Kind};
use crate::marshal::{self, DomainInfoRecord, StructBuffer};
use crate::stream::Stream;

/// A domain (guest) on a hypervisor connection.
///
/// Obtained from the lookup and define operations on
/// [`Connect`](crate::Connect). Each lookup hands out an independent
/// object; dropping it releases the native reference without affecting
/// other objects for the same domain.
///
/// # Example
///
/// ```
/// use virt::Connect;
///
/// let conn = Connect::open(Some("test:///default"))?;
/// let dom = conn.domain_lookup_by_name("test")?;
///
/// let info = dom.info()?;
/// assert_eq!(info.len(), virt::DOMAIN_INFO_RECORD_SIZE);
/// println!("{} is in state {}", dom.name()?, info.as_bytes()[0]);
/// # Ok::<(), virt::Error>(())
/// ```
#[derive(Debug)]
pub struct Domain {
    handle: Handle,
}

impl Domain {
    pub(crate) fn wrap(handle: Handle) -> Domain {
        Domain { handle }
    }

    /// Wrap an existing domain handle, checking its kind.
    pub fn from_handle(handle: Handle) -> Result<Domain> {
        if handle.kind() != Kind::Domain {
            return Err(Error::bad_arg(format!(
                "expected a domain handle, got a {} handle",
                handle.kind()
            )));
        }
        Ok(Domain { handle })
    }

    /// The underlying resource handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Consume the wrapper, returning the resource handle.
    pub fn into_handle(self) -> Handle {
        self.handle
    }

    fn as_ptr(&self) -> Result<ffi::virDomainPtr> {
        Ok(self.handle.as_ptr()?.cast())
    }

    // Shared shape for the plain `fn(domain) -> int` operations.
    fn simple(&self, f: unsafe extern "C" fn(ffi::virDomainPtr) -> c_int) -> Result<()> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        ffi::cvt(unsafe { f(dom) })?;
        Ok(())
    }

    // ========== Lifecycle ==========

    /// Start a defined domain.
    ///
    /// Uses the flags variant where the library provides it; older
    /// libraries start with default behavior and ignore `flags`.
    pub fn create(&self, flags: u32) -> Result<()> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let rc = if caps::active().has(Capability::DomainCreateWithFlags) {
            unsafe { ffi::virDomainCreateWithFlags(dom, flags) }
        } else {
            unsafe { ffi::virDomainCreate(dom) }
        };
        ffi::cvt(rc)?;
        Ok(())
    }

    /// Ask the domain to shut down cleanly.
    pub fn shutdown(&self) -> Result<()> {
        self.simple(ffi::virDomainShutdown)
    }

    /// Suspend a running domain.
    pub fn suspend(&self) -> Result<()> {
        self.simple(ffi::virDomainSuspend)
    }

    /// Resume a suspended domain.
    pub fn resume(&self) -> Result<()> {
        self.simple(ffi::virDomainResume)
    }

    /// Remove the persistent definition of an inactive domain.
    pub fn undefine(&self) -> Result<()> {
        self.simple(ffi::virDomainUndefine)
    }

    /// Forcefully terminate the domain.
    pub fn destroy(&self) -> Result<()> {
        self.simple(ffi::virDomainDestroy)
    }

    /// Save the domain state to `path` and stop it.
    pub fn save(&self, path: &str) -> Result<()> {
        self.save_bytes(&CBytes::from_slice(path.as_bytes())?)
    }

    pub(crate) fn save_bytes(&self, path: &CBytes) -> Result<()> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is live and path is NUL-terminated.
        ffi::cvt(unsafe { ffi::virDomainSave(dom, path.as_ptr()) })?;
        Ok(())
    }

    // ========== Scalar queries ==========

    /// Maximum number of virtual CPUs supported for this domain.
    pub fn max_vcpus(&self) -> Result<i32> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        ffi::cvt(unsafe { ffi::virDomainGetMaxVcpus(dom) })
    }

    /// Whether the domain starts when the host boots.
    pub fn autostart(&self) -> Result<bool> {
        let dom = self.as_ptr()?;
        let mut autostart: c_int = 0;
        // SAFETY: dom is live and the out-parameter is valid.
        ffi::cvt(unsafe { ffi::virDomainGetAutostart(dom, &mut autostart) })?;
        Ok(autostart != 0)
    }

    /// Configure whether the domain starts when the host boots.
    pub fn set_autostart(&self, autostart: bool) -> Result<()> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        ffi::cvt(unsafe { ffi::virDomainSetAutostart(dom, autostart as c_int) })?;
        Ok(())
    }

    /// Numeric id of a running domain.
    pub fn id(&self) -> Result<u32> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let id = unsafe { ffi::virDomainGetID(dom) };
        // The id call signals failure with the all-ones sentinel.
        if id == c_uint::MAX {
            return Err(ffi::last_error());
        }
        Ok(id)
    }

    /// Maximum memory of the domain in KiB.
    pub fn max_memory(&self) -> Result<u64> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let memory = unsafe { ffi::virDomainGetMaxMemory(dom) };
        // Zero is this call's failure sentinel.
        if memory == 0 {
            return Err(ffi::last_error());
        }
        Ok(memory as u64)
    }

    /// Name of the domain.
    pub fn name(&self) -> Result<String> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let name = unsafe { ffi::virDomainGetName(dom) };
        let name = ffi::cvt_ptr(name as *mut c_char)?;
        // SAFETY: the string is owned by the domain object; copy only.
        Ok(unsafe { ffi::borrow_string(name) })
    }

    /// Operating system type the domain runs, e.g. `linux`.
    pub fn os_type(&self) -> Result<String> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let name = ffi::cvt_ptr(unsafe { ffi::virDomainGetOSType(dom) })?;
        // SAFETY: the caller owns this string; take_string frees it.
        Ok(unsafe { ffi::take_string(name) })
    }

    /// Scheduler type name and the number of scheduler parameters.
    pub fn scheduler_type(&self) -> Result<(String, i32)> {
        let dom = self.as_ptr()?;
        let mut nparams: c_int = 0;
        // SAFETY: dom is live and the out-parameter is valid.
        let name = ffi::cvt_ptr(unsafe { ffi::virDomainGetSchedulerType(dom, &mut nparams) })?;
        // SAFETY: the caller owns this string; take_string frees it.
        Ok((unsafe { ffi::take_string(name) }, nparams))
    }

    /// XML description of the domain.
    pub fn xml_desc(&self, flags: u32) -> Result<String> {
        let dom = self.as_ptr()?;
        // SAFETY: dom is a live domain pointer.
        let xml = ffi::cvt_ptr(unsafe { ffi::virDomainGetXMLDesc(dom, flags) })?;
        // SAFETY: the caller owns this string; take_string frees it.
        Ok(unsafe { ffi::take_string(xml) })
    }

    /// UUID string in the canonical 36-character form.
    pub fn uuid_string(&self) -> Result<String> {
        let dom = self.as_ptr()?;
        let mut buf = [0 as c_char; ffi::VIR_UUID_STRING_BUFLEN];
        // SAFETY: dom is live and buf holds VIR_UUID_STRING_BUFLEN bytes.
        ffi::cvt(unsafe { ffi::virDomainGetUUIDString(dom, buf.as_mut_ptr()) })?;
        // SAFETY: the native call wrote a NUL-terminated string.
        Ok(unsafe { ffi::borrow_string(buf.as_ptr()) })
    }

    /// Raw UUID, always exactly [`VIR_UUID_BUFLEN`](crate::VIR_UUID_BUFLEN)
    /// bytes.
    pub fn uuid(&self) -> Result<[u8; ffi::VIR_UUID_BUFLEN]> {
        let dom = self.as_ptr()?;
        let mut uuid = [0u8; ffi::VIR_UUID_BUFLEN];
        // SAFETY: dom is live and uuid holds VIR_UUID_BUFLEN bytes.
        ffi::cvt(unsafe { ffi::virDomainGetUUID(dom, uuid.as_mut_ptr()) })?;
        Ok(uuid)
    }

    // ========== Struct queries ==========

    /// State, memory and vcpu summary as a packed record; see
    /// [`DomainInfoRecord`] for the layout.
    pub fn info(&self) -> Result<StructBuffer> {
        let dom = self.as_ptr()?;
        // SAFETY: zero-initialized out-struct filled by the native call.
        let mut info: ffi::virDomainInfo = unsafe { mem::zeroed() };
        ffi::cvt(unsafe { ffi::virDomainGetInfo(dom, &mut info) })?;
        let record = DomainInfoRecord {
            state: info.state as u8,
            max_mem: info.maxMem,
            memory: info.memory,
            nr_virt_cpu: info.nrVirtCpu as u16,
            cpu_time: info.cpuTime as u64,
        };
        marshal::copy_out(&record)
    }

    /// Block device usage for `disk`, as a verbatim copy of the native
    /// record.
    pub fn block_info(&self, disk: &str) -> Result<StructBuffer> {
        self.block_info_bytes(&CBytes::from_slice(disk.as_bytes())?)
    }

    pub(crate) fn block_info_bytes(&self, disk: &CBytes) -> Result<StructBuffer> {
        require(Capability::DomainGetBlockInfo)?;
        let dom = self.as_ptr()?;
        // SAFETY: zero-initialized out-struct filled by the native call;
        // disk is NUL-terminated.
        let mut info: ffi::virDomainBlockInfo = unsafe { mem::zeroed() };
        ffi::cvt(unsafe { ffi::virDomainGetBlockInfo(dom, disk.as_ptr(), &mut info, 0) })?;
        marshal::copy_out(&info)
    }

    /// Progress of the active background job, as a verbatim copy of the
    /// native record.
    pub fn job_info(&self) -> Result<StructBuffer> {
        require(Capability::DomainGetJobInfo)?;
        let dom = self.as_ptr()?;
        // SAFETY: zero-initialized out-struct filled by the native call.
        let mut info: ffi::virDomainJobInfo = unsafe { mem::zeroed() };
        ffi::cvt(unsafe { ffi::virDomainGetJobInfo(dom, &mut info) })?;
        marshal::copy_out(&info)
    }

    /// Memory tunables as a buffer of native parameter records plus the
    /// record count.
    ///
    /// Follows the query-then-allocate-then-fetch convention; a first
    /// query reporting zero records is a failure, since several drivers
    /// do not distinguish "no data" from "not supported" at zero.
    pub fn memory_parameters(&self) -> Result<(StructBuffer, i32)> {
        require(Capability::DomainGetMemoryParameters)?;
        let dom = self.as_ptr()?;
        let mut nparams: c_int = 0;
        // SAFETY: a null params pointer asks only for the record count.
        ffi::cvt(unsafe {
            ffi::virDomainGetMemoryParameters(dom, ptr::null_mut(), &mut nparams, 0)
        })?;
        if nparams <= 0 {
            return Err(ffi::last_error());
        }

        let record_size = mem::size_of::<ffi::virMemoryParameter>();
        let mut buf = marshal::alloc_records(nparams as usize, record_size)?;
        // SAFETY: buf holds nparams records; the fetch fills them.
        ffi::cvt(unsafe {
            ffi::virDomainGetMemoryParameters(dom, buf.as_mut_ptr().cast(), &mut nparams, 0)
        })?;
        // The fetch may legitimately report fewer records than the query.
        buf.truncate(nparams as usize * record_size);
        Ok((StructBuffer::from_vec(buf), nparams))
    }

    /// Scheduler tunables as a buffer of native parameter records.
    pub fn scheduler_parameters(&self) -> Result<StructBuffer> {
        let (_, mut nparams) = self.scheduler_type()?;
        if nparams <= 0 {
            return Err(ffi::last_error());
        }
        let dom = self.as_ptr()?;
        let record_size = mem::size_of::<ffi::virSchedParameter>();
        let mut buf = marshal::alloc_records(nparams as usize, record_size)?;
        // SAFETY: buf holds nparams records; the fetch fills them.
        ffi::cvt(unsafe {
            ffi::virDomainGetSchedulerParameters(dom, buf.as_mut_ptr().cast(), &mut nparams)
        })?;
        buf.truncate(nparams as usize * record_size);
        Ok(StructBuffer::from_vec(buf))
    }

    /// Security label of the domain, as a verbatim copy of the native
    /// record.
    pub fn security_label(&self) -> Result<StructBuffer> {
        let dom = self.as_ptr()?;
        // SAFETY: zero-initialized out-struct filled by the native call.
        let mut label: ffi::virSecurityLabel = unsafe { mem::zeroed() };
        ffi::cvt(unsafe { ffi::virDomainGetSecurityLabel(dom, &mut label) })?;
        marshal::copy_out(&label)
    }

    // ========== Console ==========

    /// Attach `stream` to the domain console. `dev_name` selects a
    /// specific console device; `None` picks the first one.
    pub fn open_console(&self, dev_name: Option<&str>, stream: &Stream) -> Result<()> {
        let dev_name = match dev_name {
            Some(d) => Some(CBytes::from_slice(d.as_bytes())?),
            None => None,
        };
        self.open_console_bytes(dev_name.as_ref(), stream)
    }

    pub(crate) fn open_console_bytes(
        &self,
        dev_name: Option<&CBytes>,
        stream: &Stream,
    ) -> Result<()> {
        require(Capability::DomainOpenConsole)?;
        let dom = self.as_ptr()?;
        let st: ffi::virStreamPtr = stream.handle().as_ptr()?.cast();
        // SAFETY: dom and st are live pointers; dev_name is
        // NUL-terminated or null for the default device.
        ffi::cvt(unsafe {
            ffi::virDomainOpenConsole(dom, dev_name.map_or(ptr::null(), |d| d.as_ptr()), st, 0)
        })?;
        Ok(())
    }
}

fn require(capability: Capability) -> Result<()> {
    if caps::active().has(capability) {
        Ok(())
    } else {
        Err(Error::Unsupported)
    }
}
