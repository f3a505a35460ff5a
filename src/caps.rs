//! Runtime capability detection.
//!
//! Availability of the optional entry points is decided once per
//! process by probing the linked library version, not by compile-time
//! conditionals. Entry points gated on an absent capability fail with
//! [`Error::Unsupported`](crate::Error::Unsupported) without touching
//! the native library, so every declared operation is always callable.

use std::sync::OnceLock;

use tracing::debug;

/// An optional libvirt operation gated on the library version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DomainCreateWithFlags,
    DomainGetBlockInfo,
    DomainGetJobInfo,
    DomainGetMemoryParameters,
    DomainOpenConsole,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 5] = [
        Capability::DomainCreateWithFlags,
        Capability::DomainGetBlockInfo,
        Capability::DomainGetJobInfo,
        Capability::DomainGetMemoryParameters,
        Capability::DomainOpenConsole,
    ];

    /// First libvirt release providing the call, encoded as
    /// `major * 1_000_000 + minor * 1_000 + micro`.
    pub fn min_version(&self) -> u64 {
        match self {
            Capability::DomainGetJobInfo => 7_007,           // 0.7.7
            Capability::DomainGetBlockInfo => 8_001,         // 0.8.1
            Capability::DomainCreateWithFlags => 8_002,      // 0.8.2
            Capability::DomainGetMemoryParameters => 8_005,  // 0.8.5
            Capability::DomainOpenConsole => 8_006,          // 0.8.6
        }
    }
}

/// The set of optional operations provided by the linked library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    version: u64,
}

impl CapabilitySet {
    /// Probe the linked library.
    ///
    /// When no version can be read, every optional operation is treated
    /// as absent.
    pub fn probe() -> CapabilitySet {
        match crate::lib_version() {
            Ok(version) => CapabilitySet::for_version(version),
            Err(_) => CapabilitySet::for_version(0),
        }
    }

    /// A capability set for a specific library version.
    pub fn for_version(version: u64) -> CapabilitySet {
        CapabilitySet { version }
    }

    /// Whether the library provides `capability`.
    pub fn has(&self, capability: Capability) -> bool {
        self.version >= capability.min_version()
    }

    /// The probed library version.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Capability set of the linked library, probed on first use.
pub fn active() -> &'static CapabilitySet {
    static ACTIVE: OnceLock<CapabilitySet> = OnceLock::new();
    ACTIVE.get_or_init(|| {
        let set = CapabilitySet::probe();
        debug!(version = set.version(), "probed libvirt library version");
        set
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_thresholds() {
        let old = CapabilitySet::for_version(7_000);
        assert!(Capability::ALL.iter().all(|c| !old.has(*c)));

        let mid = CapabilitySet::for_version(8_002);
        assert!(mid.has(Capability::DomainGetJobInfo));
        assert!(mid.has(Capability::DomainGetBlockInfo));
        assert!(mid.has(Capability::DomainCreateWithFlags));
        assert!(!mid.has(Capability::DomainGetMemoryParameters));
        assert!(!mid.has(Capability::DomainOpenConsole));

        let modern = CapabilitySet::for_version(1_000_000);
        assert!(Capability::ALL.iter().all(|c| modern.has(*c)));
    }

    #[test]
    fn test_probe_reads_linked_version() {
        let set = CapabilitySet::probe();
        assert!(set.version() > 0);
        assert!(Capability::ALL.iter().all(|c| set.has(*c)));
    }
}
