// CLASSIFICATION: COMMUNITY
// Filename: kernel.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Seams to the host kernel.
//!
//! The scaling tables and `cpufreq_cpu_get` are not exported with a stable
//! ABI across the kernels this driver targets, so they are reached through a
//! name→address lookup ([`SymbolResolver`]) instead of being linked. The
//! cpufreq table registration calls are ordinary exports and sit behind
//! [`CpufreqHost`].

use core::ffi::c_int;
use core::num::NonZeroUsize;
use core::ptr::NonNull;

use crate::ladder::{FrequencyLadder, OperatingPoint};

/// Non-null address of a kernel symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddr(NonZeroUsize);

impl SymbolAddr {
    /// `None` for a zero address, which is how lookups report a miss.
    #[must_use]
    pub fn new(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

/// Kallsyms-style lookup of kernel objects by name.
///
/// # Safety
///
/// An address returned for a name must point at the live object that name
/// denotes in the running kernel, with the layout this crate expects for it
/// (a `[AcpuLevel]` array for scaling tables, a [`PolicyGetFn`] for the
/// policy-fetch function), valid for as long as the resolver exists.
pub unsafe trait SymbolResolver {
    fn lookup_name(&self, name: &str) -> Option<SymbolAddr>;
}

/// `cpuinfo` block of a cpufreq policy.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub max_freq: u32,
    pub min_freq: u32,
    pub transition_latency: u32,
}

/// Leading fields of the host's `struct cpufreq_policy`.
///
/// Only `cpuinfo.max_freq` is written.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpufreqPolicy {
    pub cpu: u32,
    pub min: u32,
    pub max: u32,
    pub cur: u32,
    pub cpuinfo: CpuInfo,
}

/// Signature of `cpufreq_cpu_get`.
pub type PolicyGetFn = unsafe extern "C" fn(cpu: c_int) -> *mut CpufreqPolicy;

/// Indirect-call handle for the resolved `cpufreq_cpu_get`.
#[derive(Clone, Copy)]
pub struct PolicyGetter(PolicyGetFn);

impl PolicyGetter {
    /// Resolve `symbol` into a callable policy getter.
    pub fn resolve<R: SymbolResolver + ?Sized>(resolver: &R, symbol: &str) -> Option<Self> {
        let addr = resolver.lookup_name(symbol)?;
        // SAFETY: the resolver contract guarantees `addr` is a function with
        // the `cpufreq_cpu_get` signature.
        Some(Self(unsafe {
            core::mem::transmute::<usize, PolicyGetFn>(addr.get())
        }))
    }

    /// Run `f` on the policy object of `cpu`, or return `None` if the host
    /// has no policy for it.
    pub fn with_policy<T>(&self, cpu: u32, f: impl FnOnce(&mut CpufreqPolicy) -> T) -> Option<T> {
        let cpu = c_int::try_from(cpu).ok()?;
        // SAFETY: the getter comes from a resolver honouring its contract;
        // a non-null result is a live policy object owned by the host.
        let policy = unsafe { (self.0)(cpu).as_mut() }?;
        Some(f(policy))
    }
}

/// Address of a cpufreq table registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreqTableRef(NonNull<OperatingPoint>);

// SAFETY: the reference is only an address handed back to the host; this
// crate never reads through it.
unsafe impl Send for FreqTableRef {}

impl FreqTableRef {
    #[must_use]
    pub fn from_ladder(ladder: &'static FrequencyLadder) -> Self {
        Self(NonNull::from(&ladder.points()[0]))
    }

    /// Wrap a table owned by the host.
    #[must_use]
    pub fn from_raw(ptr: NonNull<OperatingPoint>) -> Self {
        Self(ptr)
    }

    #[must_use]
    pub fn as_ptr(self) -> *const OperatingPoint {
        self.0.as_ptr()
    }
}

/// cpufreq frequency-table registration.
pub trait CpufreqHost {
    /// CPUs currently present.
    fn present_cpus(&self) -> Vec<u32>;
    /// `cpufreq_frequency_get_table`.
    fn frequency_get_table(&self, cpu: u32) -> Option<FreqTableRef>;
    /// `cpufreq_frequency_table_put_attr`.
    fn table_put_attr(&mut self, cpu: u32);
    /// `cpufreq_frequency_table_get_attr`.
    fn table_get_attr(&mut self, table: FreqTableRef, cpu: u32);
}
