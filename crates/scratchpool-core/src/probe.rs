//! Named memory-usage probes for profilers.
//!
//! A profiler owns a [`ProbeRegistry`] and asks every registered
//! [`MemoryProbe`] for a [`ProbeReading`] when it builds a report. Probes
//! are kept in registration order so reports are stable.

use std::fmt;

use indexmap::IndexMap;

/// One probe's answer: bytes in use now and the high-water mark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeReading {
    /// Bytes currently held.
    pub current_bytes: u64,
    /// Largest value `current_bytes` has reached, as far as the probe knows.
    pub peak_bytes: u64,
}

impl ProbeReading {
    /// A reading whose current and peak values are both `bytes`.
    pub fn flat(bytes: u64) -> Self {
        Self {
            current_bytes: bytes,
            peak_bytes: bytes,
        }
    }
}

/// Something that can report its memory usage on demand.
pub trait MemoryProbe: Send + Sync {
    /// Take a reading. May be called from any thread.
    fn read(&self) -> ProbeReading;
}

impl<F> MemoryProbe for F
where
    F: Fn() -> ProbeReading + Send + Sync,
{
    fn read(&self) -> ProbeReading {
        self()
    }
}

/// Insertion-ordered collection of named probes.
#[derive(Default)]
pub struct ProbeRegistry {
    probes: IndexMap<String, Box<dyn MemoryProbe>>,
}

impl ProbeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `probe` under `name`, returning the probe it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        probe: impl MemoryProbe + 'static,
    ) -> Option<Box<dyn MemoryProbe>> {
        self.probes.insert(name.into(), Box::new(probe))
    }

    /// Remove the probe registered under `name`. Returns whether one existed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.probes.shift_remove(name).is_some()
    }

    /// Whether a probe is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.probes.contains_key(name)
    }

    /// Number of registered probes.
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether no probes are registered.
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Read a single probe by name.
    pub fn read(&self, name: &str) -> Option<ProbeReading> {
        self.probes.get(name).map(|p| p.read())
    }

    /// Read every probe, in registration order.
    pub fn report(&self) -> Vec<(String, ProbeReading)> {
        self.probes
            .iter()
            .map(|(name, probe)| (name.clone(), probe.read()))
            .collect()
    }
}

impl fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("probes", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}
