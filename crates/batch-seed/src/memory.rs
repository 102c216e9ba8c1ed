//! Process memory sampling for batch reports.

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::debug;

/// Memory usage observed at flush time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    /// Resident set size of the process, in bytes.
    pub current_bytes: u64,
    /// Highest `current_bytes` observed during the run.
    pub peak_bytes: u64,
}

/// Samples the resident memory of the current process.
pub struct MemoryProbe {
    system: Option<(System, Pid)>,
    peak_bytes: u64,
}

impl MemoryProbe {
    /// Creates a probe for the current process.
    ///
    /// Falls back to a disabled probe when the platform cannot report it.
    pub fn new() -> Self {
        let system = match sysinfo::get_current_pid() {
            Ok(pid) => Some((System::new(), pid)),
            Err(e) => {
                debug!("Process memory unavailable: {e}");
                None
            }
        };

        Self {
            system,
            peak_bytes: 0,
        }
    }

    /// A probe that always reports zero.
    pub fn disabled() -> Self {
        Self {
            system: None,
            peak_bytes: 0,
        }
    }

    /// Takes a sample and folds it into the running peak.
    pub fn sample(&mut self) -> MemorySample {
        let current_bytes = match self.system.as_mut() {
            Some((system, pid)) => {
                system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);
                system.process(*pid).map(|p| p.memory()).unwrap_or(0)
            }
            None => 0,
        };

        self.peak_bytes = self.peak_bytes.max(current_bytes);

        MemorySample {
            current_bytes,
            peak_bytes: self.peak_bytes,
        }
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_probe_reports_zero() {
        let mut probe = MemoryProbe::disabled();
        assert_eq!(probe.sample(), MemorySample::default());
    }

    #[test]
    fn test_peak_never_decreases() {
        let mut probe = MemoryProbe::new();
        let first = probe.sample();
        let second = probe.sample();

        assert!(first.peak_bytes >= first.current_bytes);
        assert!(second.peak_bytes >= first.peak_bytes);
        assert!(second.peak_bytes >= second.current_bytes);
    }
}
