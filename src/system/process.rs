use anyhow::Result;
use sysinfo::{ProcessesToUpdate, System};

/// Lists running processes and force-stops them by executable name
pub trait ProcessLister: Send + Sync {
    fn process_names(&self) -> Result<Vec<String>>;

    /// Kill every process whose name matches `name` (case-insensitive);
    /// returns how many were signalled
    fn kill_named(&self, name: &str) -> Result<usize>;
}

/// Process enumeration through `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProcesses;

impl ProcessLister for SysinfoProcesses {
    fn process_names(&self) -> Result<Vec<String>> {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        Ok(sys
            .processes()
            .values()
            .map(|p| p.name().to_string_lossy().to_string())
            .collect())
    }

    fn kill_named(&self, name: &str) -> Result<usize> {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let mut killed = 0;
        let mut refused = 0;
        for process in sys.processes().values() {
            if !process.name().to_string_lossy().eq_ignore_ascii_case(name) {
                continue;
            }
            if process.kill() {
                killed += 1;
            } else {
                tracing::debug!(pid = %process.pid(), name, "kill refused");
                refused += 1;
            }
        }
        if killed == 0 && refused > 0 {
            return Err(crate::common::errors::PadmaError::ExternalTool {
                tool: "kill".into(),
                message: format!("could not stop {} ({} process(es) refused)", name, refused),
            }
            .into());
        }
        Ok(killed)
    }
}

/// Running process names; empty when the list cannot be read, so a lister
/// failure counts as nothing running
pub fn running_names(lister: &dyn ProcessLister) -> Vec<String> {
    lister.process_names().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "process list unavailable");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl ProcessLister for Fixed {
        fn process_names(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }

        fn kill_named(&self, _name: &str) -> Result<usize> {
            Ok(0)
        }
    }

    struct Broken;

    impl ProcessLister for Broken {
        fn process_names(&self) -> Result<Vec<String>> {
            anyhow::bail!("no process table")
        }

        fn kill_named(&self, _name: &str) -> Result<usize> {
            anyhow::bail!("no process table")
        }
    }

    #[test]
    fn test_names_passed_through() {
        let lister = Fixed(vec!["explorer.exe", "Chrome.EXE"]);
        assert_eq!(running_names(&lister), vec!["explorer.exe", "Chrome.EXE"]);
    }

    #[test]
    fn test_failure_is_nothing_running() {
        assert!(running_names(&Broken).is_empty());
    }

    #[test]
    fn test_kill_unknown_name_signals_nothing() {
        let killed = SysinfoProcesses.kill_named("padma-no-such-process.exe").unwrap();
        assert_eq!(killed, 0);
    }
}
