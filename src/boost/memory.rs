use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Boost intensity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoostMode {
    /// Trim process working sets
    #[default]
    Soft,
    /// Soft trim plus a system file cache flush; needs administrator rights
    Hard,
}

impl std::fmt::Display for BoostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoostMode::Soft => write!(f, "soft"),
            BoostMode::Hard => write!(f, "hard"),
        }
    }
}

/// Reports how much physical memory is in use
pub trait MemoryProbe: Send + Sync {
    fn used_bytes(&self) -> Result<u64>;
}

/// What a trim actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimReport {
    /// The file cache flush ran (false in soft mode or when the flush failed)
    pub hard_applied: bool,
}

/// Asks the OS to release memory
pub trait MemoryTrimmer: Send + Sync {
    /// Empty the working set of every process we can open
    fn trim_working_sets(&self) -> Result<()>;

    /// Flush the system file cache; needs administrator rights
    fn flush_file_cache(&self) -> Result<()>;
}

/// Run the steps `mode` asks for.
///
/// Only the working-set trim is fatal. Once it has run, a failed cache
/// flush leaves the boost applied in soft form with `hard_applied` unset.
pub fn trim(trimmer: &dyn MemoryTrimmer, mode: BoostMode) -> Result<TrimReport> {
    trimmer.trim_working_sets()?;

    let hard_applied = match mode {
        BoostMode::Soft => false,
        BoostMode::Hard => match trimmer.flush_file_cache() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "file cache flush failed (administrator rights needed); soft trim only");
                false
            }
        },
    };
    Ok(TrimReport { hard_applied })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoMemory;

impl MemoryProbe for SysinfoMemory {
    fn used_bytes(&self) -> Result<u64> {
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        Ok(sys.used_memory())
    }
}

/// Trims memory through PowerShell P/Invoke on Windows
#[derive(Debug, Default, Clone, Copy)]
pub struct PowerShellTrimmer;

#[cfg(windows)]
const SOFT_SCRIPT: &str = r#"
$sig = '[DllImport("psapi.dll")] public static extern bool EmptyWorkingSet(IntPtr hProcess);'
Add-Type -MemberDefinition $sig -Name Psapi -Namespace Padma
Get-Process | ForEach-Object { try { [Padma.Psapi]::EmptyWorkingSet($_.Handle) | Out-Null } catch {} }
"#;

#[cfg(windows)]
const HARD_SCRIPT: &str = r#"
$src = @'
using System;
using System.Runtime.InteropServices;
public static class Cache {
    [StructLayout(LayoutKind.Sequential, Pack = 1)]
    struct TokenPrivilege { public int Count; public long Luid; public int Attr; }
    [DllImport("advapi32.dll", SetLastError = true)]
    static extern bool OpenProcessToken(IntPtr process, int access, out IntPtr token);
    [DllImport("advapi32.dll", SetLastError = true)]
    static extern bool LookupPrivilegeValue(string host, string name, out long luid);
    [DllImport("advapi32.dll", SetLastError = true)]
    static extern bool AdjustTokenPrivileges(IntPtr token, bool disableAll, ref TokenPrivilege state, int len, IntPtr prev, IntPtr ret);
    [DllImport("kernel32.dll")]
    static extern IntPtr GetCurrentProcess();
    [DllImport("kernel32.dll", SetLastError = true)]
    static extern bool SetSystemFileCacheSize(IntPtr min, IntPtr max, int flags);
    public static bool Flush() {
        IntPtr token;
        if (!OpenProcessToken(GetCurrentProcess(), 0x28, out token)) return false;
        TokenPrivilege tp = new TokenPrivilege { Count = 1, Attr = 2 };
        if (!LookupPrivilegeValue(null, "SeIncreaseQuotaPrivilege", out tp.Luid)) return false;
        if (!AdjustTokenPrivileges(token, false, ref tp, 0, IntPtr.Zero, IntPtr.Zero)) return false;
        if (Marshal.GetLastWin32Error() != 0) return false;
        return SetSystemFileCacheSize(new IntPtr(-1), new IntPtr(-1), 0);
    }
}
'@
Add-Type -TypeDefinition $src
if (-not [Cache]::Flush()) { exit 1 }
"#;

#[cfg(windows)]
fn run_powershell(script: &str) -> Result<()> {
    use crate::common::errors::PadmaError;

    let output = std::process::Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-Command", script])
        .output()
        .map_err(|e| PadmaError::ExternalTool {
            tool: "powershell".into(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PadmaError::ExternalTool {
            tool: "powershell".into(),
            message: format!("exited with {}: {}", output.status, stderr.trim()),
        }
        .into());
    }
    Ok(())
}

#[cfg(windows)]
impl MemoryTrimmer for PowerShellTrimmer {
    fn trim_working_sets(&self) -> Result<()> {
        run_powershell(SOFT_SCRIPT)
    }

    fn flush_file_cache(&self) -> Result<()> {
        run_powershell(HARD_SCRIPT)
    }
}

#[cfg(not(windows))]
fn unsupported() -> Result<()> {
    Err(crate::common::errors::PadmaError::Unsupported {
        feature: "Memory boost".into(),
    }
    .into())
}

#[cfg(not(windows))]
impl MemoryTrimmer for PowerShellTrimmer {
    fn trim_working_sets(&self) -> Result<()> {
        unsupported()
    }

    fn flush_file_cache(&self) -> Result<()> {
        unsupported()
    }
}
