pub mod cooldown;
pub mod memory;

use serde::Serialize;
use std::time::Instant;

pub use cooldown::{BoostCooldownGuard, BoostPermit, BoostStatus, CooldownState, Rejected, COOLDOWN};
pub use memory::{trim, BoostMode, MemoryProbe, MemoryTrimmer, PowerShellTrimmer, SysinfoMemory, TrimReport};

/// Outcome of a boost request
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoostResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freed_memory: Option<u64>,
    /// Set when the cooldown refused the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<BoostMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_applied: Option<bool>,
}

/// Run a boost through the cooldown guard.
///
/// A cooldown refusal is a normal result with `cooldown_remaining` set. If
/// the working-set trim fails the reservation is handed back, so a failed
/// boost does not start the cooldown. A failed cache flush in hard mode is
/// still a successful boost and keeps the cooldown.
pub fn run_boost(
    guard: &BoostCooldownGuard,
    probe: &dyn MemoryProbe,
    trimmer: &dyn MemoryTrimmer,
    mode: BoostMode,
    now: Instant,
) -> BoostResult {
    let permit = match guard.try_boost(now) {
        Ok(permit) => permit,
        Err(rejected) => {
            tracing::info!(remaining = rejected.remaining_secs, "boost still cooling down");
            return BoostResult {
                success: false,
                cooldown_remaining: Some(rejected.remaining_secs),
                ..BoostResult::default()
            };
        }
    };

    let before = used(probe);
    match memory::trim(trimmer, mode) {
        Ok(report) => {
            let freed = before.zip(used(probe)).map(|(b, a)| b.saturating_sub(a));
            tracing::info!(%mode, freed = ?freed, hard_applied = report.hard_applied, "boost done");
            BoostResult {
                success: true,
                freed_memory: freed,
                mode: Some(mode),
                hard_applied: Some(report.hard_applied),
                ..BoostResult::default()
            }
        }
        Err(e) => {
            permit.rollback();
            tracing::warn!(%mode, error = %e, "boost failed");
            BoostResult {
                success: false,
                error: Some(e.to_string()),
                mode: Some(mode),
                ..BoostResult::default()
            }
        }
    }
}

fn used(probe: &dyn MemoryProbe) -> Option<u64> {
    match probe.used_bytes() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "memory probe failed");
            None
        }
    }
}
