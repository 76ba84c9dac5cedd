//! The restore workflow: swap the active boot partition back to the
//! previously installed firmware.
//!
//! The swap writes the fallback pointer before the active pointer, so a
//! crash mid-swap leaves the old active partition still bootable. Only 2 and
//! 3 are valid root partitions; anything else aborts before any write.

use super::{run_blocking, Orchestrator};
use crate::error::SlateError;
use tracing::info;

/// Partition-swap script executed on the device. The shell-side guard
/// mirrors [`swap_target`]; the script refuses to write anything when the
/// current active partition is not 2 or 3.
pub(crate) const PARTITION_SWAP_SCRIPT: &str = r#"
# switches the active root partition

OLDPART=$(/sbin/fw_printenv -n active_partition)
case "$OLDPART" in
    2) NEWPART="3" ;;
    3) NEWPART="2" ;;
    *) echo "unexpected active_partition: ${OLDPART}" >&2; exit 1 ;;
esac

/sbin/fw_setenv "upgrade_available" "1"
/sbin/fw_setenv "bootcount" "0"

echo "new: ${NEWPART}"
echo "fallback: ${OLDPART}"

/sbin/fw_setenv "fallback_partition" "${OLDPART}"
/sbin/fw_setenv "active_partition" "${NEWPART}"
"#;

/// The toggle: 2 -> 3, 3 -> 2, anything else rejected.
pub fn swap_target(active: &str) -> Option<u8> {
    match active.trim() {
        "2" => Some(3),
        "3" => Some(2),
        _ => None,
    }
}

impl Orchestrator {
    /// Drive a partition swap. Returns Ok(false) when the operator declined
    /// the confirmation; the device is untouched in that case.
    pub async fn restore(&self) -> Result<bool, SlateError> {
        // Confirm
        if !self
            .interaction
            .confirm("Are you sure you want to swap back to the previous firmware?", false)?
        {
            return Ok(false);
        }

        let transport = self.device_transport()?;

        // Pre-validate on our side before touching the boot environment.
        let out =
            run_blocking(&transport, "/sbin/fw_printenv -n active_partition".to_string()).await?;
        if !out.success() {
            return Err(SlateError::PartitionSwap(format!(
                "could not read active_partition: {}",
                out.stderr.trim()
            )));
        }
        let active = out.stdout.trim().to_string();
        let target = swap_target(&active).ok_or_else(|| {
            SlateError::PartitionSwap(format!(
                "active partition is '{}', expected 2 or 3; refusing to toggle",
                active
            ))
        })?;
        info!(%active, %target, "swapping root partition");

        // ExecuteSwap + VerifyExit
        let out = run_blocking(&transport, PARTITION_SWAP_SCRIPT.to_string()).await?;
        if !out.success() {
            return Err(SlateError::PartitionSwap(format!(
                "swap script exited with {}: {}",
                out.exit_code,
                out.stderr.trim()
            )));
        }
        info!("partition swap complete, reboot the device to take effect");

        // OptionalShutdown
        self.optional_shutdown(&transport).await;

        Ok(true)
    }
}
