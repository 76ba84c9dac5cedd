//! Device version readout.
//!
//! Pulls the three config files the tablet keeps its version identity in and
//! extracts the interesting fields, through whichever transport is active.

use crate::config::UPDATE_CONF_PATH;
use crate::error::SlateError;
use crate::transport::Transport;
use regex::Regex;

const REMARKABLE_CONF_PATH: &str = "/etc/remarkable.conf";
const VERSION_ID_PATH: &str = "/etc/version";

/// What `slatectl status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Release version from update.conf.
    pub current: String,
    /// Build timestamp from /etc/version.
    pub version_id: String,
    /// Previous release, "unknown" when the device never upgraded.
    pub previous: String,
    /// Enrolled in the vendor beta program.
    pub beta: bool,
}

/// Extract a status from the three raw documents. Pure so it can be tested
/// without a device.
pub fn parse_status(remarkable_conf: &str, version_id: &str, update_conf: &str) -> DeviceStatus {
    let capture = |pattern: &str, haystack: &str| -> Option<String> {
        Regex::new(pattern)
            .ok()?
            .captures(haystack)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    let current = capture(r"(?m)^REMARKABLE_RELEASE_VERSION=(.*)$", update_conf)
        .unwrap_or_else(|| "unknown".to_string());
    let previous = capture(r"(?m)^[Pp]reviousVersion=(.*)$", remarkable_conf)
        .unwrap_or_else(|| "unknown".to_string());
    let beta = capture(r"(?m)^BetaProgram=(.*)$", remarkable_conf)
        .map(|v| !v.is_empty() && v != "false")
        .unwrap_or(false);

    DeviceStatus {
        current,
        version_id: version_id.trim().to_string(),
        previous,
        beta,
    }
}

/// Read the status through a transport. `remarkable.conf` may be missing on a
/// freshly flashed device; the other two files are mandatory.
pub fn read_status(transport: &dyn Transport) -> Result<DeviceStatus, SlateError> {
    let remarkable_conf = transport
        .read_file(REMARKABLE_CONF_PATH)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default();
    let version_id = transport.read_file(VERSION_ID_PATH)?;
    let update_conf = transport.read_file(UPDATE_CONF_PATH)?;

    Ok(parse_status(
        &remarkable_conf,
        &String::from_utf8_lossy(&version_id),
        &String::from_utf8_lossy(&update_conf),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_all_fields() {
        let status = parse_status(
            "PreviousVersion=2.15.0.1067\nBetaProgram=true\n",
            "20230608125139\n",
            "[General]\nREMARKABLE_RELEASE_VERSION=3.2.3.1595\nSERVER=http://x\n",
        );
        assert_eq!(
            status,
            DeviceStatus {
                current: "3.2.3.1595".to_string(),
                version_id: "20230608125139".to_string(),
                previous: "2.15.0.1067".to_string(),
                beta: true,
            }
        );
    }

    #[test]
    fn missing_fields_degrade_to_unknown() {
        let status = parse_status("", "", "");
        assert_eq!(status.current, "unknown");
        assert_eq!(status.previous, "unknown");
        assert!(!status.beta);
    }

    #[test]
    fn lowercase_previous_version_is_accepted() {
        let status = parse_status("previousVersion=2.14.3.977\n", "x", "");
        assert_eq!(status.previous, "2.14.3.977");
    }
}
