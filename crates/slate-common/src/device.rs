//! Device generations and on-device detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The SoC identity file present on the tablet itself.
const SOC_MACHINE_PATH: &str = "/sys/devices/soc0/machine";

/// The two supported hardware families. Selects which version table and
/// payload filename scheme applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceGeneration {
    Gen1,
    Gen2,
}

impl DeviceGeneration {
    pub const ALL: [DeviceGeneration; 2] = [DeviceGeneration::Gen1, DeviceGeneration::Gen2];

    /// Vendor codename used in payload filenames and download URLs.
    pub fn codename(&self) -> &'static str {
        match self {
            Self::Gen1 => "reMarkable",
            Self::Gen2 => "reMarkable2",
        }
    }
}

impl fmt::Display for DeviceGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gen1 => write!(f, "reMarkable 1"),
            Self::Gen2 => write!(f, "reMarkable 2"),
        }
    }
}

impl FromStr for DeviceGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "rm1" | "gen1" => Ok(Self::Gen1),
            "2" | "rm2" | "gen2" => Ok(Self::Gen2),
            other => Err(format!("unknown device generation '{}'", other)),
        }
    }
}

/// True when the current process runs on the tablet itself rather than on an
/// operator workstation.
pub fn running_on_device() -> bool {
    match std::fs::read_to_string(SOC_MACHINE_PATH) {
        Ok(machine) => machine.trim().starts_with("reMarkable"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generation_aliases() {
        assert_eq!("rm1".parse::<DeviceGeneration>(), Ok(DeviceGeneration::Gen1));
        assert_eq!("2".parse::<DeviceGeneration>(), Ok(DeviceGeneration::Gen2));
        assert!("4".parse::<DeviceGeneration>().is_err());
    }

    #[test]
    fn codenames_match_payload_scheme() {
        assert_eq!(DeviceGeneration::Gen1.codename(), "reMarkable");
        assert_eq!(DeviceGeneration::Gen2.codename(), "reMarkable2");
    }
}
