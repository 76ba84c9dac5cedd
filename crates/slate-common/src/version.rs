//! Version tables and token resolution.
//!
//! The tables map each supported firmware version to the vendor build id
//! embedded in its payload filename. "latest" and "toltec" are the only
//! symbolic tokens; everything else must be a literal entry.

use crate::device::DeviceGeneration;
use crate::error::SlateError;
use std::collections::BTreeMap;

/// Pinned community-distribution version, device-independent. Toltec breaks
/// on anything newer.
pub const TOLTEC_VERSION: &str = "2.15.1.1189";

const LATEST_GEN1: &str = "3.2.3.1595";
const LATEST_GEN2: &str = "3.2.3.1595";

const GEN1_VERSIONS: &[(&str, &str)] = &[
    ("3.2.3.1595", "0usnvkQnzk"),
    ("3.0.4.1305", "T2W9LkJbGa"),
    ("2.15.1.1189", "hFuQXCbbjW"),
    ("2.15.0.1067", "SkmSPbrKkJ"),
    ("2.12.3.606", "tdwbuIzhYP"),
    ("2.10.3.379", "n24vdpHTBH"),
];

const GEN2_VERSIONS: &[(&str, &str)] = &[
    ("3.2.3.1595", "wVbHkgKisg"),
    ("3.2.2.1581", "XnE1EL7ojK"),
    ("3.0.4.1305", "b8ej5kPnqd"),
    ("2.15.1.1189", "wschF3QQEg"),
    ("2.15.0.1067", "BqEprAvCZl"),
    ("2.14.3.977", "joPqAABTBp"),
    ("2.13.0.758", "RGLmy8Jb39"),
];

/// Known-version tables for both device generations.
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    gen1: BTreeMap<&'static str, &'static str>,
    gen2: BTreeMap<&'static str, &'static str>,
}

impl Default for VersionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl VersionCatalog {
    pub fn builtin() -> Self {
        Self {
            gen1: GEN1_VERSIONS.iter().copied().collect(),
            gen2: GEN2_VERSIONS.iter().copied().collect(),
        }
    }

    fn table(&self, device: DeviceGeneration) -> &BTreeMap<&'static str, &'static str> {
        match device {
            DeviceGeneration::Gen1 => &self.gen1,
            DeviceGeneration::Gen2 => &self.gen2,
        }
    }

    /// Latest known-good version for the given generation.
    pub fn latest(&self, device: DeviceGeneration) -> &'static str {
        match device {
            DeviceGeneration::Gen1 => LATEST_GEN1,
            DeviceGeneration::Gen2 => LATEST_GEN2,
        }
    }

    pub fn contains(&self, device: DeviceGeneration, version: &str) -> bool {
        self.table(device).contains_key(version)
    }

    /// Vendor build id for a version, if known.
    pub fn build_id(&self, device: DeviceGeneration, version: &str) -> Option<&'static str> {
        self.table(device).get(version).copied()
    }

    /// All known versions for a generation, newest-style ordering not
    /// guaranteed (lexicographic).
    pub fn versions(&self, device: DeviceGeneration) -> impl Iterator<Item = &'static str> + '_ {
        self.table(device).keys().copied()
    }

    /// Map a version token to a concrete version identifier.
    ///
    /// "latest" resolves per device, "toltec" is device-independent, and any
    /// other token must be a literal entry in that generation's table.
    pub fn resolve(
        &self,
        token: &str,
        device: DeviceGeneration,
    ) -> Result<String, SlateError> {
        match token {
            "latest" => Ok(self.latest(device).to_string()),
            "toltec" => Ok(TOLTEC_VERSION.to_string()),
            literal if self.contains(device, literal) => Ok(literal.to_string()),
            _ => Err(SlateError::VersionNotFound {
                token: token.to_string(),
                device: device.to_string(),
            }),
        }
    }
}
