//! Network topology between the operator's machine and the device.
//!
//! A tablet connected over USB shows up as a host interface inside the fixed
//! tether subnet, with the device itself always at `10.11.99.1`. Over WiFi
//! the operator has to tell us which of the host's addresses faces the
//! device's network.

use crate::error::SlateError;
use std::net::IpAddr;
use sysinfo::Networks;
use tracing::debug;

/// USB-tether subnet prefix on the host side.
pub const USB_SUBNET_PREFIX: &str = "10.11.99.";

/// Fixed device address on the USB-tether subnet.
pub const DEVICE_USB_ADDR: &str = "10.11.99.1";

/// Where this invocation runs relative to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// Running on the tablet itself; no discovery needed.
    OnDevice,
    /// USB tether detected; `host_addr` is our side of the tether.
    UsbTether { host_addr: String },
    /// No unambiguous tether; operator must pick from `candidates`.
    Lan { candidates: Vec<String> },
}

/// Enumerate candidate IPv4 addresses on this host. Finding a tether-subnet
/// address short-circuits: it is the only sensible serving address.
pub fn host_candidates() -> Vec<String> {
    let networks = Networks::new_with_refreshed_list();
    let mut candidates = Vec::new();

    for (name, data) in networks.iter() {
        for network in data.ip_networks() {
            let IpAddr::V4(addr) = network.addr else { continue };
            if addr.is_loopback() {
                continue;
            }
            let addr = addr.to_string();
            debug!(interface = %name, address = %addr, "interface candidate");
            if addr.starts_with(USB_SUBNET_PREFIX) {
                return vec![addr];
            }
            candidates.push(addr);
        }
    }
    candidates
}

/// Classify the candidate set into a topology.
pub fn classify(on_device: bool, candidates: Vec<String>) -> Result<Topology, SlateError> {
    if on_device {
        return Ok(Topology::OnDevice);
    }
    if candidates.is_empty() {
        return Err(SlateError::UnreachableNetwork(
            "this machine has no network interface with an IPv4 address".to_string(),
        ));
    }
    if candidates.len() == 1 && candidates[0].starts_with(USB_SUBNET_PREFIX) {
        return Ok(Topology::UsbTether {
            host_addr: candidates.into_iter().next().unwrap_or_default(),
        });
    }
    Ok(Topology::Lan { candidates })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_device_needs_no_discovery() {
        let topology = classify(true, Vec::new()).unwrap();
        assert_eq!(topology, Topology::OnDevice);
    }

    #[test]
    fn single_tether_address_is_usb() {
        let topology = classify(false, vec!["10.11.99.2".to_string()]).unwrap();
        assert_eq!(
            topology,
            Topology::UsbTether {
                host_addr: "10.11.99.2".to_string()
            }
        );
    }

    #[test]
    fn single_lan_address_still_requires_the_operator() {
        let topology = classify(false, vec!["192.168.1.20".to_string()]).unwrap();
        assert!(matches!(topology, Topology::Lan { candidates } if candidates.len() == 1));
    }

    #[test]
    fn multiple_addresses_fall_back_to_operator_choice() {
        let candidates = vec!["192.168.1.20".to_string(), "172.17.0.1".to_string()];
        let topology = classify(false, candidates.clone()).unwrap();
        assert_eq!(topology, Topology::Lan { candidates });
    }

    #[test]
    fn no_addresses_is_unreachable() {
        let err = classify(false, Vec::new()).unwrap_err();
        assert!(matches!(err, SlateError::UnreachableNetwork(_)));
    }
}
