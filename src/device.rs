//! Target devices a problem runs on and a solution was built for.

use serde::{Deserialize, Serialize};

/// Maximum length of a device name, in bytes.
pub const MAX_DEVICE_NAME_LEN: usize = 256;

/// Maximum number of devices in one profile.
pub const MAX_DEVICES: usize = 1;

/// A single compute device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub num_compute_units: usize,
    /// Clock frequency in MHz.
    #[serde(default)]
    pub clock_frequency: usize,
}

impl Device {
    pub fn new(name: impl Into<String>, num_compute_units: usize, clock_frequency: usize) -> Self {
        Self {
            name: name.into(),
            num_compute_units,
            clock_frequency,
        }
    }
}

/// Ordered set of devices.
///
/// Solutions are matched against profiles by device name, in order; compute
/// unit count and clock do not take part in matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub devices: Vec<Device>,
}

impl DeviceProfile {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Profile with one device.
    pub fn single(device: Device) -> Self {
        Self {
            devices: vec![device],
        }
    }

    #[inline]
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// Device names in profile order; the key used for matching.
    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }

    /// Whether a solution built for `self` can run on `other`.
    pub fn matches(&self, other: &DeviceProfile) -> bool {
        self.devices.len() == other.devices.len()
            && self
                .devices
                .iter()
                .zip(&other.devices)
                .all(|(a, b)| a.name == b.name)
    }

    /// Total compute units across the profile.
    pub fn total_compute_units(&self) -> usize {
        self.devices.iter().map(|d| d.num_compute_units).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_matches_by_name() {
        let fiji = DeviceProfile::single(Device::new("Fiji", 64, 1050));
        let fiji_oc = DeviceProfile::single(Device::new("Fiji", 64, 1100));
        let hawaii = DeviceProfile::single(Device::new("Hawaii", 44, 1000));
        assert!(fiji.matches(&fiji_oc));
        assert!(!fiji.matches(&hawaii));
        assert!(!fiji.matches(&DeviceProfile::default()));
    }

    #[test]
    fn test_names() {
        let p = DeviceProfile::single(Device::new("Fiji", 64, 1050));
        assert_eq!(p.names(), vec!["Fiji".to_string()]);
        assert_eq!(p.total_compute_units(), 64);
    }
}
