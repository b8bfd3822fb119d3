use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Speaker entry from the MiNA device list. Unlisted upstream fields are kept verbatim.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Device {
    pub name: String,
    pub hardware: String,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DeviceRef {
    pub hardware: String,
    pub device_id: String,
}

impl From<&Device> for DeviceRef {
    fn from(device: &Device) -> Self {
        Self {
            hardware: device.hardware.clone(),
            device_id: device.device_id.clone(),
        }
    }
}

/// First device whose display name matches exactly (case-sensitive).
pub fn resolve_device_by_name(name: &str, devices: &[Device]) -> Result<DeviceRef> {
    devices
        .iter()
        .find(|d| d.name == name)
        .map(DeviceRef::from)
        .ok_or_else(|| Error::NotFound(format!("No such device: {name}")))
}

pub fn resolve_device_by_id(device_id: &str, devices: &[Device]) -> Result<DeviceRef> {
    devices
        .iter()
        .find(|d| d.device_id == device_id)
        .map(DeviceRef::from)
        .ok_or_else(|| Error::NotFound(format!("No device with id: {device_id}")))
}
