// Gestion des devices audio CPAL - enumeration et sélection de la sortie

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::error::PlaybackError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

pub struct OutputDeviceManager {
    host: Host,
}

impl OutputDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// All output devices that report a name
    pub fn list_output_devices(&self) -> Result<Vec<OutputDeviceInfo>, PlaybackError> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let devices = self
            .host
            .output_devices()?
            .filter_map(|device| device.name().ok())
            .map(|name| OutputDeviceInfo {
                is_default: name == default_name,
                name,
            })
            .collect();

        Ok(devices)
    }

    /// The named device, or the host default when `name` is `None`
    pub fn output_device(&self, name: Option<&str>) -> Result<Device, PlaybackError> {
        match name {
            None => self
                .host
                .default_output_device()
                .ok_or(PlaybackError::NoOutputDevice),
            Some(wanted) => self
                .host
                .output_devices()?
                .find(|device| device.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| PlaybackError::DeviceNotFound(wanted.to_string())),
        }
    }
}

impl Default for OutputDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
