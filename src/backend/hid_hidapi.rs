//! Real HID backend built on hidapi.
//!
//! hidapi is a blocking API; output report writes are small and complete
//! in microseconds, so they are issued inline rather than through a
//! blocking task.

use hidapi::HidApi;
use log::debug;

use super::{BackendError, ConnectedDeviceInfo, DeviceFilter, HidBackend};

/// HID backend over hidapi.
#[derive(Default)]
pub struct HidApiBackend {
    device: Option<hidapi::HidDevice>,
}

impl HidApiBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HidBackend for HidApiBackend {
    async fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> Result<ConnectedDeviceInfo, BackendError> {
        let api = HidApi::new()
            .map_err(|e| BackendError::Platform(format!("HID enumeration failed: {e}")))?;

        for info in api.device_list() {
            if filters.iter().any(|f| f.matches(info.vendor_id(), info.product_id())) {
                debug!(
                    "Opening HID device {:04X}:{:04X}",
                    info.vendor_id(),
                    info.product_id()
                );
                let device = info
                    .open_device(&api)
                    .map_err(|e| BackendError::Platform(format!("HID open failed: {e}")))?;
                let connected = ConnectedDeviceInfo {
                    product_id: info.product_id(),
                    serial: info.serial_number().map(str::to_string),
                    name: info.product_string().map(str::to_string),
                };
                self.device = Some(device);
                return Ok(connected);
            }
        }

        Err(BackendError::NoDevice)
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    async fn send_report(&mut self, report_id: u8, body: &[u8]) -> Result<(), BackendError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| BackendError::Platform("no HID device open".to_string()))?;

        let mut buffer = Vec::with_capacity(body.len() + 1);
        buffer.push(report_id);
        buffer.extend_from_slice(body);

        device
            .write(&buffer)
            .map_err(|e| BackendError::Platform(format!("HID write failed: {e}")))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.device = None;
        Ok(())
    }
}
