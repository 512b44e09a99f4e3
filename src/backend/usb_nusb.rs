//! Real USB backend built on nusb.
//!
//! Holds the opened device and the claimed interface; bulk transfers go
//! through nusb's async transfer API.

use log::{debug, warn};
use nusb::transfer::{Direction, EndpointType, RequestBuffer};

use super::{BackendError, ConnectedDeviceInfo, DeviceFilter, UsbBackend};

/// USB backend over nusb.
#[derive(Default)]
pub struct NusbBackend {
    device: Option<nusb::Device>,
    interface: Option<nusb::Interface>,
}

impl NusbBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn device(&self) -> Result<&nusb::Device, BackendError> {
        self.device
            .as_ref()
            .ok_or_else(|| BackendError::Platform("no USB device open".to_string()))
    }

    fn interface(&self) -> Result<&nusb::Interface, BackendError> {
        self.interface
            .as_ref()
            .ok_or_else(|| BackendError::Platform("no USB interface claimed".to_string()))
    }
}

impl UsbBackend for NusbBackend {
    async fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> Result<ConnectedDeviceInfo, BackendError> {
        let devices = nusb::list_devices()
            .map_err(|e| BackendError::Platform(format!("USB enumeration failed: {e}")))?;

        for info in devices {
            if filters.iter().any(|f| f.matches(info.vendor_id(), info.product_id())) {
                debug!(
                    "Opening USB device {:04X}:{:04X}",
                    info.vendor_id(),
                    info.product_id()
                );
                let device = info
                    .open()
                    .map_err(|e| BackendError::Platform(format!("USB open failed: {e}")))?;
                self.device = Some(device);
                return Ok(ConnectedDeviceInfo {
                    product_id: info.product_id(),
                    serial: info.serial_number().map(str::to_string),
                    name: info.product_string().map(str::to_string),
                });
            }
        }

        Err(BackendError::NoDevice)
    }

    async fn select_configuration(&mut self, configuration: u8) -> Result<(), BackendError> {
        let device = self.device()?;
        match device.active_configuration() {
            Ok(config) => {
                debug!("Active configuration: {}", config.configuration_value());
                Ok(())
            }
            Err(_) => device
                .set_configuration(configuration)
                .map_err(|e| BackendError::Platform(format!("set_configuration failed: {e}"))),
        }
    }

    async fn claim_interface(&mut self, interface: u8) -> Result<(), BackendError> {
        let device = self.device()?;

        // A kernel HID driver may hold the interface; detaching is
        // best-effort and a no-op on platforms without one.
        let _ = device.detach_kernel_driver(interface);

        let claimed = device
            .claim_interface(interface)
            .map_err(|e| BackendError::Platform(format!("claim_interface failed: {e}")))?;
        self.interface = Some(claimed);
        Ok(())
    }

    async fn discover_bulk_endpoints(
        &mut self,
        interface: u8,
    ) -> Result<(Option<u8>, Option<u8>), BackendError> {
        let device = self.device()?;
        let config = device
            .active_configuration()
            .map_err(|e| BackendError::Platform(format!("active_configuration failed: {e}")))?;

        let mut ep_out = None;
        let mut ep_in = None;
        for alt in config
            .interface_alt_settings()
            .filter(|alt| alt.interface_number() == interface)
        {
            for ep in alt.endpoints() {
                if ep.transfer_type() != EndpointType::Bulk {
                    continue;
                }
                match ep.direction() {
                    Direction::Out => ep_out = ep_out.or(Some(ep.address())),
                    Direction::In => ep_in = ep_in.or(Some(ep.address())),
                }
            }
        }

        Ok((ep_out, ep_in))
    }

    async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, BackendError> {
        let interface = self.interface()?;
        let completion = interface.bulk_out(endpoint, data.to_vec()).await;
        match completion.status {
            Ok(()) => Ok(completion.data.actual_length()),
            Err(e) => Err(BackendError::Platform(format!("bulk OUT failed: {e}"))),
        }
    }

    async fn transfer_in(&mut self, endpoint: u8, length: usize) -> Result<Vec<u8>, BackendError> {
        let interface = self.interface()?;
        let completion = interface.bulk_in(endpoint, RequestBuffer::new(length)).await;
        match completion.status {
            Ok(()) => Ok(completion.data),
            Err(e) => Err(BackendError::Platform(format!("bulk IN failed: {e}"))),
        }
    }

    async fn release_interface(&mut self, interface: u8) -> Result<(), BackendError> {
        if self.interface.take().is_some() {
            // nusb releases the claim when the Interface is dropped; put the
            // kernel driver back so the OS HID stack can reattach.
            if let Some(device) = &self.device {
                if let Err(e) = device.attach_kernel_driver(interface) {
                    warn!("Could not reattach kernel driver: {e}");
                }
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.interface = None;
        self.device = None;
        Ok(())
    }
}
