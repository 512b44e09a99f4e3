//! Mock USB backend for testing.
//!
//! Records every bulk transfer instead of touching hardware and can be
//! scripted to fail at any step of the connect chain, so the transport
//! manager's rollback and handshake behavior is testable without a
//! controller plugged in.

use std::sync::{Arc, Mutex};

use log::info;

use super::{BackendError, ConnectedDeviceInfo, DeviceFilter, UsbBackend};

/// Mock USB backend that records transfers and scripts failures.
#[derive(Clone, Default)]
pub struct MockUsbBackend {
    /// Every buffer handed to `transfer_out`, in order
    writes: Arc<Mutex<Vec<Vec<u8>>>>,

    /// Respond to `transfer_in` with these bytes (None: fail the read)
    pub read_response: Option<Vec<u8>>,

    /// Present a bulk OUT endpoint during discovery
    pub has_bulk_out: bool,

    /// Present a bulk IN endpoint during discovery
    pub has_bulk_in: bool,

    /// Fail `request_device` with `NoDevice`
    pub fail_request: bool,

    /// Fail `claim_interface` with a platform error
    pub fail_claim: bool,

    /// Fail `transfer_out` once this many writes have been recorded
    pub fail_write_after: Option<usize>,

    /// Fail `release_interface` and `close` with platform errors
    pub fail_close: bool,
}

impl MockUsbBackend {
    /// A mock that connects cleanly: one bulk OUT and one bulk IN endpoint,
    /// reads answered with an empty buffer.
    pub fn new() -> Self {
        Self {
            writes: Arc::new(Mutex::new(Vec::new())),
            read_response: Some(Vec::new()),
            has_bulk_out: true,
            has_bulk_in: true,
            fail_request: false,
            fail_claim: false,
            fail_write_after: None,
            fail_close: false,
        }
    }

    /// Handle to the recorded writes, valid after the mock is moved into
    /// a transport manager.
    pub fn writes(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.writes)
    }
}

impl UsbBackend for MockUsbBackend {
    async fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> Result<ConnectedDeviceInfo, BackendError> {
        if self.fail_request {
            return Err(BackendError::NoDevice);
        }
        let filter = filters.first().ok_or(BackendError::NoDevice)?;
        info!("[MOCK USB] Device requested ({:04X}:{:04X})", filter.vendor_id, filter.product_id);
        Ok(ConnectedDeviceInfo {
            product_id: filter.product_id,
            serial: Some("MOCK-USB-0001".to_string()),
            name: Some("Mock Pro Controller 2".to_string()),
        })
    }

    async fn select_configuration(&mut self, configuration: u8) -> Result<(), BackendError> {
        info!("[MOCK USB] Configuration {} selected", configuration);
        Ok(())
    }

    async fn claim_interface(&mut self, interface: u8) -> Result<(), BackendError> {
        if self.fail_claim {
            return Err(BackendError::Platform(format!(
                "InvalidStateError: interface {interface} busy"
            )));
        }
        info!("[MOCK USB] Interface {} claimed", interface);
        Ok(())
    }

    async fn discover_bulk_endpoints(
        &mut self,
        _interface: u8,
    ) -> Result<(Option<u8>, Option<u8>), BackendError> {
        let ep_out = self.has_bulk_out.then_some(0x01);
        let ep_in = self.has_bulk_in.then_some(0x81);
        Ok((ep_out, ep_in))
    }

    async fn transfer_out(&mut self, endpoint: u8, data: &[u8]) -> Result<usize, BackendError> {
        if let Some(limit) = self.fail_write_after {
            if self.writes.lock().unwrap().len() >= limit {
                return Err(BackendError::Platform("NetworkError: transfer failed".to_string()));
            }
        }
        info!("[MOCK USB] OUT ep {:#04x}: {} bytes", endpoint, data.len());
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    async fn transfer_in(&mut self, endpoint: u8, length: usize) -> Result<Vec<u8>, BackendError> {
        info!("[MOCK USB] IN ep {:#04x}: up to {} bytes", endpoint, length);
        match &self.read_response {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(BackendError::Platform("NetworkError: read stalled".to_string())),
        }
    }

    async fn release_interface(&mut self, interface: u8) -> Result<(), BackendError> {
        if self.fail_close {
            return Err(BackendError::Platform("InvalidStateError: release failed".to_string()));
        }
        info!("[MOCK USB] Interface {} released", interface);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        if self.fail_close {
            return Err(BackendError::Platform("InvalidStateError: close failed".to_string()));
        }
        info!("[MOCK USB] Device closed");
        Ok(())
    }
}
