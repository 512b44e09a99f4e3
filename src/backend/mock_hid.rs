//! Mock HID backend for testing.
//!
//! Captures every output report so tests can verify report ID coercion
//! and framing, and can be scripted to fail `send_report` with an
//! arbitrary platform message to exercise error classification.

use std::sync::{Arc, Mutex};

use log::info;

use super::{BackendError, ConnectedDeviceInfo, DeviceFilter, HidBackend};

/// Mock HID backend that records output reports and scripts failures.
#[derive(Clone, Default)]
pub struct MockHidBackend {
    /// Every (report_id, body) handed to `send_report`, in order
    reports: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,

    open: bool,

    /// Fail `request_device` with `NoDevice` (user cancelled / no match)
    pub fail_request: bool,

    /// Fail `send_report` with this platform message
    pub send_error: Option<String>,

    /// Fail `close` with a platform error
    pub fail_close: bool,
}

impl MockHidBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the captured reports, valid after the mock is moved into
    /// a transport manager.
    pub fn reports(&self) -> Arc<Mutex<Vec<(u8, Vec<u8>)>>> {
        Arc::clone(&self.reports)
    }
}

impl HidBackend for MockHidBackend {
    async fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> Result<ConnectedDeviceInfo, BackendError> {
        if self.fail_request {
            return Err(BackendError::NoDevice);
        }
        let filter = filters.first().ok_or(BackendError::NoDevice)?;
        info!("[MOCK HID] Device requested ({:04X}:{:04X})", filter.vendor_id, filter.product_id);
        self.open = true;
        Ok(ConnectedDeviceInfo {
            product_id: filter.product_id,
            serial: Some("MOCK-HID-0001".to_string()),
            name: Some("Mock Pro Controller 2".to_string()),
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn send_report(&mut self, report_id: u8, body: &[u8]) -> Result<(), BackendError> {
        if let Some(message) = &self.send_error {
            return Err(BackendError::Platform(message.clone()));
        }
        info!("[MOCK HID] Report {:#04x}: {} bytes", report_id, body.len());
        self.reports.lock().unwrap().push((report_id, body.to_vec()));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.open = false;
        if self.fail_close {
            return Err(BackendError::Platform("InvalidStateError: close failed".to_string()));
        }
        info!("[MOCK HID] Device closed");
        Ok(())
    }
}
