//! Backend abstraction for USB and HID device access
//!
//! This module provides a unified interface over the platform device
//! stacks (nusb for USB bulk transfers, hidapi for HID output reports)
//! so the transport manager can be driven against real hardware or
//! against the scriptable mocks in tests.

pub mod hid_hidapi;
pub mod mock_hid;
pub mod mock_usb;
pub mod usb_nusb;

pub use hid_hidapi::HidApiBackend;
pub use mock_hid::MockHidBackend;
pub use mock_usb::MockUsbBackend;
pub use usb_nusb::NusbBackend;

use thiserror::Error;

/// A vendor/product pair used to filter device enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceFilter {
    /// Check whether a concrete device matches this filter.
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Identity of the device a backend attached to, for logging and caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedDeviceInfo {
    pub product_id: u16,
    pub serial: Option<String>,
    pub name: Option<String>,
}

/// Errors surfaced by the platform backends.
///
/// `Platform` carries the raw platform message; the transport manager
/// classifies it into the public error taxonomy.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no matching device found")]
    NoDevice,

    #[error("{0}")]
    Platform(String),

    #[error("platform not supported")]
    PlatformNotSupported,
}

/// Raw USB device access as the transport manager consumes it.
///
/// The methods mirror the steps of the connect chain so each failure
/// stays distinguishable: request/open, configuration select, interface
/// claim, endpoint discovery, then transfers.
pub trait UsbBackend {
    /// Enumerate, pick the first device matching any filter, and open it.
    fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> impl std::future::Future<Output = Result<ConnectedDeviceInfo, BackendError>>;

    /// Select a configuration if none is active.
    fn select_configuration(
        &mut self,
        configuration: u8,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// Claim the vendor interface.
    fn claim_interface(
        &mut self,
        interface: u8,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// Scan the claimed interface's alternate settings for bulk endpoints.
    /// Returns (bulk OUT address, bulk IN address); either may be absent.
    fn discover_bulk_endpoints(
        &mut self,
        interface: u8,
    ) -> impl std::future::Future<Output = Result<(Option<u8>, Option<u8>), BackendError>>;

    /// Bulk-transfer `data` out on `endpoint`. Returns bytes written.
    fn transfer_out(
        &mut self,
        endpoint: u8,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<usize, BackendError>>;

    /// Bulk-transfer up to `length` bytes in on `endpoint`.
    fn transfer_in(
        &mut self,
        endpoint: u8,
        length: usize,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, BackendError>>;

    /// Release the claimed interface.
    fn release_interface(
        &mut self,
        interface: u8,
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// Close the device.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), BackendError>>;
}

/// Raw HID device access as the transport manager consumes it.
pub trait HidBackend {
    /// Enumerate, pick the first device matching any filter, and open it.
    fn request_device(
        &mut self,
        filters: &[DeviceFilter],
    ) -> impl std::future::Future<Output = Result<ConnectedDeviceInfo, BackendError>>;

    /// Whether an opened device is currently held.
    fn is_open(&self) -> bool;

    /// Send an output report: `report_id` prefixed to `body` on the wire.
    fn send_report(
        &mut self,
        report_id: u8,
        body: &[u8],
    ) -> impl std::future::Future<Output = Result<(), BackendError>>;

    /// Close the device.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), BackendError>>;
}
