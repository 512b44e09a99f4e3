//! Transport management for the Pro Controller 2
//!
//! This module owns the USB and HID connections to a single physical
//! controller, runs the vendor handshake over USB, and exposes the raw
//! send primitives both halves of the crate are built on.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::time::sleep;

use crate::backend::{
    BackendError, ConnectedDeviceInfo, HidApiBackend, HidBackend, NusbBackend, UsbBackend,
};
use crate::device_cache::DeviceCache;
use crate::procon2::constants::{
    ACCEPTED_REPORT_IDS, COMMAND_DELAY_MS, DEVICE_FILTERS, INIT_COMMANDS, INIT_SET_PLAYER_LED,
    PLAYER_LED_VALUE_INDEX, REPORT_ID_HAPTIC, USB_CONFIGURATION, USB_INTERFACE, USB_READ_DELAY_MS,
    USB_READ_LEN,
};
use crate::procon2::haptics::build_haptic_report;
use crate::procon2::types::{
    DeviceStatus, HapticInput, Transport, TransportState, UsbTransferOutcome,
};

/// Errors surfaced by the transport manager.
///
/// Every message layers the originating platform error so it can be
/// shown directly in a UI log.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no matching device was selected")]
    NoDeviceSelected,

    #[error("no bulk OUT endpoint on interface {0}")]
    EndpointNotFound(u8),

    #[error("{0} transport is not connected")]
    NotConnected(Transport),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),

    #[error("invalid device state: {0}")]
    InvalidState(String),

    #[error("handshake command {index}/7 failed: {message}")]
    HandshakeStep { index: usize, message: String },

    #[error("no transport available")]
    NoTransportAvailable,

    #[error("USB transport error: {0}")]
    Usb(String),

    #[error("HID transport error: {0}")]
    Hid(String),
}

/// Classify a backend failure into the public taxonomy by sniffing the
/// platform message, mirroring the DOMException names the platform
/// stacks report (NotAllowedError, NetworkError, InvalidStateError).
fn classify(transport: Transport, err: BackendError) -> TransportError {
    let generic = |msg: String| match transport {
        Transport::Usb => TransportError::Usb(msg),
        Transport::Hid => TransportError::Hid(msg),
    };

    match err {
        BackendError::NoDevice => TransportError::NoDeviceSelected,
        BackendError::PlatformNotSupported => generic("platform not supported".to_string()),
        BackendError::Platform(msg) => {
            let lower = msg.to_lowercase();
            if lower.contains("notallowed") || lower.contains("permission") || lower.contains("access denied") {
                TransportError::PermissionDenied(msg)
            } else if lower.contains("networkerror")
                || lower.contains("disconnect")
                || lower.contains("no such device")
                || lower.contains("device removed")
            {
                TransportError::Disconnected(msg)
            } else if lower.contains("invalidstate") || lower.contains("invalid state") || lower.contains("busy") {
                TransportError::InvalidState(msg)
            } else {
                generic(msg)
            }
        }
    }
}

/// Timing knobs for the transport, overridable from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// Delay after each handshake command
    pub command_delay: Duration,

    /// Delay between a bulk write and the best-effort read-back
    pub read_delay: Duration,

    /// Maximum length of the best-effort read-back
    pub read_len: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            command_delay: Duration::from_millis(COMMAND_DELAY_MS),
            read_delay: Duration::from_millis(USB_READ_DELAY_MS),
            read_len: USB_READ_LEN,
        }
    }
}

/// Live USB connection details, present only after the full open chain
/// (open, configure, claim, endpoint discovery) succeeded.
#[derive(Debug, Clone, Copy)]
struct UsbHandle {
    ep_out: u8,
    ep_in: Option<u8>,
}

/// Manages the USB and HID connections to one physical controller.
///
/// One instance per controller; instances pointed at different
/// controllers are independent. A single logical caller is assumed:
/// overlapping sends are not serialized here and race at the platform
/// layer.
pub struct TransportManager<U: UsbBackend, H: HidBackend> {
    usb: U,
    hid: H,
    settings: TransportSettings,

    usb_handle: Option<UsbHandle>,
    hid_open: bool,
    usb_state: TransportState,
    hid_state: TransportState,

    usb_device: Option<ConnectedDeviceInfo>,
    hid_device: Option<ConnectedDeviceInfo>,

    cache: Option<DeviceCache>,
}

impl TransportManager<NusbBackend, HidApiBackend> {
    /// Manager over the real platform stacks (nusb + hidapi).
    pub fn new_native() -> Self {
        Self::new(NusbBackend::new(), HidApiBackend::new())
    }
}

impl<U: UsbBackend, H: HidBackend> TransportManager<U, H> {
    /// Create a manager over the given backends with default timing.
    pub fn new(usb: U, hid: H) -> Self {
        Self::with_settings(usb, hid, TransportSettings::default())
    }

    /// Create a manager with explicit timing settings.
    pub fn with_settings(usb: U, hid: H, settings: TransportSettings) -> Self {
        Self {
            usb,
            hid,
            settings,
            usb_handle: None,
            hid_open: false,
            usb_state: TransportState::Disconnected,
            hid_state: TransportState::Disconnected,
            usb_device: None,
            hid_device: None,
            cache: None,
        }
    }

    /// Load the device cache and record successful connections in it.
    pub fn enable_cache(&mut self) {
        let cache = DeviceCache::load();
        info!("Loaded {} cached controllers", cache.len());
        self.cache = Some(cache);
    }

    /// Connect over USB and run the firmware handshake.
    ///
    /// Any failure before the handle is stored rolls the handle back. A
    /// handshake failure after that point leaves the handle set: the
    /// controller accepts raw sends without a completed handshake, and
    /// callers can retry or degrade. The error still propagates so the
    /// incomplete initialization is visible.
    pub async fn connect_usb(&mut self) -> Result<(), TransportError> {
        self.usb_state = TransportState::Connecting;

        let result = self.open_usb().await;
        let handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                self.usb_handle = None;
                self.usb_state = TransportState::Disconnected;
                return Err(e);
            }
        };

        self.usb_handle = Some(handle);
        self.usb_state = TransportState::Initializing;

        if let Err(e) = self.run_init_sequence().await {
            warn!("USB handshake incomplete, handle kept: {e}");
            self.usb_state = TransportState::Connected;
            return Err(e);
        }

        self.usb_state = TransportState::Connected;
        info!("✓ USB transport ready");

        self.record_connection(Transport::Usb);
        Ok(())
    }

    /// The open/configure/claim/endpoint-discovery chain.
    async fn open_usb(&mut self) -> Result<UsbHandle, TransportError> {
        let info = self
            .usb
            .request_device(&DEVICE_FILTERS)
            .await
            .map_err(|e| classify(Transport::Usb, e))?;
        info!(
            "USB device selected: {} (PID {:04X})",
            info.name.as_deref().unwrap_or("unknown"),
            info.product_id
        );
        self.usb_device = Some(info);

        self.usb
            .select_configuration(USB_CONFIGURATION)
            .await
            .map_err(|e| classify(Transport::Usb, e))?;

        self.usb
            .claim_interface(USB_INTERFACE)
            .await
            .map_err(|e| classify(Transport::Usb, e))?;

        let (ep_out, ep_in) = self
            .usb
            .discover_bulk_endpoints(USB_INTERFACE)
            .await
            .map_err(|e| classify(Transport::Usb, e))?;

        let ep_out = ep_out.ok_or(TransportError::EndpointNotFound(USB_INTERFACE))?;
        debug!("Bulk endpoints: OUT {ep_out:#04x}, IN {ep_in:?}");

        Ok(UsbHandle { ep_out, ep_in })
    }

    /// Send the 7 handshake commands in order, pausing after each.
    async fn run_init_sequence(&mut self) -> Result<(), TransportError> {
        info!("Sending initialization sequence ({} commands)...", INIT_COMMANDS.len());

        for (i, command) in INIT_COMMANDS.iter().enumerate() {
            debug!("  Command {}/{}: 0x{:02X}", i + 1, INIT_COMMANDS.len(), command[0]);
            self.send_usb_data(command).await.map_err(|e| TransportError::HandshakeStep {
                index: i + 1,
                message: e.to_string(),
            })?;
            sleep(self.settings.command_delay).await;
        }

        Ok(())
    }

    /// Connect over HID. No handshake; the firmware handshake is
    /// USB-specific.
    pub async fn connect_hid(&mut self) -> Result<(), TransportError> {
        self.hid_state = TransportState::Connecting;

        let info = match self.hid.request_device(&DEVICE_FILTERS).await {
            Ok(info) => info,
            Err(e) => {
                self.hid_open = false;
                self.hid_state = TransportState::Disconnected;
                return Err(classify(Transport::Hid, e));
            }
        };
        info!(
            "HID device selected: {} (PID {:04X})",
            info.name.as_deref().unwrap_or("unknown"),
            info.product_id
        );
        self.hid_device = Some(info);
        self.hid_open = true;
        self.hid_state = TransportState::Connected;
        info!("✓ HID transport ready");

        self.record_connection(Transport::Hid);
        Ok(())
    }

    /// Attempt both transports, HID first. Succeeds if at least one
    /// connected; each individual failure is logged.
    pub async fn connect(&mut self) -> Result<DeviceStatus, TransportError> {
        let hid_result = self.connect_hid().await;
        if let Err(e) = &hid_result {
            warn!("HID connect failed: {e}");
        }

        let usb_result = self.connect_usb().await;
        if let Err(e) = &usb_result {
            warn!("USB connect failed: {e}");
        }

        if hid_result.is_err() && usb_result.is_err() {
            return Err(TransportError::NoTransportAvailable);
        }

        Ok(self.device_status())
    }

    /// Bulk-write `data`, then best-effort read back up to the configured
    /// length. Read failures are expected for write-only commands and
    /// surface as `response: None`, never as an error.
    pub async fn send_usb_data(&mut self, data: &[u8]) -> Result<UsbTransferOutcome, TransportError> {
        let handle = self.usb_handle.ok_or(TransportError::NotConnected(Transport::Usb))?;

        let bytes_written = self
            .usb
            .transfer_out(handle.ep_out, data)
            .await
            .map_err(|e| classify(Transport::Usb, e))?;

        sleep(self.settings.read_delay).await;

        let response = match handle.ep_in {
            Some(ep_in) => match self.usb.transfer_in(ep_in, self.settings.read_len).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    debug!("Best-effort read failed (ok for write-only commands): {e}");
                    None
                }
            },
            None => None,
        };

        Ok(UsbTransferOutcome { bytes_written, response })
    }

    /// Send an output report whose first byte is the report ID.
    ///
    /// Report IDs outside the accepted set are rewritten to the haptic
    /// report ID. The firmware drops reports under any other ID, so the
    /// coercion is a compatibility shim; it is logged rather than silent.
    pub async fn send_hid_data(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if !self.hid_open || !self.hid.is_open() {
            return Err(TransportError::NotConnected(Transport::Hid));
        }
        if data.is_empty() {
            return Err(TransportError::InvalidState("empty HID report".to_string()));
        }

        let mut report_id = data[0];
        if !ACCEPTED_REPORT_IDS.contains(&report_id) {
            warn!(
                "Report ID {:#04x} not accepted by firmware, coercing to {:#04x}",
                report_id, REPORT_ID_HAPTIC
            );
            report_id = REPORT_ID_HAPTIC;
        }

        self.hid
            .send_report(report_id, &data[1..])
            .await
            .map_err(|e| classify(Transport::Hid, e))
    }

    /// Light a player LED slot (1..=4, clamped). USB transport only.
    ///
    /// The handshake already lights slot 1; this re-sends the LED command
    /// with a different bitmask, e.g. from a configured slot.
    pub async fn set_player_led(&mut self, slot: u8) -> Result<UsbTransferOutcome, TransportError> {
        let mut command = [0u8; 16];
        command.copy_from_slice(INIT_SET_PLAYER_LED);
        command[PLAYER_LED_VALUE_INDEX] = 1u8 << (slot.clamp(1, 4) - 1);
        self.send_usb_data(&command).await
    }

    /// Encode a haptic intent and send it as a single HID report.
    pub async fn send_haptic(
        &mut self,
        input: &HapticInput,
        counter: u8,
    ) -> Result<(), TransportError> {
        let report = build_haptic_report(input, counter);
        self.send_hid_data(&report).await
    }

    /// Tear down both transports. Best-effort: sub-step failures are
    /// logged, never propagated, and both handles are cleared regardless.
    pub async fn disconnect(&mut self) {
        if self.usb_handle.is_some() {
            if let Err(e) = self.usb.release_interface(USB_INTERFACE).await {
                warn!("USB interface release failed: {e}");
            }
            if let Err(e) = self.usb.close().await {
                warn!("USB close failed: {e}");
            }
        }

        if self.hid_open {
            if let Err(e) = self.hid.close().await {
                warn!("HID close failed: {e}");
            }
        }

        self.usb_handle = None;
        self.hid_open = false;
        self.usb_state = TransportState::Disconnected;
        self.hid_state = TransportState::Disconnected;
        info!("Disconnected");
    }

    /// Current connection status. Haptics ride the HID transport only.
    pub fn device_status(&self) -> DeviceStatus {
        DeviceStatus {
            usb_connected: self.usb_handle.is_some(),
            hid_connected: self.hid_open,
            can_send_haptic: self.hid_open,
        }
    }

    pub fn usb_state(&self) -> TransportState {
        self.usb_state
    }

    pub fn hid_state(&self) -> TransportState {
        self.hid_state
    }

    /// Identity of the device behind the given transport, if connected.
    pub fn device_info(&self, transport: Transport) -> Option<&ConnectedDeviceInfo> {
        match transport {
            Transport::Usb => self.usb_device.as_ref(),
            Transport::Hid => self.hid_device.as_ref(),
        }
    }

    fn record_connection(&mut self, transport: Transport) {
        let info = match transport {
            Transport::Usb => self.usb_device.as_ref(),
            Transport::Hid => self.hid_device.as_ref(),
        };
        if let (Some(cache), Some(info)) = (self.cache.as_mut(), info) {
            cache.record(info);
            if let Err(e) = cache.save() {
                warn!("Could not save device cache: {e}");
            }
        }
    }
}
