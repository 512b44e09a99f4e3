//! Pro Controller 2 type definitions
//!
//! This module defines the basic data types used throughout the procon2
//! module: transport states, connection status, haptic intents, and
//! transfer results.

use serde::{Deserialize, Serialize};

/// Per-transport connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    /// USB only: handle stored, handshake in flight
    Initializing,
    Connected,
}

impl Default for TransportState {
    fn default() -> Self {
        Self::Disconnected
    }
}

/// Which transport an operation refers to (used in errors and logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Usb,
    Hid,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Usb => write!(f, "USB"),
            Transport::Hid => write!(f, "HID"),
        }
    }
}

/// Snapshot of the manager's connection status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// USB handle is live
    pub usb_connected: bool,

    /// HID handle is live
    pub hid_connected: bool,

    /// Haptic reports can be sent (haptics are HID-transport only)
    pub can_send_haptic: bool,
}

/// Haptic intent handed to the encoder.
///
/// The three variants preserve the three accepted input shapes: a raw
/// byte pattern, a tone described by frequency/amplitude, or nothing
/// (both motors stopped).
#[derive(Debug, Clone, PartialEq)]
pub enum HapticInput {
    /// Raw per-motor pattern: bytes 0..4 drive the left motor, bytes 4..8
    /// the right motor. If fewer than 8 bytes are given the left pattern
    /// is reused for the right motor. Must be at least 4 bytes.
    Raw(Vec<u8>),

    /// A tone encoded per motor via the HD Rumble quantizer.
    Tone {
        /// Frequency in Hz, clamped to the actuator range
        frequency: f32,

        /// Base amplitude in [0, 1], clamped
        amplitude: f32,

        /// Left motor amplitude override
        left_amp: Option<f32>,

        /// Right motor amplitude override
        right_amp: Option<f32>,
    },

    /// Both motors stopped
    Stop,
}

impl HapticInput {
    /// Convenience constructor for a symmetric tone.
    pub fn tone(frequency: f32, amplitude: f32) -> Self {
        Self::Tone { frequency, amplitude, left_amp: None, right_amp: None }
    }
}

impl Default for HapticInput {
    fn default() -> Self {
        Self::Stop
    }
}

/// Result of a USB write plus the best-effort read that follows it.
///
/// `response` is `None` when the read failed or timed out; many handshake
/// commands are write-only and never answer, so an absent response is not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbTransferOutcome {
    /// Bytes accepted by the bulk OUT endpoint
    pub bytes_written: usize,

    /// Response read back from the bulk IN endpoint, if any
    pub response: Option<Vec<u8>>,
}
