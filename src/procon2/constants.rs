//! Pro Controller 2 protocol constants
//!
//! This module contains all the constants needed for Pro Controller 2
//! communication:
//! - USB/HID device identity (vendor and product IDs)
//! - USB initialization handshake commands
//! - HID report IDs and haptic encoding bounds
//! - Timing constants

use crate::backend::DeviceFilter;

// ============================================================================
// Device Identity
// ============================================================================

/// Nintendo Co., Ltd. vendor ID
pub const NINTENDO_VENDOR_ID: u16 = 0x057E;

/// Joy-Con 2 (Right) product ID
pub const JOYCON2_RIGHT_PID: u16 = 0x2066;

/// Joy-Con 2 (Left) product ID
pub const JOYCON2_LEFT_PID: u16 = 0x2067;

/// Pro Controller 2 product ID
pub const PROCON2_PID: u16 = 0x2069;

/// GameCube-style controller product ID
pub const GCCON_PID: u16 = 0x2073;

/// Device filters handed to the backends when requesting a device.
/// Covers every controller of the Switch 2 family that speaks this protocol.
pub const DEVICE_FILTERS: [DeviceFilter; 4] = [
    DeviceFilter { vendor_id: NINTENDO_VENDOR_ID, product_id: JOYCON2_RIGHT_PID },
    DeviceFilter { vendor_id: NINTENDO_VENDOR_ID, product_id: JOYCON2_LEFT_PID },
    DeviceFilter { vendor_id: NINTENDO_VENDOR_ID, product_id: PROCON2_PID },
    DeviceFilter { vendor_id: NINTENDO_VENDOR_ID, product_id: GCCON_PID },
];

/// USB interface carrying the vendor bulk endpoints
pub const USB_INTERFACE: u8 = 1;

/// USB configuration selected when the device reports none active
pub const USB_CONFIGURATION: u8 = 1;

/// Maximum length of a best-effort bulk IN read after a write
pub const USB_READ_LEN: usize = 32;

// ============================================================================
// USB Initialization Commands
// ============================================================================
// Sent once, in order, immediately after the USB handle is established.
// Opaque firmware handshake constants captured from the official pairing
// flow; none of them carry runtime-computed fields.

/// Basic init command (0x03)
pub const INIT_BASIC: &[u8] = &[
    0x03, 0x91, 0x00, 0x0D, 0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Unknown vendor handshake command (0x07)
pub const INIT_UNKNOWN_0X07: &[u8] = &[0x07, 0x91, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Unknown vendor handshake command (0x16)
pub const INIT_UNKNOWN_0X16: &[u8] = &[0x16, 0x91, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];

/// Request the controller's MAC address (0x15, arg 0x01)
pub const INIT_REQUEST_MAC: &[u8] = &[
    0x15, 0x91, 0x00, 0x01, 0x00, 0x0E, 0x00, 0x00, 0x00, 0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Request the long-term key (0x15, arg 0x02)
pub const INIT_REQUEST_LTK: &[u8] = &[
    0x15, 0x91, 0x00, 0x02, 0x00, 0x11, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Enable the haptic driver (0x03, arg 0x0A)
pub const INIT_ENABLE_HAPTICS: &[u8] = &[
    0x03, 0x91, 0x00, 0x0A, 0x00, 0x04, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00,
];

/// Set player LED (slot 1). Byte 8 is the LED bitmask.
pub const INIT_SET_PLAYER_LED: &[u8] = &[
    0x09, 0x91, 0x00, 0x07, 0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Index of the LED bitmask byte inside [`INIT_SET_PLAYER_LED`]
pub const PLAYER_LED_VALUE_INDEX: usize = 8;

/// The full handshake sequence, in the order the firmware expects.
pub const INIT_COMMANDS: [&[u8]; 7] = [
    INIT_BASIC,
    INIT_UNKNOWN_0X07,
    INIT_UNKNOWN_0X16,
    INIT_REQUEST_MAC,
    INIT_REQUEST_LTK,
    INIT_ENABLE_HAPTICS,
    INIT_SET_PLAYER_LED,
];

// ============================================================================
// HID Report IDs
// ============================================================================

/// Generic command output report
pub const REPORT_ID_COMMAND: u8 = 0x01;

/// Haptic output report (the canonical rumble report ID)
pub const REPORT_ID_HAPTIC: u8 = 0x02;

/// Firmware/status output report
pub const REPORT_ID_STATUS: u8 = 0x10;

/// Report IDs the firmware accepts; anything else is coerced to
/// [`REPORT_ID_HAPTIC`] before sending.
pub const ACCEPTED_REPORT_IDS: [u8; 3] = [REPORT_ID_COMMAND, REPORT_ID_HAPTIC, REPORT_ID_STATUS];

// ============================================================================
// Haptic Encoding Bounds
// ============================================================================

/// Lowest frequency the HD Rumble actuator resolves (Hz)
pub const HD_RUMBLE_FREQ_MIN: f32 = 81.75;

/// Highest frequency the HD Rumble actuator resolves (Hz)
pub const HD_RUMBLE_FREQ_MAX: f32 = 1252.27;

/// 4-byte per-motor stop pattern (amplitude zero)
pub const HD_RUMBLE_STOP: [u8; 4] = [0x00, 0x01, 0x40, 0x40];

/// Size of a haptic output report, report ID byte included
pub const HAPTIC_REPORT_LEN: usize = 64;

// ============================================================================
// Timing Constants
// ============================================================================

/// Delay between handshake commands (milliseconds)
pub const COMMAND_DELAY_MS: u64 = 10;

/// Delay between a bulk write and the best-effort read-back (milliseconds)
pub const USB_READ_DELAY_MS: u64 = 10;
