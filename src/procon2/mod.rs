//! Pro Controller 2 device communication
//!
//! This module provides the device-facing core:
//! - USB/HID transport management and the firmware handshake
//! - HD Rumble report encoding
//! - Protocol constants and shared types

pub mod constants;
pub mod haptics;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use haptics::{build_haptic_report, encode_hd_rumble, preset_rumble};
pub use transport::{TransportError, TransportManager, TransportSettings};
pub use types::*;
