//! procon2-rs: Nintendo Switch Pro Controller 2 transport and haptics
//!
//! This library talks to the Switch 2 controller family (Joy-Con 2,
//! Pro Controller 2, GameCube-style) over USB and HID: it negotiates the
//! connections, runs the vendor initialization handshake, and encodes
//! HD Rumble haptic reports.

pub mod backend;
pub mod config;
pub mod device_cache;
pub mod procon2;

// Re-export commonly used items
pub use backend::{HidApiBackend, HidBackend, MockHidBackend, MockUsbBackend, NusbBackend, UsbBackend};
pub use config::Config;
pub use device_cache::DeviceCache;
pub use procon2::{
    build_haptic_report, encode_hd_rumble, preset_rumble, DeviceStatus, HapticInput, Transport,
    TransportError, TransportManager, TransportSettings, TransportState, UsbTransferOutcome,
};
