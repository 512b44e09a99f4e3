//! Pro Controller 2 haptic demo
//!
//! Connects to a Switch 2 family controller over HID and USB, runs the
//! firmware handshake, then plays a short preset sweep on the rumble
//! actuators.
//!
//! ⚠️  Requires a controller plugged in over USB (or paired over HID).

use std::time::Duration;

use anyhow::Context;
use log::warn;
use procon2_rs::{Config, HapticInput, TransportManager};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Pro Controller 2 Haptic Demo ===");
    println!();
    println!("This application will:");
    println!("1. Look for a Switch 2 family controller (USB and HID)");
    println!("2. Run the USB initialization handshake");
    println!("3. Play a short rumble sweep over HID");
    println!();

    let config = Config::load_default()?;

    let mut manager = TransportManager::new_native();
    manager.enable_cache();

    let status = manager
        .connect()
        .await
        .context("no controller reachable over USB or HID")?;
    println!(
        "Connected (USB: {}, HID: {}, haptics: {})",
        status.usb_connected, status.hid_connected, status.can_send_haptic
    );

    if status.usb_connected && config.transport.player_led != 1 {
        manager.set_player_led(config.transport.player_led).await?;
    }

    if status.can_send_haptic {
        let mut counter: u8 = 0;

        // Preset sweep
        for name in ["weak", "medium", "strong", config.haptics.default_preset.as_str()] {
            println!("Playing preset '{name}'...");
            let pattern = procon2_rs::preset_rumble(name);
            let mut raw = pattern.to_vec();
            raw.extend_from_slice(&pattern);
            manager.send_haptic(&HapticInput::Raw(raw), counter).await?;
            counter = counter.wrapping_add(1);
            sleep(Duration::from_millis(400)).await;
        }

        // Configured tone
        println!(
            "Playing tone ({} Hz, amplitude {})...",
            config.haptics.frequency, config.haptics.amplitude
        );
        let tone = HapticInput::tone(config.haptics.frequency, config.haptics.amplitude);
        manager.send_haptic(&tone, counter).await?;
        counter = counter.wrapping_add(1);
        sleep(Duration::from_millis(600)).await;

        manager.send_haptic(&HapticInput::Stop, counter).await?;
    } else {
        warn!("HID transport unavailable, skipping haptic sweep");
    }

    manager.disconnect().await;
    println!("Done.");
    Ok(())
}
