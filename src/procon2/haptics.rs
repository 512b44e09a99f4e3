//! HD Rumble report encoding
//!
//! Pure functions converting a haptic intent (tone, raw pattern, or stop)
//! into the fixed 64-byte output report the Pro Controller 2 firmware
//! expects. No I/O and no internal state; all inputs are clamped or
//! defaulted rather than rejected.

use log::debug;

use crate::procon2::constants::{
    HAPTIC_REPORT_LEN, HD_RUMBLE_FREQ_MAX, HD_RUMBLE_FREQ_MIN, HD_RUMBLE_STOP, REPORT_ID_HAPTIC,
};
use crate::procon2::types::HapticInput;

/// Encode a (frequency, amplitude) pair into the 4-byte per-motor value.
///
/// Frequency is clamped to the actuator range, amplitude to [0, 1].
/// Amplitude follows a logarithmic curve; the firmware's loudness
/// response is perceptual, and a linear mapping does not match observed
/// behavior.
pub fn encode_hd_rumble(frequency: f32, amplitude: f32) -> [u8; 4] {
    let freq = frequency.clamp(HD_RUMBLE_FREQ_MIN, HD_RUMBLE_FREQ_MAX);
    let amp = amplitude.clamp(0.0, 1.0);

    let freq_norm = (freq - HD_RUMBLE_FREQ_MIN) / (HD_RUMBLE_FREQ_MAX - HD_RUMBLE_FREQ_MIN);
    let hf_b0 = (freq_norm * 0x60 as f32).round() as u8;

    if amp == 0.0 {
        // Fixed stop pair; the frequency byte is still meaningful so a
        // later non-zero amplitude resumes at the same pitch.
        return [hf_b0, 0x01, 0x40, 0x40];
    }

    let amp_curve = (amp * 100.0 + 1.0).log2() / 101f32.log2();
    let amp_byte = (0x64 as f32 + (amp_curve * (0xFF - 0x64) as f32).round()).min(255.0) as u8;
    let freq_byte = (0x40 as f32 + (freq_norm * 0x60 as f32).round()).min(255.0) as u8;

    [hf_b0, 0x01, amp_byte, freq_byte]
}

/// Resolve a haptic intent into per-motor 4-byte patterns.
fn resolve_channels(input: &HapticInput) -> ([u8; 4], [u8; 4]) {
    match input {
        HapticInput::Raw(bytes) if bytes.len() >= 4 => {
            let mut left = [0u8; 4];
            left.copy_from_slice(&bytes[0..4]);
            let right = if bytes.len() >= 8 {
                let mut right = [0u8; 4];
                right.copy_from_slice(&bytes[4..8]);
                right
            } else {
                left
            };
            (left, right)
        }
        HapticInput::Raw(bytes) => {
            debug!("Raw haptic pattern too short ({} bytes), motors stopped", bytes.len());
            (HD_RUMBLE_STOP, HD_RUMBLE_STOP)
        }
        HapticInput::Tone { frequency, amplitude, left_amp, right_amp } => {
            let left = encode_hd_rumble(*frequency, left_amp.unwrap_or(*amplitude));
            let right = encode_hd_rumble(*frequency, right_amp.unwrap_or(*amplitude));
            (left, right)
        }
        HapticInput::Stop => (HD_RUMBLE_STOP, HD_RUMBLE_STOP),
    }
}

/// Build the 64-byte haptic output report.
///
/// Byte 0 is the haptic report ID, bytes 1 and 17 carry the rolling
/// 4-bit sequence counter folded into a fixed high nibble, and each
/// motor's 4-byte value appears twice (offsets 2/18 and 6/22). The
/// duplication is a firmware-compatibility requirement and must not be
/// collapsed.
pub fn build_haptic_report(input: &HapticInput, counter: u8) -> [u8; HAPTIC_REPORT_LEN] {
    let (left, right) = resolve_channels(input);
    let seq = 0x50 | (counter & 0x0F);

    let mut report = [0u8; HAPTIC_REPORT_LEN];
    report[0] = REPORT_ID_HAPTIC;
    report[1] = seq;
    report[2..6].copy_from_slice(&left);
    report[6..10].copy_from_slice(&right);
    report[17] = seq;
    report[18..22].copy_from_slice(&left);
    report[22..26].copy_from_slice(&right);
    report
}

/// Look up a named 4-byte preset pattern.
///
/// Unknown names fall back to `off`; this is a convenience for UI code
/// driving quick tests, and a misspelled name stopping the motors is the
/// safe outcome.
pub fn preset_rumble(name: &str) -> [u8; 4] {
    match name {
        "off" => HD_RUMBLE_STOP,
        "weak" => encode_hd_rumble(160.0, 0.3),
        "medium" => encode_hd_rumble(160.0, 0.6),
        "strong" => encode_hd_rumble(160.0, 1.0),
        "piano-low" => encode_hd_rumble(110.0, 0.8),
        "piano-mid" => encode_hd_rumble(440.0, 0.6),
        "piano-high" => encode_hd_rumble(880.0, 0.5),
        // Raw patterns kept from early bring-up; useful as known-good
        // firmware test signals.
        "legacy-buzz" => [0x20, 0x01, 0x80, 0x60],
        "legacy-pulse" => [0x30, 0x01, 0xA0, 0x70],
        "test-max" => [0x60, 0x01, 0xFF, 0xFF],
        other => {
            debug!("Unknown rumble preset '{}', using 'off'", other);
            HD_RUMBLE_STOP
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_clamps_to_actuator_range() {
        assert_eq!(encode_hd_rumble(0.0, 0.5), encode_hd_rumble(HD_RUMBLE_FREQ_MIN, 0.5));
        assert_eq!(encode_hd_rumble(-20.0, 0.5), encode_hd_rumble(HD_RUMBLE_FREQ_MIN, 0.5));
        assert_eq!(encode_hd_rumble(10_000.0, 0.5), encode_hd_rumble(HD_RUMBLE_FREQ_MAX, 0.5));
    }

    #[test]
    fn zero_amplitude_emits_stop_pair() {
        for freq in [0.0, 81.75, 440.0, 1252.27, 9999.0] {
            let encoded = encode_hd_rumble(freq, 0.0);
            assert_eq!(&encoded[2..4], &[0x40, 0x40], "freq {freq}");
        }
    }

    #[test]
    fn amplitude_clamps_to_unit_range() {
        assert_eq!(encode_hd_rumble(440.0, 1.5), encode_hd_rumble(440.0, 1.0));
        assert_eq!(encode_hd_rumble(440.0, -0.5), encode_hd_rumble(440.0, 0.0));
    }

    #[test]
    fn amplitude_curve_is_monotonic() {
        let low = encode_hd_rumble(320.0, 0.1)[2];
        let mid = encode_hd_rumble(320.0, 0.5)[2];
        let high = encode_hd_rumble(320.0, 1.0)[2];
        assert!(low < mid && mid < high);
        assert_eq!(high, 0xFF);
    }

    #[test]
    fn frequency_byte_stays_in_range() {
        let min = encode_hd_rumble(HD_RUMBLE_FREQ_MIN, 0.5);
        let max = encode_hd_rumble(HD_RUMBLE_FREQ_MAX, 0.5);
        assert_eq!(min[0], 0x00);
        assert_eq!(max[0], 0x60);
    }

    fn assert_report_invariants(report: &[u8; HAPTIC_REPORT_LEN]) {
        assert_eq!(report[0], REPORT_ID_HAPTIC);
        assert_eq!(report[1], report[17]);
        assert_eq!(&report[2..6], &report[18..22]);
        assert_eq!(&report[6..10], &report[22..26]);
        // Everything outside the defined fields stays zero
        assert!(report[10..17].iter().all(|&b| b == 0));
        assert!(report[26..].iter().all(|&b| b == 0));
    }

    #[test]
    fn report_invariants_hold_for_every_input_variant() {
        let raw = HapticInput::Raw(vec![0x10, 0x01, 0x70, 0x50, 0x20, 0x01, 0x90, 0x58]);
        let tone = HapticInput::tone(440.0, 0.7);
        let split = HapticInput::Tone {
            frequency: 220.0,
            amplitude: 0.5,
            left_amp: Some(0.9),
            right_amp: Some(0.1),
        };

        for input in [&raw, &tone, &split, &HapticInput::Stop] {
            let report = build_haptic_report(input, 3);
            assert_report_invariants(&report);
        }
    }

    #[test]
    fn raw_pattern_is_split_across_motors() {
        let input = HapticInput::Raw(vec![0x10, 0x01, 0x70, 0x50, 0x20, 0x01, 0x90, 0x58]);
        let report = build_haptic_report(&input, 0);
        assert_eq!(&report[2..6], &[0x10, 0x01, 0x70, 0x50]);
        assert_eq!(&report[6..10], &[0x20, 0x01, 0x90, 0x58]);
    }

    #[test]
    fn short_raw_pattern_drives_both_motors() {
        let input = HapticInput::Raw(vec![0x10, 0x01, 0x70, 0x50]);
        let report = build_haptic_report(&input, 0);
        assert_eq!(&report[2..6], &report[6..10]);
    }

    #[test]
    fn undersized_raw_pattern_falls_back_to_stop() {
        let input = HapticInput::Raw(vec![0x10, 0x01]);
        let report = build_haptic_report(&input, 0);
        assert_eq!(&report[2..6], &HD_RUMBLE_STOP);
        assert_eq!(&report[6..10], &HD_RUMBLE_STOP);
    }

    #[test]
    fn stop_input_uses_stop_pattern() {
        let report = build_haptic_report(&HapticInput::Stop, 5);
        assert_eq!(&report[2..6], &[0x00, 0x01, 0x40, 0x40]);
        assert_eq!(&report[6..10], &[0x00, 0x01, 0x40, 0x40]);
    }

    #[test]
    fn counter_folds_through_low_nibble() {
        let a = build_haptic_report(&HapticInput::Stop, 17);
        let b = build_haptic_report(&HapticInput::Stop, 1);
        assert_eq!(a[1], 0x51);
        assert_eq!(a[1], b[1]);
        assert_eq!(build_haptic_report(&HapticInput::Stop, 0x1F)[1], 0x5F);
    }

    #[test]
    fn per_channel_amplitude_overrides_apply() {
        let input = HapticInput::Tone {
            frequency: 440.0,
            amplitude: 0.5,
            left_amp: Some(1.0),
            right_amp: None,
        };
        let report = build_haptic_report(&input, 0);
        assert_eq!(&report[2..6], &encode_hd_rumble(440.0, 1.0));
        assert_eq!(&report[6..10], &encode_hd_rumble(440.0, 0.5));
    }

    #[test]
    fn unknown_preset_falls_back_to_off() {
        assert_eq!(preset_rumble("nonexistent-name"), preset_rumble("off"));
        assert_eq!(preset_rumble("off"), [0x00, 0x01, 0x40, 0x40]);
    }

    #[test]
    fn named_presets_are_plausible_patterns() {
        for name in ["weak", "medium", "strong", "piano-low", "piano-mid", "piano-high"] {
            let pattern = preset_rumble(name);
            assert_eq!(pattern[1], 0x01, "{name}");
            assert!(pattern[2] >= 0x64, "{name} amplitude byte");
        }
    }
}
