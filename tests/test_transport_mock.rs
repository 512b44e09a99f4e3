//! Integration tests for the transport manager over the mock backends.

use std::time::Duration;

use procon2_rs::backend::{MockHidBackend, MockUsbBackend};
use procon2_rs::procon2::constants::INIT_COMMANDS;
use procon2_rs::{HapticInput, TransportError, TransportManager, TransportSettings, TransportState};

fn fast_settings() -> TransportSettings {
    TransportSettings {
        command_delay: Duration::from_millis(1),
        read_delay: Duration::from_millis(1),
        read_len: 32,
    }
}

fn manager(usb: MockUsbBackend, hid: MockHidBackend) -> TransportManager<MockUsbBackend, MockHidBackend> {
    TransportManager::with_settings(usb, hid, fast_settings())
}

#[test]
fn fresh_manager_reports_all_disconnected() {
    let m = manager(MockUsbBackend::new(), MockHidBackend::new());
    let status = m.device_status();
    assert!(!status.usb_connected);
    assert!(!status.hid_connected);
    assert!(!status.can_send_haptic);
    assert_eq!(m.usb_state(), TransportState::Disconnected);
    assert_eq!(m.hid_state(), TransportState::Disconnected);
}

#[tokio::test]
async fn usb_connect_runs_handshake_in_order() {
    let usb = MockUsbBackend::new();
    let writes = usb.writes();
    let mut m = manager(usb, MockHidBackend::new());

    m.connect_usb().await.expect("connect_usb should succeed");

    let recorded = writes.lock().unwrap();
    assert_eq!(recorded.len(), INIT_COMMANDS.len());
    for (written, expected) in recorded.iter().zip(INIT_COMMANDS.iter()) {
        assert_eq!(written.as_slice(), *expected);
    }
    drop(recorded);

    assert!(m.device_status().usb_connected);
    assert_eq!(m.usb_state(), TransportState::Connected);
}

#[tokio::test]
async fn usb_connect_fails_without_bulk_out_endpoint() {
    let mut usb = MockUsbBackend::new();
    usb.has_bulk_out = false;
    let mut m = manager(usb, MockHidBackend::new());

    let err = m.connect_usb().await.unwrap_err();
    assert!(matches!(err, TransportError::EndpointNotFound(1)));
    assert!(!m.device_status().usb_connected);
    assert_eq!(m.usb_state(), TransportState::Disconnected);
}

#[tokio::test]
async fn handshake_failure_keeps_usb_handle() {
    let mut usb = MockUsbBackend::new();
    usb.fail_write_after = Some(3);
    let mut m = manager(usb, MockHidBackend::new());

    let err = m.connect_usb().await.unwrap_err();
    match err {
        TransportError::HandshakeStep { index, .. } => assert_eq!(index, 4),
        other => panic!("expected HandshakeStep, got {other:?}"),
    }

    // Degraded-but-connected: raw sends stay possible without a completed
    // handshake.
    assert!(m.device_status().usb_connected);
    assert_eq!(m.usb_state(), TransportState::Connected);
}

#[tokio::test]
async fn usb_send_requires_connection() {
    let mut m = manager(MockUsbBackend::new(), MockHidBackend::new());
    let err = m.send_usb_data(&[0x01, 0x02]).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected(_)));
}

#[tokio::test]
async fn usb_send_returns_best_effort_response() {
    let mut usb = MockUsbBackend::new();
    usb.read_response = Some(vec![0xAA, 0xBB]);
    let mut m = manager(usb, MockHidBackend::new());
    m.connect_usb().await.unwrap();

    let outcome = m.send_usb_data(&[0x03, 0x91]).await.unwrap();
    assert_eq!(outcome.bytes_written, 2);
    assert_eq!(outcome.response, Some(vec![0xAA, 0xBB]));
}

#[tokio::test]
async fn usb_read_failure_is_swallowed() {
    let mut usb = MockUsbBackend::new();
    usb.read_response = None;
    let mut m = manager(usb, MockHidBackend::new());
    m.connect_usb().await.unwrap();

    let outcome = m.send_usb_data(&[0x03, 0x91]).await.unwrap();
    assert_eq!(outcome.bytes_written, 2);
    assert_eq!(outcome.response, None);
}

#[tokio::test]
async fn hid_send_requires_connection() {
    let mut m = manager(MockUsbBackend::new(), MockHidBackend::new());
    let err = m.send_hid_data(&[0x02, 0x00]).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected(_)));
}

#[tokio::test]
async fn unrecognized_report_id_is_coerced_to_haptic() {
    let hid = MockHidBackend::new();
    let reports = hid.reports();
    let mut m = manager(MockUsbBackend::new(), hid);
    m.connect_hid().await.unwrap();

    m.send_hid_data(&[0x05, 0xDE, 0xAD]).await.unwrap();

    let captured = reports.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (report_id, body) = &captured[0];
    assert_eq!(*report_id, 0x02);
    assert_eq!(body.as_slice(), &[0xDE, 0xAD]);
}

#[tokio::test]
async fn accepted_report_ids_pass_through() {
    let hid = MockHidBackend::new();
    let reports = hid.reports();
    let mut m = manager(MockUsbBackend::new(), hid);
    m.connect_hid().await.unwrap();

    for id in [0x01, 0x02, 0x10] {
        m.send_hid_data(&[id, 0x00]).await.unwrap();
    }

    let captured = reports.lock().unwrap();
    let ids: Vec<u8> = captured.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![0x01, 0x02, 0x10]);
}

#[tokio::test]
async fn permission_failures_are_classified() {
    let mut hid = MockHidBackend::new();
    hid.send_error = Some("NotAllowedError: sendReport denied".to_string());
    let mut m = manager(MockUsbBackend::new(), hid);
    m.connect_hid().await.unwrap();

    let err = m.send_hid_data(&[0x02, 0x00]).await.unwrap_err();
    match err {
        TransportError::PermissionDenied(msg) => assert!(msg.contains("NotAllowedError")),
        other => panic!("expected PermissionDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn disconnection_failures_are_classified() {
    let mut hid = MockHidBackend::new();
    hid.send_error = Some("NetworkError: device disconnected".to_string());
    let mut m = manager(MockUsbBackend::new(), hid);
    m.connect_hid().await.unwrap();

    let err = m.send_hid_data(&[0x02, 0x00]).await.unwrap_err();
    assert!(matches!(err, TransportError::Disconnected(_)));
}

#[tokio::test]
async fn connect_succeeds_with_one_transport() {
    let mut usb = MockUsbBackend::new();
    usb.fail_request = true;
    let mut m = manager(usb, MockHidBackend::new());

    let status = m.connect().await.expect("HID alone should be enough");
    assert!(!status.usb_connected);
    assert!(status.hid_connected);
    assert!(status.can_send_haptic);
}

#[tokio::test]
async fn connect_fails_when_both_transports_fail() {
    let mut usb = MockUsbBackend::new();
    usb.fail_request = true;
    let mut hid = MockHidBackend::new();
    hid.fail_request = true;
    let mut m = manager(usb, hid);

    let err = m.connect().await.unwrap_err();
    assert!(matches!(err, TransportError::NoTransportAvailable));
}

#[tokio::test]
async fn disconnect_clears_handles_even_when_close_fails() {
    let mut usb = MockUsbBackend::new();
    usb.fail_close = true;
    let mut hid = MockHidBackend::new();
    hid.fail_close = true;
    let mut m = manager(usb, hid);

    m.connect().await.unwrap();
    assert!(m.device_status().usb_connected);
    assert!(m.device_status().hid_connected);

    m.disconnect().await;

    let status = m.device_status();
    assert!(!status.usb_connected);
    assert!(!status.hid_connected);
    assert!(!status.can_send_haptic);
    assert_eq!(m.usb_state(), TransportState::Disconnected);
    assert_eq!(m.hid_state(), TransportState::Disconnected);
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let mut m = manager(MockUsbBackend::new(), MockHidBackend::new());
    m.disconnect().await;
    m.disconnect().await;
    assert!(!m.device_status().usb_connected);
}

#[tokio::test]
async fn set_player_led_sends_bitmask_over_usb() {
    let usb = MockUsbBackend::new();
    let writes = usb.writes();
    let mut m = manager(usb, MockHidBackend::new());
    m.connect_usb().await.unwrap();

    m.set_player_led(3).await.unwrap();

    let recorded = writes.lock().unwrap();
    let led_command = recorded.last().unwrap();
    assert_eq!(led_command[0], 0x09);
    assert_eq!(led_command[8], 0b100);
}

#[tokio::test]
async fn send_haptic_frames_a_full_report() {
    let hid = MockHidBackend::new();
    let reports = hid.reports();
    let mut m = manager(MockUsbBackend::new(), hid);
    m.connect_hid().await.unwrap();

    m.send_haptic(&HapticInput::tone(440.0, 0.8), 7).await.unwrap();

    let captured = reports.lock().unwrap();
    let (report_id, body) = &captured[0];
    assert_eq!(*report_id, 0x02);
    // 64-byte report minus the report ID byte on the wire
    assert_eq!(body.len(), 63);
    assert_eq!(body[0], 0x57);
    assert_eq!(body[16], 0x57);
}
