//! Integration tests for comm-sync.
//!
//! Everything here runs against `MockBackend`. Tests that need the real audio
//! system are marked with `#[ignore]` and should be run manually.

use std::sync::Arc;
use std::time::Duration;

use comm_sync::{
    ChannelLogSink, DataFlow, DomainEvent, EndpointBackend, EndpointError, FileLogSink,
    MockBackend, Role, SyncConfig, SyncOutcome, SyncService,
};
use tokio::sync::mpsc;

const SPEAKERS: &str = "{0.0.0.00000000}.{speakers}";
const HEADSET: &str = "{0.0.0.00000000}.{headset}";
const HDMI: &str = "{0.0.0.00000000}.{hdmi}";

fn mock() -> Arc<MockBackend> {
    let mock = MockBackend::new()
        .with_device(SPEAKERS, "Speakers")
        .with_device(HEADSET, "Headset")
        .with_unnamed_device(HDMI);
    mock.set_default(Role::Console, SPEAKERS);
    mock.set_default(Role::Communications, SPEAKERS);
    Arc::new(mock)
}

async fn start(mock: &Arc<MockBackend>) -> (SyncService, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let service = SyncService::builder()
        .backend(mock.clone())
        .add_log_sink(ChannelLogSink::new(tx))
        .start()
        .await
        .unwrap();
    (service, rx)
}

/// Waits for the queue to drain, then returns every line logged so far.
async fn settle(service: &SyncService, rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    service.routing_state().await.unwrap();
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

fn comm_default(mock: &MockBackend) -> Option<String> {
    mock.default_endpoint(DataFlow::Render, Role::Communications)
        .unwrap()
}

#[tokio::test]
async fn test_console_change_is_mirrored() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    assert_eq!(
        mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET)),
        1
    );

    let lines = settle(&service, &mut rx).await;
    assert_eq!(
        lines,
        vec![
            "Default output changed → Headset".to_string(),
            "Synced communication device → Headset".to_string(),
        ]
    );
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));
    assert_eq!(mock.set_calls(), vec![(HEADSET.to_string(), Role::Communications)]);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_other_flows_and_roles_are_ignored() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    mock.fire_default_changed(DataFlow::Render, Role::Multimedia, Some(HEADSET));
    mock.fire_default_changed(DataFlow::Render, Role::Communications, Some(HEADSET));
    mock.fire_default_changed(DataFlow::Capture, Role::Console, Some(HEADSET));
    mock.fire_default_changed(DataFlow::Render, Role::Console, None);

    assert!(settle(&service, &mut rx).await.is_empty());
    assert!(mock.set_calls().is_empty());
    assert_eq!(service.routing_state().await.unwrap().last_applied_comm_device_id, None);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_toggle_off_skips_then_on_resumes() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    service.toggle_sync().unwrap();
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET));
    let lines = settle(&service, &mut rx).await;
    assert_eq!(
        lines,
        vec![
            "Sync disabled".to_string(),
            "Default output changed → Headset".to_string(),
            "Sync disabled, skipping communication device update".to_string(),
        ]
    );
    assert!(mock.set_calls().is_empty());
    assert_eq!(comm_default(&mock).as_deref(), Some(SPEAKERS));

    // Re-enabling does not retroactively apply the skipped change
    service.toggle_sync().unwrap();
    assert_eq!(settle(&service, &mut rx).await, vec!["Sync enabled".to_string()]);
    assert!(mock.set_calls().is_empty());

    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(SPEAKERS));
    settle(&service, &mut rx).await;
    assert_eq!(mock.set_calls(), vec![(SPEAKERS.to_string(), Role::Communications)]);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_manual_pick_holds_until_next_console_change() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    service.set_comm_device(HEADSET).unwrap();
    let lines = settle(&service, &mut rx).await;
    assert_eq!(lines, vec!["Manually set communication device → Headset".to_string()]);
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));

    // Sync is still on, so the next console change overrides the pick
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HDMI));
    let lines = settle(&service, &mut rx).await;
    assert_eq!(lines.last().unwrap(), &format!("Synced communication device → {HDMI}"));
    assert_eq!(comm_default(&mock).as_deref(), Some(HDMI));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_manual_pick_works_with_sync_off() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;

    service.toggle_sync().unwrap();
    service.set_comm_device(HEADSET).unwrap();
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HDMI));
    settle(&service, &mut rx).await;

    let state = service.routing_state().await.unwrap();
    assert!(!state.sync_enabled);
    assert_eq!(state.last_applied_comm_device_id.as_deref(), Some(HEADSET));
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_failed_switch_keeps_state_and_service_running() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    service.set_comm_device(HEADSET).unwrap();
    settle(&service, &mut rx).await;

    mock.fail_set_default(Some(0x8007_0005_u32 as i32));
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HDMI));
    service.set_comm_device(SPEAKERS).unwrap();
    let lines = settle(&service, &mut rx).await;

    assert_eq!(
        lines,
        vec![
            format!("Default output changed → {HDMI}"),
            "SetDefaultEndpoint failed (HRESULT 0x80070005)".to_string(),
            "Failed to set communication device (HRESULT 0x80070005)".to_string(),
        ]
    );
    let state = service.routing_state().await.unwrap();
    assert_eq!(state.last_applied_comm_device_id.as_deref(), Some(HEADSET));
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));

    // Still processing after failures
    mock.fail_set_default(None);
    service.set_comm_device(SPEAKERS).unwrap();
    settle(&service, &mut rx).await;
    assert_eq!(comm_default(&mock).as_deref(), Some(SPEAKERS));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_apply_returns_outcome_to_caller() {
    let mock = mock();
    let (service, _rx) = start(&mock).await;

    assert_eq!(
        service.apply(DomainEvent::manual_set(HEADSET)).await.unwrap(),
        SyncOutcome::Applied {
            device_id: HEADSET.to_string()
        }
    );

    mock.fail_set_default(Some(0x8007_0005_u32 as i32));
    let outcome = service.apply(DomainEvent::manual_set(HDMI)).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Failed { ref error, .. } if error.code() == Some(0x8007_0005_u32 as i32)));
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_repeated_console_change_reapplies() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;

    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET));
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET));
    settle(&service, &mut rx).await;

    assert_eq!(mock.set_calls().len(), 2);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_device_falls_back_to_id() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    mock.fire_default_changed(DataFlow::Render, Role::Console, Some("{gone}"));
    let lines = settle(&service, &mut rx).await;
    assert_eq!(lines[0], "Default output changed → {gone}");

    service.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sources_never_overlap() {
    let mock = mock();
    mock.set_call_delay(Duration::from_millis(2));
    let (service, mut rx) = start(&mock).await;

    // Foreign threads stand in for the OS notification thread
    let notifiers: Vec<_> = (0..4)
        .map(|i| {
            let mock = mock.clone();
            std::thread::spawn(move || {
                for n in 0..10 {
                    let id = if (i + n) % 2 == 0 { HEADSET } else { SPEAKERS };
                    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(id));
                }
            })
        })
        .collect();

    for _ in 0..10 {
        service.set_comm_device(HDMI).unwrap();
        tokio::task::yield_now().await;
    }
    for notifier in notifiers {
        notifier.join().unwrap();
    }

    settle(&service, &mut rx).await;
    assert_eq!(mock.set_calls().len(), 50);
    assert_eq!(mock.max_concurrent_set_calls(), 1);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_menu_snapshot_and_select() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;

    let menu = service.menu_snapshot().await.unwrap();
    assert!(menu.sync_enabled);
    assert!(!menu.devices_selectable());
    assert_eq!(menu.comm_device_id.as_deref(), Some(SPEAKERS));

    let names: Vec<_> = menu
        .devices
        .iter()
        .map(|d| d.endpoint.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Speakers", "Headset", HDMI]);
    assert!(menu.devices[0].is_comm_default);

    // The device list changes after the snapshot; the pick still carries
    // the id the operator saw
    mock.remove_device(SPEAKERS);
    let pick = menu.select(1).unwrap();
    assert_eq!(pick, DomainEvent::manual_set(HEADSET));
    service.submit(pick).unwrap();
    settle(&service, &mut rx).await;
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));

    service.toggle_sync().unwrap();
    let menu = service.menu_snapshot().await.unwrap();
    assert!(menu.devices_selectable());
    assert_eq!(menu.devices.len(), 2);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_menu_snapshot_survives_enumeration_failure() {
    let mock = mock();
    mock.fail_enumeration(Some(EndpointError::os("EnumAudioEndpoints", -1)));
    let (service, _rx) = start(&mock).await;

    let menu = service.menu_snapshot().await.unwrap();
    assert!(menu.is_empty());
    assert_eq!(menu.select(0), None);

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_degraded_mode_accepts_commands() {
    let mock = mock();
    mock.fail_registration(Some(EndpointError::os(
        "RegisterEndpointNotificationCallback",
        0x8000_4005_u32 as i32,
    )));
    let (service, mut rx) = start(&mock).await;

    assert!(!service.is_live());
    let lines = settle(&service, &mut rx).await;
    assert_eq!(lines[0], "AudioSync started");
    assert!(lines[1].starts_with("Failed to register for device notifications"));

    // Nobody is listening
    assert_eq!(
        mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET)),
        0
    );

    service.set_comm_device(HDMI).unwrap();
    settle(&service, &mut rx).await;
    assert_eq!(comm_default(&mock).as_deref(), Some(HDMI));

    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_unregisters_before_draining() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    let commands = service.commands();

    service.set_comm_device(HEADSET).unwrap();
    service.stop().await.unwrap();

    assert!(!mock.is_registered());
    assert_eq!(
        mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HDMI)),
        0
    );
    // The queued pick was applied before the serializer exited
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));
    assert!(commands.is_closed());
    assert!(commands.toggle_sync().is_err());

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    assert_eq!(lines.last().unwrap(), "AudioSync stopped");
}

#[tokio::test]
async fn test_unregister_failure_is_logged_and_stop_completes() {
    let mock = mock();
    let (service, mut rx) = start(&mock).await;
    settle(&service, &mut rx).await;

    mock.fail_unregistration(Some(EndpointError::os(
        "UnregisterEndpointNotificationCallback",
        0x8000_4005_u32 as i32,
    )));
    service.set_comm_device(HEADSET).unwrap();
    service.stop().await.unwrap();

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    assert_eq!(
        lines,
        vec![
            "Failed to unregister device notifications: \
             UnregisterEndpointNotificationCallback failed (HRESULT 0x80004005)"
                .to_string(),
            "Manually set communication device → Headset".to_string(),
            "AudioSync stopped".to_string(),
        ]
    );
    assert_eq!(comm_default(&mock).as_deref(), Some(HEADSET));
}

#[tokio::test]
async fn test_drop_unregisters() {
    let mock = mock();
    let (service, _rx) = start(&mock).await;
    assert!(mock.is_registered());

    drop(service);
    assert!(!mock.is_registered());
}

#[tokio::test]
async fn test_file_log_sink_records_activity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AudioSync").join("log.txt");

    let mock = mock();
    let service = SyncService::builder()
        .backend(mock.clone())
        .add_log_sink(FileLogSink::open(&path).unwrap())
        .with_config(SyncConfig::default())
        .start()
        .await
        .unwrap();

    mock.fire_default_changed(DataFlow::Render, Role::Console, Some(HEADSET));
    service.stop().await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] AudioSync started"));
    assert!(lines[1].ends_with("] Default output changed → Headset"));
    assert!(lines[2].ends_with("] Synced communication device → Headset"));
    assert!(lines[3].ends_with("] AudioSync stopped"));
}

#[tokio::test]
#[ignore = "requires audio hardware"]
async fn test_default_backend_lists_outputs() {
    let backend = comm_sync::default_backend().unwrap();
    let outputs = backend.active_endpoints(DataFlow::Render).unwrap();
    assert!(!outputs.is_empty());
}
