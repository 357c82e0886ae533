//! Scripted session against the mock backend.
//!
//! Plays a headset plug-in, a toggle, a manual pick and a failed switch, and
//! prints the activity log as it happens. No audio hardware is touched.
//!
//! Run with: cargo run --example mock_session

use std::sync::Arc;

use comm_sync::{ChannelLogSink, DataFlow, MockBackend, Role, SyncService};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "comm_sync=debug".into()),
        )
        .init();

    let mock = Arc::new(
        MockBackend::new()
            .with_device("{0.0.0}.{speakers}", "Speakers (Realtek Audio)")
            .with_device("{0.0.0}.{headset}", "Headset (USB Audio)")
            .with_unnamed_device("{0.0.0}.{hdmi}"),
    );
    mock.set_default(Role::Console, "{0.0.0}.{speakers}");
    mock.set_default(Role::Communications, "{0.0.0}.{speakers}");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("log: {line}");
        }
    });

    let service = SyncService::builder()
        .backend(mock.clone())
        .add_log_sink(ChannelLogSink::new(tx))
        .start()
        .await?;

    println!("== headset plugged in");
    // Notifications arrive on a thread the OS owns
    let os_thread = {
        let mock = mock.clone();
        std::thread::spawn(move || {
            mock.fire_default_changed(DataFlow::Render, Role::Console, Some("{0.0.0}.{headset}"));
            // Ignored: wrong role
            mock.fire_default_changed(DataFlow::Render, Role::Multimedia, Some("{0.0.0}.{hdmi}"));
        })
    };
    if os_thread.join().is_err() {
        return Err("notification thread panicked".into());
    }
    service.routing_state().await?;

    println!("== sync off, manual pick from the menu");
    service.toggle_sync()?;
    let menu = service.menu_snapshot().await?;
    for (index, device) in menu.devices.iter().enumerate() {
        let mark = if device.is_comm_default { "*" } else { " " };
        println!("  {mark} {index}. {}", device.endpoint.display_name);
    }
    if let Some(pick) = menu.select(2) {
        service.submit(pick)?;
    }

    println!("== console change while sync is off");
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some("{0.0.0}.{speakers}"));

    println!("== sync back on, switch rejected by the OS");
    service.toggle_sync()?;
    mock.fail_set_default(Some(0x8007_0005_u32 as i32));
    mock.fire_default_changed(DataFlow::Render, Role::Console, Some("{0.0.0}.{headset}"));

    let state = service.routing_state().await?;
    println!("final state: {state:?}");
    println!("set calls: {:?}", mock.set_calls());

    service.stop().await?;
    printer.await?;
    Ok(())
}
