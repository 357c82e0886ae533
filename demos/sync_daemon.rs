//! Runs the sync service against the real audio system.
//!
//! Logs to the per-user log file and to the terminal. Type commands on stdin
//! to drive it the way a tray menu would.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example sync_daemon
//! ```
//!
//! Commands: `l` list devices, `t` toggle sync, a number to pick that device,
//! `q` (or Ctrl-C) to quit.

use comm_sync::{
    default_backend, default_log_path, FileLogSink, MenuSnapshot, SyncService, TracingLogSink,
};
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_menu(menu: &MenuSnapshot) {
    println!();
    println!(
        "Sync: {}",
        if menu.sync_enabled { "on" } else { "off" }
    );
    println!("------------------------");
    if menu.is_empty() {
        println!("  (no output devices)");
    }
    for (i, device) in menu.devices.iter().enumerate() {
        let mark = if device.is_comm_default { "*" } else { " " };
        println!("  {mark} {}. {}", i + 1, device.endpoint.display_name);
    }
    if !menu.devices_selectable() {
        println!("  (picks last until the next console change while sync is on)");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let backend = default_backend()?;
    println!("Backend: {}", backend.name());

    let mut builder = SyncService::builder()
        .backend(backend)
        .add_log_sink(TracingLogSink);
    if let Some(path) = default_log_path() {
        println!("Log file: {}", path.display());
        builder = builder.add_log_sink(FileLogSink::open(path)?);
    }
    let service = builder.start().await?;

    if !service.is_live() {
        println!("Device notifications unavailable; manual picks only.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut menu = service.menu_snapshot().await?;
    print_menu(&menu);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "q" => break,
                    "t" => service.toggle_sync()?,
                    "l" | "" => {}
                    other => match other.parse::<usize>() {
                        Ok(n) if n > 0 => match menu.select(n - 1) {
                            Some(pick) => service.submit(pick)?,
                            None => println!("No device {n}"),
                        },
                        _ => println!("Unknown command: {other}"),
                    },
                }
                menu = service.menu_snapshot().await?;
                print_menu(&menu);
            }
        }
    }

    service.stop().await?;
    Ok(())
}
