use anyhow::Result;
use std::time::Duration;
use stratus_services::AlertEvent;
use tokio::sync::broadcast::error::RecvError;

use crate::app::App;
use crate::cli::WatchArgs;

pub async fn run(app: &App, args: WatchArgs) -> Result<()> {
    let scheduler = app.scheduler();
    let mut events = scheduler.subscribe();

    let restored = scheduler.rehydrate().await?;
    println!(
        "Watching {} alert(s). Press Ctrl-C to stop.",
        restored
    );

    let mut refresh = tokio::time::interval(Duration::from_secs(args.refresh_secs.max(1)));
    refresh.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                if scheduler.alarm().stop() {
                    println!("Alarm stopped.");
                }
                break;
            }
            _ = refresh.tick() => {
                if let Err(e) = scheduler.sync().await {
                    tracing::warn!("Alert sync failed: {:#}", e);
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => tracing::debug!("Missed {} alert events", n),
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn print_event(event: &AlertEvent) {
    match event {
        AlertEvent::Scheduled { alert_id, delay } => {
            println!("⏳ {} scheduled in {}s", alert_id, delay.as_secs())
        }
        AlertEvent::Skipped { alert_id, reason } => println!("⏭ {} skipped: {}", alert_id, reason),
        AlertEvent::Cancelled { alert_id } => println!("✖ {} cancelled", alert_id),
        AlertEvent::Fired {
            alert_id, alarm, ..
        } => {
            println!("🔔 {} fired", alert_id);
            if *alarm {
                println!("   Alarm ringing. Stop it with `stratus alert stop {}`.", alert_id);
            }
        }
        AlertEvent::AlarmStopped { alert_id } => println!("🔕 {} alarm stopped", alert_id),
    }
}
