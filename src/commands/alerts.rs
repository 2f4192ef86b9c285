use anyhow::Result;
use chrono::Local;
use stratus_services::{AlarmStyle, ScheduleOutcome};

use crate::app::App;
use crate::cli::{parse_time, AlertCommand};
use crate::render;

pub async fn run(app: &App, cmd: AlertCommand) -> Result<()> {
    let scheduler = app.scheduler();
    match cmd {
        AlertCommand::List => {
            let alerts = app.repository().alerts().await?;
            if alerts.is_empty() {
                println!("No alerts.");
            }
            for alert in &alerts {
                println!("{}", render::alert_line(alert));
            }
        }
        AlertCommand::Add { from, to, style } => {
            let now = Local::now();
            let from = parse_time(&from, &now)?;
            let to = parse_time(&to, &now)?;
            let style = AlarmStyle::from(style);
            let (alert, outcome) = scheduler.create(style, from, to).await?;
            println!("Created {}", render::alert_line(&alert));
            report(outcome);
        }
        AlertCommand::Stop { id } => {
            if scheduler.stop(&id).await? {
                println!("Stopped alert {}", id);
            } else {
                println!("No alert with id {}", id);
            }
        }
        AlertCommand::Snooze { id } => match scheduler.snooze(&id).await? {
            Some((alert, outcome)) => {
                println!("Snoozed as {}", render::alert_line(&alert));
                report(outcome);
            }
            None => println!("No alert with id {}", id),
        },
        AlertCommand::Delete { id } => {
            if scheduler.delete(&id).await? {
                println!("Deleted alert {}", id);
            } else {
                println!("No alert with id {}", id);
            }
        }
    }
    Ok(())
}

fn report(outcome: ScheduleOutcome) {
    match outcome {
        ScheduleOutcome::Scheduled { delay, .. } => println!(
            "Fires in {} min while `stratus watch` is running.",
            delay.as_secs().div_ceil(60)
        ),
        ScheduleOutcome::Skipped(reason) => println!("Not scheduled: {}.", reason),
    }
}
