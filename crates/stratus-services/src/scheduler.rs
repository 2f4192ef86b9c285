//! Alert scheduling.
//!
//! Each alert id maps to at most one pending job. Scheduling an id that
//! already has a job cancels the old one before the new one is inserted.
//! A job keeps its handle until firing completes, so stopping an alert
//! mid-fire still suppresses its notification and alarm.
//! Jobs are fire-and-forget: failures while firing are logged and the job
//! still counts as done.
//!
//! The id of the alert whose alarm is ringing is kept in the store. A stop
//! or delete from any process clears it, and `sync` silences a local alarm
//! whose alert no longer owns that entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use stratus_weather::WeatherQuery;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::alarm::AlarmPlayer;
use crate::model::{AlarmStyle, Alert};
use crate::notify::{Notification, Notifier};
use crate::repository::WeatherRepository;
use crate::settings::UserSettings;

const EVENT_CAPACITY: usize = 64;
const NO_DESCRIPTION: &str = "No description available";
const RINGING_ALERT_KEY: &str = "ringing_alert";

/// Why `schedule` declined to enqueue a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    Expired,
    PermissionDenied,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Inactive => "alert is inactive",
            Self::Expired => "alert window has already ended",
            Self::PermissionDenied => "notification permission not granted",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled { delay: Duration, replaced: bool },
    Skipped(SkipReason),
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }
}

/// Lifecycle events, for observers such as `watch`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    Scheduled {
        alert_id: String,
        delay: Duration,
    },
    Skipped {
        alert_id: String,
        reason: SkipReason,
    },
    Cancelled {
        alert_id: String,
    },
    Fired {
        alert_id: String,
        notified: bool,
        alarm: bool,
    },
    AlarmStopped {
        alert_id: String,
    },
}

struct JobHandle {
    job_id: u64,
    cancel: CancellationToken,
    firing: bool,
}

struct Inner {
    repository: WeatherRepository,
    notifier: Arc<dyn Notifier>,
    alarm: AlarmPlayer,
    api_key: String,
    snooze: chrono::Duration,
    jobs: Mutex<HashMap<String, JobHandle>>,
    ringing: Mutex<Option<String>>,
    next_job: AtomicU64,
    events: broadcast::Sender<AlertEvent>,
}

#[derive(Clone)]
pub struct AlertScheduler {
    inner: Arc<Inner>,
}

impl AlertScheduler {
    pub fn new(
        repository: WeatherRepository,
        notifier: Arc<dyn Notifier>,
        alarm: AlarmPlayer,
        api_key: impl Into<String>,
        snooze: chrono::Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                repository,
                notifier,
                alarm,
                api_key: api_key.into(),
                snooze,
                jobs: Mutex::new(HashMap::new()),
                ringing: Mutex::new(None),
                next_job: AtomicU64::new(1),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.inner.events.subscribe()
    }

    pub fn alarm(&self) -> &AlarmPlayer {
        &self.inner.alarm
    }

    pub fn repository(&self) -> &WeatherRepository {
        &self.inner.repository
    }

    /// True while a job for `alert_id` is pending or firing.
    pub fn is_scheduled(&self, alert_id: &str) -> bool {
        self.inner.jobs.lock().contains_key(alert_id)
    }

    pub fn scheduled_count(&self) -> usize {
        self.inner.jobs.lock().len()
    }

    /// Enqueue the job for `alert`, replacing any pending job for the same id.
    ///
    /// Inactive alerts, alerts whose window has ended, and a missing
    /// notification permission are logged and skipped.
    pub fn schedule(&self, alert: &Alert) -> ScheduleOutcome {
        self.schedule_at(alert, Utc::now())
    }

    fn schedule_at(&self, alert: &Alert, now: DateTime<Utc>) -> ScheduleOutcome {
        let skip = if !alert.is_active {
            Some(SkipReason::Inactive)
        } else if alert.is_expired(now) {
            Some(SkipReason::Expired)
        } else if !self.inner.notifier.permission_granted() {
            Some(SkipReason::PermissionDenied)
        } else {
            None
        };

        if let Some(reason) = skip {
            tracing::info!("Not scheduling alert {}: {}", alert.id, reason);
            self.inner.emit(AlertEvent::Skipped {
                alert_id: alert.id.clone(),
                reason,
            });
            return ScheduleOutcome::Skipped(reason);
        }

        let delay = alert.delay_from(now);
        let job_id = self.inner.next_job.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let replaced = {
            let mut jobs = self.inner.jobs.lock();
            let previous = jobs.insert(
                alert.id.clone(),
                JobHandle {
                    job_id,
                    cancel: cancel.clone(),
                    firing: false,
                },
            );
            match previous {
                Some(old) => {
                    old.cancel.cancel();
                    true
                }
                None => false,
            }
        };

        tracing::info!(
            "Scheduled {} alert {} in {:?}{}",
            alert.style,
            alert.id,
            delay,
            if replaced { " (replaced pending job)" } else { "" }
        );
        self.inner.emit(AlertEvent::Scheduled {
            alert_id: alert.id.clone(),
            delay,
        });

        let inner = self.inner.clone();
        let alert = alert.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Job {} for alert {} cancelled", job_id, alert.id);
                }
                _ = tokio::time::sleep(delay) => {
                    inner.begin_fire(&alert.id, job_id);
                    let fired = inner.fire(&alert, &cancel).await;
                    inner.finish(&alert.id, job_id);
                    if let Some((notified, alarm)) = fired {
                        inner.emit(AlertEvent::Fired {
                            alert_id: alert.id.clone(),
                            notified,
                            alarm,
                        });
                    }
                }
            }
        });

        ScheduleOutcome::Scheduled { delay, replaced }
    }

    /// Cancel the pending job for `alert_id`. Returns false if none existed.
    pub fn cancel(&self, alert_id: &str) -> bool {
        let removed = self.inner.jobs.lock().remove(alert_id);
        match removed {
            Some(job) => {
                job.cancel.cancel();
                self.inner.emit(AlertEvent::Cancelled {
                    alert_id: alert_id.to_string(),
                });
                true
            }
            None => false,
        }
    }

    /// Store a new alert and schedule it.
    pub async fn create(
        &self,
        style: AlarmStyle,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Alert, ScheduleOutcome)> {
        if to <= from {
            bail!("Alert must end after it starts ({} >= {})", from, to);
        }
        let alert = Alert::new(style, from, to);
        self.inner.repository.add_alert(alert.clone()).await?;
        let outcome = self.schedule(&alert);
        Ok((alert, outcome))
    }

    /// User stop: cancel the job, mark the alert inactive, silence its alarm.
    pub async fn stop(&self, alert_id: &str) -> Result<bool> {
        self.cancel(alert_id);
        let found = self
            .inner
            .repository
            .update_alert_status(alert_id, false)
            .await?;
        self.inner.release_alarm(alert_id).await?;
        tracing::info!("Stopped alert {}", alert_id);
        Ok(found)
    }

    /// Cancel the job, silence its alarm and remove the alert record.
    pub async fn delete(&self, alert_id: &str) -> Result<bool> {
        self.cancel(alert_id);
        let found = self.inner.repository.delete_alert(alert_id).await?;
        self.inner.release_alarm(alert_id).await?;
        tracing::info!("Deleted alert {}", alert_id);
        Ok(found)
    }

    /// Stop `alert_id` and replace it with a fresh alert covering
    /// `[now, now + snooze)`. Returns `None` if the alert does not exist.
    pub async fn snooze(&self, alert_id: &str) -> Result<Option<(Alert, ScheduleOutcome)>> {
        let Some(alert) = self.inner.repository.alert(alert_id).await? else {
            tracing::warn!("Alert {} not found for snooze", alert_id);
            return Ok(None);
        };

        self.stop(alert_id).await?;

        let replacement = alert.snoozed(Utc::now(), self.inner.snooze);
        self.inner.repository.add_alert(replacement.clone()).await?;
        let outcome = self.schedule(&replacement);
        tracing::info!(
            "Snoozed alert {} as {} for {} minutes",
            alert_id,
            replacement.id,
            self.inner.snooze.num_minutes()
        );
        Ok(Some((replacement, outcome)))
    }

    /// Schedule every stored alert that is still active and unexpired.
    /// Returns how many jobs were enqueued.
    pub async fn rehydrate(&self) -> Result<usize> {
        let now = Utc::now();
        let alerts = self.inner.repository.alerts().await?;
        let scheduled = alerts
            .iter()
            .filter(|a| a.is_active && !a.is_expired(now))
            .filter(|a| self.schedule_at(a, now).is_scheduled())
            .count();
        tracing::info!("Rehydrated {} of {} stored alerts", scheduled, alerts.len());
        Ok(scheduled)
    }

    /// Reconcile with the store: silence an alarm stopped elsewhere, cancel
    /// jobs whose alert was stopped or removed elsewhere, and schedule live
    /// alerts that have no job yet. Returns (scheduled, cancelled).
    pub async fn sync(&self) -> Result<(usize, usize)> {
        self.inner.follow_ringing().await?;

        let now = Utc::now();
        let live: HashMap<String, Alert> = self
            .inner
            .repository
            .alerts()
            .await?
            .into_iter()
            .filter(|a| a.is_active && !a.is_expired(now))
            .map(|a| (a.id.clone(), a))
            .collect();

        // Firing jobs already marked their alert inactive
        let pending: Vec<String> = self
            .inner
            .jobs
            .lock()
            .iter()
            .filter(|(_, job)| !job.firing)
            .map(|(id, _)| id.clone())
            .collect();
        let cancelled = pending
            .iter()
            .filter(|id| !live.contains_key(*id))
            .filter(|id| self.cancel(id))
            .count();

        let scheduled = live
            .values()
            .filter(|a| !self.is_scheduled(&a.id))
            .filter(|a| self.schedule_at(a, now).is_scheduled())
            .count();

        if scheduled + cancelled > 0 {
            tracing::info!("Alert sync: {} scheduled, {} cancelled", scheduled, cancelled);
        }
        Ok((scheduled, cancelled))
    }

    /// Cancel every pending job and stop the alarm.
    pub fn shutdown(&self) {
        let jobs: Vec<_> = self.inner.jobs.lock().drain().collect();
        for (alert_id, job) in jobs {
            job.cancel.cancel();
            tracing::debug!("Cancelled alert {} on shutdown", alert_id);
        }
        self.inner.ringing.lock().take();
        self.inner.alarm.stop();
    }
}

impl Inner {
    fn emit(&self, event: AlertEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn begin_fire(&self, alert_id: &str, job_id: u64) {
        if let Some(job) = self.jobs.lock().get_mut(alert_id) {
            if job.job_id == job_id {
                job.firing = true;
            }
        }
    }

    /// Drop the map entry for `alert_id` if it still belongs to `job_id`.
    fn finish(&self, alert_id: &str, job_id: u64) {
        let mut jobs = self.jobs.lock();
        if jobs.get(alert_id).map(|j| j.job_id) == Some(job_id) {
            jobs.remove(alert_id);
        }
    }

    /// Returns `(notified, alarm)`, or `None` when the job was cancelled
    /// before it could notify.
    async fn fire(&self, alert: &Alert, cancel: &CancellationToken) -> Option<(bool, bool)> {
        if cancel.is_cancelled() {
            return None;
        }
        tracing::info!("Alert {} fired", alert.id);

        match self.repository.update_alert_status(&alert.id, false).await {
            Ok(true) => tracing::debug!("Marked alert {} inactive", alert.id),
            Ok(false) => tracing::warn!("Alert {} no longer stored", alert.id),
            Err(e) => tracing::warn!("Failed to update alert {}: {:#}", alert.id, e),
        }

        let settings = match UserSettings::load(self.repository.local()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {:#}", e);
                UserSettings::default()
            }
        };

        if !settings.notifications_enabled {
            tracing::debug!("Notifications disabled; alert {} fired silently", alert.id);
            return Some((false, false));
        }

        let description = self.describe_weather(&settings).await;
        if cancel.is_cancelled() {
            tracing::info!("Alert {} stopped while firing", alert.id);
            return None;
        }

        let notification = Notification::weather_alert(&alert.id, description.as_deref());
        let notified = match self.notifier.notify(notification).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to post notification for {}: {:#}", alert.id, e);
                false
            }
        };

        let mut alarm = false;
        if alert.style == AlarmStyle::Alarm {
            self.claim_alarm(&alert.id).await;
            if cancel.is_cancelled() {
                tracing::info!("Alert {} stopped before its alarm started", alert.id);
                if let Err(e) = self.release_alarm(&alert.id).await {
                    tracing::warn!("Failed to release alarm for {}: {:#}", alert.id, e);
                }
            } else {
                self.alarm.start();
                alarm = self.alarm.is_playing();
            }
        }

        Some((notified, alarm))
    }

    /// Record `alert_id` as the owner of the alarm, locally and in the store.
    async fn claim_alarm(&self, alert_id: &str) {
        *self.ringing.lock() = Some(alert_id.to_string());
        if let Err(e) = self
            .repository
            .local()
            .set_setting(RINGING_ALERT_KEY, alert_id.to_string())
            .await
        {
            tracing::warn!("Failed to record ringing alert {}: {:#}", alert_id, e);
        }
    }

    /// Clear `alert_id`'s claim on the alarm and silence it if this process
    /// is ringing for that alert.
    async fn release_alarm(&self, alert_id: &str) -> Result<()> {
        let cache = self.repository.local();
        if cache.get_setting(RINGING_ALERT_KEY).await?.as_deref() == Some(alert_id) {
            cache.remove_setting(RINGING_ALERT_KEY).await?;
        }

        let owned = {
            let mut ringing = self.ringing.lock();
            if ringing.as_deref() == Some(alert_id) {
                ringing.take();
                true
            } else {
                false
            }
        };
        if owned && self.alarm.stop() {
            self.emit(AlertEvent::AlarmStopped {
                alert_id: alert_id.to_string(),
            });
        }
        Ok(())
    }

    /// Silence the local alarm once its alert lost the stored claim.
    async fn follow_ringing(&self) -> Result<()> {
        let Some(local) = self.ringing.lock().clone() else {
            return Ok(());
        };
        let stored = self.repository.local().get_setting(RINGING_ALERT_KEY).await?;
        if stored.as_deref() == Some(local.as_str()) {
            return Ok(());
        }

        self.ringing.lock().take();
        if self.alarm.stop() {
            tracing::info!("Alarm for alert {} stopped elsewhere", local);
            self.emit(AlertEvent::AlarmStopped { alert_id: local });
        }
        Ok(())
    }

    /// Current conditions at the stored location, or `None` when the
    /// location is unset or the fetch fails.
    async fn describe_weather(&self, settings: &UserSettings) -> Option<String> {
        let Some(coords) = settings.coordinates() else {
            tracing::warn!("No stored location; skipping weather fetch");
            return None;
        };

        let query = WeatherQuery::new(coords, self.api_key.clone()).with_language(settings.language);
        match self.repository.get_current_weather(&query).await {
            Ok(snapshot) => Some(snapshot.description().unwrap_or(NO_DESCRIPTION).to_string()),
            Err(e) => {
                tracing::warn!("Weather fetch for alert failed: {}", e);
                None
            }
        }
    }
}
