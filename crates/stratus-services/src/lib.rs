//! Local storage, repository and alert scheduling for Stratus.

pub mod alarm;
pub mod cache;
pub mod model;
pub mod notify;
pub mod repository;
pub mod scheduler;
pub mod settings;
pub mod store;

pub use alarm::{AlarmPlayer, AlarmSound, TerminalBell};
pub use cache::LocalCache;
pub use model::{AlarmStyle, Alert, CachedRecord, FavoritePlace};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
pub use repository::WeatherRepository;
pub use scheduler::{AlertEvent, AlertScheduler, ScheduleOutcome, SkipReason};
pub use settings::UserSettings;
pub use store::WeatherStore;
