//! Looping alarm sound.
//!
//! One player per process. `start` while already playing is a no-op; the
//! loop runs until `stop`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

const RING_INTERVAL: Duration = Duration::from_millis(1500);

/// Something that can make one "ring".
pub trait AlarmSound: Send + Sync {
    fn ring(&self);
}

/// Terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AlarmSound for TerminalBell {
    fn ring(&self) {
        use std::io::Write;
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }
}

#[derive(Clone)]
pub struct AlarmPlayer {
    sound: Arc<dyn AlarmSound>,
    interval: Duration,
    playing: Arc<Mutex<Option<CancellationToken>>>,
}

impl AlarmPlayer {
    pub fn new(sound: Arc<dyn AlarmSound>) -> Self {
        Self {
            sound,
            interval: RING_INTERVAL,
            playing: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing.lock().is_some()
    }

    /// Start looping. Returns false if an alarm was already playing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let token = {
            let mut playing = self.playing.lock();
            if playing.is_some() {
                tracing::debug!("Alarm already playing");
                return false;
            }
            let token = CancellationToken::new();
            *playing = Some(token.clone());
            token
        };

        let sound = self.sound.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => sound.ring(),
                }
            }
        });

        tracing::info!("Alarm started");
        true
    }

    /// Stop the loop. Returns false if nothing was playing.
    pub fn stop(&self) -> bool {
        match self.playing.lock().take() {
            Some(token) => {
                token.cancel();
                tracing::info!("Alarm stopped");
                true
            }
            None => false,
        }
    }
}

impl Default for AlarmPlayer {
    fn default() -> Self {
        Self::new(Arc::new(TerminalBell))
    }
}
