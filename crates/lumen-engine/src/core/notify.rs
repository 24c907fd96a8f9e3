use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// A short on-screen message, posted from any thread.
#[derive(Debug)]
pub(crate) struct Notifier {
    duration: Duration,
    current: Mutex<Option<(String, Instant)>>,
}

impl Notifier {
    pub(crate) fn new(secs: f64) -> Self {
        Self {
            duration: Duration::try_from_secs_f64(secs).unwrap_or_default(),
            current: Mutex::new(None),
        }
    }

    /// Replaces any message currently shown.
    pub(crate) fn post(&self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        log::debug!("notification: {text}");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some((text, now));
    }

    /// The message visible at `now`, if it has not expired.
    pub(crate) fn active(&self, now: Instant) -> Option<String> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some((text, posted)) if now.saturating_duration_since(*posted) < self.duration => {
                Some(text.clone())
            }
            Some(_) => {
                *current = None;
                None
            }
            None => None,
        }
    }
}
