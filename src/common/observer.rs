use log::Level;
use std::sync::{Arc, Mutex};

/// The log target used for every event emitted through a `LogObserver`.
pub const LOG_TARGET: &str = "rustybridge";

/// Receives the events emitted by sessions and their components.
///
/// An observer is handed to each component at construction. Components
/// never configure a process-wide logger.
pub trait Observer: Send + Sync {
    /// Reports a single event at the given level.
    fn notify(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.notify(Level::Info, message)
    }

    fn warn(&self, message: &str) {
        self.notify(Level::Warn, message)
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message)
    }
}

/// Forwards events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl LogObserver {
    pub fn new_with_handle() -> Arc<dyn Observer> {
        Arc::new(LogObserver)
    }
}

impl Observer for LogObserver {
    fn notify(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{message}");
    }
}

/// Records every event in memory. Mostly useful in tests.
#[derive(Debug, Default)]
pub struct CaptureObserver {
    events: Mutex<Vec<(Level, String)>>,
}

impl CaptureObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_handle() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a copy of all events recorded so far, in order.
    pub fn events(&self) -> Vec<(Level, String)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the messages recorded at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// True if any message at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Observer for CaptureObserver {
    fn notify(&self, level: Level, message: &str) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push((level, message.to_string()));
    }
}
