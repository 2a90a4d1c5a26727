//! Small instrumentation helpers shared by the CLI and the layout phases.

use std::time::Instant;

use log::Level;

/// Scope timer: logs `"<label>: <elapsed>"` at the chosen level when dropped.
/// Phases wrap themselves in one of these so the timing survives early
/// returns.
pub struct Timed {
    label: &'static str,
    level: Level,
    started: Instant,
}

impl Timed {
    pub fn info(label: &'static str) -> Self {
        Self::at(Level::Info, label)
    }

    pub fn debug(label: &'static str) -> Self {
        Self::at(Level::Debug, label)
    }

    fn at(level: Level, label: &'static str) -> Self {
        Self {
            label,
            level,
            started: Instant::now(),
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.1?}", self.label, self.started.elapsed());
    }
}
