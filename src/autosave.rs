//! Auto-save scheduling
//!
//! Edits arm a debounce deadline that each further edit pushes back. An
//! independent interval flushes unsaved changes during long typing runs.
//! Instants are supplied by the caller, so the scheduler is driven by
//! whatever clock the host uses.

use std::time::{Duration, Instant};

use tracing::debug;

use prodoc_core::config::EditorConfig;

/// Which timer asked for the save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// The quiet period after the last edit elapsed
    Debounce,
    /// The periodic flush found unsaved changes
    Interval,
}

#[derive(Debug, Clone)]
pub struct AutoSave {
    debounce: Duration,
    interval: Duration,
    debounce_deadline: Option<Instant>,
    next_flush: Instant,
    dirty: bool,
}

impl AutoSave {
    pub fn new(debounce: Duration, interval: Duration, start: Instant) -> Self {
        Self {
            debounce,
            interval,
            debounce_deadline: None,
            next_flush: start + interval,
            dirty: false,
        }
    }

    pub fn from_config(config: &EditorConfig, start: Instant) -> Self {
        Self::new(
            Duration::from_millis(config.autosave_debounce_ms),
            Duration::from_millis(config.autosave_interval_ms),
            start,
        )
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// An edit happened; restart the quiet period
    pub fn note_edit(&mut self, now: Instant) {
        self.dirty = true;
        self.debounce_deadline = Some(now + self.debounce);
    }

    /// The document was written, by either timer or by hand
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.debounce_deadline = None;
    }

    /// Earliest instant at which `tick` may fire
    pub fn next_deadline(&self) -> Instant {
        match self.debounce_deadline {
            Some(deadline) => deadline.min(self.next_flush),
            None => self.next_flush,
        }
    }

    /// Advance to `now`; at most one save is requested per call
    pub fn tick(&mut self, now: Instant) -> Option<SaveTrigger> {
        let interval_due = now >= self.next_flush;
        if interval_due {
            while self.next_flush <= now {
                self.next_flush += self.interval;
            }
        }

        if let Some(deadline) = self.debounce_deadline {
            if now >= deadline {
                self.debounce_deadline = None;
                if self.dirty {
                    debug!("Auto-save: debounce elapsed");
                    return Some(SaveTrigger::Debounce);
                }
            }
        }

        if interval_due && self.dirty {
            // The pending debounce would only save the same content again
            self.debounce_deadline = None;
            debug!("Auto-save: interval flush");
            return Some(SaveTrigger::Interval);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn scheduler(start: Instant) -> AutoSave {
        AutoSave::from_config(&EditorConfig::default(), start)
    }

    #[test]
    fn test_idle_never_saves() {
        let t0 = Instant::now();
        let mut autosave = scheduler(t0);
        assert_eq!(autosave.tick(t0 + ms(60_000)), None);
    }

    #[test]
    fn test_debounce_restarts_on_edit() {
        let t0 = Instant::now();
        let mut autosave = scheduler(t0);

        autosave.note_edit(t0);
        autosave.note_edit(t0 + ms(2000));
        assert_eq!(autosave.tick(t0 + ms(2600)), None);
        assert_eq!(autosave.next_deadline(), t0 + ms(4500));
        assert_eq!(autosave.tick(t0 + ms(4500)), Some(SaveTrigger::Debounce));
        autosave.mark_saved();
        assert_eq!(autosave.tick(t0 + ms(5000)), None);
    }

    #[test]
    fn test_interval_flushes_continuous_typing() {
        let t0 = Instant::now();
        let mut autosave = scheduler(t0);

        let mut fired = Vec::new();
        let mut now = t0;
        while now < t0 + ms(16_000) {
            autosave.note_edit(now);
            if let Some(trigger) = autosave.tick(now) {
                fired.push(trigger);
                autosave.mark_saved();
                autosave.note_edit(now);
            }
            now += ms(1000);
        }
        assert_eq!(fired, vec![SaveTrigger::Interval]);
    }

    #[test]
    fn test_timers_do_not_both_fire() {
        let t0 = Instant::now();
        let mut autosave = scheduler(t0);

        autosave.note_edit(t0 + ms(13_000));
        // Debounce (15.5s) and interval (15s) both elapsed
        assert_eq!(autosave.tick(t0 + ms(16_000)), Some(SaveTrigger::Debounce));
        autosave.mark_saved();
        assert_eq!(autosave.tick(t0 + ms(16_001)), None);
    }

    #[test]
    fn test_interval_skips_when_clean() {
        let t0 = Instant::now();
        let mut autosave = scheduler(t0);
        autosave.note_edit(t0);
        autosave.mark_saved();
        assert_eq!(autosave.tick(t0 + ms(15_000)), None);
        assert_eq!(autosave.next_deadline(), t0 + ms(30_000));
    }
}
