//! Long-lived named flags, numbers, and timers
//!
//! This is the only rule-visible state that survives across ticks besides
//! the pending-effect queue. Every mutating operation reports whether it
//! changed anything, which is what lets the corresponding side effects
//! distinguish a semantically new application from a repeat.

use ahash::AHashMap;
use std::time::{Duration, Instant};

/// Timer lifecycle. Accumulated time survives stop/start cycles until an
/// explicit reset.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerState {
    Stopped { accumulated: Duration },
    Running { started: Instant, accumulated: Duration },
}

#[derive(Debug, Clone)]
pub struct VariableStore {
    flags: AHashMap<String, bool>,
    numbers: AHashMap<String, f64>,
    timers: AHashMap<String, TimerState>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self {
            flags: AHashMap::new(),
            numbers: AHashMap::new(),
            timers: AHashMap::new(),
        }
    }

    // === FLAGS ===

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Set a flag to true; returns false when it already was
    pub fn set_flag(&mut self, name: &str) -> bool {
        !std::mem::replace(self.flags.entry(name.to_owned()).or_insert(false), true)
    }

    /// Clear a flag; returns false when it already was clear
    pub fn reset_flag(&mut self, name: &str) -> bool {
        match self.flags.get_mut(name) {
            Some(value) if *value => {
                *value = false;
                true
            }
            _ => false,
        }
    }

    // === NUMBERS ===

    pub fn number(&self, name: &str) -> f64 {
        self.numbers.get(name).copied().unwrap_or(0.0)
    }

    /// Store a number; returns false when the stored value already equals it
    pub fn set_number(&mut self, name: &str, value: f64) -> bool {
        match self.numbers.get(name) {
            Some(current) if *current == value => false,
            _ => {
                self.numbers.insert(name.to_owned(), value);
                true
            }
        }
    }

    /// Remove a number; returns false when it was absent
    pub fn reset_number(&mut self, name: &str) -> bool {
        self.numbers.remove(name).is_some()
    }

    // === TIMERS ===

    pub fn timer_running(&self, name: &str) -> bool {
        matches!(self.timers.get(name), Some(TimerState::Running { .. }))
    }

    /// Elapsed time on a timer, including the in-flight run
    pub fn timer_elapsed(&self, name: &str, now: Instant) -> Duration {
        match self.timers.get(name) {
            Some(TimerState::Stopped { accumulated }) => *accumulated,
            Some(TimerState::Running {
                started,
                accumulated,
            }) => *accumulated + now.saturating_duration_since(*started),
            None => Duration::ZERO,
        }
    }

    /// Start a timer; returns false when it is already running
    pub fn start_timer(&mut self, name: &str, now: Instant) -> bool {
        let state = self
            .timers
            .entry(name.to_owned())
            .or_insert(TimerState::Stopped {
                accumulated: Duration::ZERO,
            });
        match *state {
            TimerState::Running { .. } => false,
            TimerState::Stopped { accumulated } => {
                *state = TimerState::Running {
                    started: now,
                    accumulated,
                };
                true
            }
        }
    }

    /// Stop a timer, banking its elapsed time; returns false when it was
    /// not running
    pub fn stop_timer(&mut self, name: &str, now: Instant) -> bool {
        match self.timers.get_mut(name) {
            Some(state @ TimerState::Running { .. }) => {
                if let TimerState::Running {
                    started,
                    accumulated,
                } = *state
                {
                    *state = TimerState::Stopped {
                        accumulated: accumulated + now.saturating_duration_since(started),
                    };
                }
                true
            }
            _ => false,
        }
    }

    /// Zero a timer and stop it; returns false when it was already stopped
    /// at zero
    pub fn reset_timer(&mut self, name: &str) -> bool {
        match self.timers.get_mut(name) {
            Some(state) => {
                let was_zeroed = matches!(
                    state,
                    TimerState::Stopped { accumulated } if accumulated.is_zero()
                );
                *state = TimerState::Stopped {
                    accumulated: Duration::ZERO,
                };
                !was_zeroed
            }
            None => false,
        }
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_flag_reports_change_once() {
        let mut vars = VariableStore::new();
        assert!(vars.set_flag("low_life"));
        assert!(!vars.set_flag("low_life"));
        assert!(vars.flag("low_life"));
    }

    #[test]
    fn test_reset_flag_on_unset_flag_is_noop() {
        let mut vars = VariableStore::new();
        assert!(!vars.reset_flag("missing"));
        vars.set_flag("present");
        assert!(vars.reset_flag("present"));
        assert!(!vars.reset_flag("present"));
    }

    #[test]
    fn test_set_number_detects_equal_value() {
        let mut vars = VariableStore::new();
        assert!(vars.set_number("stacks", 3.0));
        assert!(!vars.set_number("stacks", 3.0));
        assert!(vars.set_number("stacks", 4.0));
        assert_eq!(vars.number("stacks"), 4.0);
    }

    #[test]
    fn test_timer_accumulates_across_stop_start() {
        let mut vars = VariableStore::new();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(100);
        let t2 = t1 + Duration::from_millis(50);
        let t3 = t2 + Duration::from_millis(25);

        assert!(vars.start_timer("phase", t0));
        assert!(!vars.start_timer("phase", t0), "already running");
        assert!(vars.stop_timer("phase", t1));
        assert_eq!(vars.timer_elapsed("phase", t1), Duration::from_millis(100));

        assert!(vars.start_timer("phase", t2));
        assert_eq!(
            vars.timer_elapsed("phase", t3),
            Duration::from_millis(125),
            "accumulated time survives restart"
        );
    }

    #[test]
    fn test_reset_timer_zeroes_and_stops() {
        let mut vars = VariableStore::new();
        let t0 = Instant::now();
        vars.start_timer("phase", t0);
        assert!(vars.reset_timer("phase"));
        assert!(!vars.timer_running("phase"));
        assert_eq!(vars.timer_elapsed("phase", t0), Duration::ZERO);
        assert!(!vars.reset_timer("phase"), "second reset changes nothing");
    }

    #[test]
    fn test_unknown_timer_reads_as_zero() {
        let vars = VariableStore::new();
        assert!(!vars.timer_running("ghost"));
        assert_eq!(vars.timer_elapsed("ghost", Instant::now()), Duration::ZERO);
    }
}
