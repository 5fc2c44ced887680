//! Animated transitions of scalar values and of the day window.
//!
//! Time is passed in explicitly so callers drive the animation from their
//! own frame clock.

use std::time::{Duration, Instant};

use chrono::{NaiveTime, Timelike};

use crate::day_view::TimeWindow;

/// Default length of a window transition.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(300);

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// A scalar moving towards a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f64,
    to: f64,
    started: Option<Instant>,
    duration: Duration,
}

impl Tween {
    /// A tween resting at `value`.
    pub fn new(value: f64) -> Self {
        Tween {
            from: value,
            to: value,
            started: None,
            duration: Duration::ZERO,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Start moving to `target`, beginning from wherever the value is at `now`.
    pub fn tween_to(&mut self, target: f64, duration: Duration, now: Instant) {
        self.from = self.value_at(now);
        self.to = target;
        self.started = Some(now);
        self.duration = duration;
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        let Some(started) = self.started else {
            return self.to;
        };
        if self.duration.is_zero() {
            return self.to;
        }

        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).min(1.0);
        self.from + (self.to - self.from) * ease_in_out(t)
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.started
            .is_some_and(|started| now.saturating_duration_since(started) < self.duration)
    }
}

/// The day window's two ends, animated together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTween {
    from: Tween,
    to: Tween,
}

fn seconds_of(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64
}

fn time_of(seconds: f64) -> NaiveTime {
    let seconds = seconds.round().clamp(0.0, 86_399.0) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or(NaiveTime::MIN)
}

impl WindowTween {
    pub fn new(window: TimeWindow) -> Self {
        WindowTween {
            from: Tween::new(seconds_of(window.from)),
            to: Tween::new(seconds_of(window.to)),
        }
    }

    pub fn tween_to(&mut self, window: TimeWindow, duration: Duration, now: Instant) {
        self.from.tween_to(seconds_of(window.from), duration, now);
        self.to.tween_to(seconds_of(window.to), duration, now);
    }

    pub fn window_at(&self, now: Instant) -> TimeWindow {
        TimeWindow::new(time_of(self.from.value_at(now)), time_of(self.to.value_at(now)))
    }

    pub fn target(&self) -> TimeWindow {
        TimeWindow::new(time_of(self.from.target()), time_of(self.to.target()))
    }

    pub fn is_running(&self, now: Instant) -> bool {
        self.from.is_running(now) || self.to.is_running(now)
    }
}
