//! Projection of time intervals onto a bounded display window.
//!
//! A window `[from, to]` maps to the vertical range `[0, 1]`. Intervals are
//! rendered to an `offset`/`height` pair in that space, then cropped to the
//! window before layout.

use chrono::{NaiveDateTime, TimeDelta};

/// A start instant and a non-negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub duration: TimeDelta,
}

impl TimeInterval {
    /// Negative durations are clamped to zero.
    pub fn new(start: NaiveDateTime, duration: TimeDelta) -> Self {
        TimeInterval {
            start,
            duration: duration.max(TimeDelta::zero()),
        }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(start, end - start)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }
}

/// An interval positioned within a display window.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedInterval<V> {
    pub value: V,
    pub start: NaiveDateTime,
    pub duration: TimeDelta,
    /// Distance from the top of the window, as a fraction of its length.
    pub offset: f64,
    /// Length as a fraction of the window length.
    pub height: f64,
}

impl<V> RenderedInterval<V> {
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> RenderedInterval<U> {
        RenderedInterval {
            value: f(self.value),
            start: self.start,
            duration: self.duration,
            offset: self.offset,
            height: self.height,
        }
    }
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// Position `[start, start + duration)` inside the window `[from, to]`.
///
/// The result is not clipped; see [`crop`]. A window of zero or negative
/// length yields offset and height of zero.
pub fn rendered_interval<V>(
    from: NaiveDateTime,
    to: NaiveDateTime,
    value: V,
    start: NaiveDateTime,
    duration: TimeDelta,
) -> RenderedInterval<V> {
    let window = seconds(to - from);
    let (offset, height) = if window > 0.0 {
        (seconds(start - from) / window, seconds(duration) / window)
    } else {
        (0.0, 0.0)
    };

    RenderedInterval {
        value,
        start,
        duration,
        offset,
        height,
    }
}

/// Clip a rendered interval to the window.
///
/// Intervals entirely outside `[0, 1]` are dropped. The end is always
/// clipped to 1. The start is clipped to 0 unless `allow_negative_offset`,
/// which keeps blocks that began before the window visibly running into it.
pub fn crop<V>(
    mut interval: RenderedInterval<V>,
    allow_negative_offset: bool,
) -> Option<RenderedInterval<V>> {
    if interval.offset >= 1.0 || interval.offset + interval.height <= 0.0 {
        return None;
    }

    if interval.offset + interval.height > 1.0 {
        interval.height = 1.0 - interval.offset;
    }

    if interval.offset < 0.0 && !allow_negative_offset {
        interval.height += interval.offset;
        interval.offset = 0.0;
    }

    Some(interval)
}

/// Gaps of the window `[from, to)` not covered by any of `items`.
///
/// Coverage may be unsorted and overlapping; it is clamped to the window.
/// Empty gaps are skipped.
pub fn invert_times<I, S, E>(
    items: &[I],
    start_of: S,
    end_of: E,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Vec<TimeInterval>
where
    S: Fn(&I) -> NaiveDateTime,
    E: Fn(&I) -> NaiveDateTime,
{
    let mut covered: Vec<(NaiveDateTime, NaiveDateTime)> =
        items.iter().map(|i| (start_of(i), end_of(i))).collect();
    covered.sort_by_key(|&(start, _)| start);

    let mut gaps = Vec::new();
    let mut cursor = from;
    for (start, end) in covered {
        let start = start.clamp(from, to.max(from));
        let end = end.clamp(from, to.max(from));

        if start > cursor {
            gaps.push(TimeInterval::between(cursor, start));
        }
        cursor = cursor.max(end);
    }

    if cursor < to {
        gaps.push(TimeInterval::between(cursor, to));
    }

    gaps
}
