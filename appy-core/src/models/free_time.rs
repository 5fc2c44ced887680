use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A window in which an appointment of a given length can start.
///
/// `to_including_duration` is the end of the window with the requested
/// duration already added, so `[from, to_including_duration)` is the span
/// that would be occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTime {
    pub from: NaiveDateTime,
    pub to_including_duration: NaiveDateTime,
}

impl FreeTime {
    pub fn new(from: NaiveDateTime, to_including_duration: NaiveDateTime) -> Self {
        FreeTime {
            from,
            to_including_duration,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.to_including_duration - self.from
    }
}
