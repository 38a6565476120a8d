//! Candidate slot generation on a configurable grid.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{clock, hhmm, Booking, BusinessHours, Slot, SlotUnavailableReason, TimeWindow};

/// Grid of slot start times: every `granularity_minutes` from `anchor`, with no
/// slot ending after `window_end`. Business hours clip the grid further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotGrid {
    #[serde(with = "hhmm")]
    pub anchor: NaiveTime,
    pub granularity_minutes: u32,
    #[serde(with = "hhmm")]
    pub window_end: NaiveTime,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self::new(clock(7, 0), 30, clock(19, 0))
    }
}

impl SlotGrid {
    pub fn new(anchor: NaiveTime, granularity_minutes: u32, window_end: NaiveTime) -> Self {
        Self {
            anchor,
            granularity_minutes,
            window_end,
        }
    }

    /// A grid spanning the full business day.
    pub fn spanning(hours: &BusinessHours, granularity_minutes: u32) -> Self {
        Self::new(hours.open, granularity_minutes, hours.close)
    }
}

/// Produces slots for one technician-day.
///
/// Generation is a pure function of its inputs: the returned iterator borrows
/// the existing bookings, can be cloned to restart, and never touches the
/// generator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGenerator {
    hours: BusinessHours,
}

impl SlotGenerator {
    pub fn new(hours: BusinessHours) -> Self {
        Self { hours }
    }

    pub fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    /// Every grid start between open and close whose slot ends by close.
    ///
    /// `existing` should hold the technician's bookings; cancelled ones are ignored.
    pub fn generate<'a>(
        &self,
        day: NaiveDate,
        duration_minutes: u32,
        granularity_minutes: u32,
        existing: &'a [Booking],
    ) -> Slots<'a> {
        self.generate_on_grid(
            day,
            duration_minutes,
            &SlotGrid::spanning(&self.hours, granularity_minutes),
            existing,
        )
    }

    pub fn generate_on_grid<'a>(
        &self,
        day: NaiveDate,
        duration_minutes: u32,
        grid: &SlotGrid,
        existing: &'a [Booking],
    ) -> Slots<'a> {
        let step = Duration::minutes(i64::from(grid.granularity_minutes));
        let open = self.hours.opening_on(day);
        let anchor = day.and_time(grid.anchor);

        // Keep grid alignment when the anchor precedes opening time.
        let first = if anchor < open && step > Duration::zero() {
            let behind = (open - anchor).num_minutes();
            let steps = (behind + step.num_minutes() - 1) / step.num_minutes();
            anchor + Duration::minutes(steps * step.num_minutes())
        } else {
            anchor.max(open)
        };

        Slots {
            next_start: first,
            last_end: self.hours.closing_on(day).min(day.and_time(grid.window_end)),
            step,
            duration: Duration::minutes(i64::from(duration_minutes)),
            existing,
        }
    }

    /// Availability of a single window: business hours first, then overlap.
    pub fn evaluate(&self, window: TimeWindow, existing: &[Booking]) -> Slot {
        if !self.hours.contains(&window) {
            Slot::unavailable(window, SlotUnavailableReason::OutsideHours)
        } else if first_overlap(&window, existing).is_some() {
            Slot::unavailable(window, SlotUnavailableReason::Booked)
        } else {
            Slot::available(window)
        }
    }
}

/// First active booking whose interval overlaps `window`.
pub fn first_overlap<'a>(window: &TimeWindow, existing: &'a [Booking]) -> Option<&'a Booking> {
    existing
        .iter()
        .filter(|booking| booking.is_active())
        .find(|booking| booking.window().overlaps(window))
}

/// Lazy slot sequence returned by [`SlotGenerator::generate`].
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    next_start: NaiveDateTime,
    last_end: NaiveDateTime,
    step: Duration,
    duration: Duration,
    existing: &'a [Booking],
}

impl Iterator for Slots<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.step <= Duration::zero() || self.duration <= Duration::zero() {
            return None;
        }

        let window = TimeWindow::new(self.next_start, self.next_start + self.duration);
        if window.end > self.last_end {
            return None;
        }
        self.next_start += self.step;

        Some(match first_overlap(&window, self.existing) {
            Some(_) => Slot::unavailable(window, SlotUnavailableReason::Booked),
            None => Slot::available(window),
        })
    }
}
