//! Candidate appointment slots. Computed on demand, never persisted.

use serde::{Deserialize, Serialize};

use super::time::TimeWindow;
use super::TechnicianId;

/// Why a slot cannot be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotUnavailableReason {
    /// Overlaps an existing active booking.
    Booked,
    /// Falls outside business hours.
    OutsideHours,
    /// Not enough travel time to or from a neighbouring booking.
    TravelTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(flatten)]
    pub window: TimeWindow,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SlotUnavailableReason>,
}

impl Slot {
    pub fn available(window: TimeWindow) -> Self {
        Self {
            window,
            is_available: true,
            reason: None,
        }
    }

    pub fn unavailable(window: TimeWindow, reason: SlotUnavailableReason) -> Self {
        Self {
            window,
            is_available: false,
            reason: Some(reason),
        }
    }
}

/// A slot offered by a specific technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianSlot {
    #[serde(flatten)]
    pub slot: Slot,
    pub technician_id: TechnicianId,
    pub technician_name: String,
}
