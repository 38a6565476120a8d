//! Travel-time estimation between suburbs.
//!
//! The estimate is a one-dimensional proxy: the difference between the two
//! suburbs' distances from the CBD plus a fixed buffer. It ignores the actual
//! road network, so two suburbs on opposite sides of the city at the same
//! radius look close together. Treat the result as an approximation only.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::suburbs::SuburbTable;

/// Average speed in Melbourne traffic, used to turn minutes into distance.
const AVERAGE_SPEED_KMH: f64 = 25.0;

/// A suburb close enough to a target to be worth re-dispatching to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbySuburb {
    pub name: String,
    pub travel_minutes: u32,
}

#[derive(Debug, Clone)]
pub struct TravelTimeEstimator {
    table: Arc<SuburbTable>,
    buffer_minutes: u32,
}

impl TravelTimeEstimator {
    pub fn new(table: Arc<SuburbTable>, buffer_minutes: u32) -> Self {
        Self {
            table,
            buffer_minutes,
        }
    }

    /// `|lookup(a) - lookup(b)| + buffer`. Symmetric, and `estimate(a, a)` is the buffer.
    pub fn estimate(&self, from: &str, to: &str) -> u32 {
        self.drive_minutes(from, to).saturating_add(self.buffer_minutes)
    }

    /// Raw driving time between two suburbs, without the buffer.
    pub fn drive_minutes(&self, from: &str, to: &str) -> u32 {
        self.table.lookup(from).abs_diff(self.table.lookup(to))
    }

    /// Road distance implied by the driving time at city traffic speed, in whole km.
    pub fn distance_km(&self, from: &str, to: &str) -> u32 {
        let minutes = f64::from(self.drive_minutes(from, to));
        (minutes / 60.0 * AVERAGE_SPEED_KMH).round() as u32
    }

    pub fn buffer_minutes(&self) -> u32 {
        self.buffer_minutes
    }

    pub fn table(&self) -> &SuburbTable {
        &self.table
    }

    /// Known suburbs within `max_minutes` of `target`, closest first.
    pub fn nearby(&self, target: &str, max_minutes: u32) -> Vec<NearbySuburb> {
        let mut nearby: Vec<NearbySuburb> = self
            .table
            .iter()
            .filter(|suburb| !suburb.name.eq_ignore_ascii_case(target.trim()))
            .map(|suburb| NearbySuburb {
                name: suburb.name.clone(),
                travel_minutes: self.estimate(&suburb.name, target),
            })
            .filter(|candidate| candidate.travel_minutes <= max_minutes)
            .collect();

        nearby.sort_by(|a, b| {
            a.travel_minutes
                .cmp(&b.travel_minutes)
                .then_with(|| a.name.cmp(&b.name))
        });
        nearby
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> TravelTimeEstimator {
        TravelTimeEstimator::new(Arc::new(SuburbTable::melbourne()), 15)
    }

    #[test]
    fn test_estimate_richmond_to_frankston() {
        let est = estimator();
        assert_eq!(est.estimate("Richmond", "Frankston"), 48);
        assert_eq!(est.estimate("Frankston", "Richmond"), 48);
    }

    #[test]
    fn test_same_suburb_is_buffer_only() {
        let est = estimator();
        assert_eq!(est.estimate("Carlton", "carlton"), 15);
        assert_eq!(est.estimate("Nowhere", "Nowhere"), 15);
    }

    #[test]
    fn test_unknown_suburb_uses_default_distance() {
        let est = estimator();
        // Melbourne (0) to unknown (30)
        assert_eq!(est.estimate("Melbourne", "Nowhere"), 45);
    }

    #[test]
    fn test_nearby_excludes_target_and_sorts() {
        let est = estimator();
        let nearby = est.nearby("Richmond", 20);

        assert!(nearby.iter().all(|n| n.name != "Richmond"));
        assert!(nearby.iter().all(|n| n.travel_minutes <= 20));
        // Prahran, Thornbury, Footscray and Moonee Ponds share Richmond's value
        assert_eq!(nearby[0].travel_minutes, 15);
        assert!(nearby.windows(2).all(|w| w[0].travel_minutes <= w[1].travel_minutes));
        assert!(nearby.iter().any(|n| n.name == "Brunswick"));
        assert!(!nearby.iter().any(|n| n.name == "Frankston"));
    }

    #[test]
    fn test_distance_ignores_buffer() {
        let estimator = estimator();
        assert_eq!(estimator.drive_minutes("Richmond", "Frankston"), 33);
        // 33 minutes at 25 km/h
        assert_eq!(estimator.distance_km("Richmond", "Frankston"), 14);
        assert_eq!(estimator.distance_km("Carlton", "Carlton"), 0);
    }
}
