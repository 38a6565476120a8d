//! Pure scheduling engine.
//!
//! Nothing in this module performs I/O. Callers load the relevant bookings
//! from the store and hand them in; every function returns plain data.
//!
//! ```text
//! SuburbTable ──► TravelTimeEstimator ──┬──► ConflictDetector ◄── SlotGenerator
//!                                       ├──► TechnicianScorer
//!                                       └──► route::plan_route
//! ```

pub mod conflicts;
pub mod route;
pub mod scoring;
pub mod slots;
pub mod suburbs;
pub mod travel;

pub use conflicts::{
    audit_overlaps, BookingRef, Conflict, ConflictDetector, ConflictKind, ConflictReport,
    OverlapConflict, ProposedBooking,
};
pub use route::{plan_route, DailyRoute, RouteStop, WorkingHours};
pub use scoring::{
    Assignment, FactorScore, ScoreFactor, ScoredTechnician, ScoringWeights, TechnicianCandidate,
    TechnicianScorer, ALTERNATIVE_TECHNICIANS,
};
pub use slots::{first_overlap, SlotGenerator, SlotGrid, Slots};
pub use suburbs::{Suburb, SuburbTable, Zone, DEFAULT_UNKNOWN_SUBURB_MINUTES};
pub use travel::{NearbySuburb, TravelTimeEstimator};

use std::sync::Arc;

use crate::config::{SchedulerConfig, SchedulingRules, SlotSettings};
use crate::models::BusinessHours;

/// The engine components wired to one immutable configuration.
#[derive(Debug, Clone)]
pub struct SchedulingEngine {
    hours: BusinessHours,
    rules: SchedulingRules,
    grids: SlotSettings,
    suburbs: Arc<SuburbTable>,
    estimator: TravelTimeEstimator,
    slots: SlotGenerator,
    detector: ConflictDetector,
    scorer: TechnicianScorer,
}

impl SchedulingEngine {
    pub fn new(
        hours: BusinessHours,
        rules: SchedulingRules,
        grids: SlotSettings,
        weights: ScoringWeights,
        suburbs: SuburbTable,
    ) -> Self {
        let suburbs = Arc::new(suburbs);
        let estimator = TravelTimeEstimator::new(Arc::clone(&suburbs), rules.travel_buffer_minutes);
        let detector = ConflictDetector::new(
            hours,
            estimator.clone(),
            rules.alternative_offsets_hours.clone(),
            rules.max_alternatives,
            rules.nearby_suburb_minutes,
        );
        let scorer = TechnicianScorer::new(estimator.clone(), weights, rules.home_base.clone());

        Self {
            hours,
            grids,
            suburbs,
            slots: SlotGenerator::new(hours),
            estimator,
            detector,
            scorer,
            rules,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        let suburbs = SuburbTable::melbourne_with_overrides(
            &config.suburbs,
            config.scheduling.unknown_suburb_minutes,
        );
        Self::new(
            config.business_hours,
            config.scheduling.clone(),
            config.slots,
            config.scoring.clone(),
            suburbs,
        )
    }

    pub fn business_hours(&self) -> &BusinessHours {
        &self.hours
    }

    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    pub fn grids(&self) -> &SlotSettings {
        &self.grids
    }

    pub fn suburbs(&self) -> &SuburbTable {
        &self.suburbs
    }

    pub fn estimator(&self) -> &TravelTimeEstimator {
        &self.estimator
    }

    pub fn slot_generator(&self) -> &SlotGenerator {
        &self.slots
    }

    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    pub fn scorer(&self) -> &TechnicianScorer {
        &self.scorer
    }
}

impl Default for SchedulingEngine {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_engine_uses_configured_buffer_and_suburbs() {
        let mut config = SchedulerConfig::default();
        config.scheduling.travel_buffer_minutes = 20;
        config.suburbs = BTreeMap::from([("Mornington".to_string(), 55)]);

        let engine = SchedulingEngine::from_config(&config);
        assert_eq!(engine.estimator().estimate("Richmond", "Richmond"), 20);
        assert_eq!(engine.estimator().estimate("Melbourne", "Mornington"), 75);
        assert_eq!(engine.rules().home_base, "Melbourne");
    }

    #[test]
    fn test_default_engine() {
        let engine = SchedulingEngine::default();
        assert_eq!(engine.estimator().buffer_minutes(), 15);
        assert_eq!(engine.suburbs().lookup("Frankston"), 45);
        assert_eq!(engine.grids().inspection.granularity_minutes, 120);
    }
}
