//! Technician ranking for a desired appointment.
//!
//! Every technician starts from a base score and each factor adds or removes
//! points. The factors are independent pure functions so each weight can be
//! tuned and tested on its own:
//!
//! | Factor       | Condition                                   | Default |
//! |--------------|---------------------------------------------|---------|
//! | Availability | any booking within 2h of the desired start  | -50     |
//! | Travel       | mean same-day travel <= 15 / <= 30 / more   | +20 / +10 / -10 |
//! | Workload     | same-day bookings >= 6 / >= 4 / fewer       | -30 / -15 / +10 |

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::travel::TravelTimeEstimator;
use crate::models::{Booking, Technician, TechnicianId, TimeWindow};

/// How many runners-up are returned next to the recommendation.
pub const ALTERNATIVE_TECHNICIANS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub base_score: i32,
    /// Half-width of the window around the desired start that counts as "busy".
    pub availability_window_minutes: i64,
    pub availability_penalty: i32,
    pub travel_near_minutes: u32,
    pub travel_near_points: i32,
    pub travel_mid_minutes: u32,
    pub travel_mid_points: i32,
    pub travel_far_points: i32,
    /// Daily booking count at which a technician is at capacity.
    pub capacity_bookings: usize,
    pub capacity_points: i32,
    pub busy_bookings: usize,
    pub busy_points: i32,
    pub light_points: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base_score: 100,
            availability_window_minutes: 120,
            availability_penalty: -50,
            travel_near_minutes: 15,
            travel_near_points: 20,
            travel_mid_minutes: 30,
            travel_mid_points: 10,
            travel_far_points: -10,
            capacity_bookings: 6,
            capacity_points: -30,
            busy_bookings: 4,
            busy_points: -15,
            light_points: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreFactor {
    Availability,
    TravelEfficiency,
    Workload,
}

/// Points awarded by a single factor, with a human-readable note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScore {
    pub factor: ScoreFactor,
    pub points: i32,
    pub note: String,
}

/// A technician together with their bookings for the day being scored.
#[derive(Debug, Clone)]
pub struct TechnicianCandidate {
    pub technician: Technician,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTechnician {
    pub technician_id: TechnicianId,
    pub technician_name: String,
    pub score: i32,
    pub average_travel_minutes: f64,
    pub same_day_bookings: usize,
    pub factors: Vec<FactorScore>,
    pub reasoning: String,
}

/// Ranked result. Advisory: callers may pick any scored technician.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub recommended: Option<ScoredTechnician>,
    pub alternatives: Vec<ScoredTechnician>,
    pub all_scored: Vec<ScoredTechnician>,
}

#[derive(Debug, Clone)]
pub struct TechnicianScorer {
    estimator: TravelTimeEstimator,
    weights: ScoringWeights,
    home_base: String,
}

impl TechnicianScorer {
    pub fn new(estimator: TravelTimeEstimator, weights: ScoringWeights, home_base: impl Into<String>) -> Self {
        Self {
            estimator,
            weights,
            home_base: home_base.into(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn availability_factor(&self, desired: NaiveDateTime, bookings: &[Booking]) -> FactorScore {
        let reach = Duration::minutes(self.weights.availability_window_minutes);
        let around = TimeWindow::new(desired - reach, desired + reach);
        let nearby = bookings
            .iter()
            .filter(|b| b.is_active() && b.window().overlaps(&around))
            .count();

        if nearby == 0 {
            FactorScore {
                factor: ScoreFactor::Availability,
                points: 0,
                note: "available".to_string(),
            }
        } else {
            FactorScore {
                factor: ScoreFactor::Availability,
                points: self.weights.availability_penalty,
                note: format!(
                    "{} booking(s) within {} minutes of the requested time",
                    nearby, self.weights.availability_window_minutes
                ),
            }
        }
    }

    /// Returns the factor and the mean travel time it was based on.
    pub fn travel_factor(&self, suburb: &str, bookings: &[Booking]) -> (FactorScore, f64) {
        let active: Vec<&Booking> = bookings.iter().filter(|b| b.is_active()).collect();

        if active.is_empty() {
            let from_base = self.estimator.estimate(&self.home_base, suburb);
            let factor = FactorScore {
                factor: ScoreFactor::TravelEfficiency,
                points: 0,
                note: format!("no other bookings today, {} min from {}", from_base, self.home_base),
            };
            return (factor, f64::from(from_base));
        }

        let total: u32 = active
            .iter()
            .map(|b| self.estimator.estimate(&b.location.suburb, suburb))
            .sum();
        let average = f64::from(total) / active.len() as f64;

        let points = if average <= f64::from(self.weights.travel_near_minutes) {
            self.weights.travel_near_points
        } else if average <= f64::from(self.weights.travel_mid_minutes) {
            self.weights.travel_mid_points
        } else {
            self.weights.travel_far_points
        };

        let factor = FactorScore {
            factor: ScoreFactor::TravelEfficiency,
            points,
            note: format!("average travel {:.0} min from today's bookings", average),
        };
        (factor, average)
    }

    pub fn workload_factor(&self, same_day: usize) -> FactorScore {
        let (points, note) = if same_day >= self.weights.capacity_bookings {
            (
                self.weights.capacity_points,
                format!("at capacity ({} bookings today)", same_day),
            )
        } else if same_day >= self.weights.busy_bookings {
            (
                self.weights.busy_points,
                format!("busy day ({} bookings today)", same_day),
            )
        } else {
            (
                self.weights.light_points,
                format!("light workload ({} bookings today)", same_day),
            )
        };

        FactorScore {
            factor: ScoreFactor::Workload,
            points,
            note,
        }
    }

    /// Score one technician. Only active bookings on the desired day count.
    ///
    /// The service type does not change the points; it labels the reasoning.
    pub fn score(
        &self,
        desired: NaiveDateTime,
        suburb: &str,
        service_type: Option<&str>,
        candidate: &TechnicianCandidate,
    ) -> ScoredTechnician {
        let same_day: Vec<Booking> = candidate
            .bookings
            .iter()
            .filter(|b| b.is_active() && b.scheduled_date == desired.date())
            .cloned()
            .collect();

        let availability = self.availability_factor(desired, &same_day);
        let (travel, average_travel_minutes) = self.travel_factor(suburb, &same_day);
        let workload = self.workload_factor(same_day.len());
        let factors = vec![availability, travel, workload];

        let score = self.weights.base_score + factors.iter().map(|f| f.points).sum::<i32>();
        let mut reasoning = factors
            .iter()
            .map(|f| f.note.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        if let Some(service) = service_type.map(str::trim).filter(|s| !s.is_empty()) {
            reasoning = format!("{} in {}: {}", service, suburb, reasoning);
        }

        ScoredTechnician {
            technician_id: candidate.technician.id,
            technician_name: candidate.technician.name.clone(),
            score,
            average_travel_minutes,
            same_day_bookings: same_day.len(),
            factors,
            reasoning,
        }
    }

    /// Rank the pool: highest score first, ties by ascending technician id.
    pub fn rank(
        &self,
        desired: NaiveDateTime,
        suburb: &str,
        service_type: Option<&str>,
        pool: &[TechnicianCandidate],
    ) -> Assignment {
        let mut all_scored: Vec<ScoredTechnician> = pool
            .iter()
            .map(|candidate| self.score(desired, suburb, service_type, candidate))
            .collect();
        all_scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.technician_id.cmp(&b.technician_id))
        });

        let recommended = all_scored.first().cloned();
        let alternatives = all_scored
            .iter()
            .skip(1)
            .take(ALTERNATIVE_TECHNICIANS)
            .cloned()
            .collect();

        Assignment {
            recommended,
            alternatives,
            all_scored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        clock, BookingId, BookingKind, BookingStatus, LeadId, NewBooking, ServiceLocation,
        TechnicianRole,
    };
    use crate::scheduling::SuburbTable;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn scorer() -> TechnicianScorer {
        let estimator = TravelTimeEstimator::new(Arc::new(SuburbTable::melbourne()), 15);
        TechnicianScorer::new(estimator, ScoringWeights::default(), "Melbourne")
    }

    fn technician(id: i64) -> Technician {
        Technician {
            id: TechnicianId::new(id),
            name: format!("Tech {}", id),
            email: format!("tech{}@example.com", id),
            phone: None,
            role: TechnicianRole::Technician,
            active: true,
        }
    }

    fn booking(id: i64, tech: i64, suburb: &str, hour: u32) -> Booking {
        NewBooking {
            technician_id: TechnicianId::new(tech),
            lead_id: LeadId::new(id),
            customer_name: format!("Customer {}", id),
            location: ServiceLocation {
                address: "1 Main St".to_string(),
                suburb: suburb.to_string(),
            },
            start: day().and_time(clock(hour, 0)),
            duration_minutes: 60,
            status: BookingStatus::Confirmed,
            notes: None,
            kind: BookingKind::Appointment,
        }
        .into_booking(BookingId::new(id), day().and_time(clock(6, 0)))
    }

    fn candidate(id: i64, bookings: Vec<Booking>) -> TechnicianCandidate {
        TechnicianCandidate {
            technician: technician(id),
            bookings,
        }
    }

    #[test]
    fn test_idle_technician_scores_base_plus_light_workload() {
        let scored = scorer().score(day().and_time(clock(10, 0)), "Richmond", None, &candidate(1, vec![]));
        assert_eq!(scored.score, 110);
        assert_eq!(scored.same_day_bookings, 0);
        // Melbourne (0) to Richmond (12)
        assert_eq!(scored.average_travel_minutes, 27.0);
        assert!(scored.reasoning.contains("available"));
    }

    #[test]
    fn test_availability_penalty_uses_two_hour_window() {
        let s = scorer();
        let desired = day().and_time(clock(12, 0));

        let near = s.availability_factor(desired, &[booking(1, 1, "Carlton", 10)]);
        assert_eq!(near.points, -50);

        // 09:00-10:00 ends exactly at the window start
        let far = s.availability_factor(desired, &[booking(1, 1, "Carlton", 9)]);
        assert_eq!(far.points, 0);

        let mut cancelled = booking(2, 1, "Carlton", 12);
        cancelled.status = BookingStatus::Cancelled;
        assert_eq!(s.availability_factor(desired, &[cancelled]).points, 0);
    }

    #[test]
    fn test_travel_factor_thresholds() {
        let s = scorer();
        let (near, avg) = s.travel_factor("Richmond", &[booking(1, 1, "Richmond", 8)]);
        assert_eq!(avg, 15.0);
        assert_eq!(near.points, 20);

        let (mid, _) = s.travel_factor("Richmond", &[booking(1, 1, "Melbourne", 8)]);
        assert_eq!(mid.points, 10);

        let (far, _) = s.travel_factor("Richmond", &[booking(1, 1, "Frankston", 8)]);
        assert_eq!(far.points, -10);
    }

    #[test]
    fn test_workload_thresholds() {
        let s = scorer();
        assert_eq!(s.workload_factor(0).points, 10);
        assert_eq!(s.workload_factor(3).points, 10);
        assert_eq!(s.workload_factor(4).points, -15);
        assert_eq!(s.workload_factor(5).points, -15);
        assert_eq!(s.workload_factor(6).points, -30);
        assert!(s.workload_factor(6).note.contains("at capacity"));
    }

    #[test]
    fn test_idle_technician_outranks_one_at_capacity() {
        let busy: Vec<Booking> = (0..6)
            .map(|i| booking(10 + i, 2, "Frankston", 7 + i as u32))
            .collect();
        let pool = vec![candidate(2, busy), candidate(1, vec![])];

        let assignment = scorer().rank(day().and_time(clock(15, 0)), "Carlton", None, &pool);
        let recommended = assignment.recommended.unwrap();
        assert_eq!(recommended.technician_id, TechnicianId::new(1));

        let b = &assignment.all_scored[1];
        assert_eq!(b.technician_id, TechnicianId::new(2));
        assert!(b.score <= 70);
        assert_eq!(assignment.alternatives.len(), 1);
    }

    #[test]
    fn test_ties_break_by_technician_id() {
        let pool = vec![candidate(3, vec![]), candidate(1, vec![]), candidate(2, vec![])];
        let assignment = scorer().rank(day().and_time(clock(10, 0)), "Carlton", None, &pool);
        let order: Vec<i64> = assignment
            .all_scored
            .iter()
            .map(|s| s.technician_id.value())
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_alternatives_capped_at_three() {
        let pool: Vec<_> = (1..=6).map(|id| candidate(id, vec![])).collect();
        let assignment = scorer().rank(day().and_time(clock(10, 0)), "Carlton", None, &pool);
        assert_eq!(assignment.alternatives.len(), 3);
        assert_eq!(assignment.all_scored.len(), 6);
    }

    #[test]
    fn test_empty_pool() {
        let assignment = scorer().rank(day().and_time(clock(10, 0)), "Carlton", None, &[]);
        assert!(assignment.recommended.is_none());
        assert!(assignment.all_scored.is_empty());
    }

    #[test]
    fn test_bookings_on_other_days_are_ignored() {
        let mut other_day = booking(1, 1, "Carlton", 10);
        other_day.set_start(day().succ_opt().unwrap().and_time(clock(10, 0)));
        let scored = scorer().score(day().and_time(clock(10, 0)), "Carlton", None, &candidate(1, vec![other_day]));
        assert_eq!(scored.same_day_bookings, 0);
        assert_eq!(scored.score, 110);
    }

    #[test]
    fn test_service_type_labels_reasoning_only() {
        let desired = day().and_time(clock(10, 0));
        let plain = scorer().score(desired, "Richmond", None, &candidate(1, vec![]));
        let labelled = scorer().score(
            desired,
            "Richmond",
            Some("Mould inspection"),
            &candidate(1, vec![]),
        );

        assert_eq!(labelled.score, plain.score);
        assert!(labelled.reasoning.starts_with("Mould inspection in Richmond: "));
        assert!(labelled.reasoning.ends_with(&plain.reasoning));
    }
}
