//! Daily route ordering for a single technician.
//!
//! Greedy nearest-neighbour: the earliest booking goes first, then each step
//! picks the remaining booking with the lowest time-constraint score. Routes
//! of three or more stops are also checked for zone hopping.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::suburbs::Zone;
use super::travel::TravelTimeEstimator;
use crate::models::{hhmm, Booking, BookingId, TimeWindow};

/// Score added when the gap to the next booking is shorter than the travel time.
const INFEASIBLE_PENALTY: f64 = 1000.0;
/// Idle minutes tolerated between stops before the score starts to grow.
const SLACK_TOLERANCE_MINUTES: i64 = 60;
/// More distinct zones than this in one day triggers a grouping suggestion.
const MAX_ZONES_BEFORE_SUGGESTION: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub booking_id: BookingId,
    pub customer_name: String,
    pub suburb: String,
    pub window: TimeWindow,
    pub travel_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRoute {
    pub date: NaiveDate,
    pub start_suburb: String,
    pub stops: Vec<RouteStop>,
    pub total_appointments: usize,
    pub total_travel_minutes: u32,
    pub total_distance_km: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    pub suggestions: Vec<String>,
}

/// Order the active bookings of one technician-day.
pub fn plan_route(
    estimator: &TravelTimeEstimator,
    date: NaiveDate,
    start_suburb: &str,
    bookings: &[Booking],
) -> DailyRoute {
    let mut remaining: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.is_active() && b.scheduled_date == date)
        .collect();
    remaining.sort_by_key(|b| (b.start(), b.id));

    let working_hours = match (remaining.first(), remaining.iter().map(|b| b.window().end).max()) {
        (Some(first), Some(end)) => Some(WorkingHours {
            start: first.scheduled_time,
            end: end.time(),
        }),
        _ => None,
    };

    let mut stops: Vec<RouteStop> = Vec::with_capacity(remaining.len());
    let mut suggestions = Vec::new();
    let mut total_travel_minutes = 0u32;
    let mut total_distance_km = 0u32;

    if !remaining.is_empty() {
        let first = remaining.remove(0);
        let travel = estimator.estimate(start_suburb, &first.location.suburb);
        total_travel_minutes += travel;
        total_distance_km += estimator.distance_km(start_suburb, &first.location.suburb);
        stops.push(stop(first, travel));

        let mut previous = first;
        while !remaining.is_empty() {
            let mut best: Option<(usize, f64)> = None;
            for (index, candidate) in remaining.iter().enumerate() {
                let score = time_constraint_score(estimator, previous, candidate);
                if best.map_or(true, |(_, lowest)| score < lowest) {
                    best = Some((index, score));
                }
            }
            let Some((index, _)) = best else { break };

            let next = remaining.remove(index);
            let travel = estimator.estimate(&previous.location.suburb, &next.location.suburb);
            let gap = signed_gap(previous, next);
            if gap < i64::from(travel) {
                suggestions.push(format!(
                    "Tight schedule: only {} minutes between {} and {} (need {} minutes)",
                    gap,
                    previous.location.suburb,
                    next.location.suburb,
                    travel
                ));
            }
            total_travel_minutes += travel;
            total_distance_km += estimator.distance_km(&previous.location.suburb, &next.location.suburb);
            stops.push(stop(next, travel));
            previous = next;
        }
    }

    if stops.len() > 2 {
        suggestions.extend(zone_suggestions(&stops));
    }

    DailyRoute {
        date,
        start_suburb: start_suburb.to_string(),
        total_appointments: stops.len(),
        stops,
        total_travel_minutes,
        total_distance_km,
        working_hours,
        suggestions,
    }
}

fn stop(booking: &Booking, travel_minutes: u32) -> RouteStop {
    RouteStop {
        booking_id: booking.id,
        customer_name: booking.customer_name.clone(),
        suburb: booking.location.suburb.clone(),
        window: booking.window(),
        travel_minutes,
    }
}

/// Grouping and back-and-forth hints over the ordered stops.
fn zone_suggestions(stops: &[RouteStop]) -> Vec<String> {
    let zones: Vec<Zone> = stops.iter().map(|s| Zone::of(&s.suburb)).collect();
    let mut suggestions = Vec::new();

    let mut distinct = zones.clone();
    distinct.sort_by_key(|zone| *zone as u8);
    distinct.dedup();
    if distinct.len() > MAX_ZONES_BEFORE_SUGGESTION {
        suggestions.push(format!(
            "Route crosses {} zones: consider grouping appointments by area",
            distinct.len()
        ));
    }

    for (i, triple) in zones.windows(3).enumerate() {
        if triple[0] == triple[2] && triple[1] != triple[0] {
            suggestions.push(format!(
                "Potential zigzag detected: {} -> {} -> {}",
                stops[i].suburb,
                stops[i + 1].suburb,
                stops[i + 2].suburb
            ));
        }
    }
    suggestions
}

/// Minutes from the end of `from` to the start of `to`; negative if `to` starts earlier.
fn signed_gap(from: &Booking, to: &Booking) -> i64 {
    (to.start() - from.window().end).num_minutes()
}

fn time_constraint_score(estimator: &TravelTimeEstimator, from: &Booking, to: &Booking) -> f64 {
    let required = i64::from(estimator.estimate(&from.location.suburb, &to.location.suburb));
    let gap = signed_gap(from, to);

    if gap < required {
        return INFEASIBLE_PENALTY + (required - gap) as f64;
    }
    let excess = gap - required;
    let slack_penalty = if excess > SLACK_TOLERANCE_MINUTES {
        excess as f64 * 0.5
    } else {
        0.0
    };
    required as f64 + slack_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{clock, BookingKind, BookingStatus, LeadId, NewBooking, ServiceLocation, TechnicianId};
    use crate::scheduling::SuburbTable;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn estimator() -> TravelTimeEstimator {
        TravelTimeEstimator::new(Arc::new(SuburbTable::melbourne()), 15)
    }

    fn booking(id: i64, suburb: &str, hour: u32, minute: u32, minutes: u32) -> Booking {
        NewBooking {
            technician_id: TechnicianId::new(1),
            lead_id: LeadId::new(id),
            customer_name: format!("Customer {}", id),
            location: ServiceLocation {
                address: "1 Main St".to_string(),
                suburb: suburb.to_string(),
            },
            start: day().and_time(clock(hour, minute)),
            duration_minutes: minutes,
            status: BookingStatus::Confirmed,
            notes: None,
            kind: BookingKind::Appointment,
        }
        .into_booking(BookingId::new(id), day().and_time(clock(6, 0)))
    }

    #[test]
    fn test_empty_day() {
        let route = plan_route(&estimator(), day(), "Melbourne", &[]);
        assert!(route.stops.is_empty());
        assert_eq!(route.total_appointments, 0);
        assert_eq!(route.total_travel_minutes, 0);
        assert_eq!(route.total_distance_km, 0);
        assert!(route.working_hours.is_none());
    }

    #[test]
    fn test_single_booking_counts_home_leg() {
        let route = plan_route(&estimator(), day(), "Melbourne", &[booking(1, "Richmond", 9, 0, 60)]);
        assert_eq!(route.stops.len(), 1);
        assert_eq!(route.total_travel_minutes, 27);
        assert_eq!(
            route.working_hours,
            Some(WorkingHours {
                start: clock(9, 0),
                end: clock(10, 0)
            })
        );
    }

    #[test]
    fn test_feasible_day_keeps_chronological_order() {
        let bookings = vec![
            booking(3, "Carlton", 14, 0, 60),
            booking(1, "Richmond", 9, 0, 60),
            booking(2, "Prahran", 11, 0, 60),
        ];
        let route = plan_route(&estimator(), day(), "Melbourne", &bookings);

        let order: Vec<i64> = route.stops.iter().map(|s| s.booking_id.value()).collect();
        assert_eq!(order, vec![1, 2, 3]);
        // 27 (home) + 15 (Richmond-Prahran) + 22 (Prahran-Carlton)
        assert_eq!(route.total_travel_minutes, 64);
        // 12, 0 and 7 driving minutes at 25 km/h, rounded per leg
        assert_eq!(route.total_distance_km, 5 + 3);
        assert_eq!(route.total_appointments, 3);
        // Inner city, inner south, back to inner city
        assert_eq!(
            route.suggestions,
            vec!["Potential zigzag detected: Richmond -> Prahran -> Carlton".to_string()]
        );
    }

    #[test]
    fn test_tight_gap_is_reported() {
        let bookings = vec![
            booking(1, "Richmond", 10, 0, 120),
            booking(2, "Frankston", 12, 5, 60),
        ];
        let route = plan_route(&estimator(), day(), "Melbourne", &bookings);
        assert_eq!(route.suggestions.len(), 1);
        assert!(route.suggestions[0].contains("only 5 minutes"));
        assert!(route.suggestions[0].contains("need 48 minutes"));
    }

    #[test]
    fn test_cancelled_and_other_days_skipped() {
        let mut cancelled = booking(1, "Richmond", 9, 0, 60);
        cancelled.status = BookingStatus::Cancelled;
        let mut tomorrow = booking(2, "Richmond", 9, 0, 60);
        tomorrow.set_start(day().succ_opt().unwrap().and_time(clock(9, 0)));

        let route = plan_route(&estimator(), day(), "Melbourne", &[cancelled, tomorrow]);
        assert!(route.stops.is_empty());
    }

    #[test]
    fn test_route_across_many_zones_is_flagged() {
        let bookings = vec![
            booking(1, "Richmond", 9, 0, 60),
            booking(2, "Brunswick", 11, 0, 60),
            booking(3, "Brighton", 13, 0, 60),
        ];
        let route = plan_route(&estimator(), day(), "Melbourne", &bookings);

        let order: Vec<i64> = route.stops.iter().map(|s| s.booking_id.value()).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(
            route.suggestions,
            vec!["Route crosses 3 zones: consider grouping appointments by area".to_string()]
        );
    }

    #[test]
    fn test_two_stops_skip_zone_rules() {
        let bookings = vec![
            booking(1, "Richmond", 9, 0, 60),
            booking(2, "Brighton", 13, 0, 60),
        ];
        let route = plan_route(&estimator(), day(), "Melbourne", &bookings);
        assert_eq!(route.total_appointments, 2);
        assert!(route.suggestions.is_empty());
    }
}
