//! End-to-end scheduling scenarios: conflict rules, ranking and races.

mod support;

use std::sync::Arc;

use inspection_scheduler::db::{BookingFilter, FullRepository, LocalRepository};
use inspection_scheduler::models::{BookingStatus, SlotUnavailableReason, TimeWindow};
use inspection_scheduler::scheduling::{ConflictKind, ProposedBooking, SchedulingEngine};
use inspection_scheduler::services::{BookingService, LogNotificationSink, SchedulingError};
use support::*;

#[tokio::test]
async fn test_travel_time_between_richmond_and_frankston() {
    let (service, _) = service();
    service
        .confirm_slot(request(ALEX, at(10, 0), 120, "Richmond"))
        .await
        .unwrap();

    let err = service
        .create(request(ALEX, at(12, 5), 60, "Frankston"))
        .await
        .unwrap_err();
    let report = match err {
        SchedulingError::Conflict(report) => report,
        other => panic!("expected conflict, got {:?}", other),
    };

    assert_eq!(report.kinds(), vec![ConflictKind::TravelTime]);
    let travel = &report.conflicts[0];
    assert_eq!(travel.required_gap_minutes, Some(48));
    assert_eq!(travel.actual_gap_minutes, Some(5));
    assert_eq!(travel.suburb.as_deref(), Some("Richmond"));

    // Alternatives fit business hours and avoid the existing booking
    assert!(!report.suggested_alternatives.is_empty());
    for slot in &report.suggested_alternatives {
        assert!(slot.is_available);
        assert!(!slot.window.overlaps(&TimeWindow::from_start(at(10, 0), 120)));
    }
}

#[tokio::test]
async fn test_early_morning_request_is_outside_hours() {
    let (service, _) = service();
    let report = service
        .check_conflicts(SAM, at(6, 30), Some(60), "Carlton")
        .await
        .unwrap();
    assert_eq!(report.kinds(), vec![ConflictKind::OutsideHours]);

    // Every technician gets the same answer, busy or not
    service
        .confirm_slot(request(ALEX, at(7, 0), 60, "Carlton"))
        .await
        .unwrap();
    let report = service
        .check_conflicts(ALEX, at(6, 30), Some(60), "Carlton")
        .await
        .unwrap();
    assert!(report.has(ConflictKind::OutsideHours));
    assert!(report.has(ConflictKind::DoubleBooking));
}

#[tokio::test]
async fn test_booking_may_end_exactly_at_close() {
    let (service, _) = service();
    let report = service
        .check_conflicts(ALEX, at(18, 0), Some(60), "Carlton")
        .await
        .unwrap();
    assert!(!report.has_conflicts());

    let report = service
        .check_conflicts(ALEX, at(18, 1), Some(60), "Carlton")
        .await
        .unwrap();
    assert_eq!(report.kinds(), vec![ConflictKind::OutsideHours]);
}

#[tokio::test]
async fn test_check_conflicts_lists_nearby_suburbs() {
    let (service, _) = service();
    let report = service
        .check_conflicts(ALEX, at(10, 0), Some(60), "Richmond")
        .await
        .unwrap();
    assert!(!report.has_conflicts());
    assert!(report.suggested_alternatives.is_empty());
    assert!(!report.nearby_suburbs.is_empty());
    assert!(report.nearby_suburbs.iter().all(|s| s.travel_minutes <= 20));
    assert!(report.nearby_suburbs.iter().all(|s| s.name != "Richmond"));
}

#[tokio::test]
async fn test_assignment_prefers_free_technician_over_full_one() {
    let repo = seeded_repository();
    for (i, hour) in (13..19).enumerate() {
        repo.import_booking(booking(100 + i as i64, SAM, at(hour, 0), 60, "Frankston"));
    }
    let (service, _) = service_with(repo);

    let assignment = service
        .optimal_assignment("Carlton", at(10, 0), Some("Termite inspection"))
        .await
        .unwrap();

    // Office staff and inactive technicians are not in the pool
    assert_eq!(assignment.all_scored.len(), 2);

    let best = assignment.recommended.expect("a recommendation");
    assert_eq!(best.technician_id, ALEX);
    assert_eq!(best.score, 110);

    let sam = assignment
        .all_scored
        .iter()
        .find(|s| s.technician_id == SAM)
        .unwrap();
    assert_eq!(sam.same_day_bookings, 6);
    assert!(sam.score <= 70);
    assert_eq!(assignment.alternatives.len(), 1);
    assert_eq!(assignment.alternatives[0].technician_id, SAM);
    assert!(sam.reasoning.starts_with("Termite inspection in Carlton: "));
}

#[tokio::test]
async fn test_assignment_without_field_staff_is_not_found() {
    let repo = LocalRepository::new();
    let (service, _) = service_with(repo);
    assert!(matches!(
        service.optimal_assignment("Carlton", at(10, 0), None).await.unwrap_err(),
        SchedulingError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_availability_marks_booked_slots() {
    let (service, _) = service();
    service
        .create(request(ALEX, at(10, 0), 60, "Richmond"))
        .await
        .unwrap();

    let slots = service.availability(ALEX, day(), Some(60), None).await.unwrap();
    assert_eq!(slots.len(), 23);
    assert_eq!(slots.first().unwrap().window.start, at(7, 0));
    assert_eq!(slots.last().unwrap().window.end, at(19, 0));

    let booked: Vec<_> = slots.iter().filter(|s| !s.is_available).collect();
    // 09:30, 10:00 and 10:30 overlap 10:00-11:00
    assert_eq!(booked.len(), 3);
    assert!(booked
        .iter()
        .all(|s| s.reason == Some(SlotUnavailableReason::Booked)));

    let hourly = service.availability(ALEX, day(), Some(60), Some(60)).await.unwrap();
    assert_eq!(hourly.len(), 12);
    assert!(service.availability(ALEX, day(), Some(60), Some(0)).await.is_err());
}

#[tokio::test]
async fn test_check_availability_with_and_without_suburb() {
    let (service, _) = service();
    service
        .confirm_slot(request(ALEX, at(10, 0), 120, "Richmond"))
        .await
        .unwrap();

    // Without a suburb only hours and overlap are checked
    let quick = service
        .check_availability(ALEX, at(12, 5), Some(60), None)
        .await
        .unwrap();
    assert!(quick.available);

    let full = service
        .check_availability(ALEX, at(12, 5), Some(60), Some("Frankston"))
        .await
        .unwrap();
    assert!(!full.available);
    assert_eq!(full.slot.reason, Some(SlotUnavailableReason::TravelTime));
    assert_eq!(full.conflicts.len(), 1);
}

#[tokio::test]
async fn test_inspection_slots_across_technicians() {
    let (service, _) = service();
    service
        .confirm_slot(request(ALEX, at(11, 0), 120, "Richmond"))
        .await
        .unwrap();

    let slots = service.inspection_slots(day(), "Richmond", None).await.unwrap();
    let starts = |tech| -> Vec<u32> {
        slots
            .iter()
            .filter(|s| s.technician_id == tech)
            .map(|s| chrono::Timelike::hour(&s.slot.window.start))
            .collect()
    };

    assert_eq!(starts(SAM), vec![9, 11, 13, 15]);
    // 09:00 and 13:00 leave no gap around the Richmond booking, 11:00 overlaps it
    assert_eq!(starts(ALEX), vec![15]);
    assert!(slots.iter().all(|s| s.slot.is_available));
    assert!(slots.windows(2).all(|w| w[0].slot.window.start <= w[1].slot.window.start));
}

#[tokio::test]
async fn test_overlap_audit_finds_imported_double_bookings() {
    let repo = seeded_repository();
    repo.import_booking(booking(1, ALEX, at(9, 0), 120, "Richmond"));
    repo.import_booking(booking(2, ALEX, at(10, 0), 60, "Carlton"));
    repo.import_booking(booking(3, SAM, at(9, 0), 60, "Carlton"));
    let mut cancelled = booking(4, ALEX, at(9, 30), 60, "Carlton");
    cancelled.status = BookingStatus::Cancelled;
    repo.import_booking(cancelled);
    let (service, _) = service_with(repo);

    let findings = service.audit_conflicts(None, None, None).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, ConflictKind::Overlap);
    assert_eq!(findings[0].technician_id, ALEX);
    assert_eq!(findings[0].overlap_minutes, 60);

    let none = service
        .audit_conflicts(Some(SAM), Some(day()), Some(day()))
        .await
        .unwrap();
    assert!(none.is_empty());
    let later = service
        .audit_conflicts(None, Some(next_day()), None)
        .await
        .unwrap();
    assert!(later.is_empty());
}

#[tokio::test]
async fn test_daily_route_orders_stops() {
    let (service, _) = service();
    service
        .create(request(ALEX, at(14, 0), 60, "Carlton"))
        .await
        .unwrap();
    service
        .create(request(ALEX, at(9, 0), 60, "Richmond"))
        .await
        .unwrap();

    let route = service.daily_route(ALEX, day()).await.unwrap();
    assert_eq!(route.start_suburb, "Melbourne");
    assert_eq!(route.stops.len(), 2);
    assert_eq!(route.stops[0].suburb, "Richmond");
    assert_eq!(route.stops[1].suburb, "Carlton");
    // Melbourne -> Richmond (12 + 15), Richmond -> Carlton (7 + 15)
    assert_eq!(route.total_travel_minutes, 27 + 22);
    assert!(route.suggestions.is_empty());
}

fn shared_service() -> (BookingService, LocalRepository) {
    let repo = seeded_repository();
    let service = BookingService::new(
        Arc::new(repo.clone()) as Arc<dyn FullRepository>,
        Arc::new(SchedulingEngine::default()),
        Arc::new(LogNotificationSink),
    );
    (service, repo)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_confirm_books_slot_once() {
    let (service, repo) = shared_service();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .confirm_slot(request(ALEX, at(10, 0), 60, "Richmond"))
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => {
                assert_eq!(booking.status, BookingStatus::Confirmed);
                successes += 1;
            }
            Err(err) => {
                assert!(err.is_conflict(), "unexpected error {:?}", err);
                rejections += 1;
            }
        }
    }
    assert_eq!((successes, rejections), (1, 1));

    let confirmed = service
        .list_bookings(&BookingFilter {
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(repo.booking_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_creates_never_double_book() {
    let (service, _) = shared_service();

    let handles: Vec<_> = [0, 15, 30, 45, 50]
        .into_iter()
        .map(|minute| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create(request(ALEX, at(10, minute), 60, "Richmond"))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    // Other technicians are not serialized behind Alex
    assert!(service
        .create(request(SAM, at(10, 0), 60, "Richmond"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_proposal_excluding_itself_is_clear() {
    let engine = SchedulingEngine::default();
    let existing = vec![booking(1, ALEX, at(10, 0), 60, "Richmond")];
    let proposal = ProposedBooking::new(ALEX, at(10, 30), 60, "Richmond");
    assert!(engine.detector().check(&proposal, &existing).has_conflicts());
    assert!(!engine
        .detector()
        .check(&proposal.excluding(existing[0].id), &existing)
        .has_conflicts());
}
