// Unit tests for the Wingmate core

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use wingmate::core::{build_reason, is_compatible, rank_offers, FULL_COMPATIBILITY};
use wingmate::models::{
    NotificationCategory, OfferCriteria, RequestCriteria, ServiceOffer, ServiceRequest,
};

fn companionship_request(requester: &str, price: f64) -> ServiceRequest {
    ServiceRequest {
        id: Uuid::new_v4(),
        requester_id: requester.to_string(),
        criteria: RequestCriteria::Companionship {
            origin: "AKL".to_string(),
            destination: "PVG".to_string(),
            travel_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        },
        price,
        matched: false,
        matched_offer_id: None,
        created_at: Utc::now(),
    }
}

fn companionship_offer(owner: &str, price: f64) -> ServiceOffer {
    ServiceOffer {
        id: Uuid::new_v4(),
        owner_id: owner.to_string(),
        criteria: OfferCriteria::Companionship {
            origin: "AKL".to_string(),
            destination: "PVG".to_string(),
            travel_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        },
        price,
        available: true,
        times_completed: 0,
        average_rating: None,
        owner_verified: false,
        created_at: Utc::now(),
    }
}

fn pickup_offer(owner: &str, capacity: u8, luggage_space: bool, price: f64) -> ServiceOffer {
    ServiceOffer {
        id: Uuid::new_v4(),
        owner_id: owner.to_string(),
        criteria: OfferCriteria::Pickup {
            airport: "AKL".to_string(),
            vehicle_capacity: capacity,
            luggage_space,
        },
        price,
        available: true,
        times_completed: 0,
        average_rating: None,
        owner_verified: false,
        created_at: Utc::now(),
    }
}

#[test]
fn test_example_scenario_single_candidate() {
    // Request R1 (AKL -> PVG, 2025-09-01, price 80) and offer O1 (same
    // route and date, price 60, different owner) yield exactly one
    // candidate at full score.
    let request = companionship_request("r1-user", 80.0);
    let offer = companionship_offer("o1-user", 60.0);
    let offer_id = offer.id;

    let candidates = rank_offers(&request, vec![offer], 10);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].offer_id, offer_id);
    assert_eq!(candidates[0].compatibility_score, FULL_COMPATIBILITY);
}

#[test]
fn test_no_self_matching_property() {
    let request = companionship_request("traveller", 80.0);
    let offers = vec![
        companionship_offer("traveller", 10.0),
        companionship_offer("a", 50.0),
        companionship_offer("traveller", 20.0),
        companionship_offer("b", 70.0),
    ];

    let candidates = rank_offers(&request, offers, 10);

    assert_eq!(candidates.len(), 2);
    for candidate in &candidates {
        assert_ne!(candidate.owner_id, "traveller");
    }
}

#[test]
fn test_price_ordering_property() {
    let request = companionship_request("traveller", 80.0);
    let offers: Vec<ServiceOffer> = [95.0, 40.0, 60.0, 40.0, 72.5]
        .iter()
        .enumerate()
        .map(|(i, price)| companionship_offer(&format!("p{}", i), *price))
        .collect();

    let candidates = rank_offers(&request, offers, 10);

    for pair in candidates.windows(2) {
        assert!(pair[0].price <= pair[1].price);
    }
}

#[test]
fn test_pickup_compatibility_matrix() {
    let request = ServiceRequest {
        id: Uuid::new_v4(),
        requester_id: "traveller".to_string(),
        criteria: RequestCriteria::Pickup {
            airport: "AKL".to_string(),
            passenger_count: 2,
            has_luggage: true,
        },
        price: 40.0,
        matched: false,
        matched_offer_id: None,
        created_at: Utc::now(),
    };

    // Capacity too small
    assert!(!is_compatible(&request, &pickup_offer("d1", 1, true, 30.0)));
    // No luggage space for a luggage-carrying traveller
    assert!(!is_compatible(&request, &pickup_offer("d2", 4, false, 30.0)));
    // Fits
    assert!(is_compatible(&request, &pickup_offer("d3", 2, true, 30.0)));
}

#[test]
fn test_reason_reflects_reputation_signals() {
    let mut offer = companionship_offer("companion", 60.0);
    offer.average_rating = Some(4.8);
    offer.times_completed = 12;
    offer.owner_verified = true;

    let reason = build_reason(&offer);

    assert!(reason.contains("4.8"));
    assert!(reason.contains("12 services completed"));
    assert!(reason.contains("verified identity"));
}

#[test]
fn test_category_expiry_lookup() {
    assert_eq!(
        NotificationCategory::ServiceConfirmed.expiry(),
        chrono::Duration::days(7)
    );
    assert_eq!(
        NotificationCategory::ServiceAssignment.expiry(),
        chrono::Duration::days(7)
    );
    assert_eq!(
        NotificationCategory::PaymentReceived.expiry(),
        chrono::Duration::days(30)
    );
    assert_eq!(
        NotificationCategory::EmergencyAlert.expiry(),
        chrono::Duration::days(7)
    );
}
