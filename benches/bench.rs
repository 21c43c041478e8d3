// Criterion benchmarks for the Wingmate core

use chrono::{NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use wingmate::core::{is_compatible, rank_offers};
use wingmate::models::{OfferCriteria, RequestCriteria, ServiceOffer, ServiceRequest};

fn create_request() -> ServiceRequest {
    ServiceRequest {
        id: Uuid::new_v4(),
        requester_id: "current_user".to_string(),
        criteria: RequestCriteria::Pickup {
            airport: "AKL".to_string(),
            passenger_count: 2,
            has_luggage: true,
        },
        price: 40.0,
        matched: false,
        matched_offer_id: None,
        created_at: Utc::now(),
    }
}

fn create_offer(id: usize) -> ServiceOffer {
    ServiceOffer {
        id: Uuid::new_v4(),
        owner_id: format!("provider-{}", id),
        criteria: OfferCriteria::Pickup {
            airport: if id % 5 == 0 { "WLG" } else { "AKL" }.to_string(),
            vehicle_capacity: 1 + (id % 6) as u8,
            luggage_space: id % 3 != 0,
        },
        price: 20.0 + (id % 40) as f64,
        available: id % 7 != 0,
        times_completed: (id % 20) as u32,
        average_rating: if id % 2 == 0 { Some(4.0 + (id % 10) as f64 / 10.0) } else { None },
        owner_verified: id % 4 == 0,
        created_at: Utc::now(),
    }
}

fn create_companionship_pair() -> (ServiceRequest, ServiceOffer) {
    let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let request = ServiceRequest {
        id: Uuid::new_v4(),
        requester_id: "traveller".to_string(),
        criteria: RequestCriteria::Companionship {
            origin: "AKL".to_string(),
            destination: "PVG".to_string(),
            travel_date: date,
        },
        price: 80.0,
        matched: false,
        matched_offer_id: None,
        created_at: Utc::now(),
    };
    let offer = ServiceOffer {
        id: Uuid::new_v4(),
        owner_id: "companion".to_string(),
        criteria: OfferCriteria::Companionship {
            origin: "AKL".to_string(),
            destination: "PVG".to_string(),
            travel_date: date,
        },
        price: 60.0,
        available: true,
        times_completed: 3,
        average_rating: Some(4.5),
        owner_verified: true,
        created_at: Utc::now(),
    };
    (request, offer)
}

fn bench_compatibility_predicate(c: &mut Criterion) {
    let (request, offer) = create_companionship_pair();

    c.bench_function("compatibility_predicate", |b| {
        b.iter(|| is_compatible(black_box(&request), black_box(&offer)));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let request = create_request();

    let mut group = c.benchmark_group("ranking");

    for offer_count in [10, 50, 100, 500, 1000].iter() {
        let offers: Vec<ServiceOffer> = (0..*offer_count).map(create_offer).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(offer_count),
            &offers,
            |b, offers| {
                b.iter(|| rank_offers(black_box(&request), offers.clone(), 10));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compatibility_predicate, bench_ranking);
criterion_main!(benches);
