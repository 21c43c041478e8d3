use crate::models::{OfferCriteria, RequestCriteria, ServiceOffer, ServiceRequest};

/// Check whether an offer is a structural candidate for a request
///
/// Compatibility is binary: an offer either satisfies every constraint of
/// the request's domain or it is not a candidate at all. The availability
/// flag is advisory here; confirmation re-checks it on the owning side.
#[inline]
pub fn is_compatible(request: &ServiceRequest, offer: &ServiceOffer) -> bool {
    if !offer.available {
        return false;
    }

    // Never match a requester with their own offer
    if offer.owner_id == request.requester_id {
        return false;
    }

    matches_domain_criteria(&request.criteria, &offer.criteria)
}

/// Domain-specific compatibility predicate
#[inline]
pub fn matches_domain_criteria(request: &RequestCriteria, offer: &OfferCriteria) -> bool {
    match (request, offer) {
        (
            RequestCriteria::Companionship {
                origin,
                destination,
                travel_date,
            },
            OfferCriteria::Companionship {
                origin: offer_origin,
                destination: offer_destination,
                travel_date: offer_date,
            },
        ) => origin == offer_origin && destination == offer_destination && travel_date == offer_date,
        (
            RequestCriteria::Pickup {
                airport,
                passenger_count,
                has_luggage,
            },
            OfferCriteria::Pickup {
                airport: offer_airport,
                vehicle_capacity,
                luggage_space,
            },
        ) => {
            airport == offer_airport
                && vehicle_capacity >= passenger_count
                && (!has_luggage || *luggage_space)
        }
        // Cross-domain pairs are never compatible
        _ => false,
    }
}
