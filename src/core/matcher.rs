use std::cmp::Ordering;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::core::{
    compat::is_compatible,
    reason::{build_reason, FULL_COMPATIBILITY},
};
use crate::models::{MatchCandidate, ServiceDomain, ServiceOffer, ServiceRequest};
use crate::services::directory::{ConfirmOutcome, Directory, DirectoryError};

/// Errors surfaced by the match engine
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("request {0} not found")]
    NotFound(Uuid),

    #[error("directory error: {0}")]
    Directory(DirectoryError),
}

/// Matching engine for pending service requests
///
/// A pure read path: loads the request, filters the domain's live offers
/// through the compatibility predicate, orders by price and truncates.
/// Confirmation is a separate operation with its own atomicity guard.
pub struct MatchEngine {
    directory: Arc<dyn Directory>,
    default_limit: usize,
    max_limit: usize,
}

impl MatchEngine {
    pub fn new(directory: Arc<dyn Directory>, default_limit: usize, max_limit: usize) -> Self {
        Self {
            directory,
            default_limit,
            max_limit,
        }
    }

    /// Find compatible offers for a pending request, cheapest first
    ///
    /// Returns an empty list (not an error) when the request is already
    /// matched; matching is idempotent and side-effect free.
    pub async fn find_matches(
        &self,
        request_id: Uuid,
        domain: ServiceDomain,
        max_results: Option<usize>,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        let limit = max_results.unwrap_or(self.default_limit).min(self.max_limit);

        let request = self
            .directory
            .get_request(domain, request_id)
            .await
            .map_err(|e| match e {
                DirectoryError::NotFound(_) => MatchError::NotFound(request_id),
                other => MatchError::Directory(other),
            })?;

        if request.matched {
            tracing::debug!(%request_id, "Request already matched, returning empty result");
            return Ok(Vec::new());
        }

        let offers = self
            .directory
            .list_available_offers(domain)
            .await
            .map_err(MatchError::Directory)?;

        let candidates = rank_offers(&request, offers, limit);

        tracing::info!(
            %request_id,
            domain = domain.as_str(),
            matches = candidates.len(),
            "Matching complete"
        );

        Ok(candidates)
    }

    /// Confirm a match against a specific offer
    ///
    /// The availability re-check runs atomically on the directory side,
    /// which owns the request and offer rows; a lost race surfaces as
    /// `ConfirmOutcome::Conflict`, never as a double booking.
    pub async fn confirm_match(
        &self,
        domain: ServiceDomain,
        request_id: Uuid,
        offer_id: Uuid,
    ) -> Result<ConfirmOutcome, MatchError> {
        self.directory
            .confirm_match(domain, request_id, offer_id)
            .await
            .map_err(|e| match e {
                DirectoryError::NotFound(_) => MatchError::NotFound(request_id),
                other => MatchError::Directory(other),
            })
    }
}

/// Filter, order and truncate offers for a request
///
/// Ordering is ascending by price with a stable sort, so equally priced
/// offers keep their insertion order.
pub fn rank_offers(
    request: &ServiceRequest,
    offers: Vec<ServiceOffer>,
    limit: usize,
) -> Vec<MatchCandidate> {
    let mut candidates: Vec<MatchCandidate> = offers
        .into_iter()
        .filter(|offer| is_compatible(request, offer))
        .map(|offer| {
            let reason = build_reason(&offer);
            MatchCandidate {
                request_id: request.id,
                offer_id: offer.id,
                owner_id: offer.owner_id,
                price: offer.price,
                compatibility_score: FULL_COMPATIBILITY,
                reason,
            }
        })
        .collect();

    candidates.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));
    candidates.truncate(limit);

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OfferCriteria, RequestCriteria};
    use chrono::{NaiveDate, Utc};

    fn request(requester: &str, price: f64) -> ServiceRequest {
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

    fn offer(owner: &str, price: f64) -> ServiceOffer {
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

    #[test]
    fn test_single_compatible_offer_scores_full() {
        let request = request("traveller", 80.0);
        let candidate_offer = offer("companion", 60.0);
        let offer_id = candidate_offer.id;

        let candidates = rank_offers(&request, vec![candidate_offer], 10);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].offer_id, offer_id);
        assert_eq!(candidates[0].compatibility_score, 100);
    }

    #[test]
    fn test_cheapest_first_ordering() {
        let request = request("traveller", 80.0);
        let offers = vec![
            offer("a", 90.0),
            offer("b", 55.0),
            offer("c", 70.0),
        ];

        let candidates = rank_offers(&request, offers, 10);

        let prices: Vec<f64> = candidates.iter().map(|c| c.price).collect();
        assert_eq!(prices, vec![55.0, 70.0, 90.0]);
    }

    #[test]
    fn test_equal_prices_keep_insertion_order() {
        let request = request("traveller", 80.0);
        let offers = vec![offer("first", 60.0), offer("second", 60.0)];
        let first_id = offers[0].id;
        let second_id = offers[1].id;

        let candidates = rank_offers(&request, offers, 10);

        assert_eq!(candidates[0].offer_id, first_id);
        assert_eq!(candidates[1].offer_id, second_id);
    }

    #[test]
    fn test_never_matches_own_offer() {
        let request = request("traveller", 80.0);
        let offers = vec![offer("traveller", 10.0), offer("companion", 60.0)];

        let candidates = rank_offers(&request, offers, 10);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].owner_id, "companion");
    }

    #[test]
    fn test_truncates_to_limit() {
        let request = request("traveller", 80.0);
        let offers: Vec<ServiceOffer> = (0..20)
            .map(|i| offer(&format!("provider-{}", i), 50.0 + i as f64))
            .collect();

        let candidates = rank_offers(&request, offers, 5);

        assert_eq!(candidates.len(), 5);
    }
}
