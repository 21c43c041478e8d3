use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{MatchEngine, MatchError};
use crate::models::{
    ConfirmMatchRequest, ConfirmMatchResponse, ErrorResponse, FindMatchesRequest,
    FindMatchesResponse, HealthResponse,
};
use crate::services::{
    ConfirmOutcome, Directory, EscalationService, NotificationDispatcher, NotificationStore,
    PgStore,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub escalation: Arc<EscalationService>,
    pub directory: Arc<dyn Directory>,
    pub notifications: Arc<dyn NotificationStore>,
    pub store: Arc<PgStore>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/confirm", web::post().to(confirm_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find match candidates for a pending request
///
/// POST /api/v1/matches/find
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let limit = req.limit.map(|l| l as usize);

    match state.engine.find_matches(req.request_id, req.domain, limit).await {
        Ok(matches) => {
            let total_results = matches.len();
            HttpResponse::Ok().json(FindMatchesResponse {
                matches,
                total_results,
            })
        }
        Err(MatchError::NotFound(id)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Request not found".to_string(),
            message: format!("No pending request with id {}", id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!(request_id = %req.request_id, "Matching failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matching failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Confirm a match and notify both parties
///
/// POST /api/v1/matches/confirm
///
/// The availability re-check runs atomically on the directory side; a
/// lost race comes back as 409 rather than a double booking.
async fn confirm_match(
    state: web::Data<AppState>,
    req: web::Json<ConfirmMatchRequest>,
) -> impl Responder {
    let request = match state.directory.get_request(req.domain, req.request_id).await {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(request_id = %req.request_id, "Request lookup failed: {}", e);
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Request not found".to_string(),
                message: e.to_string(),
                status_code: 404,
            });
        }
    };

    let offer = match state.directory.get_offer(req.domain, req.offer_id).await {
        Ok(offer) => offer,
        Err(e) => {
            tracing::error!(offer_id = %req.offer_id, "Offer lookup failed: {}", e);
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Offer not found".to_string(),
                message: e.to_string(),
                status_code: 404,
            });
        }
    };

    match state
        .engine
        .confirm_match(req.domain, req.request_id, req.offer_id)
        .await
    {
        Ok(ConfirmOutcome::Confirmed) => {
            // The confirmation is already committed; a notification
            // failure here must not roll it back.
            if let Err(e) = state
                .dispatcher
                .dispatch_match_notifications(
                    &request.requester_id,
                    &offer.owner_id,
                    req.domain,
                    &request.criteria.summary(),
                )
                .await
            {
                tracing::warn!(
                    request_id = %req.request_id,
                    "Match confirmed but notifications failed: {}",
                    e
                );
            }

            HttpResponse::Ok().json(ConfirmMatchResponse {
                confirmed: true,
                message: "Match confirmed".to_string(),
            })
        }
        Ok(ConfirmOutcome::Conflict) => HttpResponse::Conflict().json(ConfirmMatchResponse {
            confirmed: false,
            message: "Offer is no longer available".to_string(),
        }),
        Err(e) => {
            tracing::error!(request_id = %req.request_id, "Confirmation failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Confirmation failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::HealthResponse;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
