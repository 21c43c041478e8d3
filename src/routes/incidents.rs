use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CancelIncidentRequest, CancelIncidentResponse, ErrorResponse, IncidentListResponse,
    RaiseIncidentRequest, ResolveIncidentRequest,
};
use crate::routes::matches::AppState;
use crate::services::EscalationError;

/// Configure all incident-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/incidents", web::post().to(raise_incident))
        .route("/incidents", web::get().to(list_incidents))
        .route("/incidents/active", web::get().to(list_active_incidents))
        .route("/incidents/{id}/resolve", web::post().to(resolve_incident))
        .route("/incidents/{id}/cancel", web::post().to(cancel_incident));
}

fn escalation_error_response(e: EscalationError) -> HttpResponse {
    match e {
        EscalationError::UserNotFound(_) | EscalationError::NotFound(_) => {
            HttpResponse::NotFound().json(ErrorResponse {
                error: "Not found".to_string(),
                message: e.to_string(),
                status_code: 404,
            })
        }
        EscalationError::IllegalTransition(_) => HttpResponse::Conflict().json(ErrorResponse {
            error: "Illegal transition".to_string(),
            message: e.to_string(),
            status_code: 409,
        }),
        EscalationError::QueueClosed => HttpResponse::ServiceUnavailable().json(ErrorResponse {
            error: "Escalation unavailable".to_string(),
            message: e.to_string(),
            status_code: 503,
        }),
        other => {
            tracing::error!("Escalation operation failed: {}", other);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Escalation failed".to_string(),
                message: other.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Raise an emergency incident
///
/// POST /api/v1/incidents
///
/// Returns once the incident is committed and its fan-out is scheduled;
/// the notifications themselves complete asynchronously.
async fn raise_incident(
    state: web::Data<AppState>,
    req: web::Json<RaiseIncidentRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();

    match state
        .escalation
        .raise(
            &req.user_id,
            req.incident_type,
            req.description,
            req.location,
            req.linked_request,
        )
        .await
    {
        Ok(incident) => HttpResponse::Created().json(incident),
        Err(e) => escalation_error_response(e),
    }
}

/// Resolve an active incident
///
/// POST /api/v1/incidents/{id}/resolve
async fn resolve_incident(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<ResolveIncidentRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state
        .escalation
        .resolve(path.into_inner(), &req.resolution_note)
        .await
    {
        Ok(incident) => HttpResponse::Ok().json(incident),
        Err(e) => escalation_error_response(e),
    }
}

/// Cancel an active incident
///
/// POST /api/v1/incidents/{id}/cancel
///
/// Cancellation is a tolerant no-op: a missing, foreign or already
/// terminal incident reports `cancelled: false` rather than an error.
async fn cancel_incident(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<CancelIncidentRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state.escalation.cancel(path.into_inner(), &req.user_id).await {
        Ok(cancelled) => HttpResponse::Ok().json(CancelIncidentResponse { cancelled }),
        Err(e) => escalation_error_response(e),
    }
}

/// List a user's incidents, newest first
///
/// GET /api/v1/incidents?userId={userId}
async fn list_incidents(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.escalation.list_for_user(user_id).await {
        Ok(incidents) => {
            let count = incidents.len();
            HttpResponse::Ok().json(IncidentListResponse { incidents, count })
        }
        Err(e) => escalation_error_response(e),
    }
}

/// List every active incident, newest first
///
/// GET /api/v1/incidents/active
async fn list_active_incidents(state: web::Data<AppState>) -> impl Responder {
    match state.escalation.list_active().await {
        Ok(incidents) => {
            let count = incidents.len();
            HttpResponse::Ok().json(IncidentListResponse { incidents, count })
        }
        Err(e) => escalation_error_response(e),
    }
}
