use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;

use crate::models::{ErrorResponse, NotificationListResponse};
use crate::routes::matches::AppState;
use crate::services::NotificationStore;

/// Configure all notification-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::get().to(list_notifications))
        .route("/notifications/{id}/read", web::post().to(mark_read));
}

/// List a user's unexpired notification records, newest first
///
/// GET /api/v1/notifications?userId={userId}
async fn list_notifications(
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

    match state.notifications.list_for_user(user_id).await {
        Ok(notifications) => {
            let count = notifications.len();
            HttpResponse::Ok().json(NotificationListResponse {
                notifications,
                count,
            })
        }
        Err(e) => {
            tracing::error!(user_id, "Failed to list notifications: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to list notifications".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Mark a notification record as read
///
/// POST /api/v1/notifications/{id}/read
async fn mark_read(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    let id = path.into_inner();

    match state.notifications.mark_read(id).await {
        Ok(true) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Notification not found".to_string(),
            message: format!("No notification record with id {}", id),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!(record_id = %id, "Failed to mark notification read: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to mark notification read".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
