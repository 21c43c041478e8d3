// Route exports
pub mod incidents;
pub mod matches;
pub mod notifications;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(incidents::configure)
            .configure(notifications::configure),
    );
}
