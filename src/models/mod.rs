// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    EmergencyIncident, IncidentStatus, IncidentType, LinkedRequest, MatchCandidate,
    NotificationCategory, NotificationRecord, OfferCriteria, RequestCriteria, ServiceDomain,
    ServiceOffer, ServiceRequest, UserAccount,
};
pub use requests::{
    CancelIncidentRequest, ConfirmMatchRequest, FindMatchesRequest, RaiseIncidentRequest,
    ResolveIncidentRequest,
};
pub use responses::{
    CancelIncidentResponse, ConfirmMatchResponse, ErrorResponse, FindMatchesResponse,
    HealthResponse, IncidentListResponse, NotificationListResponse,
};
