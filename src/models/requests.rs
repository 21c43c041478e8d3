use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::domain::{IncidentType, LinkedRequest, ServiceDomain};

/// Request to find match candidates for a pending service request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    pub request_id: Uuid,
    pub domain: ServiceDomain,
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to confirm a match against a specific offer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmMatchRequest {
    pub request_id: Uuid,
    pub domain: ServiceDomain,
    pub offer_id: Uuid,
}

/// Request to raise an emergency incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RaiseIncidentRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    pub incident_type: IncidentType,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linked_request: Option<LinkedRequest>,
}

/// Request to resolve an active incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIncidentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub resolution_note: String,
}

/// Request to cancel an active incident
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelIncidentRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
}
