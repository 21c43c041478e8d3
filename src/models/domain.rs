use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service domain a request or offer belongs to
///
/// Each domain carries its own compatibility predicate; a request in one
/// domain never matches an offer in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceDomain {
    Companionship,
    Pickup,
}

impl ServiceDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceDomain::Companionship => "companionship",
            ServiceDomain::Pickup => "pickup",
        }
    }
}

impl std::str::FromStr for ServiceDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "companionship" => Ok(ServiceDomain::Companionship),
            "pickup" => Ok(ServiceDomain::Pickup),
            other => Err(format!("unknown service domain: {}", other)),
        }
    }
}

/// Domain criteria on the requesting side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum RequestCriteria {
    #[serde(rename_all = "camelCase")]
    Companionship {
        origin: String,
        destination: String,
        travel_date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    Pickup {
        airport: String,
        passenger_count: u8,
        has_luggage: bool,
    },
}

impl RequestCriteria {
    pub fn domain(&self) -> ServiceDomain {
        match self {
            RequestCriteria::Companionship { .. } => ServiceDomain::Companionship,
            RequestCriteria::Pickup { .. } => ServiceDomain::Pickup,
        }
    }

    /// Short human-readable description used in notification bodies
    pub fn summary(&self) -> String {
        match self {
            RequestCriteria::Companionship {
                origin,
                destination,
                travel_date,
            } => format!("{} to {} on {}", origin, destination, travel_date),
            RequestCriteria::Pickup {
                airport,
                passenger_count,
                ..
            } => format!("pickup at {} for {} passenger(s)", airport, passenger_count),
        }
    }
}

/// Domain criteria on the providing side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum OfferCriteria {
    #[serde(rename_all = "camelCase")]
    Companionship {
        origin: String,
        destination: String,
        travel_date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    Pickup {
        airport: String,
        vehicle_capacity: u8,
        luggage_space: bool,
    },
}

impl OfferCriteria {
    pub fn domain(&self) -> ServiceDomain {
        match self {
            OfferCriteria::Companionship { .. } => ServiceDomain::Companionship,
            OfferCriteria::Pickup { .. } => ServiceDomain::Pickup,
        }
    }
}

/// A pending service request, owned by the external request lifecycle
///
/// Once `matched` is true, `matched_offer_id` is non-null and immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub requester_id: String,
    #[serde(flatten)]
    pub criteria: RequestCriteria,
    pub price: f64,
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub matched_offer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn domain(&self) -> ServiceDomain {
        self.criteria.domain()
    }
}

/// A live service offer, owned by the external offer lifecycle
///
/// `available` is advisory only; confirmation re-checks it atomically on
/// the side that owns the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffer {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(flatten)]
    pub criteria: OfferCriteria,
    pub price: f64,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub times_completed: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub owner_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl ServiceOffer {
    pub fn domain(&self) -> ServiceDomain {
        self.criteria.domain()
    }
}

fn default_true() -> bool {
    true
}

/// A scored pairing of a request and a compatible offer
///
/// Derived by the match engine, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub request_id: Uuid,
    pub offer_id: Uuid,
    pub owner_id: String,
    pub price: f64,
    pub compatibility_score: u8,
    pub reason: String,
}

/// Category tag on a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_category", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    ServiceConfirmed,
    ServiceAssignment,
    EmergencyAlert,
    PaymentReceived,
    System,
}

impl NotificationCategory {
    /// Retention window for records of this category
    ///
    /// Expiry is passive: it bounds how long a record stays visible, it
    /// never triggers a purge.
    pub fn expiry(&self) -> chrono::Duration {
        match self {
            NotificationCategory::PaymentReceived => chrono::Duration::days(30),
            _ => chrono::Duration::days(7),
        }
    }
}

/// Durable record of a message addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub action_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub read: bool,
}

/// Lifecycle state of an emergency incident
///
/// Transitions are one-directional: Active to Resolved or Cancelled.
/// No incident re-opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "incident_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "incident_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentType {
    Medical,
    Safety,
    Lost,
    Other,
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            IncidentType::Medical => "medical",
            IncidentType::Safety => "safety",
            IncidentType::Lost => "lost",
            IncidentType::Other => "other",
        };
        write!(f, "{}", label)
    }
}

/// Reference from an incident to the service request it was raised on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedRequest {
    pub domain: ServiceDomain,
    pub request_id: Uuid,
}

/// A user-raised emergency event tracked through a fixed lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyIncident {
    pub id: Uuid,
    pub raised_by: String,
    pub incident_type: IncidentType,
    pub description: String,
    pub location: Option<String>,
    pub linked_request: Option<LinkedRequest>,
    pub status: IncidentStatus,
    pub emergency_contact_notified: bool,
    pub admin_notified: bool,
    pub created_at: DateTime<Utc>,
    pub last_notification_sent: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
}

/// Directory projection of a platform account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub emergency_contact_name: Option<String>,
    #[serde(default)]
    pub emergency_contact_phone: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserAccount {
    /// Both a contact name and phone must be on file for the emergency
    /// contact branch to run.
    pub fn has_emergency_contact(&self) -> bool {
        self.emergency_contact_name.is_some() && self.emergency_contact_phone.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_round_trip() {
        assert_eq!(
            "companionship".parse::<ServiceDomain>().unwrap(),
            ServiceDomain::Companionship
        );
        assert_eq!(ServiceDomain::Pickup.as_str(), "pickup");
        assert!("rideshare".parse::<ServiceDomain>().is_err());
    }

    #[test]
    fn test_category_expiry_table() {
        assert_eq!(
            NotificationCategory::ServiceConfirmed.expiry(),
            chrono::Duration::days(7)
        );
        assert_eq!(
            NotificationCategory::PaymentReceived.expiry(),
            chrono::Duration::days(30)
        );
        assert_eq!(
            NotificationCategory::System.expiry(),
            chrono::Duration::days(7)
        );
    }

    #[test]
    fn test_emergency_contact_requires_both_fields() {
        let mut user = UserAccount {
            id: "u1".to_string(),
            name: "Mei".to_string(),
            email: "mei@example.com".to_string(),
            phone: None,
            emergency_contact_name: Some("Lin".to_string()),
            emergency_contact_phone: None,
            roles: vec![],
        };
        assert!(!user.has_emergency_contact());

        user.emergency_contact_phone = Some("+64210000000".to_string());
        assert!(user.has_emergency_contact());
    }
}
