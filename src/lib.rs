//! Wingmate Core - matching and emergency escalation engine
//!
//! This library pairs pending service requests (flight-seat
//! companionship, airport pickup) with compatible offers, and fans
//! emergency incidents out to every stakeholder over durable records,
//! real-time push and email, isolating each channel's failures.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{rank_offers, MatchEngine, MatchError};
pub use models::{
    EmergencyIncident, IncidentStatus, IncidentType, MatchCandidate, NotificationCategory,
    NotificationRecord, ServiceDomain, ServiceOffer, ServiceRequest,
};
pub use services::{EscalationService, NotificationDispatcher};
