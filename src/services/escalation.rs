use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{
    EmergencyIncident, IncidentStatus, IncidentType, LinkedRequest, NotificationCategory,
    UserAccount,
};
use crate::services::directory::{Directory, DirectoryError};
use crate::services::dispatcher::{DispatchError, NotificationDispatcher};
use crate::services::store::{IncidentStore, StoreError};

/// Capability that marks an account as a platform administrator
pub const ADMIN_CAPABILITY: &str = "admin";

/// Errors surfaced by the escalation orchestrator
#[derive(Debug, Error)]
pub enum EscalationError {
    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("incident {0} not found")]
    NotFound(Uuid),

    #[error("incident {0} is not active")]
    IllegalTransition(Uuid),

    #[error("directory error: {0}")]
    Directory(DirectoryError),

    #[error("record store failure: {0}")]
    Store(StoreError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("escalation queue is closed")]
    QueueClosed,
}

/// Orchestrator for the emergency incident lifecycle
///
/// Owns the Active -> {Resolved, Cancelled} state machine and the
/// notification fan-out to every interested party. Fan-out runs on a
/// dedicated worker fed through a bounded queue, so `raise` returns as
/// soon as the incident row is committed and the job is enqueued.
pub struct EscalationService {
    store: Arc<dyn IncidentStore>,
    directory: Arc<dyn Directory>,
    dispatcher: Arc<NotificationDispatcher>,
    queue: mpsc::Sender<Uuid>,
}

/// Drains fan-out jobs enqueued by `EscalationService::raise`
pub struct EscalationWorker {
    service: Arc<EscalationService>,
    jobs: mpsc::Receiver<Uuid>,
}

/// Build the service together with its fan-out worker
///
/// The worker must be spawned by the caller; dropping it instead closes
/// the queue and makes `raise` fail with `QueueClosed`.
pub fn escalation_pair(
    store: Arc<dyn IncidentStore>,
    directory: Arc<dyn Directory>,
    dispatcher: Arc<NotificationDispatcher>,
    queue_depth: usize,
) -> (Arc<EscalationService>, EscalationWorker) {
    let (tx, rx) = mpsc::channel(queue_depth);

    let service = Arc::new(EscalationService {
        store,
        directory,
        dispatcher,
        queue: tx,
    });

    let worker = EscalationWorker {
        service: Arc::clone(&service),
        jobs: rx,
    };

    (service, worker)
}

impl EscalationWorker {
    pub async fn run(mut self) {
        while let Some(incident_id) = self.jobs.recv().await {
            match self.service.fan_out(incident_id).await {
                Ok(()) => tracing::debug!(%incident_id, "Fan-out complete"),
                Err(e) => tracing::error!(%incident_id, "Fan-out failed: {}", e),
            }
        }

        tracing::info!("Escalation worker stopped");
    }
}

impl EscalationService {
    /// Raise a new incident and schedule its fan-out
    ///
    /// The incident row is committed before the queue handoff, so every
    /// fan-out branch observes it. A closed queue is a surfaced error,
    /// not a silently dropped escalation.
    pub async fn raise(
        &self,
        user_id: &str,
        incident_type: IncidentType,
        description: String,
        location: Option<String>,
        linked_request: Option<LinkedRequest>,
    ) -> Result<EmergencyIncident, EscalationError> {
        self.directory.get_user(user_id).await.map_err(|e| match e {
            DirectoryError::NotFound(_) => EscalationError::UserNotFound(user_id.to_string()),
            other => EscalationError::Directory(other),
        })?;

        let incident = EmergencyIncident {
            id: Uuid::new_v4(),
            raised_by: user_id.to_string(),
            incident_type,
            description,
            location,
            linked_request,
            status: IncidentStatus::Active,
            emergency_contact_notified: false,
            admin_notified: false,
            created_at: Utc::now(),
            last_notification_sent: None,
            resolved_at: None,
            resolution_note: None,
        };

        self.store
            .create_incident(&incident)
            .await
            .map_err(EscalationError::Store)?;

        tracing::info!(
            incident_id = %incident.id,
            user_id,
            incident_type = %incident_type,
            "Emergency incident raised"
        );

        self.queue
            .send(incident.id)
            .await
            .map_err(|_| EscalationError::QueueClosed)?;

        Ok(incident)
    }

    /// Notify every interested party of an active incident
    ///
    /// Re-entrant safe: a non-Active incident is a silent no-op, so a
    /// duplicate job for the same incident does nothing. The four
    /// branches run concurrently and are individually isolated; after
    /// they settle, the notification flags are committed in one guarded
    /// write.
    pub async fn fan_out(&self, incident_id: Uuid) -> Result<(), EscalationError> {
        let incident = self
            .store
            .get_incident(incident_id)
            .await
            .map_err(EscalationError::Store)?
            .ok_or(EscalationError::NotFound(incident_id))?;

        if incident.status != IncidentStatus::Active {
            tracing::debug!(
                %incident_id,
                status = ?incident.status,
                "Skipping fan-out for non-active incident"
            );
            return Ok(());
        }

        let raiser = self
            .directory
            .get_user(&incident.raised_by)
            .await
            .map_err(EscalationError::Directory)?;

        let (self_result, contact_result, admin_result, counterpart_result) = tokio::join!(
            self.notify_raiser(&incident),
            self.notify_emergency_contact(&incident, &raiser),
            self.notify_admins(&incident, &raiser),
            self.notify_counterpart(&incident),
        );

        if let Err(e) = self_result {
            tracing::warn!(%incident_id, "Self-confirmation branch failed: {}", e);
        }

        let contact_notified = match contact_result {
            Ok(sent) => sent,
            Err(e) => {
                tracing::warn!(%incident_id, "Emergency contact branch failed: {}", e);
                false
            }
        };

        let admin_notified = match admin_result {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!(%incident_id, "Administrator branch failed: {}", e);
                false
            }
        };

        match counterpart_result {
            Ok(true) => tracing::debug!(%incident_id, "Matched counterpart notified"),
            Ok(false) => {}
            Err(e) => tracing::warn!(%incident_id, "Counterpart branch failed: {}", e),
        }

        let committed = self
            .store
            .record_fanout(incident_id, contact_notified, admin_notified)
            .await
            .map_err(EscalationError::Store)?;

        if !committed {
            tracing::debug!(
                %incident_id,
                "Incident left the active state during fan-out, flags not recorded"
            );
        }

        Ok(())
    }

    /// Resolve an active incident
    ///
    /// Strict policy: a Resolved or Cancelled incident cannot be
    /// resolved again; the transition is rejected rather than silently
    /// overwriting a terminal state.
    pub async fn resolve(
        &self,
        incident_id: Uuid,
        resolution_note: &str,
    ) -> Result<EmergencyIncident, EscalationError> {
        let incident = self
            .store
            .resolve_incident(incident_id, resolution_note)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => EscalationError::NotFound(incident_id),
                StoreError::IllegalTransition(_) => EscalationError::IllegalTransition(incident_id),
                other => EscalationError::Store(other),
            })?;

        tracing::info!(%incident_id, "Incident resolved");

        Ok(incident)
    }

    /// Cancel an active incident
    ///
    /// Tolerant no-op: returns false when the incident is missing, not
    /// owned by `user_id`, or already terminal. Cancellation races with
    /// delivery are expected and are not errors.
    pub async fn cancel(&self, incident_id: Uuid, user_id: &str) -> Result<bool, EscalationError> {
        let cancelled = self
            .store
            .cancel_incident(incident_id, user_id)
            .await
            .map_err(EscalationError::Store)?;

        if cancelled {
            tracing::info!(%incident_id, user_id, "Incident cancelled");
        }

        Ok(cancelled)
    }

    /// A user's incidents, newest first
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<EmergencyIncident>, EscalationError> {
        self.store
            .list_for_user(user_id)
            .await
            .map_err(EscalationError::Store)
    }

    /// All active incidents, newest first
    pub async fn list_active(&self) -> Result<Vec<EmergencyIncident>, EscalationError> {
        self.store.list_active().await.map_err(EscalationError::Store)
    }

    fn action_ref(incident: &EmergencyIncident) -> Option<String> {
        Some(format!("incident:{}", incident.id))
    }

    async fn notify_raiser(&self, incident: &EmergencyIncident) -> Result<(), EscalationError> {
        self.dispatcher
            .dispatch(
                &incident.raised_by,
                "Emergency alert received",
                &format!(
                    "Your {} emergency has been received and responders are being alerted.",
                    incident.incident_type
                ),
                NotificationCategory::EmergencyAlert,
                Self::action_ref(incident),
            )
            .await?;

        Ok(())
    }

    /// Returns true when the contact outreach was recorded
    ///
    /// The emergency contact is not a platform account, so the observable
    /// artifact is the outreach record on the raiser's own feed.
    async fn notify_emergency_contact(
        &self,
        incident: &EmergencyIncident,
        raiser: &UserAccount,
    ) -> Result<bool, EscalationError> {
        let (name, phone) = match (
            &raiser.emergency_contact_name,
            &raiser.emergency_contact_phone,
        ) {
            (Some(name), Some(phone)) => (name, phone),
            _ => {
                tracing::debug!(
                    incident_id = %incident.id,
                    "No emergency contact on file, skipping branch"
                );
                return Ok(false);
            }
        };

        self.dispatcher
            .dispatch(
                &incident.raised_by,
                "Emergency contact alerted",
                &format!("{} has been notified at {}.", name, phone),
                NotificationCategory::EmergencyAlert,
                Self::action_ref(incident),
            )
            .await?;

        Ok(true)
    }

    /// Returns the number of administrators actually notified
    async fn notify_admins(
        &self,
        incident: &EmergencyIncident,
        raiser: &UserAccount,
    ) -> Result<usize, EscalationError> {
        let admins = self
            .directory
            .list_users_with_capability(ADMIN_CAPABILITY)
            .await
            .map_err(EscalationError::Directory)?;

        let mut notified = 0usize;
        for admin in &admins {
            let result = self
                .dispatcher
                .dispatch(
                    &admin.id,
                    "Emergency reported",
                    &format!(
                        "{} reported a {} emergency: {}",
                        raiser.name, incident.incident_type, incident.description
                    ),
                    NotificationCategory::EmergencyAlert,
                    Self::action_ref(incident),
                )
                .await;

            match result {
                Ok(_) => notified += 1,
                Err(e) => {
                    tracing::warn!(
                        incident_id = %incident.id,
                        admin_id = %admin.id,
                        "Administrator dispatch failed: {}",
                        e
                    );
                }
            }
        }

        Ok(notified)
    }

    /// Returns true when a matched counterpart existed and was notified
    async fn notify_counterpart(
        &self,
        incident: &EmergencyIncident,
    ) -> Result<bool, EscalationError> {
        let linked = match incident.linked_request {
            Some(linked) => linked,
            None => return Ok(false),
        };

        let request = self
            .directory
            .get_request(linked.domain, linked.request_id)
            .await
            .map_err(EscalationError::Directory)?;

        if !request.matched {
            tracing::debug!(
                incident_id = %incident.id,
                request_id = %linked.request_id,
                "Linked request is not matched, skipping counterpart"
            );
            return Ok(false);
        }

        let offer_id = match request.matched_offer_id {
            Some(offer_id) => offer_id,
            None => return Ok(false),
        };

        let offer = self
            .directory
            .get_offer(linked.domain, offer_id)
            .await
            .map_err(EscalationError::Directory)?;

        let counterpart = if incident.raised_by == request.requester_id {
            offer.owner_id
        } else {
            request.requester_id
        };

        self.dispatcher
            .dispatch(
                &counterpart,
                "Emergency reported on your service",
                &format!(
                    "An emergency was reported on your {} service ({}). Please check in.",
                    linked.domain.as_str(),
                    request.criteria.summary()
                ),
                NotificationCategory::EmergencyAlert,
                Self::action_ref(incident),
            )
            .await?;

        Ok(true)
    }
}
