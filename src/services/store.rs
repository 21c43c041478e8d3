use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    EmergencyIncident, IncidentStatus, IncidentType, LinkedRequest, NotificationCategory,
    NotificationRecord, ServiceDomain,
};

/// Errors that can occur when interacting with the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("illegal transition: {0}")]
    IllegalTransition(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// Durable store for notification records
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_record(&self, record: &NotificationRecord) -> Result<(), StoreError>;

    /// Unexpired records for a user, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError>;

    /// Returns false when the record does not exist
    async fn mark_read(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Durable store for emergency incidents
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn create_incident(&self, incident: &EmergencyIncident) -> Result<(), StoreError>;

    async fn get_incident(&self, id: Uuid) -> Result<Option<EmergencyIncident>, StoreError>;

    /// Commit the fan-out flags in one write, guarded on Active status
    ///
    /// Returns false when the guard fails, i.e. the incident left the
    /// Active state while the fan-out was in flight.
    async fn record_fanout(
        &self,
        id: Uuid,
        contact_notified: bool,
        admin_notified: bool,
    ) -> Result<bool, StoreError>;

    /// Active -> Resolved; `NotFound` when missing, `IllegalTransition`
    /// when the incident is not Active.
    async fn resolve_incident(
        &self,
        id: Uuid,
        note: &str,
    ) -> Result<EmergencyIncident, StoreError>;

    /// Active -> Cancelled; tolerant no-op returning false when the
    /// incident is missing, not owned by `user_id`, or not Active.
    async fn cancel_incident(&self, id: Uuid, user_id: &str) -> Result<bool, StoreError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<EmergencyIncident>, StoreError>;

    async fn list_active(&self) -> Result<Vec<EmergencyIncident>, StoreError>;
}

/// PostgreSQL record store
///
/// Owns the notification_records and emergency_incidents tables. Every
/// state transition on an incident is a single guarded UPDATE, so the
/// store's per-row atomicity is the only locking this design needs.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run migrations
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    fn record_from_row(row: &sqlx::postgres::PgRow) -> NotificationRecord {
        NotificationRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            body: row.get("body"),
            category: row.get::<NotificationCategory, _>("category"),
            action_ref: row.get("action_ref"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
            read: row.get("is_read"),
        }
    }

    fn incident_from_row(row: &sqlx::postgres::PgRow) -> Result<EmergencyIncident, StoreError> {
        let linked_domain: Option<String> = row.get("linked_domain");
        let linked_request_id: Option<Uuid> = row.get("linked_request_id");

        let linked_request = match (linked_domain, linked_request_id) {
            (Some(domain), Some(request_id)) => {
                let domain: ServiceDomain = domain
                    .parse()
                    .map_err(StoreError::InvalidRow)?;
                Some(LinkedRequest { domain, request_id })
            }
            _ => None,
        };

        Ok(EmergencyIncident {
            id: row.get("id"),
            raised_by: row.get("raised_by"),
            incident_type: row.get::<IncidentType, _>("incident_type"),
            description: row.get("description"),
            location: row.get("location"),
            linked_request,
            status: row.get::<IncidentStatus, _>("status"),
            emergency_contact_notified: row.get("emergency_contact_notified"),
            admin_notified: row.get("admin_notified"),
            created_at: row.get("created_at"),
            last_notification_sent: row.get("last_notification_sent"),
            resolved_at: row.get("resolved_at"),
            resolution_note: row.get("resolution_note"),
        })
    }
}

const INCIDENT_COLUMNS: &str = r#"
    id, raised_by, incident_type, description, location,
    linked_domain, linked_request_id, status,
    emergency_contact_notified, admin_notified,
    created_at, last_notification_sent, resolved_at, resolution_note
"#;

#[async_trait]
impl NotificationStore for PgStore {
    async fn create_record(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO notification_records
                (id, user_id, title, body, category, action_ref, created_at, expires_at, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#;

        sqlx::query(query)
            .bind(record.id)
            .bind(&record.user_id)
            .bind(&record.title)
            .bind(&record.body)
            .bind(record.category)
            .bind(&record.action_ref)
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.read)
            .execute(&self.pool)
            .await?;

        tracing::debug!(record_id = %record.id, user_id = %record.user_id, "Notification record persisted");

        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>, StoreError> {
        let query = r#"
            SELECT id, user_id, title, body, category, action_ref, created_at, expires_at, is_read
            FROM notification_records
            WHERE user_id = $1 AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE notification_records SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IncidentStore for PgStore {
    async fn create_incident(&self, incident: &EmergencyIncident) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO emergency_incidents
                (id, raised_by, incident_type, description, location,
                 linked_domain, linked_request_id, status,
                 emergency_contact_notified, admin_notified,
                 created_at, last_notification_sent, resolved_at, resolution_note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#;

        sqlx::query(query)
            .bind(incident.id)
            .bind(&incident.raised_by)
            .bind(incident.incident_type)
            .bind(&incident.description)
            .bind(&incident.location)
            .bind(incident.linked_request.map(|l| l.domain.as_str()))
            .bind(incident.linked_request.map(|l| l.request_id))
            .bind(incident.status)
            .bind(incident.emergency_contact_notified)
            .bind(incident.admin_notified)
            .bind(incident.created_at)
            .bind(incident.last_notification_sent)
            .bind(incident.resolved_at)
            .bind(&incident.resolution_note)
            .execute(&self.pool)
            .await?;

        tracing::debug!(incident_id = %incident.id, "Emergency incident persisted");

        Ok(())
    }

    async fn get_incident(&self, id: Uuid) -> Result<Option<EmergencyIncident>, StoreError> {
        let query = format!(
            "SELECT {} FROM emergency_incidents WHERE id = $1",
            INCIDENT_COLUMNS
        );

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(Self::incident_from_row).transpose()
    }

    async fn record_fanout(
        &self,
        id: Uuid,
        contact_notified: bool,
        admin_notified: bool,
    ) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE emergency_incidents
            SET emergency_contact_notified = $2,
                admin_notified = $3,
                last_notification_sent = NOW()
            WHERE id = $1 AND status = 'active'
        "#;

        let result = sqlx::query(query)
            .bind(id)
            .bind(contact_notified)
            .bind(admin_notified)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn resolve_incident(
        &self,
        id: Uuid,
        note: &str,
    ) -> Result<EmergencyIncident, StoreError> {
        let query = format!(
            r#"
            UPDATE emergency_incidents
            SET status = 'resolved', resolution_note = $2, resolved_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {}
            "#,
            INCIDENT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(note)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Self::incident_from_row(&row);
        }

        // The guarded update missed: distinguish missing from non-Active
        let status: Option<IncidentStatus> =
            sqlx::query("SELECT status FROM emergency_incidents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .map(|row| row.get::<IncidentStatus, _>("status"));

        match status {
            None => Err(StoreError::NotFound(format!("incident {}", id))),
            Some(status) => Err(StoreError::IllegalTransition(format!(
                "incident {} is {:?}, not active",
                id, status
            ))),
        }
    }

    async fn cancel_incident(&self, id: Uuid, user_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE emergency_incidents
            SET status = 'cancelled'
            WHERE id = $1 AND raised_by = $2 AND status = 'active'
        "#;

        let result = sqlx::query(query)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<EmergencyIncident>, StoreError> {
        let query = format!(
            "SELECT {} FROM emergency_incidents WHERE raised_by = $1 ORDER BY created_at DESC",
            INCIDENT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::incident_from_row).collect()
    }

    async fn list_active(&self) -> Result<Vec<EmergencyIncident>, StoreError> {
        let query = format!(
            "SELECT {} FROM emergency_incidents WHERE status = 'active' ORDER BY created_at DESC",
            INCIDENT_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(Self::incident_from_row).collect()
    }
}
