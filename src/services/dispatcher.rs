use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NotificationCategory, NotificationRecord, ServiceDomain};
use crate::services::directory::Directory;
use crate::services::email::EmailChannel;
use crate::services::push::PushChannel;
use crate::services::store::{NotificationStore, StoreError};

/// Errors that can fail a dispatch as a whole
///
/// Only record persistence is fatal; channel failures are recovered
/// inside the dispatcher and never reach the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("record store failure: {0}")]
    Store(#[from] StoreError),
}

/// Multi-channel notification dispatcher
///
/// The durable record is written first and is the guarantee callers rely
/// on; real-time push and email are best-effort attempts layered on top,
/// each isolated so one channel's failure never blocks the other.
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn PushChannel>,
    email: Arc<dyn EmailChannel>,
    directory: Arc<dyn Directory>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        push: Arc<dyn PushChannel>,
        email: Arc<dyn EmailChannel>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            store,
            push,
            email,
            directory,
        }
    }

    /// Persist a record and attempt real-time delivery
    pub async fn dispatch(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        category: NotificationCategory,
        action_ref: Option<String>,
    ) -> Result<NotificationRecord, DispatchError> {
        let record = self
            .persist_record(user_id, title, body, category, action_ref)
            .await?;

        self.try_push(&record).await;

        Ok(record)
    }

    /// Persist a record, then attempt push and email concurrently
    ///
    /// Used by flows that carry an email confirmation (match confirmation
    /// and the like); most system notifications stay push-only.
    pub async fn dispatch_with_email(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        category: NotificationCategory,
        action_ref: Option<String>,
        subject: &str,
        html_body: &str,
    ) -> Result<NotificationRecord, DispatchError> {
        let record = self
            .persist_record(user_id, title, body, category, action_ref)
            .await?;

        tokio::join!(self.try_push(&record), self.try_email(user_id, subject, html_body));

        Ok(record)
    }

    /// Inform both parties of a confirmed match
    ///
    /// One record per side with the category's 7-day expiry; the two
    /// sides run concurrently and neither side's record creation is
    /// ordered before the other. Email failures are logged only, the
    /// records are already committed by then.
    pub async fn dispatch_match_notifications(
        &self,
        request_user_id: &str,
        provider_user_id: &str,
        domain: ServiceDomain,
        service_summary: &str,
    ) -> Result<(), DispatchError> {
        let requester_body = format!(
            "A provider has been confirmed for your {} request: {}.",
            domain.as_str(),
            service_summary
        );
        let provider_body = format!(
            "You have been confirmed for a {} service: {}.",
            domain.as_str(),
            service_summary
        );
        let requester_html = format!("<p>{}</p>", requester_body);
        let provider_html = format!("<p>{}</p>", provider_body);

        let requester_side = self.dispatch_with_email(
            request_user_id,
            "Match confirmed",
            &requester_body,
            NotificationCategory::ServiceConfirmed,
            None,
            "Your Wingmate match is confirmed",
            &requester_html,
        );

        let provider_side = self.dispatch_with_email(
            provider_user_id,
            "New service assignment",
            &provider_body,
            NotificationCategory::ServiceAssignment,
            None,
            "You have a new Wingmate assignment",
            &provider_html,
        );

        let (requester_result, provider_result) = tokio::join!(requester_side, provider_side);
        requester_result?;
        provider_result?;

        tracing::info!(
            request_user_id,
            provider_user_id,
            domain = domain.as_str(),
            "Match notifications dispatched"
        );

        Ok(())
    }

    async fn persist_record(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        category: NotificationCategory,
        action_ref: Option<String>,
    ) -> Result<NotificationRecord, DispatchError> {
        let now = Utc::now();
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            category,
            action_ref,
            created_at: now,
            expires_at: Some(now + category.expiry()),
            read: false,
        };

        self.store.create_record(&record).await?;

        Ok(record)
    }

    /// Push failure is logged with context and swallowed
    async fn try_push(&self, record: &NotificationRecord) {
        let payload = serde_json::json!({
            "id": record.id,
            "title": record.title,
            "body": record.body,
            "category": record.category,
            "actionRef": record.action_ref,
        });

        if let Err(e) = self
            .push
            .publish_to_user(&record.user_id, "notification", &payload)
            .await
        {
            tracing::warn!(
                user_id = %record.user_id,
                record_id = %record.id,
                "Push delivery failed: {}",
                e
            );
        }
    }

    /// Email failure, including the address lookup, is logged and swallowed
    async fn try_email(&self, user_id: &str, subject: &str, html_body: &str) {
        match self.directory.get_user(user_id).await {
            Ok(user) => {
                if let Err(e) = self.email.send_email(&user.email, subject, html_body).await {
                    tracing::warn!(user_id, "Email delivery failed: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(user_id, "Email skipped, address lookup failed: {}", e);
            }
        }
    }
}
