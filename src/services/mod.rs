// Service exports
pub mod directory;
pub mod dispatcher;
pub mod email;
pub mod escalation;
pub mod push;
pub mod store;

pub use directory::{ConfirmOutcome, Directory, DirectoryError, HttpDirectory};
pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use email::{EmailChannel, EmailError, HttpMailer};
pub use escalation::{
    escalation_pair, EscalationError, EscalationService, EscalationWorker, ADMIN_CAPABILITY,
};
pub use push::{PushChannel, PushError, RedisPush};
pub use store::{IncidentStore, NotificationStore, PgStore, StoreError};
