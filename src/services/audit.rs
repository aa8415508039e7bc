use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use tracing::error;

use crate::entities::audit_log;
use crate::errors::ServiceError;

/// Appends audit records on the caller's transaction.
///
/// The append is part of the owning unit of work: it must succeed before the
/// transaction is committed, and a failure here aborts the whole operation.
#[derive(Debug, Clone, Default)]
pub struct AuditLogService;

impl AuditLogService {
    pub fn new() -> Self {
        Self
    }

    /// Durably appends one audit record for the acting user.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
        action: &str,
        message: String,
    ) -> Result<(), ServiceError> {
        let entry = audit_log::ActiveModel {
            user_id: Set(user_id),
            action: Set(action.to_string()),
            message: Set(message),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        entry.insert(conn).await.map_err(|e| {
            error!(error = %e, action = %action, "failed to append audit log entry");
            ServiceError::DatabaseError(e)
        })?;

        Ok(())
    }
}
