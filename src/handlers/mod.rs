pub mod orders;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};

use crate::{
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::{
        audit::AuditLogService, order_status::OrderTransitionService,
        receptions::ReceptionService,
    },
};

/// JSON extractor whose rejection speaks the API's `{message}` error
/// contract instead of axum's plain-text 422.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// Service bundle shared with every handler through axum state.
#[derive(Clone)]
pub struct AppServices {
    pub receptions: Arc<ReceptionService>,
    pub transitions: Arc<OrderTransitionService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        let audit = Arc::new(AuditLogService);
        Self {
            receptions: Arc::new(ReceptionService::new(
                db_pool.clone(),
                audit.clone(),
                event_sender.clone(),
            )),
            transitions: Arc::new(OrderTransitionService::new(db_pool, audit, event_sender)),
        }
    }
}
