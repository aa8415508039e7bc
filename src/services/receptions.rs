use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    calendar::{self, Clock, TehranClock},
    db::DbPool,
    entities::{customer, order, reception},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderChannel, UNKNOWN_LABEL},
    services::audit::AuditLogService,
    validation,
};

/// Payload for one requested part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayload {
    pub order_number: String,
    pub piece_name: String,
    #[serde(default)]
    pub part_id: Option<String>,
    pub number_of_pieces: i32,
    pub order_channel: String,
    #[serde(default)]
    pub market_name: Option<String>,
    #[serde(default)]
    pub market_phone: Option<String>,
    #[serde(default)]
    pub estimated_arrival_days: Option<i32>,
    #[serde(default)]
    pub all_description: Option<String>,
}

/// Payload for creating a reception together with its first orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReceptionRequest {
    pub reception_number: String,
    pub reception_date: String,
    pub car_status: String,
    pub car_name: String,
    #[serde(default)]
    pub chassis_number: Option<String>,
    pub orders: Vec<OrderPayload>,
}

/// Payload for appending orders to an existing reception. Same body shape
/// as creation: the orders ride in a named `orders` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendOrdersRequest {
    pub orders: Vec<OrderPayload>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReceptionResult {
    pub reception_id: i32,
    pub order_count: usize,
}

/// Writer for receptions and their orders. Each public operation is one
/// atomic unit of work: validation, inserts and the audit append either all
/// commit or all roll back.
#[derive(Clone)]
pub struct ReceptionService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditLogService>,
    event_sender: Option<Arc<EventSender>>,
    clock: Arc<dyn Clock>,
}

impl ReceptionService {
    pub fn new(
        db_pool: Arc<DbPool>,
        audit: Arc<AuditLogService>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            audit,
            event_sender,
            clock: Arc::new(TehranClock),
        }
    }

    /// Replaces the time provider; tests use this with a fixed clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates one reception plus its orders atomically.
    #[instrument(skip(self, request), fields(customer_id = customer_id, reception_number = %request.reception_number))]
    pub async fn create_reception_with_orders(
        &self,
        customer_id: i32,
        request: CreateReceptionRequest,
        acting_user: &AuthUser,
    ) -> Result<CreateReceptionResult, ServiceError> {
        if customer_id <= 0 {
            return Err(ServiceError::ValidationError(
                "شناسه مشتری معتبر نیست.".to_string(),
            ));
        }

        let reception_date = validation::validate_reception_payload(&request)?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for reception creation");
            ServiceError::DatabaseError(e)
        })?;

        let new_reception = reception::ActiveModel {
            customer_id: Set(customer_id),
            reception_number: Set(request.reception_number.clone()),
            reception_date: Set(reception_date),
            car_status: Set(request.car_status.clone()),
            car_name: Set(request.car_name.trim().to_string()),
            chassis_number: Set(request
                .chassis_number
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)),
            ..Default::default()
        };

        let created = new_reception.insert(&txn).await.map_err(|e| {
            error!(error = %e, "failed to insert reception");
            ServiceError::DatabaseError(e)
        })?;

        let customer_name = resolve_customer_name(&txn, customer_id).await?;

        for (index, payload) in request.orders.iter().enumerate() {
            validation::validate_order_payload(payload, index)?;

            let new_order = self.prepare_order(
                payload,
                customer_id,
                created.id,
                created.car_name.clone(),
            );

            new_order.insert(&txn).await.map_err(|e| {
                error!(error = %e, order_index = index + 1, "failed to insert order");
                ServiceError::DatabaseError(e)
            })?;
        }

        self.audit
            .append(
                &txn,
                acting_user.id,
                "ثبت پذیرش جدید",
                format!("یک پذیرش جدید برای مشتری\"{customer_name}\" ثبت شد."),
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit reception creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            reception_id = created.id,
            order_count = request.orders.len(),
            "reception created"
        );

        if let Some(sender) = &self.event_sender {
            let event = Event::ReceptionCreated {
                reception_id: created.id,
                customer_id,
                order_count: request.orders.len(),
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, reception_id = created.id, "failed to send reception created event");
            }
        }

        Ok(CreateReceptionResult {
            reception_id: created.id,
            order_count: request.orders.len(),
        })
    }

    /// Appends orders to an existing reception atomically. Requires a prior
    /// order's car_name on the reception: appended orders must stay
    /// consistent with the vehicle recorded at first-order creation.
    #[instrument(skip(self, orders), fields(reception_id = reception_id, order_count = orders.len()))]
    pub async fn append_orders_to_reception(
        &self,
        reception_id: i32,
        orders: Vec<OrderPayload>,
        acting_user: &AuthUser,
    ) -> Result<usize, ServiceError> {
        if reception_id <= 0 {
            return Err(ServiceError::ValidationError(
                "شناسه پذیرش معتبر نیست.".to_string(),
            ));
        }
        if orders.is_empty() {
            return Err(ServiceError::ValidationError(
                "لیست سفارش‌ها خالی یا معتبر نیست.".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for order append");
            ServiceError::DatabaseError(e)
        })?;

        let existing = reception::Entity::find_by_id(reception_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to look up reception");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound("پذیرش با این شناسه یافت نشد.".to_string())
            })?;

        let customer_name = resolve_customer_name(&txn, existing.customer_id).await?;

        // car_name precedent comes from a prior order, never from the
        // reception row itself; a reception without one cannot accept
        // appended orders.
        let car_name = order::Entity::find()
            .filter(order::Column::ReceptionId.eq(reception_id))
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to resolve car name precedent");
                ServiceError::DatabaseError(e)
            })?
            .and_then(|o| o.car_name)
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "نام خودرو برای پذیرش مورد نظر یافت نشد.".to_string(),
                )
            })?;

        for (index, payload) in orders.iter().enumerate() {
            validation::validate_order_payload(payload, index)?;

            let new_order =
                self.prepare_order(payload, existing.customer_id, reception_id, car_name.clone());

            new_order.insert(&txn).await.map_err(|e| {
                error!(error = %e, order_index = index + 1, "failed to insert appended order");
                ServiceError::DatabaseError(e)
            })?;
        }

        self.audit
            .append(
                &txn,
                acting_user.id,
                "افزودن سفارش به پذیرش",
                format!(
                    "سفارش جدید به پذیرش شماره \"{}\" مشتری \"{}\" اضافه شد.",
                    existing.reception_number, customer_name
                ),
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit order append");
            ServiceError::DatabaseError(e)
        })?;

        info!(reception_id, order_count = orders.len(), "orders appended");

        if let Some(sender) = &self.event_sender {
            let event = Event::OrdersAppended {
                reception_id,
                order_count: orders.len(),
            };
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, reception_id, "failed to send orders appended event");
            }
        }

        Ok(orders.len())
    }

    /// Builds the active model for one new order: status defaulted by
    /// channel, order_date stamped from the shop clock, arrival projected
    /// when an offset is given, delivery_date forced null, car_name copied
    /// forward from the reception's first order.
    fn prepare_order(
        &self,
        payload: &OrderPayload,
        customer_id: i32,
        reception_id: i32,
        car_name: String,
    ) -> order::ActiveModel {
        let now = self.clock.now_local();
        // Validation already guaranteed a recognized channel.
        let status = OrderChannel::from_label(&payload.order_channel)
            .unwrap_or(OrderChannel::Dealership)
            .initial_status();
        let estimated_arrival_date = payload
            .estimated_arrival_days
            .map(|days| calendar::project_arrival(now, days));

        order::ActiveModel {
            customer_id: Set(customer_id),
            reception_id: Set(reception_id),
            order_number: Set(payload.order_number.clone()),
            piece_name: Set(Some(payload.piece_name.clone())),
            part_id: Set(payload
                .part_id
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)),
            number_of_pieces: Set(Some(payload.number_of_pieces)),
            order_channel: Set(payload.order_channel.clone()),
            market_name: Set(payload.market_name.clone()),
            market_phone: Set(payload.market_phone.clone()),
            order_date: Set(now),
            delivery_date: Set(None),
            estimated_arrival_days: Set(payload.estimated_arrival_days),
            estimated_arrival_date: Set(estimated_arrival_date),
            status: Set(status.label()),
            final_order_number: Set(None),
            description: Set(None),
            all_description: Set(payload.all_description.clone()),
            car_name: Set(Some(car_name)),
            ..Default::default()
        }
    }
}

/// Display name of the owning customer, for audit messages. A missing row
/// falls back to the placeholder; only a store failure aborts.
async fn resolve_customer_name<C: sea_orm::ConnectionTrait>(
    conn: &C,
    customer_id: i32,
) -> Result<String, ServiceError> {
    let name = customer::Entity::find_by_id(customer_id)
        .one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, customer_id, "failed to look up customer");
            ServiceError::DatabaseError(e)
        })?
        .map(|c| c.customer_name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    Ok(name)
}

/// Canonical Gregorian form of a validated request date.
pub fn canonical_reception_date(jalali: &str) -> Option<NaiveDate> {
    calendar::parse_jalali_date(jalali)
}
