use std::sync::Arc;

use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::AuthUser,
    calendar::{Clock, TehranClock},
    db::DbPool,
    entities::{customer, lost_order, order, reception},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderStatus, DESCRIPTION_SEPARATOR, NO_DESCRIPTION_LABEL, UNKNOWN_LABEL},
    services::audit::AuditLogService,
};

lazy_static! {
    static ref ORDER_TRANSITIONS: IntCounter = IntCounter::new(
        "order_transitions_total",
        "Total number of bulk order status transitions"
    )
    .expect("metric can be created");
    static ref ORDER_TRANSITION_FAILURES: IntCounter = IntCounter::new(
        "order_transition_failures_total",
        "Total number of failed bulk order status transitions"
    )
    .expect("metric can be created");
}

/// Request for moving a set of orders into a new workflow state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOrdersRequest {
    pub order_ids: Vec<i32>,
    pub new_status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub final_order_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionOrdersResult {
    pub updated_count: u64,
}

/// One resolved order row: piece name plus owning customer, LEFT-JOIN
/// semantics so a dangling reception or customer yields placeholders.
#[derive(Debug, FromQueryResult)]
pub(crate) struct ResolvedOrderRow {
    pub id: i32,
    pub piece_name: Option<String>,
    pub customer_name: Option<String>,
}

/// Bulk status transition engine.
///
/// The engine does not gate transition legality: any order may move to any
/// status, recognized or not. Its job is the fan-out — one atomic update,
/// conditional lost-order bookkeeping, one grouped audit message per
/// affected customer.
#[derive(Clone)]
pub struct OrderTransitionService {
    db_pool: Arc<DbPool>,
    audit: Arc<AuditLogService>,
    event_sender: Option<Arc<EventSender>>,
    clock: Arc<dyn Clock>,
}

impl OrderTransitionService {
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

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Moves all requested orders into `new_status` atomically and fans out
    /// the side effects. Returns the number of rows the update touched.
    #[instrument(skip(self, request), fields(order_count = request.order_ids.len(), new_status = %request.new_status))]
    pub async fn transition_orders(
        &self,
        request: TransitionOrdersRequest,
        acting_user: &AuthUser,
    ) -> Result<TransitionOrdersResult, ServiceError> {
        validate_transition_request(&request)?;

        let recognized = OrderStatus::from_label(&request.new_status);
        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let final_order_number = request
            .final_order_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for bulk transition");
            ServiceError::DatabaseError(e)
        })?;

        let rows = order::Entity::find()
            .select_only()
            .column(order::Column::Id)
            .column(order::Column::PieceName)
            .column_as(customer::Column::CustomerName, "customer_name")
            .join(JoinType::LeftJoin, order::Relation::Reception.def())
            .join(JoinType::LeftJoin, reception::Relation::Customer.def())
            .filter(order::Column::Id.is_in(request.order_ids.clone()))
            .into_model::<ResolvedOrderRow>()
            .all(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to resolve orders for transition");
                ServiceError::DatabaseError(e)
            })?;

        if rows.is_empty() {
            return Err(ServiceError::NotFound(
                "هیچ سفارشی با این شناسه‌ها یافت نشد.".to_string(),
            ));
        }

        let customer_groups = group_by_customer(&rows);

        let delivery_date = recognized
            .filter(OrderStatus::sets_delivery_date)
            .map(|_| self.clock.now_local());

        let mut update = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(request.new_status.clone()));
        if let Some(dt) = delivery_date {
            update = update.col_expr(order::Column::DeliveryDate, Expr::value(dt));
        }
        if let Some(number) = &final_order_number {
            update = update.col_expr(order::Column::FinalOrderNumber, Expr::value(number.clone()));
        }
        if let Some(text) = &description {
            // Append, never overwrite: CONCAT_WS skips a NULL prior value.
            update = update.col_expr(
                order::Column::Description,
                Expr::cust_with_values(
                    format!("CONCAT_WS('{DESCRIPTION_SEPARATOR}', description, ?)"),
                    [text.clone()],
                ),
            );
        }

        let update_result = update
            .filter(order::Column::Id.is_in(request.order_ids.clone()))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to apply bulk status update");
                ServiceError::DatabaseError(e)
            })?;

        if recognized.is_some_and(|s| s.creates_lost_order()) {
            self.record_lost_orders(
                &txn,
                &request.order_ids,
                &request.new_status,
                description.as_deref(),
                acting_user,
            )
            .await?;
        }

        for (customer_name, pieces) in &customer_groups {
            let message = audit_message(
                &request.new_status,
                customer_name,
                pieces,
                description.as_deref(),
            );
            self.audit
                .append(&txn, acting_user.id, "به‌روزرسانی گروهی سفارش‌ها", message)
                .await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit bulk transition");
            ServiceError::DatabaseError(e)
        })?;

        ORDER_TRANSITIONS.inc();
        info!(
            updated_count = update_result.rows_affected,
            customer_groups = customer_groups.len(),
            "orders transitioned"
        );

        if let Some(sender) = &self.event_sender {
            let event = Event::OrdersTransitioned {
                order_ids: request.order_ids.clone(),
                new_status: request.new_status.clone(),
                updated_count: update_result.rows_affected,
            };
            if let Err(e) = sender.send(event).await {
                ORDER_TRANSITION_FAILURES.inc();
                warn!(error = %e, "failed to send orders transitioned event");
            }
        }

        Ok(TransitionOrdersResult {
            updated_count: update_result.rows_affected,
        })
    }

    /// Materializes one lost-order row per affected order, with the loss
    /// moment split into a local date and an HH:MM string.
    async fn record_lost_orders(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        order_ids: &[i32],
        new_status: &str,
        description: Option<&str>,
        acting_user: &AuthUser,
    ) -> Result<(), ServiceError> {
        let now = self.clock.now_local();
        let lost_date = now.date();
        let lost_time = now.format("%H:%M").to_string();
        let lost_description = description
            .map(str::to_string)
            .unwrap_or_else(|| NO_DESCRIPTION_LABEL.to_string());

        let affected = order::Entity::find()
            .filter(order::Column::Id.is_in(order_ids.to_vec()))
            .all(txn)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load orders for lost-order bookkeeping");
                ServiceError::DatabaseError(e)
            })?;

        for affected_order in affected {
            let record = lost_order::ActiveModel {
                part_id: Set(affected_order.part_id.clone()),
                piece_name: Set(affected_order
                    .piece_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
                car_name: Set(affected_order
                    .car_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
                lost_description: Set(lost_description.clone()),
                count: Set(affected_order
                    .number_of_pieces
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "1".to_string())),
                lost_date: Set(lost_date),
                lost_time: Set(lost_time.clone()),
                status: Set(new_status.to_string()),
                dealer_id: Set(acting_user.dealer_id),
                ..Default::default()
            };

            use sea_orm::ActiveModelTrait;
            record.insert(txn).await.map_err(|e| {
                error!(error = %e, order_id = affected_order.id, "failed to insert lost order");
                ServiceError::DatabaseError(e)
            })?;
        }

        Ok(())
    }
}

/// Precondition checks; nothing is mutated before these pass.
pub fn validate_transition_request(request: &TransitionOrdersRequest) -> Result<(), ServiceError> {
    if request.order_ids.is_empty() {
        return Err(ServiceError::ValidationError(
            "لیست سفارش‌ها خالی است.".to_string(),
        ));
    }

    if request.new_status.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "وضعیت جدید معتبر نیست.".to_string(),
        ));
    }

    if let Some(status) = OrderStatus::from_label(&request.new_status) {
        let description_missing = request
            .description
            .as_deref()
            .map(str::trim)
            .map_or(true, str::is_empty);
        if status.requires_description() && description_missing {
            return Err(ServiceError::ValidationError(format!(
                "وارد کردن توضیحات برای وضعیت \"{}\" الزامی است.",
                request.new_status
            )));
        }

        let final_number_missing = request
            .final_order_number
            .as_deref()
            .map(str::trim)
            .map_or(true, str::is_empty);
        if status.requires_final_order_number() && final_number_missing {
            return Err(ServiceError::ValidationError(format!(
                "وارد کردن شماره سفارش نهایی برای وضعیت \"{}\" الزامی است.",
                request.new_status
            )));
        }
    }

    Ok(())
}

/// Groups resolved rows by customer display name in encounter order; each
/// group's piece names keep encounter order and duplicates.
pub(crate) fn group_by_customer(rows: &[ResolvedOrderRow]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for row in rows {
        let customer = row
            .customer_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        let piece = row
            .piece_name
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        match groups.iter_mut().find(|(name, _)| *name == customer) {
            Some((_, pieces)) => pieces.push(piece),
            None => groups.push((customer, vec![piece])),
        }
    }
    groups
}

/// Audit message for one customer group. Recognized statuses have a fixed
/// template; anything else takes the generic wording.
pub(crate) fn audit_message(
    raw_status: &str,
    customer: &str,
    pieces: &[String],
    description: Option<&str>,
) -> String {
    let pieces_text = pieces
        .iter()
        .map(|name| format!("«{name}»"))
        .collect::<Vec<_>>()
        .join("، ");
    let reason = description
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_DESCRIPTION_LABEL);

    use OrderStatus::*;
    match OrderStatus::from_label(raw_status) {
        Some(CompanyApproved) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" توسط شرکت تأیید شد"
        ),
        Some(CompanyCanceled) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" به دلیل \"{reason}\" توسط شرکت لغو شد"
        ),
        Some(Paid) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" توسط حسابدار پرداخت شد"
        ),
        Some(AccountingNonPayment) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" به دلیل \"{reason}\" توسط حسابدار پرداخت نشد"
        ),
        Some(Received) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" توسط انباردار دریافت شد"
        ),
        Some(NotReceived) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" به دلیل \"{reason}\" دریافت نشد"
        ),
        Some(Scheduled) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" توسط پذیرش نوبت‌گذاری شد"
        ),
        Some(CustomerWithdrawal) => format!(
            "مشتری \"{customer}\" از ادامه‌ی سفارشات {pieces_text} به دلیل \"{reason}\" انصراف داد"
        ),
        Some(Delivered) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" تحویل داده شد"
        ),
        Some(NotDelivered) => format!(
            "سفارشات {pieces_text} مربوط به مشتری \"{customer}\" به دلیل \"{reason}\" تحویل نشد"
        ),
        Some(AwaitingCompanyApproval) | Some(AwaitingAccountingApproval) | None => format!(
            "وضعیت سفارشات {pieces_text} مربوط به مشتری \"{customer}\" به \"{raw_status}\" تغییر یافت"
        ),
    }
}
