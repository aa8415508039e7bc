//! Post-commit domain notifications.
//!
//! Events are advisory: they are sent after the owning transaction commits
//! and a failed send only logs a warning, it never unwinds the operation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events emitted by the workflow core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ReceptionCreated {
        reception_id: i32,
        customer_id: i32,
        order_count: usize,
    },
    OrdersAppended {
        reception_id: i32,
        order_count: usize,
    },
    OrdersTransitioned {
        order_ids: Vec<i32>,
        new_status: String,
        updated_count: u64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }
}

/// Drains the event channel, logging each event. Runs until every sender
/// is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ReceptionCreated {
                reception_id,
                customer_id,
                order_count,
            } => info!(
                reception_id,
                customer_id, order_count, "reception created"
            ),
            Event::OrdersAppended {
                reception_id,
                order_count,
            } => info!(reception_id, order_count, "orders appended to reception"),
            Event::OrdersTransitioned {
                order_ids,
                new_status,
                updated_count,
            } => info!(
                order_count = order_ids.len(),
                new_status = %new_status,
                updated_count,
                "orders transitioned"
            ),
        }
    }
    warn!("event channel closed; event processor exiting");
}
