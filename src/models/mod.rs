//! Closed domain enumerations for the workflow core.
//!
//! Statuses, channels and car states live in the database and on the wire as
//! their Persian labels; these enums are the domain representation and the
//! labels are presentation-layer mappings.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Placeholder used wherever a customer, piece or car name cannot be resolved.
pub const UNKNOWN_LABEL: &str = "نامشخص";

/// Default text for a missing transition description.
pub const NO_DESCRIPTION_LABEL: &str = "بدون توضیحات";

/// Separator used when appending a transition description to an order's
/// accumulated description field.
pub const DESCRIPTION_SEPARATOR: &str = " / ";

/// Workflow states the transition engine recognizes. Orders may carry other
/// free-form labels; those take the generic audit path and no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum OrderStatus {
    #[strum(serialize = "در انتظار تائید شرکت")]
    AwaitingCompanyApproval,
    #[strum(serialize = "در انتظار تائید حسابداری")]
    AwaitingAccountingApproval,
    #[strum(serialize = "تائید توسط شرکت")]
    CompanyApproved,
    #[strum(serialize = "لغو توسط شرکت")]
    CompanyCanceled,
    #[strum(serialize = "پرداخت شد")]
    Paid,
    #[strum(serialize = "عدم پرداخت حسابداری")]
    AccountingNonPayment,
    #[strum(serialize = "دریافت شد")]
    Received,
    #[strum(serialize = "عدم دریافت")]
    NotReceived,
    #[strum(serialize = "نوبت داده شد")]
    Scheduled,
    #[strum(serialize = "انصراف مشتری")]
    CustomerWithdrawal,
    #[strum(serialize = "تحویل شد")]
    Delivered,
    #[strum(serialize = "تحویل نشد")]
    NotDelivered,
}

impl OrderStatus {
    /// Recognize a Persian status label; unrecognized labels stay accepted
    /// by the engine and are handled generically.
    pub fn from_label(label: &str) -> Option<Self> {
        label.parse().ok()
    }

    /// The Persian label stored and rendered for this status.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Statuses that cannot be entered without an operator-supplied reason.
    pub fn requires_description(&self) -> bool {
        matches!(
            self,
            Self::CompanyCanceled
                | Self::AccountingNonPayment
                | Self::NotReceived
                | Self::CustomerWithdrawal
                | Self::NotDelivered
        )
    }

    /// Statuses whose entry materializes a lost-order record per order.
    pub fn creates_lost_order(&self) -> bool {
        matches!(self, Self::CompanyCanceled | Self::AccountingNonPayment)
    }

    /// Whether entering this status stamps the delivery date.
    pub fn sets_delivery_date(&self) -> bool {
        matches!(self, Self::Received)
    }

    /// Whether entering this status demands a final order number.
    pub fn requires_final_order_number(&self) -> bool {
        matches!(self, Self::AwaitingAccountingApproval)
    }
}

/// Sourcing channel of a parts order. The open market relaxes the part_id
/// requirement; company channels demand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum OrderChannel {
    #[strum(serialize = "بازار آزاد")]
    OpenMarket,
    #[strum(serialize = "نمایندگی")]
    Dealership,
    #[strum(serialize = "شرکتی")]
    Company,
}

impl OrderChannel {
    pub fn from_label(label: &str) -> Option<Self> {
        label.parse().ok()
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Labels of every allowed channel, for validation error messages.
    pub fn allowed_labels() -> Vec<String> {
        Self::iter().map(|c| c.to_string()).collect()
    }

    /// Initial workflow state of an order placed through this channel.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            Self::OpenMarket => OrderStatus::AwaitingAccountingApproval,
            _ => OrderStatus::AwaitingCompanyApproval,
        }
    }
}

/// State of the vehicle at reception time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum CarStatus {
    #[strum(serialize = "در تعمیرگاه")]
    InWorkshop,
    #[strum(serialize = "در انتظار قطعه")]
    AwaitingParts,
    #[strum(serialize = "ترخیص شده")]
    Released,
}

impl CarStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        label.parse().ok()
    }

    pub fn allowed_labels() -> Vec<String> {
        Self::iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in OrderStatus::iter() {
            assert_eq!(OrderStatus::from_label(&status.label()), Some(status));
        }
        assert_eq!(OrderStatus::from_label("وضعیت ناشناخته"), None);
    }

    #[test]
    fn mandatory_description_statuses() {
        assert!(OrderStatus::CompanyCanceled.requires_description());
        assert!(OrderStatus::AccountingNonPayment.requires_description());
        assert!(OrderStatus::NotReceived.requires_description());
        assert!(OrderStatus::CustomerWithdrawal.requires_description());
        assert!(OrderStatus::NotDelivered.requires_description());
        assert!(!OrderStatus::Received.requires_description());
        assert!(!OrderStatus::Paid.requires_description());
    }

    #[test]
    fn lost_order_statuses_are_the_cancellation_pair() {
        let lost: Vec<_> = OrderStatus::iter()
            .filter(OrderStatus::creates_lost_order)
            .collect();
        assert_eq!(
            lost,
            vec![
                OrderStatus::CompanyCanceled,
                OrderStatus::AccountingNonPayment
            ]
        );
    }

    #[test]
    fn channel_defaults() {
        assert_eq!(
            OrderChannel::OpenMarket.initial_status(),
            OrderStatus::AwaitingAccountingApproval
        );
        assert_eq!(
            OrderChannel::Dealership.initial_status(),
            OrderStatus::AwaitingCompanyApproval
        );
        assert_eq!(
            OrderChannel::Company.initial_status(),
            OrderStatus::AwaitingCompanyApproval
        );
    }

    #[test]
    fn only_received_sets_delivery_date() {
        for status in OrderStatus::iter() {
            assert_eq!(status.sets_delivery_date(), status == OrderStatus::Received);
        }
    }

    #[test]
    fn car_status_labels() {
        assert_eq!(
            CarStatus::from_label("در تعمیرگاه"),
            Some(CarStatus::InWorkshop)
        );
        assert_eq!(CarStatus::from_label("نامعتبر"), None);
        assert_eq!(CarStatus::allowed_labels().len(), 3);
    }
}
