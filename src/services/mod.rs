pub mod audit;
pub mod order_status;
pub mod receptions;
