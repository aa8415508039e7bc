pub mod audit_log;
pub mod customer;
pub mod lost_order;
pub mod order;
pub mod reception;

pub use audit_log::Entity as AuditLog;
pub use customer::Entity as Customer;
pub use lost_order::Entity as LostOrder;
pub use order::Entity as Order;
pub use reception::Entity as Reception;
