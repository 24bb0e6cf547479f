//! HTTP handlers for commerce-service.

pub mod categories;
pub mod dashboard;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod tasks;
pub mod users;
