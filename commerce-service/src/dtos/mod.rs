//! Wire-format types for the HTTP surface. Requests validate with
//! `validator`; responses flatten the storage rows into the field names the
//! dashboard clients consume.

pub mod categories;
pub mod dashboard;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod tasks;
pub mod users;
