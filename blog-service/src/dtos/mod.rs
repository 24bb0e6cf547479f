//! Wire-format types for the HTTP surface. Requests validate with
//! `validator`; responses flatten the storage rows into the field names the
//! blog clients consume.

pub mod comments;
pub mod posts;
pub mod profiles;
pub mod taxonomy;
