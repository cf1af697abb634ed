//! Sea-ORM entities for the account tables.

pub mod field_definition;
pub mod field_value;
pub mod user;
