//! Administrator-defined custom fields for user accounts.
//!
//! [`types`] holds the closed set of field types and their coercion rules,
//! the rest follows the crate's handlers → service → repository layering.

pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
