//! Common library for the Signup Board application
//!
//! This crate provides shared infrastructure used by the services,
//! including PostgreSQL connectivity and the database error type.

pub mod database;
pub mod error;
