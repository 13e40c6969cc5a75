//! Signup board service: email-verified signup, cookie sessions with
//! read/write access levels, and a shared message board.

pub mod accounts;
pub mod board;
pub mod codes;
pub mod database;
pub mod error;
pub mod hasher;
pub mod jwt;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod repositories;
pub mod routes;
pub mod settings;
pub mod state;
pub mod validation;

pub use state::AppState;
