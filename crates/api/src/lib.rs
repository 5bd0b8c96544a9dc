//! Cartwright API library.
//!
//! The backend as a library, so integration tests can drive the full
//! router (authentication gate included) over in-memory stores without
//! binding a socket or reaching Postgres.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
