// Library exports for murmur
// This allows integration tests and external code to use murmur modules

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod store;
