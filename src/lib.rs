pub mod auth;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod request;
pub mod sql;
pub mod tls;
pub mod wire;
