pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod points;
pub mod routes;
pub mod schema;
pub mod state;
pub mod utils;
