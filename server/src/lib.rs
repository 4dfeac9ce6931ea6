pub mod auth;
pub mod config;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod permissions;
pub mod repository;
pub mod routes;
pub mod state;
pub mod utils;
