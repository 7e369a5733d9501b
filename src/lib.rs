#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "A multi-tenant todo service: bearer-token authentication against a shared secret"]
#![doc = "or a JWK Set, and CRUD over tasks that are always scoped to their owner."]
#![doc = "The binary (`main.rs`) loads configuration and serves the routes defined here."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod routes;

pub use crate::error::AppError;
