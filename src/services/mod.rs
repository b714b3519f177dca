// src/services/mod.rs

pub mod credential_service;
pub mod did_manager;
pub mod schema_registry;
