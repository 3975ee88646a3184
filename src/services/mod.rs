// Business logic services module
// This module contains the core business logic services

pub mod auth_service;
pub mod cache_manager;
pub mod document_store;
pub mod inventory_service;
pub mod rate_limiter;
pub mod token_service;
