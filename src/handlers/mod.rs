// HTTP request handlers module

pub mod auth;
pub mod health;
pub mod inventory;
pub mod users;
