// Data models module
// Persisted documents, request payloads and the shared error type

pub mod errors;
pub mod inventory;
pub mod user;
