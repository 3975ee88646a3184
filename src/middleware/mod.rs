// Request middleware: token checks and per-client rate limiting

pub mod auth;
pub mod rate_limit;
