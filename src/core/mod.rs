pub mod auth;
pub mod dictionary;
pub mod headers;
pub mod manager;
