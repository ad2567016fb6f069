pub mod accounts;
pub mod artifacts;
pub mod auth;
pub mod config;
pub mod email;
pub mod listings;
pub mod password;
pub mod registration;
pub mod reset;
pub mod token;
pub mod validate;
