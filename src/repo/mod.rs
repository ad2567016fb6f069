pub mod accounts;
pub mod lands;
pub mod roles;
pub mod unlocks;
