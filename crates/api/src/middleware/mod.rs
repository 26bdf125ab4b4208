pub mod auth;
pub mod precondition;
