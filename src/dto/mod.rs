pub mod ads;
pub mod auth;
