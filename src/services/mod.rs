pub mod ad_service;
pub mod admin_service;
pub mod auth_service;
pub mod favorite_service;
