pub mod ads;
pub mod audit_logs;
pub mod auth_tokens;
pub mod favorites;
pub mod users;

pub use ads::Entity as Ads;
pub use audit_logs::Entity as AuditLogs;
pub use auth_tokens::Entity as AuthTokens;
pub use favorites::Entity as Favorites;
pub use users::Entity as Users;
