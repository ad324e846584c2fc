pub mod audit_logs;
pub mod chats;
pub mod items;
pub mod revoked_tokens;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use chats::Entity as Chats;
pub use items::Entity as Items;
pub use revoked_tokens::Entity as RevokedTokens;
pub use users::Entity as Users;
