pub mod auth;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{Claims, ClaimsResolver, Role};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use types::{Message, new_id, non_blank, now_rfc3339};
