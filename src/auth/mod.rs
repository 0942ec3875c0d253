//! Authentication and session management

pub mod models;
pub mod service;
pub mod storage;
pub mod store;

pub use models::{Credentials, Registration, User, UserRole};
pub use service::AuthService;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{Session, SessionEvent, TokenStore};
