//! Database models split into domain-specific modules.

pub mod catalog;
pub mod change_request;
pub mod comment;
pub mod session;
pub mod user;

pub use catalog::*;
pub use change_request::*;
pub use comment::*;
pub use session::*;
pub use user::*;
