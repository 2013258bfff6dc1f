pub mod auth;
pub mod request_id;

pub use auth::OwnerAuth;
pub use request_id::{RequestId, RequestIdMiddleware};
