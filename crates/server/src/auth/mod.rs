pub mod middleware;

pub use middleware::{AuthError, AuthenticatedUser, BearerClaims};
