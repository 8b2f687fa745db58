//! Authentication module
//!
//! - JWT token management (stateless, user id as subject)
//! - Middleware for route protection

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtService};
pub use middleware::{AuthenticatedUser, RequireAuth, TokenExtractor, TokenSource};
