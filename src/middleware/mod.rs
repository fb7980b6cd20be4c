// Middleware modules
pub mod auth;
pub mod logging;

// Export auth middleware components
pub use auth::{auth_middleware, UserIdentity};

// Export logging middleware
pub use logging::logging_middleware;
