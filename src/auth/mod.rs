//! Authentication: operator login and bearer token verification.

mod handlers;
mod jwt;
mod service;

pub use handlers::login;
pub use jwt::{Claims, TokenVerifier, TOKEN_TTL_HOURS};
pub use service::AccountService;
