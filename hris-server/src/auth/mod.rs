//! Authentication: JWT issuing/validation, bearer middleware, rate limits

pub mod jwt;
pub mod middleware;
pub mod rate_limit;

pub use jwt::{CurrentUser, JwtConfig, JwtService, TokenType};
pub use rate_limit::RateLimiter;
