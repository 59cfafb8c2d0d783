pub mod rate_limit;

pub use rate_limit::{ai_rate_limit, RateLimiter};
