mod core;
mod cors;

pub use core::Middleware;
pub use cors::{CorsConfig, CorsConfigError, CorsFilter, OriginMatcher, OriginRule};
