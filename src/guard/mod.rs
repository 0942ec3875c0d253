//! Role-based route protection for dashboard navigation

pub mod cookies;
pub mod middleware;
pub mod rules;

pub use cookies::{append_set_cookies, clear_session_cookies, session_cookies, RouteCookies};
pub use middleware::route_guard;
pub use rules::{LandingPage, Redirect, RouteDecision, RouteRule, RouteTable};
