//! Rentgate - session handling and role-based route protection
//!
//! Library interface for the landlord, tenant, manager, partner and admin
//! dashboards: a persistent token store, an API client with single-flight
//! token refresh, the auth service façade and the edge route guard.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;

pub use auth::{AuthService, TokenStore, UserRole};
pub use client::ApiClient;
pub use config::Config;
pub use error::{Error, Result};
pub use guard::{RouteDecision, RouteTable};
