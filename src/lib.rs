//! Passport identity provider authentication for a host platform.
//!
//! Credentials are verified against the remote passport service through
//! [`auth::PassportGateway`]; successful logins are mapped onto local
//! accounts by [`services::UserProvisioner`]. [`auth::PassportAuthenticator`]
//! ties both together behind the host-facing [`auth::Authenticator`] trait.

pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod observability;
pub mod services;
