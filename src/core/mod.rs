//! # Core Application Logic
//!
//! Session handling and settings. Everything here talks to the backend
//! through [`crate::api::ApiClient`] and never touches HTTP directly.
//!
//! ```text
//!     ┌──────────────┐      ┌──────────────┐
//!     │  auth.rs     │      │  config.rs   │
//!     │  login       │      │  defaults    │
//!     │  logout      │      │  file → env  │
//!     │  user info   │      │  → CLI flags │
//!     └──────┬───────┘      └──────────────┘
//!            │
//!            ▼
//!     ApiClient ──► Pipeline ──► network
//!            │
//!            ▼
//!     TokenStore (store.rs)
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: `AuthRepository` and the logout / user-info use-cases
//! - [`config`]: `~/.readpick/config.toml` loading and resolution

pub mod auth;
pub mod config;
