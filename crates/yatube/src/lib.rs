//! Yatube: a small blogging site with groups, follows and comments.
//!
//! The crate wires [`yatube_core`] feeds and follows to HTTP with Salvo:
//! [`router::service`] builds the whole site from an [`AppState`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
mod error;
pub mod forms;
pub mod media;
pub mod router;
pub mod state;
pub mod templates;
pub mod views;

pub use self::config::Config;
pub use self::error::{AppError, AppResult};
pub use self::state::AppState;
