//! Craft Copilot front-end.
//!
//! Collects a craft idea, asks the backend for project suggestions and a preview image, and
//! renders the results into an in-memory page served over HTTP.

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod handlers;
pub mod models;
pub mod presenter;
pub mod render;
pub mod routes;
pub mod view;
