//! Axum REST API for the planner.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                              │
//! │  - request parsing, date validation                      │
//! │  - CORS, compression, error mapping                      │
//! └──────────────┬───────────────────────────┬───────────────┘
//!                │                           │
//! ┌──────────────▼──────────────┐ ┌──────────▼───────────────┐
//! │  db::services               │ │  services::pipeline      │
//! │  push / holiday / listing   │ │  services::dispatch (job)│
//! └──────────────┬──────────────┘ └──────────┬───────────────┘
//!                │                           │
//! ┌──────────────▼───────────────────────────▼───────────────┐
//! │  LessonPlanRepository        ContentModel / Location      │
//! └──────────────────────────────────────────────────────────┘
//! ```

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;
