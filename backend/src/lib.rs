//! # Neo lesson planner backend
//!
//! Generates culturally grounded lesson content with a chain of language-model
//! agents, spreads it over a school term's working days, and keeps each
//! teacher's schedule consistent when holidays are declared.
//!
//! ## Architecture
//!
//! - [`scheduling`]: working-day calendar, holiday redistribution, load balancing
//! - [`extraction`]: structured fields and display-safe HTML from model replies
//! - [`models`]: lesson plans, generation results, date parsing
//! - [`db`]: repository pattern with in-memory and PostgreSQL backends
//! - [`llm`]: agent roles, the Gemini client and location lookup
//! - [`services`]: prompt pipeline, bulk generation jobs, job tracking
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`config`]: environment configuration

// RepositoryError carries a structured context for debugging.
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod scheduling;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
