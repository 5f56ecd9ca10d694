//! examforge-core — Timed test session engine.
//!
//! This crate defines the question-set data model, the resource parser, the
//! countdown timer, the session state machine with its scoring and review
//! projection, and the controller that serializes ticks and user commands.

pub mod controller;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod review;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
