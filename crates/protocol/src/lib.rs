//! # rk-protocol
//!
//! Core protocol definitions and data models for replay-kit.
//!
//! This crate defines all shared data structures used for:
//! - Decoding the automation runner's line-oriented stdout protocol
//! - OCR engine response payloads and the result-code taxonomy
//! - Per-script replay configuration
//! - Inter-process communication between the UI and the host core
//!
//! ## Modules
//!
//! - [`runner_events`]: Typed decoder for the runner's stdout lines
//! - [`ocr_models`]: OCR engine wire payloads and result classification
//! - [`config_models`]: Persisted per-script replay configuration
//! - [`session_models`]: Recording/playback session state
//! - [`ipc`]: Operations and Events for UI-Core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, ts-rs, uuid, and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other replay-kit crates

pub mod config_models;
pub mod ipc;
pub mod ocr_models;
pub mod runner_events;
pub mod session_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use ocr_models::*;
pub use runner_events::*;
pub use session_models::*;
