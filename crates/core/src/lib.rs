//! # rk-core
//!
//! Engine process supervision and OCR round-trip coordination for
//! replay-kit.
//!
//! This crate provides:
//! - Line framing for arbitrarily chunked process output streams
//! - Supervision of the external OCR engine process (serialized FIFO
//!   access, respawn on demand)
//! - Supervision of the external automation runner (record/play sessions,
//!   typed stdout event routing, cooperative shutdown)
//! - The OCR round-trip coordinator and the sentinel-file signaling it
//!   uses to answer a runner that can only be influenced through files
//!   it polls
//! - The host bridge dispatching UI operations to the components above
//!
//! ## Modules
//!
//! - [`framing`]: Newline reassembly over chunked byte streams
//! - [`ocr`]: OCR engine process supervisor
//! - [`automation`]: Runner process controller, script store, sentinels
//! - [`coordinator`]: OCR checkpoint round-trip state machine
//! - [`bridge`]: Op/Event dispatch between the UI and the core
//! - [`config`]: Core configuration loading

pub mod automation;
pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod framing;
pub mod ocr;
