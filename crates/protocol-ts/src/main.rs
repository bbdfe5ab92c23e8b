//! Generates TypeScript bindings for the rk-protocol types.
//!
//! The UI consumes the Op/Event protocol over stdio; running this binary
//! regenerates the `.ts` declaration files it typechecks against.

use anyhow::Result;
use rk_protocol::config_models::ScriptConfig;
use rk_protocol::ipc::{BreakpointResume, Event, Op};
use rk_protocol::ocr_models::{OcrItem, OcrResult};
use rk_protocol::runner_events::{OcrRequestEvent, Region};
use rk_protocol::session_models::{SessionInfo, SessionMode, SessionPhase};
use std::path::Path;
use ts_rs::TS;

const OUT_DIR: &str = "bindings";

fn main() -> Result<()> {
    let out = Path::new(OUT_DIR);

    Op::export_all_to(out)?;
    Event::export_all_to(out)?;
    BreakpointResume::export_all_to(out)?;
    ScriptConfig::export_all_to(out)?;
    OcrResult::export_all_to(out)?;
    OcrItem::export_all_to(out)?;
    Region::export_all_to(out)?;
    OcrRequestEvent::export_all_to(out)?;
    SessionInfo::export_all_to(out)?;
    SessionMode::export_all_to(out)?;
    SessionPhase::export_all_to(out)?;

    println!("TypeScript bindings written to {OUT_DIR}/");
    Ok(())
}
