//! Dialogue Advice - natural language generation for simulated task-oriented
//! dialogues.
//!
//! Samples a synthetic categorical database for a slot-filling domain,
//! counts which attribute-value combinations are frequent, and turns those
//! counts into advisory clauses appended to rendered system turns, so a
//! simulated system can volunteer "most places in the centre are cheap".

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{DialogueNlg, DialogueNlgBuilder, PipelineError, SystemUtterance};
