//! reamerge - merge recorded sessions into a mix template
//!
//! This library provides:
//! - `workbench`: the session queue, template and assignment, replanned on
//!   every queue change and committed once
//! - `output`: summaries, offset tables and assignment matrices for the CLI

pub mod output;
pub mod workbench;

pub use workbench::{Workbench, WorkbenchError};
