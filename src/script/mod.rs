//! JSON-lines command scripts

pub mod command;
pub mod runner;

pub use command::Command;
pub use runner::{Outcome, RunSummary, ScriptRunner};
