//! Terminal side of the declarative engine
//!
//! 1. Displaying - Render plans with per-attribute changes
//! 2. Executing - Progress bars, confirmation prompts and summaries

pub mod differ;
pub mod executor;

pub use differ::display_plan;
pub use executor::{TerminalConfirm, TerminalProgress, print_summary};
