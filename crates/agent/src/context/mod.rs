//! Prompt assembly under a token budget.
//!
//! | Step | What happens |
//! |------|--------------|
//! | 1. Fetch | Newest `history_window` turns from the history collaborator |
//! | 2. Filter | Drop turns older than `recent_raw_window_days` |
//! | 3. Fit | Full history if it fits the ceiling, otherwise the newest `compressed_window` turns |
//!
//! The new user input is never truncated.

pub mod budget;
pub mod token;

pub use budget::ContextBudgetBuilder;
pub use token::estimate_tokens;
