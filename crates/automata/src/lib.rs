mod algebra;
mod dfa;
mod extract;
mod fa;
mod nfa;
pub mod regex;

#[cfg(test)]
mod fa_tests;

pub use dfa::{DFACursor, DFA};
pub use extract::{extract_regex, RegexExtractor};
pub use fa::{AutomatonError, FANode, Label, NodeId, EPSILON_CHAR, FA};
pub use nfa::{NFACursor, NFA};
pub use regex::{parse_regex, RegexError};
