use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::algebra::product;
use crate::extract::extract_regex;
use crate::fa::{AutomatonError, FANode, Label, NodeId, EPSILON_CHAR, FA};
use crate::nfa::NFA;

/// Deterministic automaton: every node has at most one transition per
/// symbol and no epsilon transitions.
#[derive(Debug, Clone, Default)]
pub struct DFA {
    fa: FA,
}

impl Deref for DFA {
    type Target = FA;

    fn deref(&self) -> &FA {
        &self.fa
    }
}

impl DerefMut for DFA {
    fn deref_mut(&mut self) -> &mut FA {
        &mut self.fa
    }
}

impl fmt::Display for DFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fa, f)
    }
}

impl DFA {
    pub fn new() -> DFA {
        DFA::default()
    }

    pub(crate) fn from_fa(fa: FA) -> DFA {
        DFA { fa }
    }

    /// Adds `from --symbol--> to`, creating `to` if needed. A transition that
    /// conflicts with an existing one on the same symbol is refused and
    /// leaves the automaton untouched; re-adding the same one is a no-op.
    pub fn add_transition(
        &mut self,
        from: &str,
        symbol: char,
        to: &str,
    ) -> Result<(), AutomatonError> {
        if symbol == EPSILON_CHAR {
            return Err(AutomatonError::EpsilonInDeterministic(from.to_string()));
        }
        let source = self
            .fa
            .id_of(from)
            .ok_or_else(|| AutomatonError::UnknownSource(from.to_string()))?;

        if let Some(existing) = self.target(source, symbol) {
            let existing = self.fa.node(existing).name();
            if existing == to {
                return Ok(());
            }
            return Err(AutomatonError::DeterminismViolation {
                from: from.to_string(),
                symbol,
                existing: existing.to_string(),
                rejected: to.to_string(),
            });
        }

        let target = self.fa.insert_node(to);
        self.fa.push_transition(source, Label::Symbol(symbol), target);
        Ok(())
    }

    pub fn target(&self, from: NodeId, symbol: char) -> Option<NodeId> {
        self.fa.node(from).targets(Label::Symbol(symbol)).next()
    }

    pub fn cursor(&self) -> Result<DFACursor<'_>, AutomatonError> {
        let start = self.fa.start_id().ok_or(AutomatonError::EmptyAutomaton)?;
        Ok(DFACursor {
            dfa: self,
            current: Some(start),
        })
    }

    pub fn is_member(&self, word: &str) -> Result<bool, AutomatonError> {
        let mut cursor = self.cursor()?;
        for c in word.chars() {
            cursor.transition(c);
            if cursor.is_out() {
                return Ok(false);
            }
        }
        Ok(cursor.is_accepting())
    }

    /// Shortest non-empty prefix of `input` that the automaton accepts.
    pub fn shortest_accepted_prefix<'w>(
        &self,
        input: &'w str,
    ) -> Result<Option<&'w str>, AutomatonError> {
        let mut cursor = self.cursor()?;
        for (offset, c) in input.char_indices() {
            cursor.transition(c);
            if cursor.is_out() {
                return Ok(None);
            }
            if cursor.is_accepting() {
                return Ok(Some(&input[..offset + c.len_utf8()]));
            }
        }
        Ok(None)
    }

    /// Same graph with final and non-final nodes swapped. Only recognises the
    /// complement language when the automaton is complete over the alphabet
    /// of interest; see [`DFA::completed`].
    pub fn complement(&self) -> DFA {
        let mut result = self.clone();
        result.fa.swap_finals();
        result
    }

    pub fn is_complete(&self, alphabet: &BTreeSet<char>) -> bool {
        self.fa.nodes_by_name().all(|(id, _)| {
            alphabet.iter().all(|&c| self.target(id, c).is_some())
        })
    }

    /// Copy with a non-final sink node that absorbs every missing transition
    /// over `alphabet`.
    pub fn completed(&self, alphabet: &BTreeSet<char>) -> DFA {
        let mut result = self.clone();
        if result.is_empty() || result.is_complete(alphabet) {
            return result;
        }

        let sink_name = result.fa.fresh_name("sink");
        let sink = result.fa.insert_node(&sink_name);
        let ids: Vec<NodeId> = result.fa.nodes_by_name().map(|(id, _)| id).collect();
        for id in ids {
            for &c in alphabet {
                if result.target(id, c).is_none() {
                    result.fa.push_transition(id, Label::Symbol(c), sink);
                }
            }
        }
        log::debug!("completed with sink `{}` over {} symbols", sink_name, alphabet.len());
        result
    }

    /// Product automaton accepting words both operands accept. Pair nodes
    /// are named `(a,b)`.
    ///
    /// Panics when either operand has no start node.
    pub fn intersection(first: &DFA, second: &DFA) -> DFA {
        let (mut fa, pairs) = product(&first.fa, &second.fa, |a, b| (a == b).then_some(a));
        for &a in first.final_ids() {
            for &b in second.final_ids() {
                fa.mark_final(pairs[&(a, b)]);
            }
        }
        DFA { fa }
    }

    /// Product automaton accepting words either operand accepts. Like any
    /// product, this only covers words both operands can read to the end, so
    /// complete both over a common alphabet first for a true union.
    ///
    /// Panics when either operand has no start node.
    pub fn union(first: &DFA, second: &DFA) -> DFA {
        let (mut fa, pairs) = product(&first.fa, &second.fa, |a, b| (a == b).then_some(a));
        for (a, _) in first.nodes_by_name() {
            for (b, _) in second.nodes_by_name() {
                if first.is_final(a) || second.is_final(b) {
                    fa.mark_final(pairs[&(a, b)]);
                }
            }
        }
        DFA { fa }
    }

    pub fn to_nfa(&self) -> NFA {
        NFA::from_fa(self.fa.clone())
    }

    /// Regular expression for the accepted language, see [`extract_regex`].
    pub fn to_regex(&self) -> Result<String, AutomatonError> {
        extract_regex(self)
    }
}

/// Walks a [`DFA`] one symbol at a time. A missing transition moves the
/// cursor "out"; once out, further transitions do nothing.
#[derive(Debug, Clone)]
pub struct DFACursor<'a> {
    dfa: &'a DFA,
    current: Option<NodeId>,
}

impl<'a> DFACursor<'a> {
    pub fn current(&self) -> Option<&'a FANode> {
        self.current.map(|id| self.dfa.node(id))
    }

    pub fn is_out(&self) -> bool {
        self.current.is_none()
    }

    pub fn transition(&mut self, symbol: char) -> &mut Self {
        self.current = self.current.and_then(|id| self.dfa.target(id, symbol));
        self
    }

    pub fn is_accepting(&self) -> bool {
        self.current.map_or(false, |id| self.dfa.is_final(id))
    }
}
