use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};

use bit_set::BitSet;

use crate::dfa::DFA;
use crate::fa::{AutomatonError, FANode, Label, NodeId, EPSILON_CHAR, FA};
use crate::regex::{RegexError, RegexParser};

/// Nondeterministic automaton with epsilon transitions.
#[derive(Debug, Clone, Default)]
pub struct NFA {
    fa: FA,
}

impl Deref for NFA {
    type Target = FA;

    fn deref(&self) -> &FA {
        &self.fa
    }
}

impl DerefMut for NFA {
    fn deref_mut(&mut self) -> &mut FA {
        &mut self.fa
    }
}

impl fmt::Display for NFA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.fa, f)
    }
}

impl NFA {
    pub fn new() -> NFA {
        NFA::default()
    }

    pub(crate) fn from_fa(fa: FA) -> NFA {
        NFA { fa }
    }

    /// Chain accepting exactly `word`. Nodes are named `word` followed by
    /// their position; the empty word (or `@`) gives a single node that is
    /// both start and final.
    pub fn from_word(word: &str) -> NFA {
        let symbols: String = word.chars().filter(|&c| c != EPSILON_CHAR).collect();
        let mut fa = FA::default();
        if symbols.is_empty() {
            let only = fa.insert_node("epsilon");
            fa.set_start(only);
            fa.mark_final(only);
            return NFA { fa };
        }

        let mut current = fa.insert_node(&format!("{}0", symbols));
        fa.set_start(current);
        for (i, c) in symbols.chars().enumerate() {
            let next = fa.insert_node(&format!("{}{}", symbols, i + 1));
            fa.push_transition(current, Label::Symbol(c), next);
            current = next;
        }
        fa.mark_final(current);
        NFA { fa }
    }

    pub fn from_regex(expression: &str) -> Result<NFA, RegexError> {
        RegexParser::new(expression).solve()
    }

    /// Adds `from --label--> to`, creating `to` if needed. `@` converts to an
    /// epsilon label. An identical transition is kept only once.
    pub fn add_transition(
        &mut self,
        from: &str,
        label: impl Into<Label>,
        to: &str,
    ) -> Result<(), AutomatonError> {
        let label = label.into();
        let source = self
            .fa
            .id_of(from)
            .ok_or_else(|| AutomatonError::UnknownSource(from.to_string()))?;
        let target = self.fa.insert_node(to);
        if !self.fa.push_transition(source, label, target) {
            log::debug!("skipping repeated transition `{}` --{}--> `{}`", from, label, to);
        }
        Ok(())
    }

    pub fn cursor(&self) -> Result<NFACursor<'_>, AutomatonError> {
        let start = self.fa.start_id().ok_or(AutomatonError::EmptyAutomaton)?;
        let mut current = BitSet::with_capacity(self.fa.node_count());
        current.insert(start.index());
        Ok(NFACursor { nfa: self, current })
    }

    /// Frontier simulation. Before each symbol the frontier is grown by
    /// epsilon steps until it stops changing; after the last symbol it is
    /// grown for at most as many rounds as there are nodes, stopping early on
    /// a final node or a fixpoint.
    pub fn is_member(&self, word: &str) -> Result<bool, AutomatonError> {
        let mut cursor = self.cursor()?;
        let mut previous: Option<BitSet> = None;
        let mut symbols = word.chars().peekable();

        while let Some(&c) = symbols.peek() {
            if cursor.is_out() {
                return Ok(false);
            }
            if cursor.has_epsilon_transition() && previous.as_ref() != Some(&cursor.current) {
                previous = Some(cursor.current.clone());
                cursor.epsilon_transition();
            } else {
                cursor.transition(c);
                symbols.next();
                previous = None;
                if log::log_enabled!(log::Level::Trace) {
                    let names: Vec<&str> = cursor.current().map(FANode::name).collect();
                    log::trace!("frontier after `{}`: {:?}", c, names);
                }
            }
        }

        if cursor.is_accepting() {
            return Ok(true);
        }
        if cursor.is_out() {
            return Ok(false);
        }

        for _ in 0..self.fa.node_count() {
            let before = cursor.current.clone();
            cursor.epsilon_transition();
            if cursor.current == before || cursor.is_accepting() {
                break;
            }
        }
        Ok(cursor.is_accepting())
    }

    /// Every node reachable from `set` through epsilon transitions, `set`
    /// included.
    pub fn epsilon_closure(&self, set: &BitSet) -> BitSet {
        let mut closure = set.clone();
        let mut stack: Vec<usize> = set.iter().collect();
        while let Some(i) = stack.pop() {
            for to in self.fa.node(NodeId::from_index(i)).targets(Label::Epsilon) {
                if closure.insert(to.index()) {
                    stack.push(to.index());
                }
            }
        }
        closure
    }

    fn delta(&self, set: &BitSet, symbol: char) -> BitSet {
        let mut result = BitSet::with_capacity(self.fa.node_count());
        for i in set.iter() {
            for to in self.fa.node(NodeId::from_index(i)).targets(Label::Symbol(symbol)) {
                result.insert(to.index());
            }
        }
        result
    }

    /// Subset construction. Each deterministic node stands for an epsilon
    /// closed set of nodes and is named after them, e.g. `{q0,q1}`.
    pub fn to_dfa(&self) -> Result<DFA, AutomatonError> {
        let start = self.fa.start_id().ok_or(AutomatonError::EmptyAutomaton)?;
        let alphabet = self.fa.alphabet();

        let mut fa = FA::default();
        let mut subsets: HashMap<BitSet, NodeId> = HashMap::new();
        let mut work_list: VecDeque<BitSet> = VecDeque::new();

        let mut initial = BitSet::new();
        initial.insert(start.index());
        let initial = self.epsilon_closure(&initial);
        let id = self.subset_node(&mut fa, &initial);
        fa.set_start(id);
        subsets.insert(initial.clone(), id);
        work_list.push_back(initial);

        while let Some(q) = work_list.pop_front() {
            let from = subsets[&q];
            for &c in &alphabet {
                let moved = self.delta(&q, c);
                if moved.is_empty() {
                    continue;
                }
                let t = self.epsilon_closure(&moved);
                let to = match subsets.get(&t) {
                    Some(&to) => to,
                    None => {
                        let to = self.subset_node(&mut fa, &t);
                        subsets.insert(t.clone(), to);
                        work_list.push_back(t);
                        to
                    }
                };
                fa.push_transition(from, Label::Symbol(c), to);
            }
        }

        log::debug!(
            "determinized {} nodes into {} subsets",
            self.fa.node_count(),
            subsets.len()
        );
        Ok(DFA::from_fa(fa))
    }

    fn subset_node(&self, fa: &mut FA, set: &BitSet) -> NodeId {
        let mut names: Vec<&str> = set
            .iter()
            .map(|i| self.fa.node(NodeId::from_index(i)).name())
            .collect();
        names.sort_unstable();
        let name = fa.fresh_name(&format!("{{{}}}", names.join(",")));
        let id = fa.insert_node(&name);
        if set.iter().any(|i| self.fa.is_final(NodeId::from_index(i))) {
            fa.mark_final(id);
        }
        id
    }

    /// Same graph with final and non-final nodes swapped. This is not the
    /// language complement of a nondeterministic automaton.
    pub fn complement(&self) -> NFA {
        let mut result = self.clone();
        result.fa.swap_finals();
        result
    }
}

/// Frontier of an [`NFA`] simulation. Empty means "out".
#[derive(Debug, Clone)]
pub struct NFACursor<'a> {
    nfa: &'a NFA,
    current: BitSet,
}

impl<'a> NFACursor<'a> {
    pub fn current(&self) -> impl Iterator<Item = &'a FANode> + '_ {
        let nfa = self.nfa;
        self.current.iter().map(move |i| nfa.node(NodeId::from_index(i)))
    }

    pub fn is_out(&self) -> bool {
        self.current.is_empty()
    }

    pub fn has_epsilon_transition(&self) -> bool {
        self.current
            .iter()
            .any(|i| self.nfa.node(NodeId::from_index(i)).has_epsilon_transition())
    }

    /// Adds the epsilon successors of the frontier, keeping the frontier.
    pub fn epsilon_transition(&mut self) -> &mut Self {
        let mut grown = self.current.clone();
        for i in self.current.iter() {
            for to in self.nfa.node(NodeId::from_index(i)).targets(Label::Epsilon) {
                grown.insert(to.index());
            }
        }
        self.current = grown;
        self
    }

    /// Replaces the frontier with its successors on `symbol`.
    pub fn transition(&mut self, symbol: char) -> &mut Self {
        self.current = self.nfa.delta(&self.current, symbol);
        self
    }

    pub fn is_accepting(&self) -> bool {
        self.current
            .iter()
            .any(|i| self.nfa.is_final(NodeId::from_index(i)))
    }
}
