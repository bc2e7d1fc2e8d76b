//! Regular expression extraction from a [`DFA`].
//!
//! The walk is breadth first from the start node, carrying the word read so
//! far. Every node collects the words that lead to it. When a transition
//! closes a cycle (its target was already visited and can reach back to the
//! current node), the cycle is folded into a starred group and the new words
//! are pushed forward to everything reachable from the two nodes involved.
//!
//! The result is exact for tree shaped automata and for simple cycles. On
//! automata where a node is entered through several different paths it may
//! describe a different language.

use std::collections::{HashMap, HashSet, VecDeque};

use bit_set::BitSet;

use crate::dfa::DFA;
use crate::fa::{AutomatonError, NodeId};

pub struct RegexExtractor {
    dfa: DFA,
    queue: VecDeque<(String, NodeId)>,
    visited: HashSet<NodeId>,
    languages: HashMap<NodeId, Vec<String>>,
    back_paths: HashMap<(NodeId, NodeId), Vec<String>>,
}

impl RegexExtractor {
    pub fn new(dfa: &DFA) -> Result<RegexExtractor, AutomatonError> {
        // the walk order depends on adjacency order, so work on a rebuilt copy
        let dfa = dfa.clone();
        let start = dfa.start_id().ok_or(AutomatonError::EmptyAutomaton)?;
        Ok(RegexExtractor {
            dfa,
            queue: VecDeque::from([(String::new(), start)]),
            visited: HashSet::new(),
            languages: HashMap::new(),
            back_paths: HashMap::new(),
        })
    }

    pub fn extract(mut self) -> String {
        while let Some((word, node)) = self.queue.pop_front() {
            self.visit(node, &word);
        }

        let start = self.dfa.start_id();
        let mut groups = Vec::new();
        for &f in self.dfa.final_ids() {
            let mut atoms = self.languages.remove(&f).unwrap_or_default();
            if Some(f) == start {
                atoms.insert(0, "@".to_string());
            }
            if atoms.is_empty() {
                log::debug!("final `{}` is unreachable, skipped", self.dfa.node(f).name());
                continue;
            }
            groups.push(alternatives(&atoms));
        }
        groups.join("+")
    }

    fn visit(&mut self, node: NodeId, word: &str) {
        let transitions: Vec<(char, NodeId)> = self
            .dfa
            .outgoing(node)
            .iter()
            .filter_map(|(label, to)| label.symbol().map(|c| (c, *to)))
            .collect();

        for (symbol, target) in transitions {
            let extended = format!("{}{}", word, symbol);
            if self.visited.insert(target) {
                self.queue.push_back((extended.clone(), target));
                self.language_of(target).push(extended);
                continue;
            }

            let paths = self.paths_between(target, node);
            if paths.is_empty() {
                self.language_of(target).push(extended);
                continue;
            }

            let cycle = if paths.len() == 1 {
                paths[0].clone()
            } else {
                alternatives(&paths)
            };
            let mut excluded = HashSet::from([node, target]);
            self.language_of(node)
                .push(format!("({}({}{})*)", word, symbol, cycle));
            self.propagate(node, &mut excluded);
            self.language_of(target)
                .push(format!("({}({}{})*{})", word, symbol, cycle, symbol));
            self.propagate(target, &mut excluded);
        }
    }

    /// Extends the latest word of `node` along every transition into nodes
    /// not yet touched by this propagation.
    fn propagate(&mut self, node: NodeId, excluded: &mut HashSet<NodeId>) {
        let latest = match self.languages.get(&node).and_then(|words| words.last()) {
            Some(latest) => latest.clone(),
            None => return,
        };
        let transitions: Vec<(char, NodeId)> = self
            .dfa
            .outgoing(node)
            .iter()
            .filter_map(|(label, to)| label.symbol().map(|c| (c, *to)))
            .collect();

        for (symbol, next) in transitions {
            if !excluded.insert(next) {
                continue;
            }
            self.language_of(next).push(format!("{}{}", latest, symbol));
            self.propagate(next, excluded);
        }
    }

    fn language_of(&mut self, node: NodeId) -> &mut Vec<String> {
        self.languages.entry(node).or_default()
    }

    /// Words spelled by the simple paths from `from` to `to`. A node reaches
    /// itself by the empty word.
    fn paths_between(&mut self, from: NodeId, to: NodeId) -> Vec<String> {
        if let Some(paths) = self.back_paths.get(&(from, to)) {
            return paths.clone();
        }
        let mut paths = Vec::new();
        let mut on_path = BitSet::with_capacity(self.dfa.node_count());
        let mut prefix = String::new();
        self.collect_paths(from, to, &mut on_path, &mut prefix, &mut paths);
        self.back_paths.insert((from, to), paths.clone());
        paths
    }

    fn collect_paths(
        &self,
        current: NodeId,
        goal: NodeId,
        on_path: &mut BitSet,
        prefix: &mut String,
        paths: &mut Vec<String>,
    ) {
        if current == goal {
            paths.push(prefix.clone());
            return;
        }
        if prefix.chars().count() >= self.dfa.node_count() {
            return;
        }
        on_path.insert(current.index());
        for (label, next) in self.dfa.outgoing(current) {
            let Some(symbol) = label.symbol() else {
                continue;
            };
            if on_path.contains(next.index()) {
                continue;
            }
            prefix.push(symbol);
            self.collect_paths(*next, goal, on_path, prefix, paths);
            prefix.pop();
        }
        on_path.remove(current.index());
    }
}

fn alternatives(words: &[String]) -> String {
    format!("({})", words.join("+"))
}

/// Regular expression for the language of `dfa`, in the syntax accepted by
/// [`crate::regex::RegexParser`]. An automaton whose finals are all
/// unreachable gives the empty string.
pub fn extract_regex(dfa: &DFA) -> Result<String, AutomatonError> {
    Ok(RegexExtractor::new(dfa)?.extract())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_of_two() -> DFA {
        let mut dfa = DFA::new();
        dfa.add_start("s").unwrap();
        dfa.add_transition("s", 'a', "t").unwrap();
        dfa.add_transition("t", 'b', "s").unwrap();
        dfa.add_final("t").unwrap();
        dfa
    }

    #[test]
    fn single_word() {
        let mut dfa = DFA::new();
        dfa.add_start("0").unwrap();
        dfa.add_transition("0", 'a', "1").unwrap();
        dfa.add_transition("1", 'b', "2").unwrap();
        dfa.add_final("2").unwrap();
        assert_eq!(extract_regex(&dfa).unwrap(), "(ab)");
    }

    #[test]
    fn start_final_gets_epsilon() {
        let mut dfa = DFA::new();
        dfa.add_start("0").unwrap();
        dfa.add_transition("0", 'a', "1").unwrap();
        dfa.add_final("0").unwrap();
        dfa.add_final("1").unwrap();
        assert_eq!(extract_regex(&dfa).unwrap(), "(@)+(a)");
    }

    #[test]
    fn unreachable_finals_give_nothing() {
        let mut dfa = DFA::new();
        dfa.add_start("0").unwrap();
        assert_eq!(extract_regex(&dfa).unwrap(), "");
        assert_eq!(extract_regex(&DFA::new()), Err(AutomatonError::EmptyAutomaton));
    }

    #[test]
    fn back_paths() {
        let dfa = cycle_of_two();
        let mut extractor = RegexExtractor::new(&dfa).unwrap();
        let s = extractor.dfa.id_of("s").unwrap();
        let t = extractor.dfa.id_of("t").unwrap();
        assert_eq!(extractor.paths_between(t, s), vec!["b".to_string()]);
        assert_eq!(extractor.paths_between(s, s), vec![String::new()]);
        assert_eq!(extractor.back_paths.len(), 2);
    }

    #[test]
    fn two_cycle_language() {
        let dfa = cycle_of_two();
        let regex = extract_regex(&dfa).unwrap();
        let nfa = crate::regex::parse_regex(&regex).unwrap();
        for word in ["", "a", "ab", "aba", "ababa", "abab", "b", "aa"] {
            assert_eq!(nfa.is_member(word), dfa.is_member(word), "word {:?} in {}", word, regex);
        }
    }

    /// Multiples of three in binary, `a` for 0 and `b` for 1. Every node sits
    /// on several cycles, so only part of the language is recovered: each
    /// extracted word is accepted, but `bba` (six) is missed.
    #[test]
    fn overlapping_cycles_lose_words() {
        let mut dfa = DFA::new();
        dfa.add_start("A").unwrap();
        for (from, symbol, to) in [
            ("A", 'a', "A"),
            ("A", 'b', "B"),
            ("B", 'a', "C"),
            ("B", 'b', "A"),
            ("C", 'b', "C"),
            ("C", 'a', "B"),
        ] {
            dfa.add_transition(from, symbol, to).unwrap();
        }
        dfa.add_final("A").unwrap();

        let regex = extract_regex(&dfa).unwrap();
        assert!(regex.starts_with("(@+a+(a(a)*)+"), "{}", regex);
        let nfa = crate::regex::parse_regex(&regex).unwrap();
        assert_eq!(dfa.is_member("bba"), Ok(true));
        assert_eq!(nfa.is_member("bba"), Ok(false));
        for word in ["", "a", "aa", "abb", "bb", "bbbb", "baab", "babab"] {
            assert_eq!(dfa.is_member(word), Ok(true), "word {:?}", word);
            assert_eq!(nfa.is_member(word), Ok(true), "word {:?} in {}", word, regex);
        }
    }
}
