//! Thompson-style combinators over [`NFA`]s and the product construction
//! shared with [`crate::DFA`]. Every operation works on copies: operands are
//! never modified and the result shares no nodes with them.
//!
//! All operations expect operands with a start node and panic otherwise.

use std::collections::HashMap;

use crate::fa::{Label, NodeId, FA};
use crate::nfa::NFA;

fn start_of(fa: &FA, operation: &str) -> NodeId {
    match fa.start_id() {
        Some(start) => start,
        None => panic!("operand of {} has no start node", operation),
    }
}

/// Renames every node of `second` with the smallest suffix `#k` that makes
/// its names disjoint from `first`'s. Leaves `second` alone when the names
/// are already disjoint.
pub(crate) fn make_unique(first: &FA, second: &mut FA) {
    if second.names().all(|name| !first.contains(name)) {
        return;
    }
    let mut k = 1usize;
    loop {
        let suffix = format!("#{}", k);
        if second
            .names()
            .all(|name| !first.contains(&format!("{}{}", name, suffix)))
        {
            log::debug!("renaming {} nodes with suffix `{}`", second.node_count(), suffix);
            second.rename_with_suffix(&suffix);
            return;
        }
        k += 1;
    }
}

/// Pair automaton over every (a, b) node pair, named `(a,b)`, starting at the
/// pair of starts. For each pair of transitions `a --x--> a'`, `b --y--> b'`
/// for which `rule(x, y)` gives a label, adds `(a,b) --label--> (a',b')`.
/// Finals are left to the caller.
pub(crate) fn product(
    first: &FA,
    second: &FA,
    rule: impl Fn(Label, Label) -> Option<Label>,
) -> (FA, HashMap<(NodeId, NodeId), NodeId>) {
    let first_start = start_of(first, "a product");
    let second_start = start_of(second, "a product");

    let mut fa = FA::default();
    let mut pairs = HashMap::new();
    for (a, a_node) in first.nodes_by_name() {
        for (b, b_node) in second.nodes_by_name() {
            let name = fa.fresh_name(&format!("({},{})", a_node.name(), b_node.name()));
            pairs.insert((a, b), fa.insert_node(&name));
        }
    }
    fa.set_start(pairs[&(first_start, second_start)]);

    for (a, a_node) in first.nodes_by_name() {
        for (b, b_node) in second.nodes_by_name() {
            let from = pairs[&(a, b)];
            for &(x, a_to) in a_node.transitions() {
                for &(y, b_to) in b_node.transitions() {
                    if let Some(label) = rule(x, y) {
                        fa.push_transition(from, label, pairs[&(a_to, b_to)]);
                    }
                }
            }
        }
    }
    (fa, pairs)
}

impl NFA {
    /// Fresh start node with epsilon transitions to the first operand's start,
    /// then to the second's.
    pub fn union(first: &NFA, second: &NFA) -> NFA {
        let first_start = start_of(first, "a union");
        start_of(second, "a union");

        let mut fa = FA::default();
        let remap = fa.graft(first);
        let first_start = remap[first_start.index()];
        for &f in first.final_ids() {
            fa.mark_final(remap[f.index()]);
        }

        let mut other: FA = (**second).clone();
        make_unique(&fa, &mut other);
        let second_start = start_of(&other, "a union");
        let remap = fa.graft(&other);
        for &f in other.final_ids() {
            fa.mark_final(remap[f.index()]);
        }

        let start_name = fa.fresh_name("union");
        let start = fa.insert_node(&start_name);
        fa.push_transition(start, Label::Epsilon, first_start);
        fa.push_transition(start, Label::Epsilon, remap[second_start.index()]);
        fa.set_start(start);
        NFA::from_fa(fa)
    }

    /// Epsilon transitions from every final of `first` to the start of
    /// `second`; only `second`'s finals stay final.
    pub fn concatenation(first: &NFA, second: &NFA) -> NFA {
        let first_start = start_of(first, "a concatenation");
        start_of(second, "a concatenation");

        let mut fa = FA::default();
        let first_remap = fa.graft(first);
        fa.set_start(first_remap[first_start.index()]);

        let mut other: FA = (**second).clone();
        make_unique(&fa, &mut other);
        let second_start = start_of(&other, "a concatenation");
        let second_remap = fa.graft(&other);
        let joint = second_remap[second_start.index()];

        for &f in first.final_ids() {
            fa.push_transition(first_remap[f.index()], Label::Epsilon, joint);
        }
        for &f in other.final_ids() {
            fa.mark_final(second_remap[f.index()]);
        }
        NFA::from_fa(fa)
    }

    /// Epsilon transitions from every final back to the start, which becomes
    /// final as well.
    pub fn kleene_star(automaton: &NFA) -> NFA {
        start_of(automaton, "a kleene star");
        let mut result = automaton.clone();
        let start = start_of(&result, "a kleene star");
        let finals: Vec<NodeId> = result.final_ids().to_vec();
        for f in finals {
            result.push_transition(f, Label::Epsilon, start);
        }
        result.mark_final(start);
        result
    }

    /// Product of the two operands. A pair of transitions yields a product
    /// transition when either label is epsilon or both are the same symbol,
    /// and the product transition carries the first operand's label.
    pub fn intersection(first: &NFA, second: &NFA) -> NFA {
        let first_copy: FA = (**first).clone();
        let mut second_copy: FA = (**second).clone();
        make_unique(&first_copy, &mut second_copy);

        let (mut fa, pairs) = product(&first_copy, &second_copy, |x, y| x.meets(y).then_some(x));
        for &a in first_copy.final_ids() {
            for &b in second_copy.final_ids() {
                fa.mark_final(pairs[&(a, b)]);
            }
        }
        NFA::from_fa(fa)
    }
}
