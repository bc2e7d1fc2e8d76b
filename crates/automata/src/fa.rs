use std::collections::BTreeMap;
use std::fmt;

use automata_util::make_type_idx;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

/// Written in place of a symbol to mean "no input" (an epsilon transition).
pub const EPSILON_CHAR: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Epsilon,
    Symbol(char),
}

impl Label {
    pub fn symbol(self) -> Option<char> {
        match self {
            Label::Epsilon => None,
            Label::Symbol(c) => Some(c),
        }
    }

    pub fn is_epsilon(self) -> bool {
        matches!(self, Label::Epsilon)
    }

    /// Label compatibility used by the nondeterministic product: an epsilon
    /// on either side pairs with any label on the other side, two symbols
    /// pair only when equal.
    pub fn meets(self, other: Label) -> bool {
        match (self, other) {
            (Label::Epsilon, _) | (_, Label::Epsilon) => true,
            (Label::Symbol(a), Label::Symbol(b)) => a == b,
        }
    }
}

impl From<char> for Label {
    fn from(c: char) -> Self {
        if c == EPSILON_CHAR {
            Label::Epsilon
        } else {
            Label::Symbol(c)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Epsilon => write!(f, "epsilon"),
            Label::Symbol(c) => write!(f, "{}", c),
        }
    }
}

// pointer-based graphs in safe rust are somewhat tricky, so nodes live in an
// arena owned by the automaton and point at each other through `NodeId`s
#[derive(Debug, Clone)]
pub struct FANode {
    name: String,
    transitions: Vec<(Label, NodeId)>,
}

make_type_idx!(pub NodeId, FANode);

impl FANode {
    fn new(name: &str) -> FANode {
        FANode {
            name: name.to_string(),
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Outgoing transitions in the order they were added.
    pub fn transitions(&self) -> &[(Label, NodeId)] {
        &self.transitions
    }

    pub fn targets(&self, label: Label) -> impl Iterator<Item = NodeId> + '_ {
        self.transitions
            .iter()
            .filter(move |(l, _)| *l == label)
            .map(|(_, to)| *to)
    }

    pub fn has_epsilon_transition(&self) -> bool {
        self.transitions.iter().any(|(l, _)| l.is_epsilon())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("automaton already starts at `{0}`")]
    AlreadyInitialized(String),
    #[error("no node named `{0}` to leave from")]
    UnknownSource(String),
    #[error("no node named `{0}` to mark as final")]
    UnknownFinal(String),
    #[error("`{from}` already moves to `{existing}` on `{symbol}`, transition to `{rejected}` dropped")]
    DeterminismViolation {
        from: String,
        symbol: char,
        existing: String,
        rejected: String,
    },
    #[error("epsilon transition from `{0}` is not allowed in a deterministic automaton")]
    EpsilonInDeterministic(String),
    #[error("automaton has no start node")]
    EmptyAutomaton,
}

impl AutomatonError {
    /// Recoverable errors only drop the offending instruction; the others
    /// abort the build sequence or the query that raised them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            AutomatonError::AlreadyInitialized(_) | AutomatonError::EmptyAutomaton
        )
    }
}

/// Node registry, start node and final set shared by both automaton variants.
///
/// The registry exclusively owns its nodes. Names are unique and map to arena
/// slots; iteration "by name" follows the sorted order of the names. Cloning
/// rebuilds the whole arena from an adjacency view, so a copy never shares
/// anything with its source and its transitions come out grouped by target.
#[derive(Debug, Default)]
pub struct FA {
    nodes: Vec<FANode>,
    names: BTreeMap<String, NodeId>,
    start: Option<NodeId>,
    finals: Vec<NodeId>,
}

impl Clone for FA {
    fn clone(&self) -> Self {
        let mut copy = FA::default();
        let remap = copy.graft(self);
        copy.start = self.start.map(|id| remap[id.index()]);
        copy.finals = self.finals.iter().map(|id| remap[id.index()]).collect();
        copy
    }
}

impl FA {
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn start_id(&self) -> Option<NodeId> {
        self.start
    }

    pub fn start(&self) -> Option<&FANode> {
        self.start.map(|id| &self.nodes[id])
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&FANode> {
        self.id_of(name).map(|id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> &FANode {
        &self.nodes[id]
    }

    pub fn outgoing(&self, id: NodeId) -> &[(Label, NodeId)] {
        self.nodes[id].transitions()
    }

    /// Nodes in name order.
    pub fn nodes_by_name(&self) -> impl Iterator<Item = (NodeId, &FANode)> + '_ {
        self.names.values().map(move |&id| (id, &self.nodes[id]))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.keys().map(String::as_str)
    }

    /// Final nodes in the order they were marked.
    pub fn final_ids(&self) -> &[NodeId] {
        &self.finals
    }

    pub fn finals(&self) -> impl Iterator<Item = &FANode> + '_ {
        self.finals.iter().map(move |&id| &self.nodes[id])
    }

    pub fn is_final(&self, id: NodeId) -> bool {
        self.finals.contains(&id)
    }

    pub fn add_start(&mut self, name: &str) -> Result<(), AutomatonError> {
        if let Some(start) = self.start {
            return Err(AutomatonError::AlreadyInitialized(
                self.nodes[start].name.clone(),
            ));
        }
        let id = self.insert_node(name);
        self.start = Some(id);
        Ok(())
    }

    pub fn add_final(&mut self, name: &str) -> Result<(), AutomatonError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| AutomatonError::UnknownFinal(name.to_string()))?;
        self.mark_final(id);
        Ok(())
    }

    /// Symbols used on any transition, epsilon excluded.
    pub fn alphabet(&self) -> std::collections::BTreeSet<char> {
        self.nodes
            .iter()
            .flat_map(|node| node.transitions.iter().filter_map(|(l, _)| l.symbol()))
            .collect()
    }

    /// Graph view for rendering with `petgraph::dot`. Node weights carry the
    /// name, marked with `->` for the start and `*` for finals.
    pub fn to_graph(&self) -> DiGraph<String, String> {
        let mut graph = DiGraph::new();
        let mut indices: Vec<NodeIndex> = vec![NodeIndex::end(); self.nodes.len()];
        for (id, node) in self.nodes_by_name() {
            let mut weight = node.name.clone();
            if self.start == Some(id) {
                weight = format!("-> {}", weight);
            }
            if self.is_final(id) {
                weight.push('*');
            }
            indices[id.index()] = graph.add_node(weight);
        }
        for (id, node) in self.nodes_by_name() {
            for (label, to) in &node.transitions {
                graph.add_edge(indices[id.index()], indices[to.index()], label.to_string());
            }
        }
        graph
    }

    pub(crate) fn insert_node(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.id_of(name) {
            return id;
        }
        let id = NodeId::from_push(&mut self.nodes, FANode::new(name));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Returns false when the identical transition already exists.
    pub(crate) fn push_transition(&mut self, from: NodeId, label: Label, to: NodeId) -> bool {
        let node = &mut self.nodes[from];
        if node.transitions.contains(&(label, to)) {
            return false;
        }
        node.transitions.push((label, to));
        true
    }

    pub(crate) fn set_start(&mut self, id: NodeId) {
        self.start = Some(id);
    }

    pub(crate) fn mark_final(&mut self, id: NodeId) {
        if !self.finals.contains(&id) {
            self.finals.push(id);
        }
    }

    pub(crate) fn swap_finals(&mut self) {
        let complement: Vec<NodeId> = self
            .names
            .values()
            .copied()
            .filter(|id| !self.finals.contains(id))
            .collect();
        self.finals = complement;
    }

    /// Copies every node and transition of `other` into this registry, going
    /// node by node in name order and, per node, target by target in name
    /// order. Nodes already present under the same name are reused. Returns
    /// the mapping from `other`'s ids to ids in `self`.
    pub(crate) fn graft(&mut self, other: &FA) -> Vec<NodeId> {
        let mut remap = vec![NodeId::from_index(0); other.nodes.len()];
        for (name, &id) in &other.names {
            remap[id.index()] = self.insert_node(name);
        }

        for &from in other.names.values() {
            let mut adjacency = other.nodes[from].transitions.clone();
            // stable, so labels towards the same target keep their order
            adjacency.sort_by(|a, b| other.nodes[a.1].name.cmp(&other.nodes[b.1].name));
            for (label, to) in adjacency {
                if !self.push_transition(remap[from.index()], label, remap[to.index()]) {
                    log::warn!(
                        "graft: `{}` already had ({}, `{}`)",
                        other.nodes[from].name,
                        label,
                        other.nodes[to].name
                    );
                }
            }
        }
        remap
    }

    /// Appends `suffix` to every node name.
    pub(crate) fn rename_with_suffix(&mut self, suffix: &str) {
        for node in self.nodes.iter_mut() {
            node.name.push_str(suffix);
        }
        self.names = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.name.clone(), NodeId::from_index(i)))
            .collect();
    }

    /// `base`, primed until no node carries that name.
    pub(crate) fn fresh_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        while self.contains(&name) {
            name.push('\'');
        }
        name
    }
}

impl fmt::Display for FA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start() {
            Some(start) => writeln!(f, "Start: {}", start.name)?,
            None => writeln!(f, "Start: none")?,
        }
        for (_, node) in self.nodes_by_name() {
            write!(f, "{}", node.name)?;
            for (label, to) in &node.transitions {
                write!(f, " ({}, {})", label, self.nodes[*to].name)?;
            }
            writeln!(f)?;
        }
        write!(f, "Finals:")?;
        for node in self.finals() {
            write!(f, " {}", node.name)?;
        }
        writeln!(f)
    }
}
