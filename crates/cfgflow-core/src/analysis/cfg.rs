//! Instruction-level control-flow graph.
//!
//! Every instruction of a function gets a dense index in `1..=N`, assigned in block order.
//! Index `0` is the virtual node sitting before the function (forward) or before the exit
//! terminator (backward). Edges are deduplicated per ordered `(source, target)` pair so loops
//! and repeated predecessor links never produce two stored values for the same flow.

use crate::block::BlockId;
use crate::function::Function;
use crate::values::InstId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Index of the virtual entry node.
pub const VIRTUAL_ENTRY: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    /// Slot of this edge in the value store.
    pub id: usize,
}

#[derive(Debug, Clone)]
pub struct CfgIndex {
    direction: Direction,
    insts: Vec<Option<InstId>>,
    index_of: HashMap<InstId, usize>,
    edges: Vec<Edge>,
    incoming: Vec<Vec<Edge>>,
    outgoing: Vec<Vec<Edge>>,
    existing: HashSet<(usize, usize)>,
    entry_edge: Option<usize>,
}

impl CfgIndex {
    pub fn build(function: &Function, direction: Direction) -> Self {
        let mut index = Self::assign_indices(function, direction);

        for block in function.blocks.values() {
            let Some(first) = block.first() else {
                continue;
            };

            for pred in &block.predecessors {
                if let Some(term) = function.block(*pred).and_then(|b| b.terminator()) {
                    index.add_flow(Some(term), first);
                }
            }

            let merges: Vec<InstId> = block
                .instructions
                .iter()
                .copied()
                .take_while(|id| function.inst(*id).map(|i| i.is_merge()).unwrap_or(false))
                .collect();

            for pair in merges.windows(2) {
                index.add_flow(Some(pair[0]), pair[1]);
            }
            if let (Some(last_merge), Some(first_non_merge)) =
                (merges.last(), block.instructions.get(merges.len()))
            {
                index.add_flow(Some(*last_merge), *first_non_merge);
            }

            for pair in block.instructions[merges.len()..].windows(2) {
                let is_terminator = function
                    .inst(pair[0])
                    .map(|i| i.is_terminator())
                    .unwrap_or(false);
                if !is_terminator {
                    index.add_flow(Some(pair[0]), pair[1]);
                }
            }

            if let Some(term) = block.terminator() {
                for succ in &block.successors {
                    if let Some(next) = function.block(*succ).and_then(|b| b.first()) {
                        index.add_flow(Some(term), next);
                    }
                }
            }
        }

        let entry = match direction {
            Direction::Forward => function.entry_block().and_then(|b| b.first()),
            Direction::Backward => function.exit_block().and_then(|b| b.terminator()),
        };
        if let Some(entry) = entry {
            index.entry_edge = index.add_edge(None, Some(entry));
        }

        index
    }

    fn assign_indices(function: &Function, direction: Direction) -> Self {
        let mut insts = vec![None];
        let mut index_of = HashMap::new();

        for inst in function.instructions() {
            index_of.insert(inst.id, insts.len());
            insts.push(Some(inst.id));
        }

        let nodes = insts.len();
        Self {
            direction,
            insts,
            index_of,
            edges: Vec::new(),
            incoming: vec![Vec::new(); nodes],
            outgoing: vec![Vec::new(); nodes],
            existing: HashSet::new(),
            entry_edge: None,
        }
    }

    /// Adds the edge for a forward control transfer `from -> to`, reversed in backward mode.
    fn add_flow(&mut self, from: Option<InstId>, to: InstId) {
        match self.direction {
            Direction::Forward => {
                self.add_edge(from, Some(to));
            }
            Direction::Backward => {
                self.add_edge(Some(to), from);
            }
        }
    }

    fn add_edge(&mut self, source: Option<InstId>, target: Option<InstId>) -> Option<usize> {
        let source = match source {
            Some(id) => *self.index_of.get(&id)?,
            None => VIRTUAL_ENTRY,
        };
        let target = match target {
            Some(id) => *self.index_of.get(&id)?,
            None => VIRTUAL_ENTRY,
        };

        if !self.existing.insert((source, target)) {
            return None;
        }

        let edge = Edge {
            source,
            target,
            id: self.edges.len(),
        };
        self.edges.push(edge);
        self.incoming[target].push(edge);
        self.outgoing[source].push(edge);
        Some(edge.id)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of nodes including the virtual entry.
    pub fn node_count(&self) -> usize {
        self.insts.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entry_edge(&self) -> Option<usize> {
        self.entry_edge
    }

    pub fn index_of(&self, id: InstId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub fn inst_at(&self, index: usize) -> Option<InstId> {
        self.insts.get(index).copied().flatten()
    }

    pub fn incoming(&self, index: usize) -> &[Edge] {
        self.incoming.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outgoing(&self, index: usize) -> &[Edge] {
        self.outgoing.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_between(&self, source: usize, target: usize) -> Option<Edge> {
        self.outgoing(source)
            .iter()
            .copied()
            .find(|edge| edge.target == target)
    }

    pub fn block_of(&self, function: &Function, index: usize) -> Option<BlockId> {
        self.inst_at(index)
            .and_then(|id| function.inst(id))
            .map(|inst| inst.block)
    }
}
