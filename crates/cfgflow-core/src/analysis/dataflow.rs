//! Worklist fixpoint engine.
//!
//! An analysis supplies a lattice and a transfer function; the solver owns the edge store and
//! only ever replaces a stored value with `join(old, new)`. Termination relies on the lattice
//! having finite height over the instruction-index domain. There is no widening.

use super::cfg::{CfgIndex, Direction, Edge};
use crate::block::BlockId;
use crate::function::Function;
use crate::instructions::Instruction;
use crate::values::Operand;
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

/// A dataflow fact domain.
///
/// `join` must be commutative, associative and have `bottom()` as its identity. Equality is the
/// structural `Eq` of the value.
pub trait Lattice: Clone + Eq + fmt::Debug + fmt::Display + Serialize {
    fn bottom() -> Self;

    fn join(&self, other: &Self) -> Self;

    /// Partial order induced by `join`.
    fn leq(&self, other: &Self) -> bool {
        &self.join(other) == other
    }
}

pub trait DataflowAnalysis {
    type Info: Lattice;

    const DIRECTION: Direction;

    fn name(&self) -> &'static str;

    /// Value stored on the virtual entry edge before iteration starts.
    fn initial_state(&self) -> Self::Info {
        Self::Info::bottom()
    }

    /// Computes one value per edge in `outs`, in the same order.
    ///
    /// Must be a pure function of its arguments; the solver decides what gets stored.
    fn transfer(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        index: usize,
        input: &Self::Info,
        outs: &[Edge],
    ) -> Result<Vec<Self::Info>>;
}

/// Read-only view of the function and its index handed to transfer functions.
pub struct FlowContext<'a> {
    function: &'a Function,
    index: &'a CfgIndex,
}

impl<'a> FlowContext<'a> {
    pub fn new(function: &'a Function, index: &'a CfgIndex) -> Self {
        Self { function, index }
    }

    pub fn function(&self) -> &'a Function {
        self.function
    }

    pub fn index(&self) -> &'a CfgIndex {
        self.index
    }

    pub fn instruction_at(&self, index: usize) -> Option<&'a Instruction> {
        self.index
            .inst_at(index)
            .and_then(|id| self.function.inst(id))
    }

    pub fn block_of(&self, index: usize) -> Option<BlockId> {
        self.index.block_of(self.function, index)
    }

    /// Resolves an operand to its instruction index.
    ///
    /// Untracked operands yield `None`. An instruction reference that is missing from the
    /// index means the input is malformed.
    pub fn tracked(&self, operand: &Operand) -> Result<Option<usize>> {
        match operand.as_inst() {
            Some(id) => self
                .index
                .index_of(id)
                .map(Some)
                .ok_or_else(|| self.malformed(format!("operand {} is not a placed instruction", id))),
            None => Ok(None),
        }
    }

    pub fn operand<'i>(&self, inst: &'i Instruction, position: usize) -> Result<&'i Operand> {
        inst.operand(position).ok_or_else(|| {
            self.malformed(format!(
                "{} {} has no operand {}",
                inst.opcode, inst.id, position
            ))
        })
    }

    pub fn index_of_inst(&self, inst: &Instruction) -> Result<usize> {
        self.index
            .index_of(inst.id)
            .ok_or_else(|| self.malformed(format!("instruction {} has no index", inst.id)))
    }

    /// The leading merge-instructions of `block` with their indices.
    pub fn merge_group(&self, block: BlockId) -> Result<Vec<(usize, &'a Instruction)>> {
        let block = self
            .function
            .block(block)
            .ok_or_else(|| self.malformed(format!("unknown block {}", block)))?;

        let mut group = Vec::new();
        for id in &block.instructions {
            let inst = self
                .function
                .inst(*id)
                .ok_or_else(|| self.malformed(format!("unknown instruction {}", id)))?;
            if !inst.is_merge() || inst.is_terminator() {
                break;
            }
            group.push((self.index_of_inst(inst)?, inst));
        }
        Ok(group)
    }

    /// Whether `inst` is the first merge-instruction of its block. The group is processed there.
    pub fn is_group_head(&self, inst: &Instruction) -> Result<bool> {
        if !inst.is_merge() {
            return Ok(false);
        }
        let block = self
            .function
            .block(inst.block)
            .ok_or_else(|| self.malformed(format!("unknown block {}", inst.block)))?;
        Ok(block.first() == Some(inst.id))
    }

    pub fn malformed(&self, message: impl Into<String>) -> IrError {
        IrError::MalformedInput {
            function: self.function.name.clone(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    pub order: WorklistOrder,
    /// Keep every value each edge held during the run.
    pub record_history: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolverPhase {
    Building,
    Iterating,
    Converged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Transfer function applications.
    pub visits: usize,
    /// Stored edge values that changed.
    pub updates: usize,
}

pub struct Solver {
    config: SolverConfig,
    phase: SolverPhase,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            phase: SolverPhase::Building,
        }
    }

    fn enter(&mut self, phase: SolverPhase, function: &Function) {
        debug_assert!(phase >= self.phase, "solver phases only move forward");
        debug!(function = %function.name, from = ?self.phase, to = ?phase, "solver phase");
        self.phase = phase;
    }

    /// Runs one analysis over one function. The solver is consumed, so a run can never go back
    /// to building once it has started.
    pub fn solve<A: DataflowAnalysis>(
        mut self,
        analysis: &A,
        function: &Function,
    ) -> Result<Solution<A::Info>> {
        debug!(analysis = analysis.name(), function = %function.name, "building cfg index");
        let index = CfgIndex::build(function, A::DIRECTION);

        let mut values = vec![A::Info::bottom(); index.edge_count()];
        if let Some(entry) = index.entry_edge() {
            values[entry] = analysis.initial_state();
        }
        let mut history = self
            .config
            .record_history
            .then(|| values.iter().cloned().map(|v| vec![v]).collect::<Vec<_>>());

        self.enter(SolverPhase::Iterating, function);

        let mut stats = SolveStats::default();
        let mut worklist: VecDeque<usize> = (1..index.node_count()).collect();
        let cx = FlowContext::new(function, &index);

        while let Some(node) = match self.config.order {
            WorklistOrder::Fifo => worklist.pop_front(),
            WorklistOrder::Lifo => worklist.pop_back(),
        } {
            let inst = cx
                .instruction_at(node)
                .ok_or_else(|| cx.malformed(format!("no instruction at index {}", node)))?;

            let joined = index
                .incoming(node)
                .iter()
                .fold(A::Info::bottom(), |acc, edge| acc.join(&values[edge.id]));

            let outs = index.outgoing(node);
            let produced = analysis.transfer(&cx, inst, node, &joined, outs)?;
            stats.visits += 1;

            if produced.len() != outs.len() {
                return Err(cx.malformed(format!(
                    "{} produced {} values for {} outgoing edges at index {}",
                    analysis.name(),
                    produced.len(),
                    outs.len(),
                    node
                )));
            }

            for (edge, value) in outs.iter().zip(produced) {
                let updated = values[edge.id].join(&value);
                if updated != values[edge.id] {
                    trace!(source = edge.source, target = edge.target, value = %updated, "edge updated");
                    if let Some(history) = history.as_mut() {
                        history[edge.id].push(updated.clone());
                    }
                    values[edge.id] = updated;
                    stats.updates += 1;
                    worklist.push_back(edge.target);
                }
            }
        }

        self.enter(SolverPhase::Converged, function);
        debug!(
            analysis = analysis.name(),
            function = %function.name,
            visits = stats.visits,
            updates = stats.updates,
            "converged"
        );

        Ok(Solution {
            function: function.name.clone(),
            direction: A::DIRECTION,
            index,
            values,
            history,
            stats,
        })
    }
}

/// Solves `analysis` over `function` with the default configuration.
pub fn solve<A: DataflowAnalysis>(analysis: &A, function: &Function) -> Result<Solution<A::Info>> {
    Solver::new(SolverConfig::default()).solve(analysis, function)
}

/// The converged edge store of one run.
#[derive(Debug, Clone)]
pub struct Solution<I> {
    function: String,
    direction: Direction,
    index: CfgIndex,
    values: Vec<I>,
    history: Option<Vec<Vec<I>>>,
    stats: SolveStats,
}

impl<I: Lattice> Solution<I> {
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn index(&self) -> &CfgIndex {
        &self.index
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    pub fn value(&self, edge: Edge) -> &I {
        &self.values[edge.id]
    }

    pub fn values(&self) -> &[I] {
        &self.values
    }

    /// Value on the edge from `source` to `target`, if that edge exists.
    pub fn edge_value(&self, source: usize, target: usize) -> Option<&I> {
        self.index
            .edge_between(source, target)
            .map(|edge| &self.values[edge.id])
    }

    /// Successive values of every edge, when the solver recorded them.
    pub fn history(&self) -> Option<&[Vec<I>]> {
        self.history.as_deref()
    }

    /// `(edge, value)` rows ordered by source index, then edge creation order.
    pub fn facts(&self) -> impl Iterator<Item = (Edge, &I)> + '_ {
        (0..self.index.node_count()).flat_map(move |node| {
            self.index
                .outgoing(node)
                .iter()
                .map(move |edge| (*edge, &self.values[edge.id]))
        })
    }

    /// Re-applies every transfer function to the stored values and reports whether any edge
    /// would still change.
    pub fn verify_fixpoint<A>(&self, analysis: &A, function: &Function) -> Result<bool>
    where
        A: DataflowAnalysis<Info = I>,
    {
        let cx = FlowContext::new(function, &self.index);

        for node in 1..self.index.node_count() {
            let Some(inst) = cx.instruction_at(node) else {
                continue;
            };
            let joined = self
                .index
                .incoming(node)
                .iter()
                .fold(I::bottom(), |acc, edge| acc.join(&self.values[edge.id]));
            let outs = self.index.outgoing(node);
            let produced = analysis.transfer(&cx, inst, node, &joined, outs)?;

            for (edge, value) in outs.iter().zip(produced.iter()) {
                if self.values[edge.id].join(value) != self.values[edge.id] {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

impl<I: Lattice> fmt::Display for Solution<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (edge, value) in self.facts() {
            writeln!(f, "Edge {}->Edge {}:{}", edge.source, edge.target, value)?;
        }
        Ok(())
    }
}

