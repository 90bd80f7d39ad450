/*! Opcode counting.
 *
 * Static counts come straight from the IR. The dynamic counters are the runtime side of the
 * block-histogram and branch-bias instrumentation: an instrumented program feeds them while it
 * runs and asks them to print, which also resets them. Each counter is an owned value, so a
 * host decides how many exist and who may update them.
 */

use crate::block::BlockId;
use crate::function::Function;
use crate::instructions::Opcode;
use crate::module::Module;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Opcode name to number of occurrences in `function`.
pub fn count_static(function: &Function) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for inst in function.instructions() {
        *counts.entry(inst.opcode.name()).or_insert(0) += 1;
    }
    counts
}

pub fn count_static_module(module: &Module) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for function in module.functions.values() {
        for (name, count) in count_static(function) {
            *counts.entry(name).or_insert(0) += count;
        }
    }
    counts
}

/// `(opcode, count)` pairs for one block, the argument an instrumented block passes to
/// [`InstrCounter::update`] on entry.
pub fn block_histogram(function: &Function, block: BlockId) -> Vec<(Opcode, u64)> {
    let mut counts: BTreeMap<Opcode, u64> = BTreeMap::new();
    if let Some(block) = function.block(block) {
        for inst in block.instructions.iter().filter_map(|id| function.inst(*id)) {
            *counts.entry(inst.opcode).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}

/// Dynamic opcode counts, accumulated until printed.
#[derive(Debug, Clone, Default)]
pub struct InstrCounter {
    counts: BTreeMap<Opcode, u64>,
}

impl InstrCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, pairs: &[(Opcode, u64)]) {
        for (opcode, count) in pairs {
            *self.counts.entry(*opcode).or_insert(0) += count;
        }
    }

    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts.get(&opcode).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Writes one `name\tcount` line per opcode seen, then clears every count.
    pub fn print_and_reset<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        for (opcode, count) in &self.counts {
            writeln!(writer, "{}\t{}", opcode.name(), count)?;
        }
        self.counts.clear();
        Ok(())
    }
}

/// Conditional branch outcomes, accumulated until printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchCounter {
    taken: u64,
    total: u64,
}

impl BranchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, taken: bool) {
        if taken {
            self.taken += 1;
        }
        self.total += 1;
    }

    pub fn taken(&self) -> u64 {
        self.taken
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn print_and_reset<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "taken\t{}", self.taken)?;
        writeln!(writer, "total\t{}", self.total)?;
        *self = Self::default();
        Ok(())
    }
}
