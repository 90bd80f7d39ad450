use crate::block::{BasicBlock, BlockId};
use crate::instructions::Instruction;
use crate::values::InstId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    pub insts: Vec<Instruction>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            blocks: IndexMap::new(),
            insts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.insts.get(id.index())
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.values().next()
    }

    /// The block the backward analyses start from.
    pub fn exit_block(&self) -> Option<&BasicBlock> {
        self.blocks.values().last()
    }

    pub fn block_by_label(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.values().find(|block| block.label == label)
    }

    /// Instructions in block order, the order dataflow indices are assigned in.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks
            .values()
            .flat_map(move |block| block.instructions.iter().filter_map(move |id| self.inst(*id)))
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(BasicBlock::len).sum()
    }

    pub fn find_named(&self, name: &str) -> Option<&Instruction> {
        self.insts
            .iter()
            .find(|inst| inst.name.as_deref() == Some(name))
    }

    /// Rebuilds predecessor and successor lists from the terminators.
    pub fn compute_cfg(&mut self) {
        let mut edges: Vec<(BlockId, BlockId)> = Vec::new();

        for block in self.blocks.values() {
            let targets = block
                .terminator()
                .and_then(|id| self.insts.get(id.index()))
                .filter(|inst| inst.is_terminator())
                .map(|inst| inst.targets.clone())
                .unwrap_or_default();
            for target in targets {
                edges.push((block.id, target));
            }
        }

        for block in self.blocks.values_mut() {
            block.predecessors.clear();
            block.successors.clear();
        }

        for (from, to) in edges {
            if let Some(block) = self.blocks.get_mut(&from) {
                if !block.successors.contains(&to) {
                    block.successors.push(to);
                }
            }
            if let Some(block) = self.blocks.get_mut(&to) {
                if !block.predecessors.contains(&from) {
                    block.predecessors.push(from);
                }
            }
        }
    }
}
