//! Forward reaching definitions.
//!
//! Every index names a single definition site, so a definition is never killed: a later
//! definition always has a different index.

use super::cfg::{Direction, Edge};
use super::dataflow::{DataflowAnalysis, FlowContext};
use super::lattice::InstSet;
use crate::instructions::Instruction;
use crate::Result;

pub type ReachingSet = InstSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReachingDefinitions;

impl ReachingDefinitions {
    pub fn new() -> Self {
        Self
    }
}

impl DataflowAnalysis for ReachingDefinitions {
    type Info = ReachingSet;

    const DIRECTION: Direction = Direction::Forward;

    fn name(&self) -> &'static str {
        "reaching-definitions"
    }

    fn transfer(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        index: usize,
        input: &ReachingSet,
        outs: &[Edge],
    ) -> Result<Vec<ReachingSet>> {
        let mut out = input.clone();

        if inst.is_merge() {
            if cx.is_group_head(inst)? {
                for (merge_index, _) in cx.merge_group(inst.block)? {
                    out.insert(merge_index);
                }
            }
        } else if inst.opcode.is_value_defining() {
            out.insert(index);
        }

        Ok(vec![out; outs.len()])
    }
}
