//! Backward liveness: an index is live on an edge when its value may be read later without an
//! intervening definition.

use super::cfg::{Direction, Edge};
use super::dataflow::{DataflowAnalysis, FlowContext};
use super::lattice::InstSet;
use crate::instructions::Instruction;
use crate::Result;

pub type LiveSet = InstSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct LivenessAnalysis;

impl LivenessAnalysis {
    pub fn new() -> Self {
        Self
    }

    /// Kills every merge result of the group, then adds the value each one takes along the
    /// edge to one particular predecessor. Each outgoing edge leads to a predecessor's
    /// terminator, so every predecessor sees only its own incoming values.
    ///
    /// Phis are handled one after another, not as a parallel copy. When one phi reads another
    /// phi of the same group (a swap around a loop), the later kill removes the earlier use.
    fn merge_group(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        input: &LiveSet,
        outs: &[Edge],
    ) -> Result<Vec<LiveSet>> {
        let group = cx.merge_group(inst.block)?;
        let mut infos = Vec::with_capacity(outs.len());

        for edge in outs {
            let pred = cx.block_of(edge.target).ok_or_else(|| {
                cx.malformed(format!("edge target {} has no owning block", edge.target))
            })?;

            let mut live = input.clone();
            for (merge_index, merge) in &group {
                live.remove(*merge_index);
                if let Some(value) = merge.incoming_for(pred) {
                    if let Some(used) = cx.tracked(value)? {
                        live.insert(used);
                    }
                }
            }
            infos.push(live);
        }

        Ok(infos)
    }
}

impl DataflowAnalysis for LivenessAnalysis {
    type Info = LiveSet;

    const DIRECTION: Direction = Direction::Backward;

    fn name(&self) -> &'static str {
        "liveness"
    }

    fn transfer(
        &self,
        cx: &FlowContext<'_>,
        inst: &Instruction,
        index: usize,
        input: &LiveSet,
        outs: &[Edge],
    ) -> Result<Vec<LiveSet>> {
        if inst.is_merge() {
            if cx.is_group_head(inst)? {
                return self.merge_group(cx, inst, input, outs);
            }
            return Ok(vec![input.clone(); outs.len()]);
        }

        let mut live = input.clone();
        if inst.opcode.is_value_defining() {
            live.remove(index);
        }
        for operand in &inst.operands {
            if let Some(used) = cx.tracked(operand)? {
                live.insert(used);
            }
        }

        Ok(vec![live; outs.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::solve;
    use crate::builder::{FunctionBuilder, InstBuilder};
    use crate::values::Operand;
    use pretty_assertions::assert_eq;

    fn set(items: &[usize]) -> LiveSet {
        items.iter().copied().collect()
    }

    #[test]
    fn test_straight_line() {
        let mut b = FunctionBuilder::new("straight");
        b.block("entry");
        let a = b.add(Operand::Arg(0), Operand::Const(1));
        let bb = b.add(Operand::Arg(0), Operand::Const(2));
        let x = b.add(a, bb);
        b.ret(Some(x));
        let function = b.build().unwrap();

        let solution = solve(&LivenessAnalysis, &function).unwrap();

        // 1 a, 2 b, 3 x, 4 ret
        assert_eq!(solution.edge_value(0, 4), Some(&set(&[])));
        assert_eq!(solution.edge_value(4, 3), Some(&set(&[3])));
        assert_eq!(solution.edge_value(3, 2), Some(&set(&[1, 2])));
        assert_eq!(solution.edge_value(2, 1), Some(&set(&[1])));
        assert!(!solution.edge_value(3, 2).unwrap().contains(3));
    }

    #[test]
    fn test_untracked_operands_are_ignored() {
        let mut b = FunctionBuilder::new("consts");
        b.block("entry");
        let g = b.call("puts", vec![Operand::Global("msg".into()), Operand::Null]);
        let h = b.add(g, Operand::Const(5));
        b.ret(Some(h));
        let function = b.build().unwrap();

        // 1 call, 2 add, 3 ret
        let solution = solve(&LivenessAnalysis, &function).unwrap();
        assert_eq!(solution.edge_value(3, 2), Some(&set(&[2])));
        assert_eq!(solution.edge_value(2, 1), Some(&set(&[1])));
    }

    #[test]
    fn test_call_result_is_not_killed() {
        let mut b = FunctionBuilder::new("call");
        b.block("entry");
        let r = b.call("f", vec![]);
        let s = b.call("g", vec![r]);
        b.ret(Some(s));
        let function = b.build().unwrap();

        // Calls are not value-defining, so the call at index 2 stays live above itself.
        let solution = solve(&LivenessAnalysis, &function).unwrap();
        assert_eq!(solution.edge_value(3, 2), Some(&set(&[2])));
        assert_eq!(solution.edge_value(2, 1), Some(&set(&[1, 2])));
    }
}
