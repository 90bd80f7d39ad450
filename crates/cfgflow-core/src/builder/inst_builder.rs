use super::FunctionBuilder;
use crate::{
    block::BlockId,
    instructions::Opcode,
    values::{InstId, Operand},
};

/// Convenience constructors layered over the raw append operations.
pub trait InstBuilder {
    fn ins(&mut self, opcode: Opcode, operands: Vec<Operand>) -> InstId;

    fn ins_phi(&mut self, incoming: Vec<(Operand, BlockId)>) -> InstId;

    fn ins_terminator(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        targets: Vec<BlockId>,
    ) -> InstId;

    fn binary(&mut self, opcode: Opcode, left: Operand, right: Operand) -> Operand {
        Operand::Inst(self.ins(opcode, vec![left, right]))
    }

    fn add(&mut self, left: Operand, right: Operand) -> Operand {
        self.binary(Opcode::Add, left, right)
    }

    fn sub(&mut self, left: Operand, right: Operand) -> Operand {
        self.binary(Opcode::Sub, left, right)
    }

    fn mul(&mut self, left: Operand, right: Operand) -> Operand {
        self.binary(Opcode::Mul, left, right)
    }

    fn icmp(&mut self, left: Operand, right: Operand) -> Operand {
        self.binary(Opcode::ICmp, left, right)
    }

    fn alloca(&mut self) -> Operand {
        Operand::Inst(self.ins(Opcode::Alloca, Vec::new()))
    }

    fn load(&mut self, ptr: Operand) -> Operand {
        Operand::Inst(self.ins(Opcode::Load, vec![ptr]))
    }

    /// LLVM operand order: the stored value first, then the pointer.
    fn store(&mut self, value: Operand, ptr: Operand) -> InstId {
        self.ins(Opcode::Store, vec![value, ptr])
    }

    fn bitcast(&mut self, value: Operand) -> Operand {
        Operand::Inst(self.ins(Opcode::BitCast, vec![value]))
    }

    fn gep(&mut self, ptr: Operand, indices: Vec<Operand>) -> Operand {
        let mut operands = vec![ptr];
        operands.extend(indices);
        Operand::Inst(self.ins(Opcode::GetElementPtr, operands))
    }

    fn select(&mut self, condition: Operand, then_val: Operand, else_val: Operand) -> Operand {
        Operand::Inst(self.ins(Opcode::Select, vec![condition, then_val, else_val]))
    }

    fn call(&mut self, callee: &str, args: Vec<Operand>) -> Operand {
        let mut operands = vec![Operand::Global(callee.to_string())];
        operands.extend(args);
        Operand::Inst(self.ins(Opcode::Call, operands))
    }

    fn phi(&mut self, incoming: Vec<(Operand, BlockId)>) -> Operand {
        Operand::Inst(self.ins_phi(incoming))
    }

    fn jump(&mut self, target: BlockId) -> InstId {
        self.ins_terminator(Opcode::Br, Vec::new(), vec![target])
    }

    fn branch(&mut self, condition: Operand, then_block: BlockId, else_block: BlockId) -> InstId {
        self.ins_terminator(Opcode::Br, vec![condition], vec![then_block, else_block])
    }

    /// `targets[0]` is the default destination, the rest pair up with `cases`.
    fn switch(&mut self, value: Operand, default: BlockId, cases: Vec<(i64, BlockId)>) -> InstId {
        let mut operands = vec![value];
        let mut targets = vec![default];
        for (case, target) in cases {
            operands.push(Operand::Const(case));
            targets.push(target);
        }
        self.ins_terminator(Opcode::Switch, operands, targets)
    }

    fn ret(&mut self, value: Option<Operand>) -> InstId {
        self.ins_terminator(Opcode::Ret, value.into_iter().collect(), Vec::new())
    }

    fn unreachable(&mut self) -> InstId {
        self.ins_terminator(Opcode::Unreachable, Vec::new(), Vec::new())
    }
}

impl InstBuilder for FunctionBuilder {
    fn ins(&mut self, opcode: Opcode, operands: Vec<Operand>) -> InstId {
        self.append(opcode, operands)
    }

    fn ins_phi(&mut self, incoming: Vec<(Operand, BlockId)>) -> InstId {
        self.append_phi(incoming)
    }

    fn ins_terminator(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        targets: Vec<BlockId>,
    ) -> InstId {
        self.append_terminator(opcode, operands, targets)
    }
}
