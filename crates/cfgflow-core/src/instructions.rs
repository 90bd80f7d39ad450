use crate::block::BlockId;
use crate::values::{InstId, Operand};
use crate::IrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Ret,
    Br,
    Switch,
    Unreachable,

    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    UDiv,
    SDiv,
    FDiv,
    URem,
    SRem,
    FRem,

    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,

    Alloca,
    Load,
    Store,
    GetElementPtr,

    Trunc,
    ZExt,
    SExt,
    PtrToInt,
    IntToPtr,
    BitCast,

    ICmp,
    FCmp,
    Phi,
    Call,
    Select,
}

impl Opcode {
    pub const ALL: [Opcode; 37] = [
        Opcode::Ret,
        Opcode::Br,
        Opcode::Switch,
        Opcode::Unreachable,
        Opcode::Add,
        Opcode::FAdd,
        Opcode::Sub,
        Opcode::FSub,
        Opcode::Mul,
        Opcode::FMul,
        Opcode::UDiv,
        Opcode::SDiv,
        Opcode::FDiv,
        Opcode::URem,
        Opcode::SRem,
        Opcode::FRem,
        Opcode::Shl,
        Opcode::LShr,
        Opcode::AShr,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Alloca,
        Opcode::Load,
        Opcode::Store,
        Opcode::GetElementPtr,
        Opcode::Trunc,
        Opcode::ZExt,
        Opcode::SExt,
        Opcode::PtrToInt,
        Opcode::IntToPtr,
        Opcode::BitCast,
        Opcode::ICmp,
        Opcode::FCmp,
        Opcode::Phi,
        Opcode::Call,
        Opcode::Select,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Ret => "ret",
            Opcode::Br => "br",
            Opcode::Switch => "switch",
            Opcode::Unreachable => "unreachable",
            Opcode::Add => "add",
            Opcode::FAdd => "fadd",
            Opcode::Sub => "sub",
            Opcode::FSub => "fsub",
            Opcode::Mul => "mul",
            Opcode::FMul => "fmul",
            Opcode::UDiv => "udiv",
            Opcode::SDiv => "sdiv",
            Opcode::FDiv => "fdiv",
            Opcode::URem => "urem",
            Opcode::SRem => "srem",
            Opcode::FRem => "frem",
            Opcode::Shl => "shl",
            Opcode::LShr => "lshr",
            Opcode::AShr => "ashr",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Alloca => "alloca",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::GetElementPtr => "getelementptr",
            Opcode::Trunc => "trunc",
            Opcode::ZExt => "zext",
            Opcode::SExt => "sext",
            Opcode::PtrToInt => "ptrtoint",
            Opcode::IntToPtr => "inttoptr",
            Opcode::BitCast => "bitcast",
            Opcode::ICmp => "icmp",
            Opcode::FCmp => "fcmp",
            Opcode::Phi => "phi",
            Opcode::Call => "call",
            Opcode::Select => "select",
        }
    }

    /// Opcodes whose result is a fresh definition. Liveness kills these at their own index and
    /// reaching definitions generates them.
    pub fn is_value_defining(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::FAdd
                | Opcode::Sub
                | Opcode::FSub
                | Opcode::Mul
                | Opcode::FMul
                | Opcode::UDiv
                | Opcode::SDiv
                | Opcode::FDiv
                | Opcode::URem
                | Opcode::SRem
                | Opcode::FRem
                | Opcode::Shl
                | Opcode::LShr
                | Opcode::AShr
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::Alloca
                | Opcode::Load
                | Opcode::GetElementPtr
                | Opcode::ICmp
                | Opcode::FCmp
                | Opcode::Select
        )
    }

    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Opcode::Ret | Opcode::Br | Opcode::Switch | Opcode::Unreachable
        )
    }

    pub fn is_merge(self) -> bool {
        self == Opcode::Phi
    }

    pub fn is_allocation(self) -> bool {
        self == Opcode::Alloca
    }

    /// Casts and address arithmetic whose result aliases operand 0.
    pub fn is_address_cast(self) -> bool {
        matches!(self, Opcode::BitCast | Opcode::GetElementPtr)
    }

    /// Whether the instruction produces a value that can be named in the textual form.
    pub fn has_result(self) -> bool {
        !matches!(
            self,
            Opcode::Ret | Opcode::Br | Opcode::Switch | Opcode::Unreachable | Opcode::Store
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| IrError::UnknownOpcode(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub name: Option<String>,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    /// Incoming block of each operand, phi only.
    pub incoming: Vec<BlockId>,
    /// Successor blocks, terminators only.
    pub targets: Vec<BlockId>,
    pub block: BlockId,
}

impl Instruction {
    pub fn new(id: InstId, opcode: Opcode, operands: Vec<Operand>, block: BlockId) -> Self {
        Self {
            id,
            name: None,
            opcode,
            operands,
            incoming: Vec::new(),
            targets: Vec::new(),
            block,
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }

    pub fn is_merge(&self) -> bool {
        self.opcode.is_merge()
    }

    pub fn operand(&self, position: usize) -> Option<&Operand> {
        self.operands.get(position)
    }

    /// `(value, predecessor)` pairs of a phi.
    pub fn incoming_pairs(&self) -> impl Iterator<Item = (&Operand, BlockId)> + '_ {
        self.operands.iter().zip(self.incoming.iter().copied())
    }

    /// The value a phi selects when control arrives from `pred`.
    pub fn incoming_for(&self, pred: BlockId) -> Option<&Operand> {
        self.incoming_pairs()
            .find(|(_, block)| *block == pred)
            .map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_names_round_trip() {
        for op in Opcode::ALL {
            assert_eq!(op.name().parse::<Opcode>().unwrap(), op);
        }
        assert!("frobnicate".parse::<Opcode>().is_err());
    }

    #[test]
    fn test_classification() {
        assert!(Opcode::Add.is_value_defining());
        assert!(Opcode::Alloca.is_value_defining());
        assert!(!Opcode::Store.is_value_defining());
        assert!(!Opcode::Phi.is_value_defining());
        assert!(!Opcode::Call.is_value_defining());
        assert!(!Opcode::BitCast.is_value_defining());
        assert!(Opcode::BitCast.is_address_cast());
        assert!(Opcode::GetElementPtr.is_address_cast());
        assert!(Opcode::Br.is_terminator());
        assert!(!Opcode::Store.has_result());
    }

    #[test]
    fn test_incoming_for() {
        let mut phi = Instruction::new(
            InstId(3),
            Opcode::Phi,
            vec![Operand::Inst(InstId(0)), Operand::Const(7)],
            BlockId(2),
        );
        phi.incoming = vec![BlockId(0), BlockId(1)];

        assert_eq!(phi.incoming_for(BlockId(0)), Some(&Operand::Inst(InstId(0))));
        assert_eq!(phi.incoming_for(BlockId(1)), Some(&Operand::Const(7)));
        assert_eq!(phi.incoming_for(BlockId(5)), None);
    }
}
