use crate::{
    block::{BasicBlock, BlockId},
    function::Function,
    instructions::{Instruction, Opcode},
    values::{InstId, Operand},
    IrError, Result,
};

pub struct FunctionBuilder {
    function: Function,
    current_block: Option<BlockId>,
    next_block_id: u32,
    errors: Vec<String>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            function: Function::new(name),
            current_block: None,
            next_block_id: 0,
            errors: Vec::new(),
        }
    }

    pub fn param(&mut self, name: impl Into<String>) -> Operand {
        let index = self.function.params.len() as u32;
        self.function.params.push(name.into());
        Operand::Arg(index)
    }

    /// Creates a block and makes it current. Blocks keep creation order, so the first block
    /// created is the function entry.
    pub fn block(&mut self, label: impl Into<String>) -> BlockId {
        let id = self.create_block(label);
        self.current_block = Some(id);
        id
    }

    pub fn create_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.function.blocks.insert(id, BasicBlock::new(id, label));
        id
    }

    pub fn switch_to_block(&mut self, block_id: BlockId) -> Result<()> {
        if !self.function.blocks.contains_key(&block_id) {
            return Err(IrError::BuilderError(format!(
                "Block {} does not exist in function {}",
                block_id, self.function.name
            )));
        }
        self.current_block = Some(block_id);
        Ok(())
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Id the next appended instruction will receive. Ids are handed out sequentially.
    pub fn next_inst_id(&self) -> InstId {
        InstId(self.function.insts.len() as u32)
    }

    pub fn set_name(&mut self, id: InstId, name: impl Into<String>) {
        if let Some(inst) = self.function.insts.get_mut(id.index()) {
            inst.name = Some(name.into());
        }
    }

    pub fn append(&mut self, opcode: Opcode, operands: Vec<Operand>) -> InstId {
        self.push(opcode, operands, Vec::new(), Vec::new())
    }

    pub fn append_phi(&mut self, incoming: Vec<(Operand, BlockId)>) -> InstId {
        let (values, blocks) = incoming.into_iter().unzip();
        self.push(Opcode::Phi, values, blocks, Vec::new())
    }

    pub fn append_terminator(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        targets: Vec<BlockId>,
    ) -> InstId {
        if !opcode.is_terminator() {
            self.errors
                .push(format!("{} is not a terminator opcode", opcode));
        }
        self.push(opcode, operands, Vec::new(), targets)
    }

    fn push(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        incoming: Vec<BlockId>,
        targets: Vec<BlockId>,
    ) -> InstId {
        let id = self.next_inst_id();

        let Some(block_id) = self.current_block else {
            self.errors
                .push(format!("{} appended without a current block", opcode));
            return id;
        };

        if let Some(block) = self.function.blocks.get(&block_id) {
            let last = block
                .terminator()
                .and_then(|last| self.function.inst(last));
            if let Some(last) = last {
                if last.is_terminator() {
                    self.errors.push(format!(
                        "{} appended to terminated block {}",
                        opcode, block.label
                    ));
                } else if opcode.is_merge() && !last.is_merge() {
                    self.errors.push(format!(
                        "phi after non-phi instruction in block {}",
                        block.label
                    ));
                }
            }
        }

        let mut inst = Instruction::new(id, opcode, operands, block_id);
        inst.incoming = incoming;
        inst.targets = targets;
        self.function.insts.push(inst);

        if let Some(block) = self.function.blocks.get_mut(&block_id) {
            block.instructions.push(id);
        }

        id
    }

    pub fn build(mut self) -> Result<Function> {
        if self.function.blocks.is_empty() {
            self.errors
                .push(format!("function {} has no blocks", self.function.name));
        }

        for block in self.function.blocks.values() {
            let terminated = block
                .terminator()
                .and_then(|id| self.function.inst(id))
                .map(|inst| inst.is_terminator())
                .unwrap_or(false);
            if !terminated {
                self.errors
                    .push(format!("block {} has no terminator", block.label));
            }
        }

        for inst in &self.function.insts {
            for target in inst.targets.iter().chain(inst.incoming.iter()) {
                if !self.function.blocks.contains_key(target) {
                    self.errors.push(format!(
                        "instruction {} refers to unknown block {}",
                        inst.id, target
                    ));
                }
            }
        }

        if !self.errors.is_empty() {
            return Err(IrError::BuilderError(self.errors.join("; ")));
        }

        self.function.compute_cfg();
        Ok(self.function)
    }
}
