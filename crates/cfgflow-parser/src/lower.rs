//! Turns parse trees into `cfgflow_core` functions.
//!
//! Lowering runs in two passes over each function. The first creates every block and assigns
//! every named result the id it will receive, which makes phi operands and branch targets
//! that point forward resolvable. The second appends the instructions in text order.

use crate::error::{ParseError, Result};
use crate::Rule;
use cfgflow_core::{
    BlockId, Function, FunctionBuilder, InstBuilder, InstId, Module, Opcode, Operand,
};
use pest::iterators::{Pair, Pairs};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

pub(crate) fn lower_module(name: &str, mut pairs: Pairs<'_, Rule>) -> Result<Module> {
    let mut module = Module::new(name);

    let Some(root) = pairs.next() else {
        return Ok(module);
    };

    for pair in root.into_inner() {
        if pair.as_rule() != Rule::function {
            continue;
        }
        let function = lower_function(pair)?;
        if module.get_function(&function.name).is_some() {
            return Err(ParseError::DuplicateFunction(function.name));
        }
        module.add_function(function);
    }

    Ok(module)
}

struct BlockSource<'i> {
    label: &'i str,
    id: BlockId,
    instructions: Vec<Pair<'i, Rule>>,
}

struct Lowering<'i> {
    function: String,
    builder: FunctionBuilder,
    values: HashMap<&'i str, Operand>,
    blocks: HashMap<&'i str, BlockId>,
}

fn ident<'i>(pair: Pair<'i, Rule>) -> &'i str {
    let text = pair.as_str();
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::ident => inner.as_str(),
        _ => text,
    }
}

pub(crate) fn lower_function<'i>(pair: Pair<'i, Rule>) -> Result<Function> {
    let mut inner = pair.into_inner().peekable();

    let name = inner.next().map(ident).unwrap_or_default().to_string();
    let mut cx = Lowering {
        builder: FunctionBuilder::new(name.clone()),
        function: name,
        values: HashMap::new(),
        blocks: HashMap::new(),
    };

    if let Some(params) = inner.next_if(|p| p.as_rule() == Rule::params) {
        for local in params.into_inner() {
            let param = ident(local);
            let operand = cx.builder.param(param);
            cx.define(param, operand)?;
        }
    }

    let mut blocks = Vec::new();
    let mut next_id = 0u32;
    for block in inner.filter(|p| p.as_rule() == Rule::block) {
        let mut parts = block.into_inner();
        let label = parts.next().map(ident).unwrap_or_default();
        if cx.blocks.contains_key(label) {
            return Err(ParseError::DuplicateBlock {
                function: cx.function.clone(),
                label: label.to_string(),
            });
        }
        let id = cx.builder.create_block(label);
        cx.blocks.insert(label, id);

        let instructions: Vec<Pair<'_, Rule>> = parts.collect();
        for inst in &instructions {
            if let Some(result) = inst
                .clone()
                .into_inner()
                .next()
                .filter(|p| p.as_rule() == Rule::local)
            {
                cx.define(ident(result), Operand::Inst(InstId(next_id)))?;
            }
            next_id += 1;
        }

        blocks.push(BlockSource {
            label,
            id,
            instructions,
        });
    }

    for block in blocks {
        cx.builder.switch_to_block(block.id)?;
        debug!(function = %cx.function, block = block.label, "lowering block");
        for inst in block.instructions {
            cx.instruction(inst)?;
        }
    }

    let function = cx.builder.build()?;
    debug!(
        function = %function.name,
        blocks = function.blocks.len(),
        instructions = function.instruction_count(),
        "lowered function"
    );
    Ok(function)
}

impl<'i> Lowering<'i> {
    fn define(&mut self, name: &'i str, operand: Operand) -> Result<()> {
        if self.values.insert(name, operand).is_some() {
            return Err(ParseError::DuplicateValue {
                function: self.function.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn value(&self, name: &str) -> Result<Operand> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ParseError::UndefinedValue {
                function: self.function.clone(),
                name: name.to_string(),
            })
    }

    fn block(&self, name: &str) -> Result<BlockId> {
        self.blocks
            .get(name)
            .copied()
            .ok_or_else(|| ParseError::UndefinedBlock {
                function: self.function.clone(),
                label: name.to_string(),
            })
    }

    fn label(&self, pair: Pair<'_, Rule>) -> Result<BlockId> {
        let local = pair.into_inner().next().map(ident).unwrap_or_default();
        self.block(local)
    }

    fn integer(&self, text: &str) -> Result<i64> {
        text.parse().map_err(|_| ParseError::InvalidInteger {
            function: self.function.clone(),
            literal: text.to_string(),
        })
    }

    fn operand(&self, pair: Pair<'_, Rule>) -> Result<Operand> {
        let Some(inner) = pair.into_inner().next() else {
            return Ok(Operand::Undef);
        };
        match inner.as_rule() {
            Rule::local => self.value(ident(inner)),
            Rule::global => Ok(Operand::Global(ident(inner).to_string())),
            Rule::integer => self.integer(inner.as_str()).map(Operand::Const),
            Rule::null => Ok(Operand::Null),
            _ => Ok(Operand::Undef),
        }
    }

    fn operands(&self, pair: Option<Pair<'_, Rule>>) -> Result<Vec<Operand>> {
        match pair {
            Some(list) => list.into_inner().map(|p| self.operand(p)).collect(),
            None => Ok(Vec::new()),
        }
    }

    fn instruction(&mut self, pair: Pair<'_, Rule>) -> Result<()> {
        let id = self.builder.next_inst_id();
        let mut inner = pair.into_inner().peekable();
        let name = inner
            .next_if(|p| p.as_rule() == Rule::local)
            .map(|p| ident(p).to_string());

        let Some(body) = inner.next() else {
            return Ok(());
        };

        match body.as_rule() {
            Rule::phi => {
                let mut incoming = Vec::new();
                for edge in body.into_inner() {
                    let mut parts = edge.into_inner();
                    let value = match parts.next() {
                        Some(p) => self.operand(p)?,
                        None => Operand::Undef,
                    };
                    let pred = self.block(parts.next().map(ident).unwrap_or_default())?;
                    incoming.push((value, pred));
                }
                self.builder.append_phi(incoming);
            }
            Rule::cond_br => {
                let mut parts = body.into_inner();
                let condition = match parts.next() {
                    Some(p) => self.operand(p)?,
                    None => Operand::Undef,
                };
                let mut targets = Vec::new();
                for label in parts {
                    targets.push(self.label(label)?);
                }
                self.builder
                    .append_terminator(Opcode::Br, vec![condition], targets);
            }
            Rule::br => {
                let mut targets = Vec::new();
                for label in body.into_inner() {
                    targets.push(self.label(label)?);
                }
                self.builder.append_terminator(Opcode::Br, Vec::new(), targets);
            }
            Rule::switch => {
                let mut parts = body.into_inner();
                let value = match parts.next() {
                    Some(p) => self.operand(p)?,
                    None => Operand::Undef,
                };
                let default = match parts.next() {
                    Some(p) => self.label(p)?,
                    None => return Ok(()),
                };
                let mut cases = Vec::new();
                for case in parts {
                    let mut case_parts = case.into_inner();
                    let literal = case_parts.next().map(|p| p.as_str()).unwrap_or("0");
                    let value = self.integer(literal)?;
                    let target = match case_parts.next() {
                        Some(p) => self.label(p)?,
                        None => default,
                    };
                    cases.push((value, target));
                }
                self.builder.switch(value, default, cases);
            }
            Rule::call => {
                let mut parts = body.into_inner();
                let callee = parts.next().map(ident).unwrap_or_default().to_string();
                let args = self.operands(parts.next())?;
                self.builder.call(&callee, args);
            }
            Rule::generic => {
                let mut parts = body.into_inner();
                let text = parts.next().map(|p| p.as_str()).unwrap_or_default();
                let opcode = Opcode::from_str(text).map_err(|_| ParseError::UnknownOpcode {
                    function: self.function.clone(),
                    opcode: text.to_string(),
                })?;
                let operands = self.operands(parts.next())?;
                if opcode.is_terminator() {
                    self.builder.append_terminator(opcode, operands, Vec::new());
                } else {
                    self.builder.append(opcode, operands);
                }
            }
            _ => return Ok(()),
        }

        if let Some(name) = name {
            self.builder.set_name(id, name);
        }
        Ok(())
    }
}
