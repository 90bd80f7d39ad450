use crate::{
    block::BasicBlock,
    function::Function,
    instructions::{Instruction, Opcode},
    module::Module,
    values::Operand,
};
use std::fmt::Write;

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();

    for (i, function) in module.functions.values().enumerate() {
        if i > 0 {
            writeln!(&mut output).unwrap();
        }
        write!(&mut output, "{}", format_function(function)).unwrap();
    }

    output
}

pub fn format_function(function: &Function) -> String {
    let mut output = String::new();

    let params: Vec<String> = function.params.iter().map(|p| format!("%{}", p)).collect();
    writeln!(&mut output, "define @{}({}) {{", function.name, params.join(", ")).unwrap();

    for (i, block) in function.blocks.values().enumerate() {
        if i > 0 {
            writeln!(&mut output).unwrap();
        }
        write!(&mut output, "{}", format_block(function, block)).unwrap();
    }

    writeln!(&mut output, "}}").unwrap();

    output
}

fn format_block(function: &Function, block: &BasicBlock) -> String {
    let mut output = String::new();

    writeln!(&mut output, "{}:", block.label).unwrap();
    for inst in block.instructions.iter().filter_map(|id| function.inst(*id)) {
        writeln!(&mut output, "  {}", format_instruction(function, inst)).unwrap();
    }

    output
}

/// Name an instruction result is printed and parsed under.
///
/// Unnamed results print as `%.<id>`. Names starting with `.` are reserved for them, so a
/// value the user called `%1` never collides with instruction 1.
pub fn value_name(inst: &Instruction) -> String {
    match &inst.name {
        Some(name) => format!("%{}", name),
        None => format!("%.{}", inst.id.0),
    }
}

pub fn format_operand(function: &Function, operand: &Operand) -> String {
    match operand {
        Operand::Inst(id) => function
            .inst(*id)
            .map(value_name)
            .unwrap_or_else(|| format!("%.{}", id.0)),
        Operand::Arg(index) => function
            .params
            .get(*index as usize)
            .map(|name| format!("%{}", name))
            .unwrap_or_else(|| format!("%arg{}", index)),
        Operand::Const(value) => value.to_string(),
        Operand::Global(name) => format!("@{}", name),
        Operand::Null => "null".to_string(),
        Operand::Undef => "undef".to_string(),
    }
}

fn block_label(function: &Function, id: crate::block::BlockId) -> String {
    function
        .block(id)
        .map(|block| format!("label %{}", block.label))
        .unwrap_or_else(|| format!("label %{}", id))
}

pub fn format_instruction(function: &Function, inst: &Instruction) -> String {
    let ops: Vec<String> = inst
        .operands
        .iter()
        .map(|op| format_operand(function, op))
        .collect();

    let body = match inst.opcode {
        Opcode::Phi => {
            let incoming: Vec<String> = inst
                .incoming_pairs()
                .map(|(value, block)| {
                    let label = function
                        .block(block)
                        .map(|b| b.label.clone())
                        .unwrap_or_else(|| block.to_string());
                    format!("[ {}, %{} ]", format_operand(function, value), label)
                })
                .collect();
            format!("phi {}", incoming.join(", "))
        }
        Opcode::Br if inst.targets.len() == 2 => format!(
            "br {}, {}, {}",
            ops.first().cloned().unwrap_or_default(),
            block_label(function, inst.targets[0]),
            block_label(function, inst.targets[1])
        ),
        Opcode::Br => format!(
            "br {}",
            inst.targets
                .first()
                .map(|t| block_label(function, *t))
                .unwrap_or_default()
        ),
        Opcode::Switch => {
            let mut text = format!(
                "switch {}, {}",
                ops.first().cloned().unwrap_or_default(),
                inst.targets
                    .first()
                    .map(|t| block_label(function, *t))
                    .unwrap_or_default()
            );
            for (case, target) in ops.iter().skip(1).zip(inst.targets.iter().skip(1)) {
                write!(&mut text, " [ {}, {} ]", case, block_label(function, *target)).unwrap();
            }
            text
        }
        Opcode::Call => {
            let callee = ops.first().cloned().unwrap_or_default();
            format!("call {}({})", callee, ops[1.min(ops.len())..].join(", "))
        }
        _ if ops.is_empty() => inst.opcode.name().to_string(),
        _ => format!("{} {}", inst.opcode.name(), ops.join(", ")),
    };

    if inst.opcode.has_result() {
        format!("{} = {}", value_name(inst), body)
    } else {
        body
    }
}
