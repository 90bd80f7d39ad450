use crate::Rule;
use cfgflow_core::IrError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("Undefined value %{name} in @{function}")]
    UndefinedValue { function: String, name: String },
    #[error("Undefined block %{label} in @{function}")]
    UndefinedBlock { function: String, label: String },
    #[error("Value %{name} defined twice in @{function}")]
    DuplicateValue { function: String, name: String },
    #[error("Block {label} defined twice in @{function}")]
    DuplicateBlock { function: String, label: String },
    #[error("Function @{0} defined twice")]
    DuplicateFunction(String),
    #[error("Unknown opcode '{opcode}' in @{function}")]
    UnknownOpcode { function: String, opcode: String },
    #[error("Integer literal {literal} out of range in @{function}")]
    InvalidInteger { function: String, literal: String },
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Ir(#[from] IrError),
}

pub type Result<T> = std::result::Result<T, ParseError>;
