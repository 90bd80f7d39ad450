/*! Instruction-level dataflow analysis over a control-flow graph.
 *
 * A function is numbered instruction by instruction, wired into a forward or backward edge graph,
 * and solved with a worklist fixpoint. Liveness, points-to and reaching definitions are provided
 * on top of the engine, along with the IR they run on and the opcode counters used by profiling.
 */

pub mod analysis;
pub mod block;
pub mod builder;
pub mod format;
pub mod function;
pub mod instructions;
pub mod module;
pub mod profile;
pub mod values;

pub use analysis::{
    solve, AnalysisKind, DataflowAnalysis, Direction, Lattice, LivenessAnalysis,
    PointsToAnalysis, ReachingDefinitions, Solution, Solver, SolverConfig,
};
pub use block::{BasicBlock, BlockId};
pub use builder::{FunctionBuilder, InstBuilder};
pub use function::Function;
pub use instructions::{Instruction, Opcode};
pub use module::Module;
pub use values::{InstId, Operand};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Malformed input in {function}: {message}")]
    MalformedInput { function: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
