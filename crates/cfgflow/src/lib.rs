/*! Unified interface for instruction-level dataflow analysis.
 *
 * Single import for the IR, the worklist engine with its bundled analyses, the text front end,
 * and report rendering.
 */

pub use cfgflow_core as core;
pub use cfgflow_emit as emit;
pub use cfgflow_parser as parser;

pub use cfgflow_core::{
    analysis::{
        run_analysis, solve, AnalysisKind, CfgIndex, DataflowAnalysis, Direction, FunctionReport,
        Lattice, LivenessAnalysis, PassManager, PointsToAnalysis, ReachingDefinitions, Solution,
        Solver, SolverConfig,
    },
    block::{BasicBlock, BlockId},
    function::Function,
    instructions::{Instruction, Opcode},
    module::Module,
    values::{InstId, Operand},
    IrError,
};

pub use cfgflow_emit::{OutputFormat, ReportConfig, ReportEmitter};

pub use cfgflow_parser::{parse, parse_file, parse_module, ParseError};
