/*! Dataflow engine and the analyses built on it.
 *
 * `cfg` numbers instructions and builds the edge graph, `dataflow` iterates transfer functions to
 * a fixpoint, and the liveness, points-to and reaching-definition modules each supply one lattice
 * with its transfer function. `pass` runs them by name and turns solutions into reports.
 */

pub mod cfg;
pub mod dataflow;
pub mod lattice;
pub mod liveness;
pub mod pass;
pub mod points_to;
pub mod reaching;

pub use cfg::{CfgIndex, Direction, Edge, VIRTUAL_ENTRY};
pub use dataflow::{
    solve, DataflowAnalysis, FlowContext, Lattice, Solution, SolveStats, Solver, SolverConfig,
    SolverPhase, WorklistOrder,
};
pub use lattice::InstSet;
pub use liveness::{LiveSet, LivenessAnalysis};
pub use pass::{
    run_analysis, AnalysisKind, EdgeFact, FunctionReport, IndexedInstruction, PassManager,
    PassStatistics,
};
pub use points_to::{Location, PointsToAnalysis, PointsToMap};
pub use reaching::{ReachingDefinitions, ReachingSet};
