use super::cfg::Direction;
use super::dataflow::{DataflowAnalysis, SolveStats, Solver, SolverConfig};
use super::{LivenessAnalysis, PointsToAnalysis, ReachingDefinitions};
use crate::format::format_instruction;
use crate::function::Function;
use crate::module::Module;
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Liveness,
    PointsTo,
    ReachingDefinitions,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Liveness,
        AnalysisKind::PointsTo,
        AnalysisKind::ReachingDefinitions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::Liveness => "liveness",
            AnalysisKind::PointsTo => "pointer",
            AnalysisKind::ReachingDefinitions => "reaching",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            AnalysisKind::Liveness => LivenessAnalysis::DIRECTION,
            AnalysisKind::PointsTo => PointsToAnalysis::DIRECTION,
            AnalysisKind::ReachingDefinitions => ReachingDefinitions::DIRECTION,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisKind {
    type Err = IrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "liveness" | "live" => Ok(AnalysisKind::Liveness),
            "pointer" | "points-to" | "points_to" => Ok(AnalysisKind::PointsTo),
            "reaching" | "reaching-definitions" | "reaching_definitions" => {
                Ok(AnalysisKind::ReachingDefinitions)
            }
            other => Err(IrError::UnknownAnalysis(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFact {
    pub source: usize,
    pub target: usize,
    /// Rendered lattice value.
    pub value: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedInstruction {
    pub index: usize,
    pub block: String,
    pub text: String,
}

/// Solved facts of one analysis over one function, detached from the solver's types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionReport {
    pub function: String,
    pub analysis: AnalysisKind,
    pub direction: Direction,
    pub stats: SolveStats,
    pub instructions: Vec<IndexedInstruction>,
    pub facts: Vec<EdgeFact>,
}

impl FunctionReport {
    pub fn instruction(&self, index: usize) -> Option<&IndexedInstruction> {
        self.instructions.iter().find(|inst| inst.index == index)
    }

    pub fn fact(&self, source: usize, target: usize) -> Option<&EdgeFact> {
        self.facts
            .iter()
            .find(|fact| fact.source == source && fact.target == target)
    }
}

impl fmt::Display for FunctionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fact in &self.facts {
            writeln!(f, "Edge {}->Edge {}:{}", fact.source, fact.target, fact.value)?;
        }
        Ok(())
    }
}

fn report_for<A: DataflowAnalysis>(
    kind: AnalysisKind,
    analysis: &A,
    function: &Function,
    config: &SolverConfig,
) -> Result<FunctionReport> {
    let solution = Solver::new(config.clone()).solve(analysis, function)?;

    let instructions = (1..solution.index().node_count())
        .filter_map(|index| {
            let inst = solution.index().inst_at(index).and_then(|id| function.inst(id))?;
            let block = function
                .block(inst.block)
                .map(|b| b.label.clone())
                .unwrap_or_default();
            Some(IndexedInstruction {
                index,
                block,
                text: format_instruction(function, inst),
            })
        })
        .collect();

    let facts = solution
        .facts()
        .map(|(edge, value)| -> Result<EdgeFact> {
            Ok(EdgeFact {
                source: edge.source,
                target: edge.target,
                value: value.to_string(),
                data: serde_json::to_value(value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FunctionReport {
        function: function.name.clone(),
        analysis: kind,
        direction: solution.direction(),
        stats: solution.stats(),
        instructions,
        facts,
    })
}

/// Runs one analysis over one function with a fresh solver.
pub fn run_analysis(
    kind: AnalysisKind,
    function: &Function,
    config: &SolverConfig,
) -> Result<FunctionReport> {
    match kind {
        AnalysisKind::Liveness => report_for(kind, &LivenessAnalysis, function, config),
        AnalysisKind::PointsTo => report_for(kind, &PointsToAnalysis, function, config),
        AnalysisKind::ReachingDefinitions => {
            report_for(kind, &ReachingDefinitions, function, config)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub analysis: AnalysisKind,
    pub function: String,
    pub duration: Duration,
    pub stats: SolveStats,
}

/// Runs registered analyses over every function of a module and caches the reports.
pub struct PassManager {
    analyses: Vec<AnalysisKind>,
    config: SolverConfig,
    cache: HashMap<(AnalysisKind, String), FunctionReport>,
    statistics: Vec<PassStatistics>,
    collect_stats: bool,
}

impl PassManager {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            analyses: Vec::new(),
            config,
            cache: HashMap::new(),
            statistics: Vec::new(),
            collect_stats: false,
        }
    }

    pub fn register(&mut self, kind: AnalysisKind) -> &mut Self {
        if !self.analyses.contains(&kind) {
            self.analyses.push(kind);
        }
        self
    }

    pub fn enable_statistics(&mut self) -> &mut Self {
        self.collect_stats = true;
        self
    }

    pub fn run_on_function(
        &mut self,
        kind: AnalysisKind,
        function: &Function,
    ) -> Result<&FunctionReport> {
        let key = (kind, function.name.clone());

        if !self.cache.contains_key(&key) {
            let start = Instant::now();
            let report = run_analysis(kind, function, &self.config)?;
            info!(
                analysis = %kind,
                function = %function.name,
                edges = report.facts.len(),
                "analysis finished"
            );

            if self.collect_stats {
                self.statistics.push(PassStatistics {
                    analysis: kind,
                    function: function.name.clone(),
                    duration: start.elapsed(),
                    stats: report.stats,
                });
            }
            self.cache.insert(key.clone(), report);
        }

        self.cache
            .get(&key)
            .ok_or_else(|| IrError::FunctionNotFound(function.name.clone()))
    }

    /// Reports for every registered analysis, function by function in module order.
    pub fn run_on_module(&mut self, module: &Module) -> Result<Vec<FunctionReport>> {
        let mut reports = Vec::new();
        for kind in self.analyses.clone() {
            for function in module.functions.values() {
                reports.push(self.run_on_function(kind, function)?.clone());
            }
        }
        Ok(reports)
    }

    pub fn get_report(&self, kind: AnalysisKind, function: &str) -> Option<&FunctionReport> {
        self.cache.get(&(kind, function.to_string()))
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FunctionBuilder, InstBuilder};

    fn module() -> Module {
        let mut b = FunctionBuilder::new("f");
        b.block("entry");
        let p = b.alloca();
        let x = b.load(p);
        b.ret(Some(x));

        let mut module = Module::new("m");
        module.add_function(b.build().unwrap());
        module
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("liveness".parse::<AnalysisKind>().unwrap(), AnalysisKind::Liveness);
        assert_eq!("pointer".parse::<AnalysisKind>().unwrap(), AnalysisKind::PointsTo);
        assert_eq!(
            "reaching".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::ReachingDefinitions
        );
        assert!("constprop".parse::<AnalysisKind>().is_err());
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.name().parse::<AnalysisKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_report_matches_solution_rendering() {
        let module = module();
        let function = module.get_function("f").unwrap();

        let report =
            run_analysis(AnalysisKind::Liveness, function, &SolverConfig::default()).unwrap();
        let solution = crate::analysis::solve(&LivenessAnalysis, function).unwrap();

        assert_eq!(report.to_string(), solution.to_string());
        assert_eq!(report.direction, Direction::Backward);
        assert_eq!(report.instructions.len(), 3);
        assert_eq!(report.instruction(2).unwrap().text, "%.1 = load %.0");
        assert_eq!(report.fact(2, 1).unwrap().value, "1|");
        assert_eq!(report.fact(2, 1).unwrap().data, serde_json::json!([1]));
    }

    #[test]
    fn test_points_to_report_carries_entries() {
        let module = module();
        let function = module.get_function("f").unwrap();

        let report =
            run_analysis(AnalysisKind::PointsTo, function, &SolverConfig::default()).unwrap();
        let fact = report.fact(1, 2).unwrap();
        assert_eq!(fact.value, "R1->(M1/)|");
        assert_eq!(
            fact.data,
            serde_json::json!([{
                "location": {"kind": "value", "index": 1},
                "targets": [{"kind": "memory_object", "index": 1}]
            }])
        );
        assert_eq!(report.fact(0, 1).unwrap().data, serde_json::json!([]));
    }

    #[test]
    fn test_manager_caches_reports() {
        let module = module();
        let mut manager = PassManager::default();
        manager
            .register(AnalysisKind::ReachingDefinitions)
            .register(AnalysisKind::PointsTo)
            .enable_statistics();

        let reports = manager.run_on_module(&module).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(manager.statistics().len(), 2);

        manager.run_on_module(&module).unwrap();
        assert_eq!(manager.statistics().len(), 2);
        assert!(manager.get_report(AnalysisKind::PointsTo, "f").is_some());
        assert!(manager.get_report(AnalysisKind::Liveness, "f").is_none());

        manager.clear_cache();
        assert!(manager.get_report(AnalysisKind::PointsTo, "f").is_none());
    }
}
