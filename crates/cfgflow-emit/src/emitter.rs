use crate::config::ReportConfig;
use crate::output::OutputFormat;
use anyhow::Result;
use cfgflow_core::analysis::FunctionReport;
use colored::Colorize;
use std::io::Write;

pub type EmitResult = Result<()>;

pub trait Emitter {
    type Item: ?Sized;

    fn emit<W: Write>(&self, item: &Self::Item, writer: &mut W) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit(item, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct ReportEmitter {
    config: ReportConfig,
}

impl ReportEmitter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn header(&self, report: &FunctionReport) -> String {
        let text = format!(
            "; {} ({}) @{}",
            report.analysis, report.direction, report.function
        );
        if self.config.use_colors {
            text.bold().cyan().to_string()
        } else {
            text
        }
    }

    fn emit_text<W: Write>(&self, report: &FunctionReport, writer: &mut W) -> EmitResult {
        writeln!(writer, "{}", self.header(report))?;

        if self.config.show_instructions {
            for inst in &report.instructions {
                let line = format!("; {:>4}  {:<12} {}", inst.index, inst.block, inst.text);
                if self.config.use_colors {
                    writeln!(writer, "{}", line.dimmed())?;
                } else {
                    writeln!(writer, "{}", line)?;
                }
            }
        }

        for fact in &report.facts {
            writeln!(writer, "Edge {}->Edge {}:{}", fact.source, fact.target, fact.value)?;
        }

        if self.config.show_stats {
            let line = format!(
                "; {} visits, {} updates, {} edges",
                report.stats.visits,
                report.stats.updates,
                report.facts.len()
            );
            if self.config.use_colors {
                writeln!(writer, "{}", line.yellow())?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }

        Ok(())
    }

    /// Emits several reports as one document: blank-line separated text, or a single JSON array.
    pub fn emit_all<W: Write>(&self, reports: &[FunctionReport], writer: &mut W) -> EmitResult {
        match self.config.format {
            OutputFormat::Text => {
                for (i, report) in reports.iter().enumerate() {
                    if i > 0 {
                        writeln!(writer)?;
                    }
                    self.emit_text(report, writer)?;
                }
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, reports)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for ReportEmitter {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

impl Emitter for ReportEmitter {
    type Item = FunctionReport;

    fn emit<W: Write>(&self, item: &FunctionReport, writer: &mut W) -> EmitResult {
        match self.config.format {
            OutputFormat::Text => self.emit_text(item, writer),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, item)?;
                writeln!(writer)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgflow_core::analysis::{run_analysis, AnalysisKind, SolverConfig};
    use cfgflow_core::{FunctionBuilder, InstBuilder, Operand};

    fn report() -> FunctionReport {
        let mut b = FunctionBuilder::new("tiny");
        b.block("entry");
        let a = b.add(Operand::Arg(0), Operand::Const(1));
        b.ret(Some(a));
        let function = b.build().unwrap();
        run_analysis(AnalysisKind::Liveness, &function, &SolverConfig::default()).unwrap()
    }

    #[test]
    fn test_plain_text() {
        let emitter = ReportEmitter::new(ReportConfig::plain());
        let text = emitter.emit_to_string(&report()).unwrap();
        assert_eq!(
            text,
            "; liveness (backward) @tiny\nEdge 0->Edge 2:\nEdge 2->Edge 1:1|\n"
        );
    }

    #[test]
    fn test_stats_line() {
        let config = ReportConfig {
            show_stats: true,
            ..ReportConfig::plain()
        };
        let text = ReportEmitter::new(config).emit_to_string(&report()).unwrap();
        assert!(text.lines().last().unwrap().ends_with("2 edges"));
    }
}
