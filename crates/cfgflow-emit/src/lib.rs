/*! Render solved dataflow facts.
 *
 * A solved analysis is only useful once someone can read it. The text form keeps the classic
 * `Edge a->Edge b:value` lines so existing diffs and scripts keep working, optionally framed by
 * the numbered instruction listing and solver statistics. The JSON form carries the same rows
 * with the structured lattice value alongside the rendered one.
 */

pub mod config;
pub mod emitter;
pub mod output;

pub use config::ReportConfig;
pub use emitter::{EmitResult, Emitter, ReportEmitter};
pub use output::OutputFormat;
