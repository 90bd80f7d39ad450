use cfgflow_core::analysis::{AnalysisKind, PassManager, SolverConfig};
use cfgflow_emit::{Emitter, OutputFormat, ReportConfig, ReportEmitter};
use cfgflow_parser::parse_module;
use pretty_assertions::assert_eq;

const INPUT: &str = r"
define @first(%a) {
entry:
  %x = add %a, 1
  ret %x
}

define @second() {
entry:
  %p = alloca
  ret %p
}
";

fn reports(kind: AnalysisKind) -> Vec<cfgflow_core::analysis::FunctionReport> {
    let module = parse_module(INPUT).unwrap();
    let mut manager = PassManager::new(SolverConfig::default());
    manager.register(kind);
    manager.run_on_module(&module).unwrap()
}

#[test]
fn test_text_reports_are_separated() {
    let emitter = ReportEmitter::new(ReportConfig::plain());
    let mut out = Vec::new();
    emitter
        .emit_all(&reports(AnalysisKind::ReachingDefinitions), &mut out)
        .unwrap();

    let expected = "\
; reaching (forward) @first
Edge 0->Edge 1:
Edge 1->Edge 2:1|

; reaching (forward) @second
Edge 0->Edge 1:
Edge 1->Edge 2:1|
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_instruction_listing() {
    let config = ReportConfig {
        show_instructions: true,
        ..ReportConfig::plain()
    };
    let text = ReportEmitter::new(config)
        .emit_to_string(&reports(AnalysisKind::Liveness)[0])
        .unwrap();

    assert!(text.contains("%x = add %a, 1"));
    assert!(text.contains("ret %x"));
    assert!(text.ends_with("Edge 2->Edge 1:1|\n"));
}

#[test]
fn test_json_keeps_structured_values() {
    let config = ReportConfig::plain().with_format(OutputFormat::Json);
    let mut out = Vec::new();
    ReportEmitter::new(config)
        .emit_all(&reports(AnalysisKind::PointsTo), &mut out)
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let second = &json[1];
    assert_eq!(second["function"], "second");
    assert_eq!(second["analysis"], "points_to");
    assert_eq!(second["direction"], "forward");

    let fact = &second["facts"][1];
    assert_eq!(fact["source"], 1);
    assert_eq!(fact["target"], 2);
    assert_eq!(fact["value"], "R1->(M1/)|");

    let entry = &fact["data"][0];
    assert_eq!(entry["location"]["kind"], "value");
    assert_eq!(entry["location"]["index"], 1);
    assert_eq!(entry["targets"][0]["kind"], "memory_object");
    assert_eq!(entry["targets"][0]["index"], 1);
    assert_eq!(fact["data"].as_array().unwrap().len(), 1);
}

#[test]
fn test_format_names() {
    assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    assert!("yaml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Json.to_string(), "json");
}
