use cfgflow::{parse_module, run_analysis, AnalysisKind, ReportConfig, ReportEmitter, SolverConfig};

#[test]
fn test_parse_analyze_render() {
    let module = parse_module("define @f(%a) {\nentry:\n  %x = add %a, 1\n  ret %x\n}\n").unwrap();
    let function = module.get_function("f").unwrap();
    let report =
        run_analysis(AnalysisKind::Liveness, function, &SolverConfig::default()).unwrap();

    let mut out = Vec::new();
    ReportEmitter::new(ReportConfig::plain())
        .emit_all(&[report], &mut out)
        .unwrap();
    assert!(String::from_utf8(out).unwrap().ends_with("Edge 2->Edge 1:1|\n"));
}
