use cfgflow_core::analysis::{solve, InstSet, LivenessAnalysis, PointsToAnalysis};
use cfgflow_core::format::format_function;
use cfgflow_core::{Opcode, Operand};
use cfgflow_parser::{parse_dir, parse_file, parse_module, ParseError};
use pretty_assertions::assert_eq;
use std::fs;

const LOOP: &str = "\
define @count(%n) {
entry:
  %start = add %n, 0
  br label %loop

loop:
  %i = phi [ %start, %entry ], [ %next, %loop ]
  %next = add %i, 1
  %done = icmp %next, 10
  br %done, label %loop, label %exit

exit:
  ret %next
}
";

fn set(items: &[usize]) -> InstSet {
    items.iter().copied().collect()
}

#[test]
fn test_forward_references_resolve() {
    let module = parse_module(LOOP).unwrap();
    let function = module.get_function("count").unwrap();

    let phi = function.find_named("i").unwrap();
    let next = function.find_named("next").unwrap();
    assert_eq!(phi.opcode, Opcode::Phi);
    assert_eq!(phi.operands[1], Operand::Inst(next.id));

    let loop_block = function.block_by_label("loop").unwrap();
    assert_eq!(phi.incoming[1], loop_block.id);
    assert!(loop_block.predecessors.contains(&loop_block.id));
}

#[test]
fn test_print_then_parse_is_stable() {
    let module = parse_module(LOOP).unwrap();
    let printed = format_function(module.get_function("count").unwrap());
    assert_eq!(printed, LOOP);
}

#[test]
fn test_liveness_over_parsed_loop() {
    let module = parse_module(LOOP).unwrap();
    let function = module.get_function("count").unwrap();
    let solution = solve(&LivenessAnalysis, function).unwrap();

    // 1 start, 2 br, 3 i, 4 next, 5 done, 6 br, 7 ret
    assert_eq!(solution.edge_value(3, 2), Some(&set(&[1])));
    assert_eq!(solution.edge_value(3, 6), Some(&set(&[4])));
    assert_eq!(solution.edge_value(6, 5), Some(&set(&[4, 5])));
}

#[test]
fn test_points_to_over_parsed_casts() {
    let input = r"
define @alias() {
entry:
  %p = alloca
  %q = bitcast %p
  %v = alloca
  store %v, %q
  ret
}
";
    let module = parse_module(input).unwrap();
    let solution = solve(&PointsToAnalysis, module.get_function("alias").unwrap()).unwrap();
    assert_eq!(
        solution.edge_value(4, 5).map(|m| m.to_string()),
        Some("R1->(M1/)|R2->(M1/)|R3->(M3/)|M1->(M3/)|".to_string())
    );
}

#[test]
fn test_operandless_instruction_ends_at_next_result() {
    let input = r"
define @slots() {
entry:
  %p = alloca
  %q = alloca
  %r = alloca
  unreachable
}
";
    let module = parse_module(input).unwrap();
    let function = module.get_function("slots").unwrap();
    assert_eq!(function.instruction_count(), 4);

    for name in ["p", "q", "r"] {
        let inst = function.find_named(name).unwrap();
        assert_eq!(inst.opcode, Opcode::Alloca);
        assert!(inst.operands.is_empty());
    }
}

#[test]
fn test_undefined_value() {
    let input = "define @f() {\nentry:\n  %x = add %y, 1\n  ret\n}\n";
    match parse_module(input) {
        Err(ParseError::UndefinedValue { function, name }) => {
            assert_eq!(function, "f");
            assert_eq!(name, "y");
        }
        other => panic!("expected undefined value, got {:?}", other),
    }
}

#[test]
fn test_undefined_block() {
    let input = "define @f() {\nentry:\n  br label %nowhere\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::UndefinedBlock { label, .. }) if label == "nowhere"
    ));
}

#[test]
fn test_duplicates_are_rejected() {
    let value = "define @f(%a) {\nentry:\n  %a = add 1, 2\n  ret\n}\n";
    assert!(matches!(parse_module(value), Err(ParseError::DuplicateValue { .. })));

    let block = "define @f() {\nb:\n  br label %b\nb:\n  ret\n}\n";
    assert!(matches!(parse_module(block), Err(ParseError::DuplicateBlock { .. })));

    let function = "define @f() {\nentry:\n  ret\n}\ndefine @f() {\nentry:\n  ret\n}\n";
    assert!(matches!(parse_module(function), Err(ParseError::DuplicateFunction(name)) if name == "f"));
}

#[test]
fn test_unknown_opcode() {
    let input = "define @f() {\nentry:\n  %x = frobnicate 1\n  ret\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::UnknownOpcode { opcode, .. }) if opcode == "frobnicate"
    ));
}

#[test]
fn test_unterminated_block_is_an_ir_error() {
    let input = "define @f() {\nentry:\n  %x = add 1, 2\n}\n";
    let err = parse_module(input).unwrap_err();
    assert!(matches!(err, ParseError::Ir(_)));
    assert!(err.to_string().contains("no terminator"));
}

#[test]
fn test_parse_file_names_module_after_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counting.cfg");
    fs::write(&path, LOOP).unwrap();

    let module = parse_file(&path).unwrap();
    assert_eq!(module.name, "counting");
    assert!(module.get_function("count").is_some());

    let missing = parse_file(dir.path().join("absent.cfg")).unwrap_err();
    assert!(matches!(missing, ParseError::Io { .. }));
}

#[test]
fn test_parse_dir_walks_nested_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("a.cfg"), LOOP).unwrap();
    fs::write(
        dir.path().join("nested").join("b.cfg"),
        "define @g() {\nentry:\n  ret\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not ir").unwrap();

    let modules = parse_dir(dir.path()).unwrap();
    let names: Vec<&str> = modules.iter().map(|(_, m)| m.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}
