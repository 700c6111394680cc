use indoc::indoc;

use super::*;

fn build_ir(src: &str) -> Parser {
    let tokens = crate::lexer::lex(src).unwrap();
    let machine = crate::ast::parse(&tokens).unwrap();
    build(&machine).unwrap()
}

fn param_type(ir: &Parser, func: &str, param: &str) -> ParamType {
    *ir.function(func).unwrap().param_types.get(param).unwrap()
}

#[test]
fn params_default_to_i32() {
    let ir = build_ir(indoc! {"
        |function[f(:count)]
        |c[a] ->
    "});
    assert_eq!(param_type(&ir, "f", "count"), ParamType::I32);
}

#[test]
fn selector_use_types_param_as_byte() {
    let ir = build_ir(indoc! {"
        |function[f(:stop)]
        |c[:stop] return
    "});
    assert_eq!(param_type(&ir, "f", "stop"), ParamType::Byte);
}

#[test]
fn char_comparison_types_param_as_byte() {
    let ir = build_ir(indoc! {"
        |function[f(:q)]
        |if[:q == '|'] return
        |c[a] ->
    "});
    assert_eq!(param_type(&ir, "f", "q"), ParamType::Byte);
}

#[test]
fn reversed_char_comparison_counts() {
    let ir = build_ir(indoc! {"
        |function[f(:q)]
        |if['|' == :q] return
        |c[a] ->
    "});
    assert_eq!(param_type(&ir, "f", "q"), ParamType::Byte);
}

#[test]
fn numeric_comparison_is_a_flag_test() {
    let ir = build_ir(indoc! {"
        |function[f(:mode)]
        |if[:mode == 0] return
        |c[a] ->
    "});
    assert_eq!(param_type(&ir, "f", "mode"), ParamType::I32);
}

#[test]
fn prepend_types_param_as_bytes() {
    let ir = build_ir(indoc! {"
        |function[f(:pfx)]
        |c[a] PREPEND(:pfx) |->
    "});
    assert_eq!(param_type(&ir, "f", "pfx"), ParamType::Bytes);
}

#[test]
fn empty_class_argument_types_callee_param_as_bytes() {
    let ir = build_ir(indoc! {"
        |function[callee(:stop)]
        |c[a] ->
        |function[caller]
        |c[b] /callee(<>)
    "});
    assert_eq!(param_type(&ir, "callee", "stop"), ParamType::Bytes);
}

#[test]
fn fix_point_propagates_byte_to_caller() {
    // bar passes :x through to foo, which matches on it
    let ir = build_ir(indoc! {"
        |function[foo(:x)]
        |c[:x] return
        |function[bar(:x)]
        |c[a] /foo(:x)
    "});
    assert_eq!(param_type(&ir, "foo", "x"), ParamType::Byte);
    assert_eq!(param_type(&ir, "bar", "x"), ParamType::Byte);
}

#[test]
fn fix_point_propagates_through_chains() {
    let ir = build_ir(indoc! {"
        |function[a(:v)]
        |c[:v] return
        |function[b(:v)]
        |c[x] /a(:v)
        |function[d(:v)]
        |c[x] /b(:v)
    "});
    assert_eq!(param_type(&ir, "d", "v"), ParamType::Byte);
}

#[test]
fn fix_point_does_not_downgrade() {
    // e's own PREPEND evidence wins; the byte-typed callee cannot lower it
    let ir = build_ir(indoc! {"
        |function[take(:x)]
        |c[:x] return
        |function[e(:x)]
        |c[a] PREPEND(:x) |/take(:x)
    "});
    assert_eq!(param_type(&ir, "e", "x"), ParamType::Bytes);
}

#[test]
fn call_args_rewritten_for_byte_param() {
    let ir = build_ir(indoc! {"
        |function[take(:stop)]
        |c[:stop] return
        |function[caller]
        |c[a] /take('\"')
    "});
    let Command::Call { args, .. } = &ir.function("caller").unwrap().states[0].cases[0].commands[0]
    else {
        panic!("expected call");
    };
    assert_eq!(args[0], "b'\"'");
}

#[test]
fn call_args_rewritten_for_bytes_param() {
    let ir = build_ir(indoc! {"
        |function[pre(:pfx)]
        |c[a] PREPEND(:pfx)
        |function[caller]
        |c[b] /pre('--')
    "});
    let Command::Call { args, .. } = &ir.function("caller").unwrap().states[0].cases[0].commands[0]
    else {
        panic!("expected call");
    };
    assert_eq!(args[0], "b\"--\"");
}

#[test]
fn zero_sentinel_rewrites() {
    let ir = build_ir(indoc! {"
        |function[take(:stop)]
        |c[:stop] return
        |function[pre(:pfx)]
        |c[a] PREPEND(:pfx)
        |function[count(:n)]
        |c[a] ->
        |function[caller]
        |c[b] /take(0) |/pre(0) |/count(0)
    "});
    let cmds = &ir.function("caller").unwrap().states[0].cases[0].commands;
    let args = |i: usize| -> &str {
        let Command::Call { args, .. } = &cmds[i] else {
            panic!("expected call");
        };
        &args[0]
    };
    assert_eq!(args(0), "0u8");
    assert_eq!(args(1), "b\"\"");
    assert_eq!(args(2), "0");
}

#[test]
fn param_refs_and_builtins_pass_through() {
    let ir = build_ir(indoc! {"
        |function[take(:stop)]
        |c[:stop] return
        |function[caller(:stop)]
        |c[a] /take(:stop) |/take(COL)
    "});
    let cmds = &ir.function("caller").unwrap().states[0].cases[0].commands;
    let Command::Call { args, .. } = &cmds[0] else {
        panic!()
    };
    assert_eq!(args[0], ":stop");
    let Command::Call { args, .. } = &cmds[1] else {
        panic!()
    };
    assert_eq!(args[0], "COL");
}

#[test]
fn args_to_unknown_callee_are_untouched() {
    let ir = build_ir(indoc! {"
        |function[caller]
        |c[a] /missing('x')
    "});
    let Command::Call { args, .. } = &ir.function("caller").unwrap().states[0].cases[0].commands[0]
    else {
        panic!("expected call");
    };
    assert_eq!(args[0], "'x'");
}

#[test]
fn prepend_values_record_call_site_literals() {
    let ir = build_ir(indoc! {"
        |function[pre(:pfx)]
        |c[a] PREPEND(:pfx)
        |function[one]
        |c[b] /pre('-')
        |function[two]
        |c[b] /pre('+') |/pre('-')
    "});
    let values = &ir.function("pre").unwrap().prepend_values;
    assert_eq!(values.get("pfx").unwrap(), &vec![b'-', b'+']);
}

#[test]
fn prepend_values_skip_sentinel_and_refs() {
    let ir = build_ir(indoc! {"
        |function[pre(:pfx)]
        |c[a] PREPEND(:pfx)
        |function[caller(:pfx)]
        |c[b] /pre(0) |/pre(:pfx)
    "});
    assert!(ir.function("pre").unwrap().prepend_values.is_empty());
}
