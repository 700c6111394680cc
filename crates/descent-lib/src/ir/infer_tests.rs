use indoc::indoc;

use super::*;

fn build_ir(src: &str) -> Parser {
    let tokens = crate::lexer::lex(src).unwrap();
    let machine = crate::ast::parse(&tokens).unwrap();
    build(&machine).unwrap()
}

#[test]
fn scan_inference_with_newline_injection() {
    // the pipe-delimited state from the boundary scenarios
    let ir = build_ir(indoc! {"
        |function[row]
        |c['|'] /pipe() |-> |>>
        |default -> |>>
    "});
    let state = &ir.function("row").unwrap().states[0];
    assert_eq!(state.scan_chars, vec![b'\n', b'|']);
    assert!(state.newline_injected);
    assert!(state.has_default);
    assert!(state.is_self_looping);
}

#[test]
fn scan_keeps_existing_newline() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[<'\\n' '|'>] ->
        |default -> |>>
    "});
    let state = &ir.function("f").unwrap().states[0];
    assert!(state.scan_chars.contains(&b'\n'));
    assert!(!state.newline_injected);
    assert_eq!(state.scan_chars.len(), 2);
}

#[test]
fn scan_requires_pure_default() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[a] ->
        |default depth += 1 |-> |>>
    "});
    let state = &ir.function("f").unwrap().states[0];
    assert!(state.scan_chars.is_empty());
    assert!(!state.newline_injected);
}

#[test]
fn scan_rejects_wide_byte_sets() {
    let ir = build_ir(indoc! {"
        |function[f]
        |letter ->
        |default -> |>>
    "});
    assert!(ir.function("f").unwrap().states[0].scan_chars.is_empty());
}

#[test]
fn scan_rejects_param_selectors() {
    let ir = build_ir(indoc! {"
        |function[f(:p)]
        |c[:p] ->
        |default -> |>>
    "});
    assert!(ir.function("f").unwrap().states[0].scan_chars.is_empty());
}

#[test]
fn scan_ignores_conditional_cases() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c['<'] ->
        |if[depth == 0] return
        |default -> |>>
    "});
    let state = &ir.function("f").unwrap().states[0];
    assert_eq!(state.scan_chars, vec![b'\n', b'<']);
}

#[test]
fn scan_at_six_bytes_without_newline_stays() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[<a b d e f g>] ->
        |default -> |>>
    "});
    let state = &ir.function("f").unwrap().states[0];
    assert_eq!(state.scan_chars.len(), 6);
    assert!(!state.scan_chars.contains(&b'\n'));
    assert!(!state.newline_injected);
}

#[test]
fn expects_char_from_uniform_return_cases() {
    let ir = build_ir(indoc! {"
        |type[string_value] content
        |function[string_value] -> string_value
        |c['\"'] term |return
        |default -> |>>
    "});
    let f = ir.function("string_value").unwrap();
    assert_eq!(f.expects_char, Some(b'"'));
    assert!(f.emits_content_on_close);
}

#[test]
fn expects_char_absent_when_bytes_differ() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[a] return
        |c[b] return
    "});
    let f = ir.function("f").unwrap();
    assert_eq!(f.expects_char, None);
    assert!(!f.emits_content_on_close);
}

#[test]
fn expects_char_absent_for_default_returns() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[a] return
        |default term |return
    "});
    assert_eq!(ir.function("f").unwrap().expects_char, None);
}

#[test]
fn expects_char_without_term_does_not_flush() {
    let ir = build_ir(indoc! {"
        |function[f]
        |c[']'] -> |return
        |default -> |>>
    "});
    let f = ir.function("f").unwrap();
    assert_eq!(f.expects_char, Some(b']'));
    assert!(!f.emits_content_on_close);
}

#[test]
fn locals_collected_and_literal_inits_hoisted() {
    let ir = build_ir(indoc! {"
        |function[f]
        |depth = 1
        |count = 0
        |c[a] depth += 1 |pos = COL
    "});
    let f = ir.function("f").unwrap();
    assert_eq!(
        f.locals.keys().collect::<Vec<_>>(),
        vec!["depth", "count", "pos"]
    );
    assert_eq!(f.local_init_values.get("depth").map(String::as_str), Some("1"));
    assert_eq!(f.local_init_values.get("count").map(String::as_str), Some("0"));
    assert!(!f.local_init_values.contains_key("pos"));
    // hoisted assignments leave the entry actions
    assert!(f.entry_actions.is_empty());
}

#[test]
fn non_literal_init_stays_in_entry_actions() {
    let ir = build_ir(indoc! {"
        |function[f]
        |pos = COL
        |c[a] ->
    "});
    let f = ir.function("f").unwrap();
    assert_eq!(f.entry_actions.len(), 1);
    assert!(f.local_init_values.is_empty());
    assert!(f.locals.contains_key("pos"));
}

#[test]
fn params_are_not_locals() {
    let ir = build_ir(indoc! {"
        |function[f(:depth)]
        |c[a] depth = 0
    "});
    assert!(ir.function("f").unwrap().locals.is_empty());
}

#[test]
fn inline_emit_then_bare_return_suppresses_auto_emit() {
    let ir = build_ir(indoc! {"
        |type[integer] content
        |function[num] -> integer
        |c[x] Float(USE_MARK) |return
        |c[y] return
    "});
    let cases = &ir.function("num").unwrap().states[0].cases;
    let Command::Return {
        suppress_auto_emit, ..
    } = &cases[0].commands[1]
    else {
        panic!("expected return");
    };
    assert!(suppress_auto_emit);

    // a return with no preceding inline emit keeps the auto event
    let Command::Return {
        suppress_auto_emit, ..
    } = &cases[1].commands[0]
    else {
        panic!("expected return");
    };
    assert!(!suppress_auto_emit);
}

#[test]
fn return_with_explicit_emit_is_not_suppressed() {
    let ir = build_ir(indoc! {"
        |type[integer] content
        |function[num] -> integer
        |c[x] Float(USE_MARK) |return Integer
    "});
    let Command::Return {
        emit,
        suppress_auto_emit,
        ..
    } = &ir.function("num").unwrap().states[0].cases[0].commands[1]
    else {
        panic!("expected return");
    };
    assert_eq!(emit.as_ref().unwrap().type_name, "Integer");
    assert!(!suppress_auto_emit);
}

#[test]
fn unconditional_state_flag() {
    let ir = build_ir(indoc! {"
        |function[f]
        |/sub() |-> |>>
    "});
    let state = &ir.function("f").unwrap().states[0];
    assert!(state.is_unconditional);
    assert!(state.cases[0].is_bare);
}
