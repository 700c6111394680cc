use indoc::indoc;

use super::context::{build_context, keyword_const_name};

fn ir(src: &str) -> crate::ir::Parser {
    let tokens = crate::lexer::lex(src).unwrap();
    let machine = crate::ast::parse(&tokens).unwrap();
    crate::ir::build(&machine).unwrap()
}

#[test]
fn minimal_context_uses_nothing() {
    let ir = ir(indoc! {"
        |parser[p]
        |entry-point[f]
        |function[f]
        |c[a] ->
    "});
    let ctx = build_context(&ir, false);
    assert_eq!(ctx.name, "p");
    assert_eq!(ctx.entry_point, "f");
    assert!(!ctx.trace);
    let uses = &ctx.uses;
    assert!(!uses.col && !uses.prev && !uses.line);
    assert!(!uses.set_term && !uses.span_emit);
    assert!(!uses.unicode && !uses.prepend && !uses.keywords);
    assert_eq!(uses.max_scan_arity, 0);
}

#[test]
fn special_variables_flag_helpers() {
    let ctx_ir = ir(indoc! {"
        |function[f]
        |if[PREV == '\\\\'] ->
        |c[a] pos = COL
    "});
    let ctx = build_context(&ctx_ir, false);
    assert!(ctx.uses.prev);
    assert!(ctx.uses.col);
    assert!(!ctx.uses.line);
}

#[test]
fn term_and_content_flag_span_helpers() {
    let ctx_ir = ir(indoc! {"
        |type[text] content
        |function[f] -> text
        |c[a] term |return
    "});
    let ctx = build_context(&ctx_ir, false);
    assert!(ctx.uses.set_term);
    assert!(ctx.uses.span_emit);
}

#[test]
fn class_cases_flag_their_helpers() {
    let ctx_ir = ir(indoc! {"
        |function[f]
        |letter ->
        |digit ->
        |hex_digit ->
        |c[XID_START] ->
    "});
    let uses = build_context(&ctx_ir, false).uses;
    assert!(uses.is_letter && uses.is_digit && uses.is_hex_digit);
    assert!(!uses.is_ws);
    assert!(uses.unicode);
}

#[test]
fn scan_arity_covers_states_and_advance_to() {
    let ctx_ir = ir(indoc! {"
        |function[f]
        |c[<a b d>] ->
        |default -> |>>
        |state[:skip]
        |c[x] ->['<&-']
    "});
    let uses = build_context(&ctx_ir, false).uses;
    // 3 literal bytes plus the injected newline
    assert_eq!(uses.max_scan_arity, 4);
    assert!(uses.advance_to);
}

#[test]
fn prepend_and_keywords_flags() {
    let ctx_ir = ir(indoc! {"
        |keywords[lits]
        |k[true] True
        |function[f]
        |c[a] PREPEND('-') |KEYWORDS(lits)
    "});
    let uses = build_context(&ctx_ir, false).uses;
    assert!(uses.prepend);
    assert!(uses.keywords);
}

#[test]
fn keyword_blocks_get_constant_names() {
    let ctx_ir = ir(indoc! {"
        |keywords[json-literals]
        |k[true] True
    "});
    let ctx = build_context(&ctx_ir, false);
    assert_eq!(ctx.keywords[0].const_name, "JSON_LITERALS_KEYWORDS");
}

#[test]
fn const_name_derivation() {
    assert_eq!(keyword_const_name("lits"), "LITS_KEYWORDS");
    assert_eq!(keyword_const_name("top-level"), "TOP_LEVEL_KEYWORDS");
}
