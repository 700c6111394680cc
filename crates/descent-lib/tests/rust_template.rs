//! End-to-end: compile a machine description and render it through the
//! shipped Rust template.

use std::path::PathBuf;

use indoc::indoc;

use descent_lib::{Compiler, GenerateOptions};

fn shipped_templates() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn render(source: &str) -> String {
    let compiler = Compiler::new(source).unwrap();
    assert!(
        compiler.is_valid(),
        "fixture should validate: {:?}",
        compiler.diagnostics()
    );
    compiler
        .generate(&GenerateOptions {
            target: "rust".to_string(),
            templates_dir: shipped_templates(),
            trace: false,
        })
        .unwrap()
}

const CSV_LIKE: &str = indoc! {"
    |parser[rows]
    |entry-point[field]
    |type[field] content

    |function[field] -> field
    |c['|'] term |return
    |default -> |>>
"};

#[test]
fn renders_a_complete_parser_file() {
    let out = render(CSV_LIKE);
    assert!(out.contains("pub struct Parser<'a>"));
    assert!(out.contains("pub enum Event<'a>"));
    assert!(out.contains("pub fn new(input: &'a [u8]) -> Self"));
    assert!(out.contains("fn parse_field<F: FnMut(Event<'_>)>"));
    assert!(out.contains("Field { content: &'a [u8], span: Span }"));
}

#[test]
fn scan_state_uses_multi_byte_search() {
    let out = render(CSV_LIKE);
    // '|' plus the injected newline
    assert!(out.contains("self.scan_to2(b'\\n', b'|');"));
    assert!(out.contains("fn scan_to2(&mut self, t0: u8, t1: u8)"));
    assert!(!out.contains("fn scan_to3"));
}

#[test]
fn expects_char_produces_unclosed_error_path() {
    let out = render(indoc! {"
        |parser[strings]
        |entry-point[string_value]
        |type[string_value] content
        |function[string_value] -> string_value
        |c['\"'] term |return
        |default -> |>>
    "});
    assert!(out.contains("UnclosedStringValue,"));
    assert!(out.contains("ErrorCode::UnclosedStringValue"));
    // content is flushed before the unclosed error fires
    let error_at = out.find("ErrorCode::UnclosedStringValue").unwrap();
    let flush_at = out.find("Event::StringValue { content:").unwrap();
    assert!(flush_at < error_at);
}

#[test]
fn bracket_types_emit_start_and_end() {
    let out = render(indoc! {"
        |parser[p]
        |entry-point[obj]
        |type[object] bracket
        |function[obj] -> object
        |c['}'] -> |return
        |default -> |>>
    "});
    assert!(out.contains("ObjectStart { span: Span }"));
    assert!(out.contains("ObjectEnd { span: Span }"));
    assert!(out.contains("Event::ObjectStart { span:"));
    assert!(out.contains("Event::ObjectEnd { span:"));
}

#[test]
fn inline_emit_with_suppressed_return_emits_once() {
    let out = render(indoc! {"
        |parser[p]
        |entry-point[num]
        |type[integer] content
        |type[float] content
        |function[num] -> integer
        |c[e] Float(USE_MARK) |return
        |default -> |>>
    "});
    // exactly one emission site inside parse_num (plus the EOF flush)
    let body_start = out.find("fn parse_num").unwrap();
    let body = &out[body_start..];
    assert!(body.contains("Event::Float { content:"));
    // the suppressed bare return must not auto-emit Integer
    let case_at = body.find("b == b'e'").unwrap();
    let next_case = body[case_at..].find("continue 'machine;").unwrap();
    let case_body = &body[case_at..case_at + next_case];
    assert!(!case_body.contains("Event::Integer"));
}

#[test]
fn keywords_render_table_and_dispatch() {
    let out = render(indoc! {"
        |parser[p]
        |entry-point[word]
        |type[word] content
        |type[bool_value] content
        |keywords[lits]
        |k[true] BoolValue |k[false] BoolValue
        |fallback[/word()]
        |function[word] -> word
        |letter -> |>>
        |c[' '] KEYWORDS(lits) |return
        |default -> |>>
    "});
    assert!(out.contains("const LITS_KEYWORDS: &[&[u8]] = &[b\"true\", b\"false\"];"));
    assert!(out.contains("b\"true\" => on_event(Event::BoolValue"));
    assert!(out.contains("self.parse_word(on_event);"));
}

#[test]
fn helpers_are_gated_on_usage() {
    let out = render(CSV_LIKE);
    assert!(!out.contains("fn col("));
    assert!(!out.contains("fn prev("));
    assert!(!out.contains("fn is_letter("));
    assert!(!out.contains("fn prepend("));
    assert!(!out.contains("use unicode_ident"));

    let with_helpers = render(indoc! {"
        |parser[p]
        |entry-point[f]
        |type[t] content
        |function[f] -> t
        |if[PREV == ':'] pos = COL
        |letter -> |>>
        |c[XID_CONT] -> |>>
        |default -> |>>
    "});
    assert!(with_helpers.contains("fn col("));
    assert!(with_helpers.contains("fn prev("));
    assert!(with_helpers.contains("fn is_letter("));
    assert!(with_helpers.contains("use unicode_ident"));
    assert!(with_helpers.contains("fn is_xid_cont_at("));
}

#[test]
fn trace_flag_compiles_in_tracing() {
    let compiler = Compiler::new(CSV_LIKE).unwrap();
    let traced = compiler
        .generate(&GenerateOptions {
            target: "rust".to_string(),
            templates_dir: shipped_templates(),
            trace: true,
        })
        .unwrap();
    assert!(traced.contains("eprintln!(\"[field:main] pos={} line={}\""));

    let untraced = render(CSV_LIKE);
    assert!(!untraced.contains("eprintln!"));
}

#[test]
fn output_has_no_blank_runs() {
    let out = render(CSV_LIKE);
    assert!(!out.contains("\n\n\n"));
    assert!(out.ends_with('\n'));
}
