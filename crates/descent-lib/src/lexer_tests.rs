use indoc::indoc;

use super::lexer::{lex, strip_comments};

#[test]
fn strip_removes_comment_to_end_of_line() {
    assert_eq!(strip_comments("a ; comment\nb"), "a \nb");
}

#[test]
fn strip_preserves_newline_count() {
    let src = "a ; one\nb ; two\n; three\nd\n";
    let stripped = strip_comments(src);
    assert_eq!(
        src.chars().filter(|&c| c == '\n').count(),
        stripped.chars().filter(|&c| c == '\n').count()
    );
}

#[test]
fn strip_ignores_semicolon_in_quotes_and_brackets() {
    assert_eq!(strip_comments("c[';']"), "c[';']");
    assert_eq!(strip_comments("x \";\" y"), "x \";\" y");
    assert_eq!(strip_comments("k[a;b]"), "k[a;b]");
    assert_eq!(strip_comments("/f(';')"), "/f(';')");
}

#[test]
fn strip_is_idempotent() {
    let src = "a ; c\nc[';'] ; tail\n";
    let once = strip_comments(src);
    assert_eq!(strip_comments(&once), once);
}

#[test]
fn splits_on_pipes_across_lines() {
    let tokens = lex("|parser[p]\n|entry-point[main]\n").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].tag, "parser");
    assert_eq!(tokens[0].id, "p");
    assert_eq!(tokens[0].lineno, 1);
    assert_eq!(tokens[1].tag, "entry-point");
    assert_eq!(tokens[1].lineno, 2);
}

#[test]
fn pipe_inside_brackets_does_not_split() {
    let tokens = lex("|c['|']").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].tag, "c");
    assert_eq!(tokens[0].id, "'|'");
}

#[test]
fn pipe_inside_quotes_does_not_split() {
    let tokens = lex("|x = '|'").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].rest, "= '|'");
}

#[test]
fn empty_parts_are_dropped() {
    let tokens = lex("||c[a]|||->|").unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].tag, "c");
    assert_eq!(tokens[1].tag, "->");
}

#[test]
fn unterminated_quote_reports_opening_line() {
    let err = lex("|a\n|x = 'oops\n|b").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.message.contains("unterminated quote"));
}

#[test]
fn unterminated_bracket_reports_opening_line() {
    let err = lex("|c['x'\n").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("unterminated bracket"));
}

#[test]
fn tag_id_rest_split() {
    let tokens = lex("|function[string_value] -> string_value").unwrap();
    let t = &tokens[0];
    assert_eq!(t.tag, "function");
    assert_eq!(t.id, "string_value");
    assert_eq!(t.rest, "-> string_value");
}

#[test]
fn quoted_bracket_in_id() {
    let tokens = lex("|c[']']").unwrap();
    assert_eq!(tokens[0].id, "']'");
}

#[test]
fn screaming_snake_tag_is_lowercased() {
    let tokens = lex("|LETTER -> |TERM(2)").unwrap();
    assert_eq!(tokens[0].tag, "letter");
    assert_eq!(tokens[1].tag, "term(2)");
}

#[test]
fn pascal_case_tag_is_preserved() {
    let tokens = lex("|Float(USE_MARK)").unwrap();
    assert_eq!(tokens[0].tag, "Float(USE_MARK)");
}

#[test]
fn emit_tag_preserves_case() {
    let tokens = lex("|emit(Float)").unwrap();
    assert_eq!(tokens[0].tag, "emit(Float)");
}

#[test]
fn call_tag_captures_parenthesised_tail() {
    let tokens = lex("|/take_until(:stop, 'X')").unwrap();
    assert_eq!(tokens[0].tag, "/take_until(:stop, 'X')");
    assert_eq!(tokens[0].rest, "");
}

#[test]
fn call_args_keep_spaces_inside_parens() {
    let tokens = lex("|/pair(' ', 1)").unwrap();
    assert_eq!(tokens[0].tag, "/pair(' ', 1)");
}

#[test]
fn multi_line_part_records_first_line() {
    let src = indoc! {"
        |function[a]
          |c[x] ->
             |>>
    "};
    let tokens = lex(src).unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[2].tag, ">>");
    assert_eq!(tokens[2].lineno, 3);
}

#[test]
fn comment_between_parts() {
    let src = indoc! {"
        |parser[p] ; the machine name
        |type[text] content ; a type
    "};
    let tokens = lex(src).unwrap();
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].tag, "type");
    assert_eq!(tokens[1].rest, "content");
    assert_eq!(tokens[1].lineno, 2);
}

#[test]
fn token_linenos_stay_in_input_range() {
    let src = "|a\n|b\n|c\n";
    let line_count = src.lines().count() as u32;
    for token in lex(src).unwrap() {
        assert!(token.lineno >= 1 && token.lineno <= line_count);
    }
}
