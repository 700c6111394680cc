use indoc::indoc;

use super::postprocess::tidy;

#[test]
fn collapses_blank_runs() {
    let input = "a\n\n\n\nb\n";
    assert_eq!(tidy(input), "a\n\nb\n");
}

#[test]
fn inserts_blank_after_top_level_brace() {
    let input = indoc! {"
        fn a() {
        }
        fn b() {
        }
    "};
    assert_eq!(
        tidy(input),
        indoc! {"
            fn a() {
            }

            fn b() {
            }
        "}
    );
}

#[test]
fn no_double_blank_when_one_already_present() {
    let input = "fn a() {\n}\n\nfn b() {\n}\n";
    assert_eq!(tidy(input), "fn a() {\n}\n\nfn b() {\n}\n");
}

#[test]
fn indented_lines_do_not_trigger_separation() {
    let input = "impl X {\n    fn a() {\n    }\n    fn b() {\n    }\n}\n";
    assert_eq!(tidy(input), input);
}

#[test]
fn strips_leading_and_trailing_blanks() {
    assert_eq!(tidy("\n\nx\n\n\n"), "x\n");
}

#[test]
fn is_idempotent() {
    let input = "fn a() {\n}\nfn b() {\n}\n\n\nfn c() {\n}\n";
    let once = tidy(input);
    assert_eq!(tidy(&once), once);
}
