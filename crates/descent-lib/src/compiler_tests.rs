use std::path::PathBuf;

use indoc::indoc;

use super::{Compiler, Error, GenerateOptions};

const VALID: &str = indoc! {"
    |parser[words]
    |entry-point[word]
    |type[word] content
    |function[word] -> word
    |c[' '] term |return
    |default -> |>>
"};

/// Writes a throwaway template directory and returns its root.
fn template_dir(main: &str, partials: &[(&str, &str)]) -> PathBuf {
    static COUNTER: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "descent-test-{}-{id}",
        std::process::id()
    ));
    let target = root.join("rust");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("parser.j2"), main).unwrap();
    for (name, source) in partials {
        std::fs::write(target.join(format!("_{name}.j2")), source).unwrap();
    }
    root
}

#[test]
fn valid_source_compiles_cleanly() {
    let compiler = Compiler::new(VALID).unwrap();
    assert!(compiler.is_valid());
    assert!(compiler.diagnostics().is_empty());
    assert_eq!(compiler.ir().entry_point, "word");
    assert_eq!(compiler.tokens()[0].tag, "parser");
    assert_eq!(compiler.machine().name, "words");
}

#[test]
fn lex_error_surfaces_with_line() {
    let err = Compiler::new("|a\n|x = 'oops").unwrap_err();
    assert!(matches!(err, Error::Lex(_)));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn parse_error_surfaces_with_line() {
    let err = Compiler::new("|wibble[x]").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(err.line(), Some(1));
}

#[test]
fn build_error_surfaces_with_line() {
    let err = Compiler::new(indoc! {"
        |function[f]
        |c[a] ->[XID_START]
    "})
    .unwrap_err();
    assert!(matches!(err, Error::Build(_)));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn generate_refuses_invalid_machines() {
    let compiler = Compiler::new("|entry-point[missing]").unwrap();
    assert!(!compiler.is_valid());
    let err = compiler.generate(&GenerateOptions::default()).unwrap_err();
    let Error::Invalid(diags) = err else {
        panic!("expected validation failure");
    };
    assert!(diags.has_errors());
}

#[test]
fn generate_renders_through_template_and_partials() {
    let compiler = Compiler::new(VALID).unwrap();
    let templates_dir = template_dir(
        indoc! {r#"
            // {{ name }} -> {{ entry_point }}
            {% include "events" %}
            {% for f in functions %}
            fn parse_{{ f.name }}() {
            }
            {% endfor %}
        "#},
        &[(
            "events",
            "{% for t in types %}enum {{ t.name | pascalcase }} {\n}\n{% endfor %}",
        )],
    );
    let out = compiler
        .generate(&GenerateOptions {
            target: "rust".to_string(),
            templates_dir,
            trace: false,
        })
        .unwrap();
    assert!(out.contains("// words -> word"));
    assert!(out.contains("enum Word {"));
    assert!(out.contains("fn parse_word() {"));
    // post-processing separates top-level items with one blank line
    assert!(out.contains("}\n\nfn parse_word"));
    assert!(!out.contains("\n\n\n"));
}

#[test]
fn unknown_target_is_reported() {
    let compiler = Compiler::new(VALID).unwrap();
    let templates_dir = template_dir("x", &[]);
    let err = compiler
        .generate(&GenerateOptions {
            target: "fortran".to_string(),
            templates_dir,
            trace: false,
        })
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTarget(t) if t == "fortran"));
}

#[test]
fn template_errors_surface() {
    let compiler = Compiler::new(VALID).unwrap();
    let templates_dir = template_dir("{{ undefined_filter | nope }}", &[]);
    let err = compiler
        .generate(&GenerateOptions {
            target: "rust".to_string(),
            templates_dir,
            trace: false,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Render(_)));
}

#[test]
fn warnings_do_not_block_generation() {
    let compiler = Compiler::new(indoc! {"
        |parser[p]
        |entry-point[f]
        |function[f]
        |c[a] /missing()
    "})
    .unwrap();
    assert!(compiler.is_valid());
    assert!(compiler.diagnostics().has_warnings());
    let templates_dir = template_dir("ok: {{ name }}", &[]);
    let out = compiler
        .generate(&GenerateOptions {
            target: "rust".to_string(),
            templates_dir,
            trace: false,
        })
        .unwrap();
    assert_eq!(out, "ok: p\n");
}
