//! Prints pipeline intermediates: tokens, AST, analysed IR.
//!
//! Each stage prints as far as the pipeline gets; a fatal error is
//! reported after the stages that preceded it.

use std::fmt::Write as _;
use std::path::PathBuf;

use descent_lib::{ast, chars, ir, lexer};

use super::{fail, read_source};

pub struct DebugArgs {
    pub file: PathBuf,
    pub tokens: bool,
    pub ast: bool,
    pub ir: bool,
}

pub fn run(args: DebugArgs) {
    let source = read_source(&args.file);

    let tokens = match lexer::lex(&source) {
        Ok(tokens) => tokens,
        Err(e) => fail(&args.file, &e.into()),
    };
    if args.tokens {
        println!("== tokens ==");
        print!("{}", dump_tokens(&tokens));
    }

    let machine = match ast::parse(&tokens) {
        Ok(machine) => machine,
        Err(e) => fail(&args.file, &e.into()),
    };
    if args.ast {
        println!("== ast ==");
        print!("{}", dump_machine(&machine));
    }

    let parser = match ir::build(&machine) {
        Ok(parser) => parser,
        Err(e) => fail(&args.file, &e.into()),
    };
    if args.ir {
        println!("== ir ==");
        print!("{}", dump_ir(&parser));
    }
}

pub fn dump_tokens(tokens: &[lexer::Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        let _ = write!(out, "{:>4}  {}", token.lineno, token.tag);
        if !token.id.is_empty() {
            let _ = write!(out, " [{}]", token.id);
        }
        if !token.rest.is_empty() {
            let _ = write!(out, "  {}", token.rest);
        }
        out.push('\n');
    }
    out
}

pub fn dump_machine(machine: &ast::Machine) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "machine {}", machine.name);
    if !machine.entry_point.is_empty() {
        let _ = writeln!(out, "  entry-point {}", machine.entry_point);
    }
    for ty in &machine.types {
        let _ = writeln!(out, "  type {} {}", ty.name, ty.kind);
    }
    for block in &machine.keywords {
        let _ = writeln!(out, "  keywords {} ({} mappings)", block.name, block.mappings.len());
    }
    for func in &machine.functions {
        let _ = write!(out, "  function {}", func.name);
        if !func.params.is_empty() {
            let _ = write!(out, "({})", func.params.join(", "));
        }
        if let Some(ret) = &func.return_type {
            let _ = write!(out, " -> {ret}");
        }
        out.push('\n');
        if !func.entry_actions.is_empty() {
            let _ = writeln!(out, "    entry: {} action(s)", func.entry_actions.len());
        }
        for state in &func.states {
            let _ = writeln!(
                out,
                "    state {} ({} cases)",
                state.name.as_deref().unwrap_or("<main>"),
                state.cases.len()
            );
        }
        if func.eof_handler.is_some() {
            let _ = writeln!(out, "    eof handler");
        }
    }
    out
}

pub fn dump_ir(parser: &ir::Parser) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "parser {} entry={}", parser.name, parser.entry_point);
    if !parser.custom_error_codes.is_empty() {
        let _ = writeln!(out, "  error codes: {}", parser.custom_error_codes.join(", "));
    }
    for func in &parser.functions {
        let _ = writeln!(out, "  function {}", func.name);
        for (param, ty) in &func.param_types {
            let _ = writeln!(out, "    param {param}: {}", param_type_name(*ty));
        }
        for (var, ty) in &func.locals {
            match func.local_init_values.get(var) {
                Some(init) => {
                    let _ = writeln!(out, "    local {var}: {ty} = {init}");
                }
                None => {
                    let _ = writeln!(out, "    local {var}: {ty}");
                }
            }
        }
        if let Some(b) = func.expects_char {
            let _ = writeln!(
                out,
                "    expects {} flush={}",
                chars::rust_byte_literal(b),
                func.emits_content_on_close
            );
        }
        for state in &func.states {
            let _ = write!(
                out,
                "    state {}",
                state.name.as_deref().unwrap_or("<main>")
            );
            if !state.scan_chars.is_empty() {
                let rendered: Vec<String> = state
                    .scan_chars
                    .iter()
                    .map(|&b| chars::rust_byte_literal(b))
                    .collect();
                let _ = write!(out, " scan=[{}]", rendered.join(", "));
                if state.newline_injected {
                    let _ = write!(out, " nl-injected");
                }
            }
            let _ = writeln!(out, " ({} cases)", state.cases.len());
        }
    }
    out
}

fn param_type_name(ty: ir::ParamType) -> &'static str {
    match ty {
        ir::ParamType::I32 => "i32",
        ir::ParamType::Byte => "byte",
        ir::ParamType::Bytes => "bytes",
    }
}
