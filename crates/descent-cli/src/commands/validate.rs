use std::path::Path;

use descent_lib::{Compiler, DiagnosticsPrinter};

use super::{fail, read_source};

pub fn run(file: &Path) {
    let source = read_source(file);
    let compiler = match Compiler::new(&source) {
        Ok(compiler) => compiler,
        Err(e) => fail(file, &e),
    };

    let name = file.display().to_string();
    print!(
        "{}",
        DiagnosticsPrinter::new(compiler.diagnostics())
            .file(&name)
            .render()
    );
    if !compiler.is_valid() {
        std::process::exit(1);
    }
}
