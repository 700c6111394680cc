use std::path::PathBuf;

use descent_lib::{Compiler, DiagnosticsPrinter, GenerateOptions};

use super::{fail, read_source};

pub struct GenerateArgs {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub target: String,
    pub templates_dir: PathBuf,
    pub trace: bool,
}

pub fn run(args: GenerateArgs) {
    let source = read_source(&args.file);
    let compiler = match Compiler::new(&source) {
        Ok(compiler) => compiler,
        Err(e) => fail(&args.file, &e),
    };

    let file = args.file.display().to_string();
    if compiler.diagnostics().has_errors() {
        eprint!(
            "{}",
            DiagnosticsPrinter::new(compiler.diagnostics())
                .file(&file)
                .render()
        );
        std::process::exit(1);
    }
    for warning in compiler.diagnostics().warnings() {
        eprintln!("{} ({}:{}): {}", warning.severity(), file, warning.line(), warning.message());
    }

    let rendered = match compiler.generate(&GenerateOptions {
        target: args.target,
        templates_dir: args.templates_dir,
        trace: args.trace,
    }) {
        Ok(rendered) => rendered,
        Err(e) => fail(&args.file, &e),
    };

    match args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, rendered) {
                eprintln!("ERROR ({}): {e}", path.display());
                std::process::exit(1);
            }
        }
        None => print!("{rendered}"),
    }
}
