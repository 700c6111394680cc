//! Render-context construction and template-driven emission.
//!
//! All target-specific knowledge lives in the template; this module only
//! assembles the context, registers the filter set, resolves partials,
//! and tidies the rendered text.

mod context;
mod filters;
mod postprocess;

#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod postprocess_tests;

pub use context::{build_context, Context, KeywordsCtx, Uses};
pub use filters::{pascalcase, rust_expr, transform_call_args};

use std::path::{Path, PathBuf};

use minijinja::Environment;

use crate::ir;
use crate::Error;

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Target language: names a directory under `templates_dir`.
    pub target: String,
    pub templates_dir: PathBuf,
    /// Compile per-state tracing into the generated parser.
    pub trace: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            target: "rust".to_string(),
            templates_dir: PathBuf::from("templates"),
            trace: false,
        }
    }
}

/// Renders the IR through `<templates_dir>/<target>/parser.j2`.
pub fn generate(ir: &ir::Parser, opts: &GenerateOptions) -> Result<String, Error> {
    let target_dir = opts.templates_dir.join(&opts.target);
    if !target_dir.join("parser.j2").is_file() {
        return Err(Error::UnknownTarget(opts.target.clone()));
    }

    let mut env = Environment::new();
    filters::register(&mut env);
    env.set_loader(partial_loader(target_dir));

    let ctx = build_context(ir, opts.trace);
    let template = env.get_template("parser")?;
    let rendered = template.render(minijinja::Value::from_serialize(&ctx))?;
    Ok(postprocess::tidy(&rendered))
}

/// Resolves `{% include "name" %}` to `_name.j2` in the target directory;
/// the main template keeps its bare name.
fn partial_loader(
    dir: impl AsRef<Path>,
) -> impl Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync + 'static {
    let dir = dir.as_ref().to_path_buf();
    move |name| {
        let file = if name == "parser" {
            "parser.j2".to_string()
        } else {
            format!("_{name}.j2")
        };
        match std::fs::read_to_string(dir.join(&file)) {
            Ok(source) => Ok(Some(source)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(minijinja::Error::new(
                minijinja::ErrorKind::InvalidOperation,
                format!("failed to read template `{file}`"),
            )
            .with_source(e)),
        }
    }
}
