use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "descent", bin_name = "descent")]
#[command(about = "Generate callback-based byte parsers from .desc machine descriptions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate parser source from a machine description
    #[command(after_help = r#"EXAMPLES:
  descent generate json.desc                  # print to stdout
  descent generate json.desc -o parser.rs     # write to file
  descent generate json.desc --trace          # tracing build"#)]
    Generate {
        /// Machine description file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write output here instead of stdout
        #[arg(short = 'o', long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Target language (names a template directory)
        #[arg(long, default_value = "rust", value_name = "TARGET")]
        target: String,

        /// Template root (default: $DESCENT_TEMPLATES, then ./templates)
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,

        /// Compile per-state tracing into the generated parser
        #[arg(long)]
        trace: bool,
    },

    /// Check a machine description and print the full report
    Validate {
        /// Machine description file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print intermediate pipeline stages
    #[command(after_help = r#"EXAMPLES:
  descent debug json.desc             # all stages
  descent debug json.desc --tokens    # token stream only
  descent debug json.desc --ir        # analysed IR only"#)]
    Debug {
        /// Machine description file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the token stream
        #[arg(long)]
        tokens: bool,

        /// Print the structural tree
        #[arg(long)]
        ast: bool,

        /// Print the analysed IR
        #[arg(long)]
        ir: bool,
    },
}

/// `--templates`, then `$DESCENT_TEMPLATES`, then `./templates`.
pub fn resolve_templates_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("DESCENT_TEMPLATES").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("templates"))
}
