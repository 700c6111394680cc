mod cli;
mod commands;

use cli::{resolve_templates_dir, Cli, Command};
use commands::debug::DebugArgs;
use commands::generate::GenerateArgs;

fn main() {
    let cli = <Cli as clap::Parser>::parse();

    match cli.command {
        Command::Generate {
            file,
            output,
            target,
            templates,
            trace,
        } => {
            commands::generate::run(GenerateArgs {
                file,
                output,
                target,
                templates_dir: resolve_templates_dir(templates),
                trace,
            });
        }
        Command::Validate { file } => {
            commands::validate::run(&file);
        }
        Command::Debug {
            file,
            tokens,
            ast,
            ir,
        } => {
            // no flags means every stage
            let all = !(tokens || ast || ir);
            commands::debug::run(DebugArgs {
                file,
                tokens: tokens || all,
                ast: ast || all,
                ir: ir || all,
            });
        }
    }
}
