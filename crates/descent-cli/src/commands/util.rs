use std::path::Path;

use descent_lib::Error;

pub(crate) fn read_source(file: &Path) -> String {
    match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("ERROR ({}): {e}", file.display());
            std::process::exit(1);
        }
    }
}

/// Prints a fatal pipeline error in the `ERROR (<file>:<line>): <message>`
/// shape and exits non-zero.
pub(crate) fn fail(file: &Path, error: &Error) -> ! {
    match error.line() {
        Some(line) => eprintln!("ERROR ({}:{line}): {error}", file.display()),
        None => eprintln!("ERROR ({}): {error}", file.display()),
    }
    std::process::exit(1);
}
