use std::process::ExitCode;

use stardog_lsp::languages::TurtleLanguage;

fn main() -> ExitCode {
    stardog_lsp::cli::main(TurtleLanguage)
}
