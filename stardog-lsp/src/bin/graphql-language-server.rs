use std::process::ExitCode;

use stardog_lsp::languages::GraphQlLanguage;

fn main() -> ExitCode {
    stardog_lsp::cli::main(GraphQlLanguage)
}
