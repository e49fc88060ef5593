use std::process::ExitCode;

use stardog_lsp::languages::SparqlLanguage;

fn main() -> ExitCode {
    stardog_lsp::cli::main(SparqlLanguage)
}
