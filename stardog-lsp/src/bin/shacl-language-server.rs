use std::process::ExitCode;

use stardog_lsp::languages::ShaclLanguage;

fn main() -> ExitCode {
    stardog_lsp::cli::main(ShaclLanguage)
}
