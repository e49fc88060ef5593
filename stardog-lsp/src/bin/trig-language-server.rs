use std::process::ExitCode;

use stardog_lsp::languages::TrigLanguage;

fn main() -> ExitCode {
    stardog_lsp::cli::main(TrigLanguage)
}
