//! Command line shared by every language server binary.

use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{ArgGroup, CommandFactory, FromArgMatches, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::languages::LanguageDefinition;
use crate::server::StardogLanguageServer;
use crate::transport::{self, Transport};

/// Environment variable holding the log filter, e.g. `debug` or
/// `stardog_lsp=trace`.
pub const LOG_ENV: &str = "STARDOG_LSP_LOG";

#[derive(Debug, Parser)]
#[command(group(
    ArgGroup::new("transport")
        .required(true)
        .args(["node_ipc", "stdio", "socket", "pipe"])
))]
pub struct Cli {
    /// Communicate over the Node.js IPC channel
    #[arg(long = "node-ipc")]
    pub node_ipc: bool,

    /// Communicate over stdin and stdout
    #[arg(long)]
    pub stdio: bool,

    /// Connect to a client listening on this local TCP port
    #[arg(long, value_name = "PORT")]
    pub socket: Option<u16>,

    /// Connect to a client listening on this named pipe
    #[arg(long, value_name = "NAME")]
    pub pipe: Option<String>,

    /// Passed by some clients; unused
    #[arg(long = "clientProcessId", hide = true)]
    pub client_process_id: Option<u32>,
}

impl Cli {
    pub fn transport(&self) -> Transport {
        if let Some(port) = self.socket {
            Transport::Socket(port)
        } else if let Some(name) = &self.pipe {
            Transport::Pipe(name.clone())
        } else if self.node_ipc {
            Transport::NodeIpc
        } else {
            Transport::Stdio
        }
    }
}

/// Parse `args` with the binary named after `definition`.
pub fn parse_args<I, T>(definition: &dyn LanguageDefinition, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let command = Cli::command()
        .name(definition.server_name())
        .version(env!("CARGO_PKG_VERSION"))
        .about(format!("{} language server", definition.display_name()));
    let matches = command.try_get_matches_from(args)?;
    Cli::from_arg_matches(&matches)
}

/// Send logs to stderr; stdout may carry the protocol.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Entry point of every binary: [`run`] on a current-thread runtime.
///
/// The runtime is shut down without waiting for blocking work. After `exit`
/// the stdin reader may still sit in a blocking read on its own thread, and
/// waiting for it would keep the process alive until the client closes the
/// stream.
pub fn main<D: LanguageDefinition>(definition: D) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(run(definition));
    runtime.shutdown_background();
    code
}

/// Exits with success only when the client asked for `shutdown` before the
/// connection ended.
pub async fn run<D: LanguageDefinition>(definition: D) -> ExitCode {
    let cli = match parse_args(&definition, std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging();
    let transport = cli.transport();
    info!(
        server = definition.server_name(),
        version = env!("CARGO_PKG_VERSION"),
        ?transport,
        "starting"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let (service, socket) = StardogLanguageServer::service(Arc::new(definition), shutdown.clone());
    if let Err(err) = transport::serve(transport, service, socket).await {
        error!(%err, "transport failed");
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }

    if shutdown.load(Ordering::SeqCst) {
        ExitCode::SUCCESS
    } else {
        info!("exited without a shutdown request");
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{SparqlLanguage, TurtleLanguage};
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let argv = std::iter::once("sparql-language-server").chain(args.iter().copied());
        parse_args(&SparqlLanguage, argv)
    }

    #[test]
    fn each_flag_selects_its_transport() {
        assert_eq!(parse(&["--stdio"]).unwrap().transport(), Transport::Stdio);
        assert_eq!(parse(&["--node-ipc"]).unwrap().transport(), Transport::NodeIpc);
        assert_eq!(
            parse(&["--socket=5007"]).unwrap().transport(),
            Transport::Socket(5007)
        );
        assert_eq!(
            parse(&["--pipe", "/tmp/lsp.sock"]).unwrap().transport(),
            Transport::Pipe("/tmp/lsp.sock".into())
        );
    }

    #[test]
    fn client_process_id_is_accepted() {
        let cli = parse(&["--stdio", "--clientProcessId=4242"]).unwrap();
        assert_eq!(cli.client_process_id, Some(4242));
    }

    #[test]
    fn a_transport_is_required() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn transports_are_exclusive() {
        let err = parse(&["--stdio", "--node-ipc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn help_names_the_language() {
        let err = parse_args(&TurtleLanguage, ["turtle-language-server", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("Turtle language server"));
        assert!(!err.to_string().contains("clientProcessId"));
    }
}
