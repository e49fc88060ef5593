//! Connections between the server and its client.
//!
//! Socket and pipe transports dial out to a client that is already listening.
//! Node IPC speaks newline-delimited JSON over the channel a Node.js parent
//! opens on `NODE_CHANNEL_FD`; it is bridged to the framed stream tower-lsp
//! expects.

use std::io;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
};
use tokio::sync::Notify;
use tower::Service;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::{ClientSocket, ExitedError, LspService, Server};
use tracing::{debug, info, warn};

use crate::server::StardogLanguageServer;

/// Environment variable a Node.js parent uses to hand over its IPC channel.
pub const NODE_CHANNEL_FD: &str = "NODE_CHANNEL_FD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    NodeIpc,
    /// Connect to a client listening on `127.0.0.1:<port>`.
    Socket(u16),
    /// Connect to a client listening on a named pipe or Unix socket.
    Pipe(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to 127.0.0.1:{port}: {source}")]
    Socket { port: u16, source: io::Error },
    #[error("failed to connect to pipe {name}: {source}")]
    Pipe { name: String, source: io::Error },
    #[error("{NODE_CHANNEL_FD} is not set; --node-ipc requires a Node.js parent process")]
    MissingIpcChannel,
    #[error("{NODE_CHANNEL_FD} holds {0:?}, which is not a file descriptor")]
    InvalidIpcChannel(String),
    #[error("failed to open the node IPC channel: {0}")]
    IpcChannel(io::Error),
    #[error("node IPC is not supported on this platform")]
    IpcUnsupported,
}

/// Serve `service` over `transport` until the client exits or disconnects.
pub async fn serve(
    transport: Transport,
    service: LspService<StardogLanguageServer>,
    socket: ClientSocket,
) -> Result<(), TransportError> {
    match transport {
        Transport::Stdio => {
            info!("serving over stdio");
            serve_until_exit(tokio::io::stdin(), tokio::io::stdout(), socket, service).await;
        }
        Transport::Socket(port) => {
            let stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .map_err(|source| TransportError::Socket { port, source })?;
            info!(port, "connected over socket");
            let (read, write) = stream.into_split();
            serve_until_exit(read, write, socket, service).await;
        }
        Transport::Pipe(name) => {
            let (read, write) = connect_pipe(&name).await?;
            info!(pipe = %name, "connected over pipe");
            serve_until_exit(read, write, socket, service).await;
        }
        Transport::NodeIpc => serve_node_ipc(service, socket).await?,
    }
    Ok(())
}

/// Passes requests through, signalling once the client sends `exit`.
struct ExitNotifier<S> {
    inner: S,
    exited: Arc<Notify>,
}

impl<S> Service<Request> for ExitNotifier<S>
where
    S: Service<Request, Response = Option<Response>, Error = ExitedError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let exiting = request.method() == "exit";
        let response = self.inner.call(request);
        if exiting {
            self.exited.notify_one();
        }
        response
    }
}

/// tower-lsp only notices `exit` when the next message arrives or the input
/// closes, so stop as soon as the notification has been handled.
async fn serve_until_exit<I, O>(
    read: I,
    write: O,
    socket: ClientSocket,
    service: LspService<StardogLanguageServer>,
) where
    I: AsyncRead + Unpin,
    O: AsyncWrite,
{
    let exited = Arc::new(Notify::new());
    let service = ExitNotifier {
        inner: service,
        exited: exited.clone(),
    };
    tokio::select! {
        _ = Server::new(read, write, socket).serve(service) => debug!("input closed"),
        _ = exited.notified() => debug!("exit received"),
    }
}

#[cfg(unix)]
async fn connect_pipe(
    name: &str,
) -> Result<(tokio::net::unix::OwnedReadHalf, tokio::net::unix::OwnedWriteHalf), TransportError> {
    let stream = tokio::net::UnixStream::connect(name)
        .await
        .map_err(|source| TransportError::Pipe {
            name: name.to_string(),
            source,
        })?;
    Ok(stream.into_split())
}

#[cfg(windows)]
async fn connect_pipe(
    name: &str,
) -> Result<
    (
        tokio::io::ReadHalf<tokio::net::windows::named_pipe::NamedPipeClient>,
        tokio::io::WriteHalf<tokio::net::windows::named_pipe::NamedPipeClient>,
    ),
    TransportError,
> {
    let client = tokio::net::windows::named_pipe::ClientOptions::new()
        .open(name)
        .map_err(|source| TransportError::Pipe {
            name: name.to_string(),
            source,
        })?;
    Ok(tokio::io::split(client))
}

#[cfg(unix)]
async fn serve_node_ipc(
    service: LspService<StardogLanguageServer>,
    socket: ClientSocket,
) -> Result<(), TransportError> {
    use std::os::unix::io::FromRawFd;

    let raw = std::env::var(NODE_CHANNEL_FD).map_err(|_| TransportError::MissingIpcChannel)?;
    let fd: i32 = raw
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidIpcChannel(raw.clone()))?;
    // SAFETY: the parent process created this socket for us and nothing else
    // in this process owns it.
    let channel = unsafe { std::os::unix::net::UnixStream::from_raw_fd(fd) };
    channel
        .set_nonblocking(true)
        .map_err(TransportError::IpcChannel)?;
    let channel = tokio::net::UnixStream::from_std(channel).map_err(TransportError::IpcChannel)?;
    info!(fd, "connected over node IPC");

    let (ipc_read, ipc_write) = channel.into_split();
    let (server_side, bridge_side) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_side);
    let (bridge_read, bridge_write) = tokio::io::split(bridge_side);

    tokio::spawn(async move {
        if let Err(err) = ipc_to_frames(tokio::io::BufReader::new(ipc_read), bridge_write).await {
            warn!(%err, "node IPC read side closed");
        }
    });
    tokio::spawn(async move {
        if let Err(err) = frames_to_ipc(tokio::io::BufReader::new(bridge_read), ipc_write).await {
            warn!(%err, "node IPC write side closed");
        }
    });

    serve_until_exit(server_read, server_write, socket, service).await;
    Ok(())
}

#[cfg(not(unix))]
async fn serve_node_ipc(
    _service: LspService<StardogLanguageServer>,
    _socket: ClientSocket,
) -> Result<(), TransportError> {
    Err(TransportError::IpcUnsupported)
}

/// Node's own control messages share the channel with JSON-RPC.
fn is_node_internal(message: &Value) -> bool {
    message
        .get("cmd")
        .and_then(Value::as_str)
        .map_or(false, |cmd| cmd.starts_with("NODE_"))
}

/// Re-frame newline-delimited JSON messages with `Content-Length` headers.
pub(crate) async fn ipc_to_frames<R, W>(mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return writer.shutdown().await;
        }
        let payload = line.trim();
        if payload.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(payload) {
            Ok(message) if is_node_internal(&message) => continue,
            Ok(_) => {}
            Err(err) => {
                warn!(%err, "dropping malformed IPC message");
                continue;
            }
        }
        writer
            .write_all(format!("Content-Length: {}\r\n\r\n", payload.len()).as_bytes())
            .await?;
        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await?;
    }
}

/// Strip `Content-Length` framing and emit one JSON message per line.
pub(crate) async fn frames_to_ipc<R, W>(mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(body) = read_frame(&mut reader).await? {
        writer.write_all(&body).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}

/// Next framed message body, or `None` at end of stream.
pub(crate) async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let header = line.trim_end();
        if header.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                let length = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                content_length = Some(length);
            }
        }
    }

    let mut body = vec![0; content_length.unwrap_or_default()];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}
