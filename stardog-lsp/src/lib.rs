//! Language servers for SPARQL, GraphQL, Turtle, TriG and SHACL
//!
//! One engine serves five languages. Each binary picks a [`LanguageDefinition`](languages::LanguageDefinition),
//! which turns the client's initialization options into a `LanguageProfile`: the grammar, the
//! entry rule, completion and diagnostic settings, and an optional completion augmenter.
//! Stardog's extensions (path queries, GraphQL directives) are on unless the client asks for
//! the plain grammar through `initializationOptions.grammar`.
//!
//! # Feature Set
//!
//! 1. Diagnostics (`textDocument/publishDiagnostics`):
//!    - At most one syntax error per document, positioned on the offending token
//!    - Lexical errors for the RDF syntaxes, undeclared prefixes as semantic errors
//! 2. Completion (`textDocument/completion`):
//!    - Grammar candidates at the cursor, keywords first-class
//!    - SPARQL: document variables, prefixes, IRIs, database relationships and types
//!    - GraphQL: insertion points between tokens and the Stardog directives
//!    - SHACL: the `sh:` vocabulary wherever a prefixed name is expected
//! 3. Hover (`textDocument/hover`):
//!    - The grammar rule directly enclosing the token under the cursor
//! 4. Folding Ranges (`textDocument/foldingRange`):
//!    - Runs of prefix declarations and indented blocks
//!
//! Databases feed completion through the `$/didUpdateCompletionData` notification: namespace
//! prefixes plus relationship and type counts.
//!
//! # Architecture
//!
//! - LSP layer (tower-lsp): JSON-RPC, capability negotiation, request routing
//! - Server layer (this crate):
//!   - [`StardogLanguageServer`] keeps document text and its parse per URI
//!   - [`transport`] connects over stdio, node IPC, a socket or a pipe
//!   - [`cli`] is the shared entry point of the binaries
//! - Analysis layer (stardog-analysis, stardog-grammars): grammars, content assist,
//!   diagnostics, hover and folding over plain data, with no LSP state
//!
//! # Error Handling and Robustness
//!
//! - No `unwrap()` or `expect()` outside tests.
//! - A panicking feature is logged and answered with an empty result.
//! - `proptest` drives random documents and cursor positions through every handler.
//!
//! # Usage
//!
//! ```text
//! $ sparql-language-server --stdio
//! $ graphql-language-server --socket=5007
//! $ turtle-language-server --node-ipc
//! $ trig-language-server --pipe=/tmp/trig.sock
//! $ shacl-language-server --stdio
//! ```
//!
//! Log verbosity is read from `STARDOG_LSP_LOG` (an `EnvFilter` directive); logs go to stderr.

pub mod cli;
pub mod languages;
pub mod server;
pub mod transport;

pub use server::StardogLanguageServer;
