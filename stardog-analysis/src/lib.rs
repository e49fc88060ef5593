//! Shared language-server engine for the Stardog query and data languages
//!
//! This crate turns the output of a grammar front-end (tokens, a concrete
//! syntax tree, syntax errors and content-assist candidates) into editor
//! features: diagnostics, completion, hover and folding. It knows nothing
//! about any particular language. Each language supplies a
//! [`profile::LanguageProfile`] describing its grammar and hooks.
//!
//! # Architecture
//!
//! - `token`, `cst`: the data every front-end produces
//! - `position`: byte offset ⇄ LSP position conversion, token lookup
//! - `grammar`: the front-end contract and parse output
//! - `escapes`: codepoint-escape normalization and offset remapping
//! - `parse_state`: per-document cache of the latest parse
//! - `diagnostics`: lexical and syntactic diagnostics
//! - `completion`: the cursor-aware completion pipeline
//! - `namespaces`, `completion_data`: namespace aliases and database
//!   bindings pushed by the client
//! - `hover`: rule-scoped hover over the syntax tree
//! - `folding`: prefix-block and indentation folding over raw text
//!
//! # Design Principles
//!
//! - **Stateless**: features are functions of their inputs; the only state
//!   (the parse-state cache and completion data) is plain data owned by the
//!   caller
//! - **Protocol-light**: results use byte offsets, with `lsp-types` only for
//!   shared value types like `Diagnostic`
//! - **Never fails**: missing tokens or rules yield empty results
//!
//! # Usage
//!
//! ```rust,ignore
//! use stardog_analysis::{completion, diagnostics, grammar};
//!
//! let output = grammar::parse_document(profile.grammar.as_ref(), text);
//! let diagnostics = diagnostics::collect_diagnostics(text, &output, &profile.diagnostics);
//! let items = completion::completions(&profile, text, &output.tokens, offset, &data);
//! ```

// Core data
pub mod cst;
pub mod position;
pub mod token;

// Front-end contract
pub mod escapes;
pub mod grammar;
pub mod profile;

// Features
pub mod completion;
pub mod completion_data;
pub mod diagnostics;
pub mod folding;
pub mod hover;
pub mod namespaces;
pub mod parse_state;
