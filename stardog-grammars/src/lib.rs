//! Grammar front-ends for the Stardog language servers
//!
//! Each front-end lexes a document with a longest-match [`lexer::Lexer`],
//! parses it with hand-written recursive-descent rules on top of
//! [`parser::Parser`], and implements [`stardog_analysis::grammar::Grammar`]
//! so the analysis engine can drive it without knowing the language.
//!
//! The same rule functions serve two purposes. A full parse builds the
//! concrete syntax tree and stops at the first syntax error. Content assist
//! replays a token prefix through the rules and records, at the end of the
//! prefix, every token type a rule was willing to accept.
//!
//! - `sparql`: SPARQL 1.1 query and update, plus Stardog's `PATHS` queries
//! - `graphql`: executable GraphQL, plus Stardog's directives
//! - `turtle`: Turtle and TriG
//! - `rdf`: terminals and term rules the RDF syntaxes share

pub mod lexer;
pub mod messages;
pub mod parser;

pub mod graphql;
pub mod rdf;
pub mod sparql;
pub mod turtle;

pub use graphql::{GraphQlDialect, GraphQlGrammar};
pub use sparql::{SparqlDialect, SparqlGrammar};
pub use turtle::{RdfSyntax, TurtleGrammar};
