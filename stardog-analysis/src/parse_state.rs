//! Per-document cache of the latest token list and syntax tree.
//!
//! The cache itself is plain data. The server keeps it next to the document
//! texts behind one async `RwLock`, so a request always sees a text together
//! with the parse of that same text.

use std::collections::HashMap;
use std::sync::Arc;

use lsp_types::Url;

use crate::cst::CstNode;
use crate::token::Token;

#[derive(Debug, Clone, Default)]
pub struct ParseState {
    pub cst: Option<Arc<CstNode>>,
    pub tokens: Option<Arc<Vec<Token>>>,
}

impl ParseState {
    pub fn is_empty(&self) -> bool {
        self.cst.is_none() && self.tokens.is_none()
    }
}

/// Fields to overwrite; `None` leaves the cached value untouched.
#[derive(Debug, Clone, Default)]
pub struct ParseStateUpdate {
    pub cst: Option<Arc<CstNode>>,
    pub tokens: Option<Arc<Vec<Token>>>,
}

impl ParseStateUpdate {
    pub fn full(cst: CstNode, tokens: Vec<Token>) -> Self {
        Self {
            cst: Some(Arc::new(cst)),
            tokens: Some(Arc::new(tokens)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParseStateCache {
    states: HashMap<Url, ParseState>,
}

impl ParseStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached state for `uri`; empty when nothing was saved since the last clear.
    pub fn get(&self, uri: &Url) -> ParseState {
        self.states.get(uri).cloned().unwrap_or_default()
    }

    pub fn save(&mut self, uri: Url, update: ParseStateUpdate) {
        let state = self.states.entry(uri).or_default();
        if let Some(cst) = update.cst {
            state.cst = Some(cst);
        }
        if let Some(tokens) = update.tokens {
            state.tokens = Some(tokens);
        }
    }

    pub fn clear(&mut self, uri: &Url) {
        self.states.remove(uri);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
