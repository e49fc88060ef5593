//! Grammar-rule hover.
//!
//! Hovering a token reports the rule that directly encloses it, highlighted
//! across every token that rule covers.

use crate::cst::{CstNode, RuleNode};
use crate::token::Token;

/// A token and the rules enclosing it, outermost first.
#[derive(Debug, Clone)]
pub struct TokenPath<'a> {
    pub token: &'a Token,
    pub ancestors: Vec<&'a RuleNode>,
}

impl<'a> TokenPath<'a> {
    pub fn enclosing_rule(&self) -> Option<&'a RuleNode> {
        self.ancestors.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResult {
    pub rule: String,
    /// Byte span of the rule's tokens, end exclusive.
    pub start: usize,
    pub end: usize,
}

/// First token (depth-first) whose inclusive span contains `offset`.
pub fn find_token_path(root: &CstNode, offset: usize) -> Option<TokenPath<'_>> {
    let mut ancestors = Vec::new();
    walk(root, offset, &mut ancestors)
}

fn walk<'a>(
    node: &'a CstNode,
    offset: usize,
    ancestors: &mut Vec<&'a RuleNode>,
) -> Option<TokenPath<'a>> {
    match node {
        CstNode::Token(token) => {
            let contains = !token.is_end_of_input()
                && token.start_offset <= offset
                && offset <= token.end_offset;
            contains.then(|| TokenPath {
                token,
                ancestors: ancestors.clone(),
            })
        }
        CstNode::Rule(rule) => {
            ancestors.push(rule);
            let found = rule
                .children
                .iter()
                .find_map(|child| walk(child, offset, ancestors));
            ancestors.pop();
            found
        }
    }
}

pub fn hover(root: &CstNode, offset: usize) -> Option<HoverResult> {
    let path = find_token_path(root, offset)?;
    let rule = path.enclosing_rule()?;
    let (start, end) = rule.span()?;
    Some(HoverResult {
        rule: rule.name.clone(),
        start,
        end,
    })
}
