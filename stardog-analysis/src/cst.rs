//! Concrete syntax tree produced by grammar front-ends.

use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum CstNode {
    Rule(RuleNode),
    Token(Token),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub name: String,
    pub children: Vec<CstNode>,
}

impl RuleNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Every token under this rule, in document order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        for child in &self.children {
            child.collect_tokens(&mut tokens);
        }
        tokens
    }

    /// Covering span of the rule's tokens, end exclusive.
    pub fn span(&self) -> Option<(usize, usize)> {
        let tokens = self.tokens();
        let start = tokens.iter().map(|token| token.start_offset).min()?;
        let end = tokens.iter().map(|token| token.end()).max()?;
        Some((start, end))
    }
}

impl CstNode {
    pub fn rule(name: impl Into<String>, children: Vec<CstNode>) -> Self {
        CstNode::Rule(RuleNode {
            name: name.into(),
            children,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            CstNode::Rule(rule) => &rule.name,
            CstNode::Token(token) => token.name(),
        }
    }

    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        self.collect_tokens(&mut tokens);
        tokens
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            CstNode::Token(token) => out.push(token),
            CstNode::Rule(rule) => {
                for child in &rule.children {
                    child.collect_tokens(out);
                }
            }
        }
    }

    /// Apply `f` to every token in the tree.
    pub fn for_each_token_mut(&mut self, f: &mut impl FnMut(&mut Token)) {
        match self {
            CstNode::Token(token) => f(token),
            CstNode::Rule(rule) => {
                for child in &mut rule.children {
                    child.for_each_token_mut(f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;
    use std::sync::Arc;

    #[test]
    fn rule_span_covers_all_descendant_tokens() {
        let ty = Arc::new(TokenType::literal("X", "x"));
        let tree = RuleNode {
            name: "Outer".into(),
            children: vec![
                CstNode::Token(Token::new(ty.clone(), "ab", 2)),
                CstNode::rule("Inner", vec![CstNode::Token(Token::new(ty, "cde", 6))]),
            ],
        };
        assert_eq!(tree.span(), Some((2, 9)));
        assert_eq!(tree.tokens().len(), 2);
        assert_eq!(RuleNode::new("Empty").span(), None);
    }
}
