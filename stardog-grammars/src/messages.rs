//! Syntax error texts.

use crate::lexer::Vocabulary;

pub const NOT_ALL_INPUT_PARSED: &str = "Expected EOF.";
pub const TOO_DEEP: &str = "Maximum nesting depth exceeded.";

/// `'}' expected.`
pub fn mismatched_token(vocabulary: &Vocabulary, expected: &str) -> String {
    format!("{} expected.", vocabulary.display_name(expected))
}

/// One line per alternative, matching the layout editors already show for
/// these grammars.
pub fn expected_one_of(vocabulary: &Vocabulary, expected: &[&str]) -> String {
    let mut message = String::from("\tExpected one of the following:");
    for name in expected {
        message.push_str("\n ");
        message.push_str(&vocabulary.display_name(name));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::pattern;
    use stardog_analysis::token::TokenType;

    #[test]
    fn display_names_prefer_labels_then_quoted_text() {
        let vocabulary = Vocabulary::new(vec![
            TokenType::literal("RCurly", "}"),
            TokenType::keyword("PATHS_SHORTEST", "paths  shortest"),
            TokenType::regex("PNAME_NS", pattern(r"^\w*:")).with_label("foaf:"),
            TokenType::regex("VAR1", pattern(r"^\?\w+")),
        ]);
        assert_eq!(mismatched_token(&vocabulary, "RCurly"), "'}' expected.");
        assert_eq!(
            expected_one_of(&vocabulary, &["PATHS_SHORTEST", "PNAME_NS", "VAR1"]),
            "\tExpected one of the following:\n 'paths shortest'\n PNAME_NS e.g. foaf:\n VAR1"
        );
    }
}
