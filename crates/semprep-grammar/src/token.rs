//! Tokens and the tokenizer collaborator.
//!
//! Real NLP tokenization (POS tags, lemmas) is out of scope for this
//! workspace; [`WordTokenizer`] is a deliberately plain default so the
//! pipeline and its tests run without an external stack. Callers with a
//! linguistic tokenizer implement [`Tokenizer`] over it.

use serde::{Deserialize, Serialize};

/// One question or table token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Token { text: text.into() }
    }
}

/// Tokenizer collaborator.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Whitespace tokenizer that splits trailing/leading punctuation into their
/// own tokens. Input is expected to already be lowercased by the caller.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            let mut rest = word;
            // Peel leading punctuation.
            while let Some(c) = rest.chars().next() {
                if c.is_ascii_punctuation() && rest.len() > c.len_utf8() {
                    tokens.push(Token::new(&rest[..c.len_utf8()]));
                    rest = &rest[c.len_utf8()..];
                } else {
                    break;
                }
            }
            // Peel trailing punctuation, preserving order.
            let mut trailing = Vec::new();
            while let Some(c) = rest.chars().next_back() {
                if c.is_ascii_punctuation() && rest.len() > c.len_utf8() {
                    let cut = rest.len() - c.len_utf8();
                    trailing.push(Token::new(&rest[cut..]));
                    rest = &rest[..cut];
                } else {
                    break;
                }
            }
            if !rest.is_empty() {
                tokens.push(Token::new(rest));
            }
            tokens.extend(trailing.into_iter().rev());
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        let tokens = WordTokenizer.tokenize("how many touchdowns");
        assert_eq!(texts(&tokens), vec!["how", "many", "touchdowns"]);
    }

    #[test]
    fn peels_trailing_punctuation() {
        let tokens = WordTokenizer.tokenize("how many?");
        assert_eq!(texts(&tokens), vec!["how", "many", "?"]);
    }

    #[test]
    fn keeps_lone_punctuation_token() {
        let tokens = WordTokenizer.tokenize("- yes");
        assert_eq!(texts(&tokens), vec!["-", "yes"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(WordTokenizer.tokenize("   ").is_empty());
    }
}
