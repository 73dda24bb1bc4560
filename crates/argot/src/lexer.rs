//! Tokenization of raw process arguments and a persistent token cursor.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// One character of a `-abc` cluster.
    Short,
    /// `--name`, with the inline `=value` split into a following `Value`.
    Long,
    /// Any other argument.
    Value,
    /// End of input.
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Flag name without dashes, or the literal value.
    pub text: String,
}

static EOF_MARKER: Token = Token::EOF;

impl Token {
    pub const EOF: Token = Token {
        kind: TokenKind::Eof,
        text: String::new(),
    };

    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, TokenKind::Short | TokenKind::Long)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// The text used when this token is consumed as a value.
    ///
    /// Flag tokens keep their command-line spelling (`-x`, `--name`).
    pub fn literal(&self) -> String {
        match self.kind {
            TokenKind::Value => self.text.clone(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Short => write!(f, "-{}", self.text),
            TokenKind::Long => write!(f, "--{}", self.text),
            TokenKind::Value => f.write_str(&self.text),
            TokenKind::Eof => f.write_str("<EOF>"),
        }
    }
}

/// Split raw arguments into tokens, left to right.
///
/// The lexer is total: every input produces a token sequence.
pub fn tokenize<I, S>(args: I) -> Vec<Token>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some((name, value)) => {
                    tokens.push(Token::new(TokenKind::Long, name));
                    tokens.push(Token::new(TokenKind::Value, value));
                }
                None => tokens.push(Token::new(TokenKind::Long, long)),
            }
        } else if let Some(cluster) = arg.strip_prefix('-') {
            for c in cluster.chars() {
                tokens.push(Token::new(TokenKind::Short, c));
            }
        } else {
            tokens.push(Token::new(TokenKind::Value, arg));
        }
    }
    tracing::trace!(count = tokens.len(), "tokenized arguments");
    tokens
}

#[derive(Debug)]
struct Pushed {
    token: Token,
    next: Option<Rc<Pushed>>,
}

/// Immutable view over a token buffer.
///
/// Every operation returns a new cursor, so backtracking is a matter of
/// keeping an earlier value. Tokens returned to the stream live in a shared
/// linked overlay in front of the buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'t> {
    rest: &'t [Token],
    pushed: Option<Rc<Pushed>>,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            rest: tokens,
            pushed: None,
        }
    }

    pub fn peek(&self) -> &Token {
        match &self.pushed {
            Some(node) => &node.token,
            None => self.rest.first().unwrap_or(&EOF_MARKER),
        }
    }

    /// Consume one token. At end of input returns `Token::EOF` and an
    /// unchanged cursor.
    pub fn next(&self) -> (Token, Cursor<'t>) {
        if let Some(node) = &self.pushed {
            let rest = Cursor {
                rest: self.rest,
                pushed: node.next.clone(),
            };
            return (node.token.clone(), rest);
        }
        match self.rest.split_first() {
            Some((first, rest)) => (
                first.clone(),
                Cursor {
                    rest,
                    pushed: None,
                },
            ),
            None => (Token::EOF, self.clone()),
        }
    }

    /// Return a token to the front of the stream. End of input cannot be
    /// returned.
    pub fn push_back(&self, token: Token) -> Cursor<'t> {
        if token.is_eof() {
            return self.clone();
        }
        Cursor {
            rest: self.rest,
            pushed: Some(Rc::new(Pushed {
                token,
                next: self.pushed.clone(),
            })),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pushed.is_none() && self.rest.is_empty()
    }

    /// Command-line spellings of every remaining token.
    pub fn remaining(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut node = self.pushed.as_deref();
        while let Some(n) = node {
            out.push(n.token.to_string());
            node = n.next.as_deref();
        }
        out.extend(self.rest.iter().map(|t| t.to_string()));
        out
    }
}
