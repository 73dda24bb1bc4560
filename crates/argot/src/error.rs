//! Error types for parsing and initialization.

use std::fmt;
use thiserror::Error;

/// What kind of clause a `MissingRequired` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Flag,
    Argument,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("flag"),
            Self::Argument => f.write_str("argument"),
        }
    }
}

/// Errors produced while initializing an application or parsing arguments.
///
/// Every variant is terminal for the current parse call.
#[derive(Debug, Error)]
pub enum Error {
    /// A flag token names a flag the active group does not declare.
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    /// A command name is not declared at the current level.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Commands are declared but the next token is not a command name.
    #[error("expected command but got '{0}'")]
    ExpectedCommand(String),

    /// A value-taking flag was followed by end of input.
    #[error("expected argument for flag '{0}'")]
    MissingValue(String),

    /// A value converter rejected the raw text.
    #[error("invalid value '{value}' for {target}: {message}")]
    Conversion {
        target: String,
        value: String,
        message: String,
    },

    /// A required flag or positional argument was never bound.
    #[error("required {kind} '{name}' not provided")]
    MissingRequired { kind: ClauseKind, name: String },

    /// Positional arguments and commands declared at the same level.
    #[error("{0} declares both positional arguments and commands")]
    ConflictingGrammar(String),

    /// Any other shape violation detected at initialization.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Tokens remained after flags, arguments and commands were resolved.
    #[error("{}", trailing_message(.0))]
    TrailingArguments(Vec<String>),

    /// Bindings already hold the values of an earlier parse.
    #[error("application '{0}' has already parsed its arguments")]
    AlreadyParsed(String),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by a caller-supplied dispatch hook.
    #[error(transparent)]
    Hook(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error raised inside a dispatch hook.
    pub fn hook<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Hook(err.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDeclaration(msg.into())
    }
}

fn trailing_message(tokens: &[String]) -> String {
    if tokens.len() == 1 {
        format!("unexpected argument '{}'", tokens[0])
    } else {
        format!("unexpected arguments '{}'", tokens.join(" "))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_message_pluralizes() {
        let one = Error::TrailingArguments(vec!["hello".to_string()]);
        assert_eq!(one.to_string(), "unexpected argument 'hello'");

        let many = Error::TrailingArguments(vec!["a".to_string(), "--b".to_string()]);
        assert_eq!(many.to_string(), "unexpected arguments 'a --b'");
    }

    #[test]
    fn missing_required_names_kind() {
        let err = Error::MissingRequired {
            kind: ClauseKind::Flag,
            name: "--name".to_string(),
        };
        assert_eq!(err.to_string(), "required flag '--name' not provided");
    }

    #[test]
    fn hook_errors_are_transparent() {
        let err = Error::hook("database unavailable");
        assert_eq!(err.to_string(), "database unavailable");
    }
}
