//! Declarative command-line parsing.
//!
//! Declare flags, positional arguments and nested commands on an
//! [`Application`], parse once, then read the typed [`Binding`]s or react in
//! dispatch hooks as clauses resolve.
//!
//! # Example
//!
//! ```rust
//! use argot::Application;
//!
//! let mut app = Application::new("chat", "A command-line chat application.");
//! let debug = app.flag("debug", "Enable debug mode.").bool();
//! let post = app.command("post", "Post a message to a channel.");
//! let channel = post
//!     .flag("channel", "Channel to post to.")
//!     .short('a')
//!     .required()
//!     .string();
//! let text = post.arg("text", "Text to post.").strings();
//!
//! let command = app.parse_with_env(["--debug", "post", "-a", "general", "hi", "all"], &[])?;
//! assert_eq!(command, "post");
//! assert!(debug.get());
//! assert_eq!(channel.get().as_deref(), Some("general"));
//! assert_eq!(text.get(), ["hi", "all"]);
//! # Ok::<(), argot::Error>(())
//! ```

mod app;
mod args;
mod cmds;
mod dispatch;
mod error;
mod flags;
mod lexer;
pub mod usage;
mod value;

pub use app::Application;
pub use args::ArgClause;
pub use cmds::CmdClause;
pub use dispatch::{Context, Dispatch};
pub use error::{ClauseKind, Error, Result};
pub use flags::FlagClause;
pub use lexer::{Cursor, Token, TokenKind, tokenize};
pub use value::{Binding, Value, parse_bool};

pub use argot_model as model;
