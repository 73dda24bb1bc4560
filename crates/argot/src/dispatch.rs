//! Dispatch hooks and the context they run in.
//!
//! Hooks fire synchronously, in resolution order, the moment their clause is
//! bound: flags one by one as they are scanned, arguments as they are
//! consumed, and commands after their own flags, arguments and children
//! have resolved.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};

use argot_model::AppModel;

use crate::error::{Error, Result};
use crate::usage;

/// A hook attached to a flag, argument or command.
pub type Dispatch = Box<dyn FnMut(&Context<'_>) -> Result<()>>;

/// Output sinks and the process-termination function.
pub(crate) struct Terminal {
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
    exit: Box<dyn Fn(i32)>,
}

impl Terminal {
    pub(crate) fn set_writers(&mut self, out: Box<dyn Write>, err: Box<dyn Write>) {
        self.out = RefCell::new(out);
        self.err = RefCell::new(err);
    }

    pub(crate) fn set_exit(&mut self, exit: Box<dyn Fn(i32)>) {
        self.exit = exit;
    }

    pub(crate) fn write_out(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.borrow_mut();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    pub(crate) fn write_err(&self, text: &str) -> io::Result<()> {
        let mut err = self.err.borrow_mut();
        err.write_all(text.as_bytes())?;
        err.flush()
    }

    pub(crate) fn exit(&self, code: i32) {
        tracing::debug!(code, "terminating");
        (self.exit)(code);
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            out: RefCell::new(Box::new(io::stdout())),
            err: RefCell::new(Box::new(io::stderr())),
            exit: Box::new(|code| std::process::exit(code)),
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}

/// What a dispatch hook can see and do while parsing is in progress.
pub struct Context<'a> {
    pub(crate) model: &'a AppModel,
    pub(crate) terminal: &'a Terminal,
    pub(crate) env: &'a [(String, String)],
}

impl<'a> Context<'a> {
    /// Metadata of the whole application.
    pub fn model(&self) -> &'a AppModel {
        self.model
    }

    /// Write text to the output sink (stdout by default).
    pub fn print(&self, text: &str) -> Result<()> {
        Ok(self.terminal.write_out(text)?)
    }

    /// Write text to the error sink (stderr by default).
    pub fn eprint(&self, text: &str) -> Result<()> {
        Ok(self.terminal.write_err(text)?)
    }

    /// Render application usage to the error sink.
    pub fn usage(&self) -> Result<()> {
        self.eprint(&usage::app_usage(self.model))
    }

    /// Render usage for a space-separated command path to the error sink.
    pub fn command_usage(&self, path: &str) -> Result<()> {
        let text = usage::command_usage(self.model, path)
            .ok_or_else(|| Error::UnknownCommand(path.to_string()))?;
        self.eprint(&text)
    }

    /// Hand control to the termination function (`std::process::exit` unless
    /// replaced). Parsing continues if it returns.
    pub fn terminate(&self, code: i32) {
        self.terminal.exit(code);
    }

    pub(crate) fn env_var(&self, key: &str) -> Option<&'a str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
