//! Command clauses and recursive command-group resolution.

use std::fmt;

use argot_model::CmdModel;
use indexmap::IndexMap;

use crate::args::{ArgClause, ArgGroup};
use crate::dispatch::{Context, Dispatch};
use crate::error::{Error, Result};
use crate::flags::{FlagClause, FlagGroup};
use crate::lexer::{Cursor, TokenKind};

/// A named subcommand with its own flags and either positional arguments or
/// nested commands.
pub struct CmdClause {
    name: String,
    help: String,
    flags: FlagGroup,
    args: ArgGroup,
    commands: CmdGroup,
    dispatch: Option<Dispatch>,
}

impl CmdClause {
    fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            flags: FlagGroup::default(),
            args: ArgGroup::default(),
            commands: CmdGroup::default(),
            dispatch: None,
        }
    }

    pub fn flag(&mut self, name: &str, help: &str) -> &mut FlagClause {
        self.flags.flag(name, help)
    }

    pub fn arg(&mut self, name: &str, help: &str) -> &mut ArgClause {
        self.args.arg(name, help)
    }

    pub fn command(&mut self, name: &str, help: &str) -> &mut CmdClause {
        self.commands.command(name, help)
    }

    /// Hook fired after the command's flags, arguments and subcommands have
    /// resolved.
    pub fn dispatch<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&Context<'_>) -> Result<()> + 'static,
    {
        self.dispatch = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate this command and, recursively, its children. `path` is the
    /// space-separated chain of parent names used in error messages.
    pub(crate) fn init(&mut self, path: &str) -> Result<()> {
        let path = if path.is_empty() {
            self.name.clone()
        } else {
            format!("{path} {}", self.name)
        };
        if self.args.have() && self.commands.have() {
            return Err(Error::ConflictingGrammar(format!("command '{path}'")));
        }
        self.flags.init()?;
        self.commands.init()?;
        self.args.init()?;
        for cmd in self.commands.clauses_mut() {
            cmd.init(&path)?;
        }
        Ok(())
    }

    fn parse<'t>(&mut self, cursor: Cursor<'t>, ctx: &Context<'_>) -> Result<(Vec<String>, Cursor<'t>)> {
        let cursor = self.flags.parse(cursor, false, ctx)?;
        let (path, cursor) = if self.args.have() {
            (Vec::new(), self.args.parse(cursor, ctx)?)
        } else if self.commands.have() {
            self.commands.parse(cursor, ctx)?
        } else {
            (Vec::new(), cursor)
        };
        if let Some(hook) = self.dispatch.as_mut() {
            tracing::debug!(command = %self.name, "dispatching command hook");
            hook(ctx)?;
        }
        Ok((path, cursor))
    }

    fn model(&self) -> CmdModel {
        CmdModel {
            name: self.name.clone(),
            help: self.help.clone(),
            flags: self.flags.model(),
            args: self.args.model(),
            commands: self.commands.model(),
        }
    }
}

impl fmt::Debug for CmdClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmdClause")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// Commands declared at one nesting level, in listing order.
#[derive(Debug, Default)]
pub(crate) struct CmdGroup {
    commands: IndexMap<String, CmdClause>,
    duplicates: Vec<String>,
}

impl CmdGroup {
    pub(crate) fn command(&mut self, name: &str, help: &str) -> &mut CmdClause {
        if self.commands.contains_key(name) {
            self.duplicates.push(name.to_string());
        }
        let (idx, _) = self
            .commands
            .insert_full(name.to_string(), CmdClause::new(name, help));
        &mut self.commands[idx]
    }

    pub(crate) fn have(&self) -> bool {
        !self.commands.is_empty()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub(crate) fn move_to_front(&mut self, name: &str) {
        if let Some(idx) = self.commands.get_index_of(name) {
            self.commands.move_index(idx, 0);
        }
    }

    pub(crate) fn clauses_mut(&mut self) -> impl Iterator<Item = &mut CmdClause> {
        self.commands.values_mut()
    }

    /// Validate command names at this level.
    pub(crate) fn init(&self) -> Result<()> {
        if let Some(name) = self.duplicates.first() {
            return Err(Error::invalid(format!("duplicate command '{name}'")));
        }
        for name in self.commands.keys() {
            if name.is_empty() || name.starts_with('-') {
                return Err(Error::invalid(format!("invalid command name '{name}'")));
            }
        }
        Ok(())
    }

    /// Consume a command name and resolve that command's own clauses.
    ///
    /// Returns the selected chain of names from this level down.
    pub(crate) fn parse<'t>(
        &mut self,
        cursor: Cursor<'t>,
        ctx: &Context<'_>,
    ) -> Result<(Vec<String>, Cursor<'t>)> {
        let (token, rest) = cursor.next();
        if token.kind != TokenKind::Value {
            return Err(Error::ExpectedCommand(token.to_string()));
        }
        let Some(cmd) = self.commands.get_mut(&token.text) else {
            return Err(Error::UnknownCommand(token.text));
        };
        tracing::debug!(command = %cmd.name, "selected command");
        let (sub, rest) = cmd.parse(rest, ctx)?;
        let mut path = Vec::with_capacity(sub.len() + 1);
        path.push(cmd.name.clone());
        path.extend(sub);
        Ok((path, rest))
    }

    pub(crate) fn model(&self) -> Vec<CmdModel> {
        self.commands.values().map(CmdClause::model).collect()
    }
}
