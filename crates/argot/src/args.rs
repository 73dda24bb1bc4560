//! Positional argument clauses and argument-group resolution.

use std::fmt;

use argot_model::ArgModel;

use crate::dispatch::{Context, Dispatch};
use crate::error::{ClauseKind, Error, Result};
use crate::lexer::Cursor;
use crate::value::{Binding, StringValue, StringsValue, Value};

pub struct ArgClause {
    name: String,
    help: String,
    required: bool,
    variadic: bool,
    dispatch: Option<Dispatch>,
    value: Option<Box<dyn Value>>,
}

impl ArgClause {
    fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required: false,
            variadic: false,
            dispatch: None,
            value: None,
        }
    }

    pub fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    /// Absorb every remaining token. Must be the last declared argument.
    pub fn variadic(&mut self) -> &mut Self {
        self.variadic = true;
        self
    }

    /// Hook fired once the argument is bound.
    pub fn dispatch<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&Context<'_>) -> Result<()> + 'static,
    {
        self.dispatch = Some(Box::new(hook));
        self
    }

    pub fn value(&mut self, value: impl Value + 'static) {
        self.value = Some(Box::new(value));
    }

    pub fn string(&mut self) -> Binding<Option<String>> {
        let binding = Binding::default();
        self.value(StringValue(binding.clone()));
        binding
    }

    /// Variadic list of the remaining tokens.
    pub fn strings(&mut self) -> Binding<Vec<String>> {
        let binding = Binding::default();
        self.variadic = true;
        self.value(StringsValue(binding.clone()));
        binding
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn convert(&mut self, raw: &str) -> Result<()> {
        let target = format!("argument '{}'", self.name);
        let Some(value) = self.value.as_mut() else {
            return Err(Error::invalid(format!("{target} has no value type")));
        };
        value.from_text(raw).map_err(|message| Error::Conversion {
            target,
            value: raw.to_string(),
            message,
        })
    }

    fn fire(&mut self, ctx: &Context<'_>) -> Result<()> {
        if let Some(hook) = self.dispatch.as_mut() {
            tracing::debug!(arg = %self.name, "dispatching argument hook");
            hook(ctx)?;
        }
        Ok(())
    }

    fn missing(&self) -> Error {
        Error::MissingRequired {
            kind: ClauseKind::Argument,
            name: self.name.clone(),
        }
    }

    fn model(&self) -> ArgModel {
        ArgModel {
            name: self.name.clone(),
            help: self.help.clone(),
            required: self.required,
            variadic: self.variadic,
        }
    }
}

impl fmt::Debug for ArgClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgClause")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("variadic", &self.variadic)
            .finish_non_exhaustive()
    }
}

/// Ordered positional arguments at one nesting level.
#[derive(Debug, Default)]
pub(crate) struct ArgGroup {
    clauses: Vec<ArgClause>,
}

impl ArgGroup {
    pub(crate) fn arg(&mut self, name: &str, help: &str) -> &mut ArgClause {
        let idx = self.clauses.len();
        self.clauses.push(ArgClause::new(name, help));
        &mut self.clauses[idx]
    }

    pub(crate) fn have(&self) -> bool {
        !self.clauses.is_empty()
    }

    /// Required arguments form a prefix; a variadic argument comes last.
    pub(crate) fn init(&self) -> Result<()> {
        let mut optional: Option<&str> = None;
        for (idx, arg) in self.clauses.iter().enumerate() {
            if arg.name.is_empty() {
                return Err(Error::invalid("argument with empty name"));
            }
            if arg.value.is_none() {
                return Err(Error::invalid(format!(
                    "argument '{}' has no value type",
                    arg.name
                )));
            }
            if self.clauses[..idx].iter().any(|a| a.name == arg.name) {
                return Err(Error::invalid(format!("duplicate argument '{}'", arg.name)));
            }
            if arg.required {
                if let Some(prev) = optional {
                    return Err(Error::invalid(format!(
                        "required argument '{}' follows optional argument '{prev}'",
                        arg.name
                    )));
                }
            } else if optional.is_none() {
                optional = Some(&arg.name);
            }
            if arg.variadic && idx + 1 != self.clauses.len() {
                return Err(Error::invalid(format!(
                    "variadic argument '{}' must be the last argument",
                    arg.name
                )));
            }
        }
        Ok(())
    }

    /// Bind declared arguments positionally from the front of `cursor`.
    ///
    /// Tokens are taken as-is: a flag token here is a literal value.
    pub(crate) fn parse<'t>(&mut self, mut cursor: Cursor<'t>, ctx: &Context<'_>) -> Result<Cursor<'t>> {
        for arg in &mut self.clauses {
            if arg.variadic {
                let mut consumed = 0usize;
                loop {
                    let (token, rest) = cursor.next();
                    if token.is_eof() {
                        break;
                    }
                    cursor = rest;
                    arg.convert(&token.literal())?;
                    consumed += 1;
                }
                if consumed == 0 {
                    if arg.required {
                        return Err(arg.missing());
                    }
                    break;
                }
                tracing::debug!(arg = %arg.name, count = consumed, "bound variadic argument");
                arg.fire(ctx)?;
                break;
            }

            let (token, rest) = cursor.next();
            if token.is_eof() {
                if arg.required {
                    return Err(arg.missing());
                }
                break;
            }
            cursor = rest;
            tracing::debug!(arg = %arg.name, "bound argument");
            arg.convert(&token.literal())?;
            arg.fire(ctx)?;
        }
        Ok(cursor)
    }

    pub(crate) fn model(&self) -> Vec<ArgModel> {
        self.clauses.iter().map(ArgClause::model).collect()
    }
}
