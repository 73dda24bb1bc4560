//! Flag clauses and flag-group resolution.

use std::collections::HashMap;
use std::fmt;

use argot_model::FlagModel;

use crate::dispatch::{Context, Dispatch};
use crate::error::{ClauseKind, Error, Result};
use crate::lexer::{Cursor, TokenKind};
use crate::value::{Binding, BoolValue, StringValue, StringsValue, Value};

/// A declared `--name` flag with an optional `-x` alias.
pub struct FlagClause {
    name: String,
    short: Option<char>,
    help: String,
    required: bool,
    default: Option<String>,
    envar: Option<String>,
    placeholder: Option<String>,
    dispatch: Option<Dispatch>,
    value: Option<Box<dyn Value>>,
}

impl FlagClause {
    fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            help: help.to_string(),
            required: false,
            default: None,
            envar: None,
            placeholder: None,
            dispatch: None,
            value: None,
        }
    }

    pub fn short(&mut self, short: char) -> &mut Self {
        self.short = Some(short);
        self
    }

    pub fn required(&mut self) -> &mut Self {
        self.required = true;
        self
    }

    /// Raw text bound when neither the command line nor the environment
    /// supplies a value.
    pub fn default(&mut self, raw: impl Into<String>) -> &mut Self {
        self.default = Some(raw.into());
        self
    }

    /// Environment variable consulted when the flag is absent from the
    /// command line.
    pub fn envar(&mut self, key: impl Into<String>) -> &mut Self {
        self.envar = Some(key.into());
        self
    }

    pub fn placeholder(&mut self, text: impl Into<String>) -> &mut Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Hook fired each time the flag is bound from the command line.
    pub fn dispatch<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&Context<'_>) -> Result<()> + 'static,
    {
        self.dispatch = Some(Box::new(hook));
        self
    }

    /// Bind through a caller-supplied converter.
    pub fn value(&mut self, value: impl Value + 'static) {
        self.value = Some(Box::new(value));
    }

    pub fn string(&mut self) -> Binding<Option<String>> {
        let binding = Binding::default();
        self.value(StringValue(binding.clone()));
        binding
    }

    /// Every occurrence is appended in command-line order.
    pub fn strings(&mut self) -> Binding<Vec<String>> {
        let binding = Binding::default();
        self.value(StringsValue(binding.clone()));
        binding
    }

    /// A switch: present means `true`, no value token is consumed.
    pub fn bool(&mut self) -> Binding<bool> {
        let binding = Binding::new(false);
        self.value(BoolValue(binding.clone()));
        binding
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        format!("--{}", self.name)
    }

    fn is_bool(&self) -> bool {
        self.value.as_ref().is_some_and(|v| v.is_bool_flag())
    }

    fn convert(&mut self, raw: &str) -> Result<()> {
        let target = format!("flag '{}'", self.display_name());
        let Some(value) = self.value.as_mut() else {
            return Err(Error::invalid(format!("{target} has no value type")));
        };
        value.from_text(raw).map_err(|message| Error::Conversion {
            target,
            value: raw.to_string(),
            message,
        })
    }

    fn format_placeholder(&self) -> String {
        if let Some(p) = &self.placeholder {
            return p.clone();
        }
        if let Some(d) = &self.default {
            return d.clone();
        }
        let text = self
            .value
            .as_ref()
            .map(|v| v.placeholder_text())
            .unwrap_or_default();
        if text.is_empty() {
            self.name.to_ascii_uppercase()
        } else {
            text
        }
    }

    fn model(&self) -> FlagModel {
        FlagModel {
            name: self.name.clone(),
            short: self.short,
            help: self.help.clone(),
            required: self.required,
            default_value: self.default.clone(),
            envar: self.envar.clone(),
            placeholder: self.format_placeholder(),
            boolean: self.is_bool(),
        }
    }
}

impl fmt::Debug for FlagClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagClause")
            .field("name", &self.name)
            .field("short", &self.short)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("envar", &self.envar)
            .finish_non_exhaustive()
    }
}

/// Flags declared at one nesting level.
#[derive(Debug, Default)]
pub(crate) struct FlagGroup {
    clauses: Vec<FlagClause>,
    long: HashMap<String, usize>,
    short: HashMap<char, usize>,
}

impl FlagGroup {
    pub(crate) fn flag(&mut self, name: &str, help: &str) -> &mut FlagClause {
        let idx = self.clauses.len();
        self.clauses.push(FlagClause::new(name, help));
        &mut self.clauses[idx]
    }

    /// Validate declarations and build the lookup tables.
    pub(crate) fn init(&mut self) -> Result<()> {
        self.long.clear();
        self.short.clear();
        for (idx, flag) in self.clauses.iter().enumerate() {
            if flag.name.is_empty() || flag.name.contains('=') {
                return Err(Error::invalid(format!("invalid flag name '{}'", flag.name)));
            }
            if flag.value.is_none() {
                return Err(Error::invalid(format!(
                    "flag '{}' has no value type",
                    flag.display_name()
                )));
            }
            if flag.required && flag.default.is_some() {
                return Err(Error::invalid(format!(
                    "flag '{}' is required and also has a default",
                    flag.display_name()
                )));
            }
            if self.long.insert(flag.name.clone(), idx).is_some() {
                return Err(Error::invalid(format!(
                    "duplicate flag '{}'",
                    flag.display_name()
                )));
            }
            if let Some(short) = flag.short {
                if let Some(prev) = self.short.insert(short, idx) {
                    return Err(Error::invalid(format!(
                        "short flag '-{short}' maps to both '{}' and '{}'",
                        self.clauses[prev].display_name(),
                        flag.display_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Bind the contiguous run of flag tokens at the front of `cursor`.
    ///
    /// Unbound flags then take their environment or default value. Required
    /// flags are enforced unless `help` is set.
    pub(crate) fn parse<'t>(
        &mut self,
        mut cursor: Cursor<'t>,
        help: bool,
        ctx: &Context<'_>,
    ) -> Result<Cursor<'t>> {
        let mut seen = vec![false; self.clauses.len()];

        loop {
            let (token, rest) = cursor.next();
            if !token.is_flag() {
                cursor = rest.push_back(token);
                break;
            }
            cursor = rest;

            let idx = match token.kind {
                TokenKind::Long => self.long.get(&token.text),
                _ => token.text.chars().next().and_then(|c| self.short.get(&c)),
            };
            let Some(&idx) = idx else {
                return Err(Error::UnknownFlag(token.to_string()));
            };
            let flag = &mut self.clauses[idx];

            let raw = if flag.is_bool() {
                "true".to_string()
            } else {
                let (value, rest) = cursor.next();
                if value.is_eof() {
                    return Err(Error::MissingValue(flag.display_name()));
                }
                cursor = rest;
                value.literal()
            };
            tracing::trace!(flag = %token, len = raw.len(), "binding flag");
            flag.convert(&raw)?;
            seen[idx] = true;

            if let Some(hook) = flag.dispatch.as_mut() {
                tracing::debug!(flag = %flag.name, "dispatching flag hook");
                hook(ctx)?;
            }
        }

        for (idx, flag) in self.clauses.iter_mut().enumerate() {
            if seen[idx] {
                continue;
            }
            if let Some(raw) = flag.envar.as_deref().and_then(|key| ctx.env_var(key)) {
                tracing::debug!(flag = %flag.name, "binding flag from environment");
                flag.convert(raw)?;
                seen[idx] = true;
            } else if let Some(raw) = flag.default.clone() {
                flag.convert(&raw)?;
            }
        }

        if !help {
            let missing = self
                .clauses
                .iter()
                .zip(&seen)
                .find(|(flag, seen)| flag.required && !**seen);
            if let Some((flag, _)) = missing {
                return Err(Error::MissingRequired {
                    kind: ClauseKind::Flag,
                    name: flag.display_name(),
                });
            }
        }

        Ok(cursor)
    }

    pub(crate) fn model(&self) -> Vec<FlagModel> {
        self.clauses.iter().map(FlagClause::model).collect()
    }
}
