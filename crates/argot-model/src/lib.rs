//! Read-only metadata model of a fully-initialized argot application.
//!
//! The parsing engine builds an [`AppModel`] once initialization succeeds.
//! Usage renderers and dispatch hooks consume it instead of reaching into
//! the live clause groups, so rendering help never borrows parser state.
//!
//! The types serialize to kebab-case JSON so the vocabulary of a program can
//! be exported for completion scripts or documentation tooling.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct FlagModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envar: Option<String>,
    /// Display placeholder for the flag's value (e.g. `NAME`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
    /// Boolean flags take no value token.
    #[serde(default)]
    pub boolean: bool,
}

impl FlagModel {
    /// `-a, --channel=CHANNEL` style rendering used in flag listings.
    pub fn display(&self) -> String {
        let mut out = String::new();
        if let Some(short) = self.short {
            out.push_str(&format!("-{short}, "));
        }
        out.push_str(&format!("--{}", self.name));
        if !self.boolean {
            out.push_str(&format!("={}", self.placeholder));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ArgModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default)]
    pub required: bool,
    /// Absorbs every remaining token.
    #[serde(default)]
    pub variadic: bool,
}

impl ArgModel {
    /// `<nick>`, `[<nick>]`, or `<text> ...` for listings.
    pub fn display(&self) -> String {
        let mut out = format!("<{}>", self.name);
        if self.variadic {
            out.push_str(" ...");
        }
        if !self.required {
            out = format!("[{out}]");
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CmdModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CmdModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AppModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgModel>,
    /// Commands in listing order (the synthetic `help` command first).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CmdModel>,
}

impl AppModel {
    /// Resolve a space-separated command path such as `"deploy staging"`.
    ///
    /// Returns the chain of commands from the top level down to the target.
    pub fn find_command(&self, path: &str) -> Option<Vec<&CmdModel>> {
        let mut chain: Vec<&CmdModel> = Vec::new();
        let mut level = &self.commands;
        for name in path.split_whitespace() {
            let cmd = level.iter().find(|c| c.name == name)?;
            chain.push(cmd);
            level = &cmd.commands;
        }
        if chain.is_empty() { None } else { Some(chain) }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
