//! Command definitions and the derivation of their group, name and syntax.
//!
//! A command is declared once with an identifier such as `server_list`. Unless
//! overridden, the identifier is split at its first underscore into group and
//! name, and the positional syntax shown in help is rendered from the declared
//! parameter list.

use super::Handler;
use crate::api::Api;
use std::fmt;

/// One positional parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub required: bool,
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }

    fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// Renders `<required>` parameters first, then `[optional]` ones, each group
/// in declared order.
pub fn render_syntax(params: &[Param]) -> String {
    let required = params
        .iter()
        .filter(|p| p.required)
        .map(|p| format!("<{}>", p.display_name()));
    let optional = params
        .iter()
        .filter(|p| !p.required)
        .map(|p| format!("[{}]", p.display_name()));

    required.chain(optional).collect::<Vec<_>>().join(" ")
}

/// `"server_list"` is `(Some("server"), "list")`; `"help"` is `(None, "help")`.
pub fn split_identifier(identifier: &str) -> (Option<String>, String) {
    match identifier.split_once('_') {
        Some((group, name)) => (Some(group.to_string()), name.to_string()),
        None => (None, identifier.to_string()),
    }
}

/// A registered, invocable command.
pub struct CommandSpec {
    pub group: Option<String>,
    pub name: String,
    pub api: Option<Api>,
    pub description: String,
    pub syntax: String,
    pub params: Vec<Param>,
    pub handler: Box<dyn Handler>,
}

impl CommandSpec {
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// Whether `n` positional arguments fit the declared parameters.
    pub fn accepts(&self, n: usize) -> bool {
        self.required_count() <= n && n <= self.params.len()
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("api", &self.api)
            .field("description", &self.description)
            .field("syntax", &self.syntax)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`CommandSpec`]. Explicit values win over derived ones.
pub struct CommandDef {
    identifier: String,
    handler: Box<dyn Handler>,
    api: Option<Api>,
    group: Option<String>,
    name: Option<String>,
    description: Option<String>,
    syntax: Option<String>,
    params: Vec<Param>,
}

impl CommandDef {
    pub fn new(identifier: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self {
            identifier: identifier.into(),
            handler: Box::new(handler),
            api: None,
            group: None,
            name: None,
            description: None,
            syntax: None,
            params: Vec::new(),
        }
    }

    pub fn api(mut self, api: Api) -> Self {
        self.api = Some(api);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    pub fn params(mut self, params: &[Param]) -> Self {
        self.params = params.to_vec();
        self
    }

    pub fn build(self) -> CommandSpec {
        let (derived_group, derived_name) = split_identifier(&self.identifier);
        let syntax = self
            .syntax
            .unwrap_or_else(|| render_syntax(&self.params));

        CommandSpec {
            group: self.group.or(derived_group),
            name: self.name.unwrap_or(derived_name),
            api: self.api,
            description: self.description.unwrap_or_default(),
            syntax,
            params: self.params,
            handler: self.handler,
        }
    }
}
