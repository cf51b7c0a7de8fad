//! The command registry and the API availability filter.
//!
//! Both levels keep insertion order so help lists commands the way they were
//! declared. Re-registering a `(group, name)` pair replaces the earlier spec in
//! place.

use super::spec::CommandSpec;
use crate::api::Api;
use crate::config::{Config, GLOBAL};
use crate::error::{CirrusError, Result};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<(Option<String>, Vec<CommandSpec>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: CommandSpec) {
        let index = match self.groups.iter().position(|(g, _)| *g == spec.group) {
            Some(index) => index,
            None => {
                self.groups.push((spec.group.clone(), Vec::new()));
                self.groups.len() - 1
            }
        };

        let commands = &mut self.groups[index].1;
        match commands.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => {
                debug!(
                    "Replacing command {} {}",
                    spec.group.as_deref().unwrap_or("-"),
                    spec.name
                );
                *existing = spec;
            }
            None => commands.push(spec),
        }
    }

    pub fn get(&self, group: Option<&str>, name: &str) -> Result<&CommandSpec> {
        self.commands(group)
            .find(|c| c.name == name)
            .ok_or_else(|| CirrusError::CommandNotFound {
                group: group.map(str::to_string),
                name: name.to_string(),
            })
    }

    pub fn groups(&self) -> impl Iterator<Item = Option<&str>> {
        self.groups.iter().map(|(g, _)| g.as_deref())
    }

    pub fn commands(&self, group: Option<&str>) -> impl Iterator<Item = &CommandSpec> {
        let group = group.map(str::to_string);
        self.groups
            .iter()
            .filter(move |(g, _)| *g == group)
            .flat_map(|(_, commands)| commands.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Named groups with at least one visible command. Ungrouped commands never
    /// form a group.
    pub fn visible_groups(&self, enabled: &EnabledApis) -> Vec<&str> {
        self.groups
            .iter()
            .filter_map(|(g, commands)| {
                let group = g.as_deref()?;
                commands
                    .iter()
                    .any(|c| is_visible(c, enabled))
                    .then_some(group)
            })
            .collect()
    }

    pub fn visible_commands(&self, group: &str, enabled: &EnabledApis) -> Vec<&CommandSpec> {
        self.commands(Some(group))
            .filter(|c| is_visible(c, enabled))
            .collect()
    }
}

/// The set of APIs the current run may talk to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledApis(BTreeSet<Api>);

impl EnabledApis {
    /// Parses a whitespace separated list. Unknown names are skipped.
    pub fn parse(list: &str) -> Self {
        let apis = list
            .split_whitespace()
            .filter_map(|name| match name.parse::<Api>() {
                Ok(api) => Some(api),
                Err(_) => {
                    debug!("Ignoring unknown API '{}'", name);
                    None
                }
            })
            .collect();
        Self(apis)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::parse(config.get(GLOBAL, "apis").unwrap_or(""))
    }

    pub fn contains(&self, api: Api) -> bool {
        self.0.contains(&api)
    }

    pub fn iter(&self) -> impl Iterator<Item = Api> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Api> for EnabledApis {
    fn from_iter<I: IntoIterator<Item = Api>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn is_visible(spec: &CommandSpec, enabled: &EnabledApis) -> bool {
    spec.api.map_or(true, |api| enabled.contains(api))
}
