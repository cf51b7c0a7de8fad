//! # API Tags and Client Factory
//!
//! Commands declare the backend they need with an [`Api`] tag. Tags are grouped
//! into families that share a client: `nova` and `synnefo` both talk to the
//! compute endpoint, `glance` and `plankton` to the image registry, `pithos` to
//! object storage.
//!
//! [`build_client`] turns a tag plus the current configuration into a ready
//! [`ApiClient`]. Adding a family is one row in [`FAMILIES`] and one arm in
//! [`ApiFamily::connect`].

use crate::clients::{ComputeClient, ImagesClient, StorageClient, Transport};
use crate::config::{Config, GLOBAL};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Api {
    Nova,
    Synnefo,
    Glance,
    Plankton,
    Pithos,
}

impl Api {
    pub const ALL: [Api; 5] = [
        Api::Nova,
        Api::Synnefo,
        Api::Glance,
        Api::Plankton,
        Api::Pithos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Nova => "nova",
            Api::Synnefo => "synnefo",
            Api::Glance => "glance",
            Api::Plankton => "plankton",
            Api::Pithos => "pithos",
        }
    }

    pub fn family(&self) -> ApiFamily {
        match self {
            Api::Nova | Api::Synnefo => ApiFamily::Compute,
            Api::Glance | Api::Plankton => ApiFamily::Images,
            Api::Pithos => ApiFamily::Storage,
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Api {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Api::ALL
            .iter()
            .copied()
            .find(|api| api.as_str() == s)
            .ok_or_else(|| format!("Unknown API: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiFamily {
    Compute,
    Images,
    Storage,
}

/// Per-family configuration: `(family, section, global url key)`.
///
/// The family section may carry its own `url` and `token`; otherwise the
/// global url key and the global token apply. A value given on the command
/// line for the global key beats both.
pub const FAMILIES: &[(ApiFamily, &str, &str)] = &[
    (ApiFamily::Compute, "compute", "compute_url"),
    (ApiFamily::Images, "images", "images_url"),
    (ApiFamily::Storage, "storage", "storage_url"),
];

impl ApiFamily {
    fn settings(&self) -> (&'static str, &'static str) {
        FAMILIES
            .iter()
            .find(|(family, _, _)| family == self)
            .map(|(_, section, url_key)| (*section, *url_key))
            .unwrap_or((GLOBAL, ""))
    }

    /// The config section specific to this family.
    pub fn section(&self) -> &'static str {
        self.settings().0
    }

    /// Base URL for this family's endpoint.
    pub fn base_url<'a>(&self, config: &'a Config) -> &'a str {
        let (section, url_key) = self.settings();
        resolve(config, section, "url", url_key).unwrap_or("")
    }

    /// Token for this family's endpoint.
    pub fn token<'a>(&self, config: &'a Config) -> &'a str {
        resolve(config, self.section(), "token", "token").unwrap_or("")
    }

    fn connect(&self, config: &Config, transport: Rc<dyn Transport>) -> ApiClient {
        let url = self.base_url(config);
        let token = self.token(config);
        match self {
            ApiFamily::Compute => ApiClient::Compute(ComputeClient::new(url, token, transport)),
            ApiFamily::Images => ApiClient::Images(ImagesClient::new(url, token, transport)),
            ApiFamily::Storage => {
                let section = self.section();
                let account = resolve(config, section, "account", "account");
                let container = resolve(config, section, "container", "container");
                ApiClient::Storage(StorageClient::new(url, token, transport, account, container))
            }
        }
    }
}

/// Looks up a family setting. A command-line value for the global key comes
/// first, then the family section, then the global key's persisted or default
/// value.
fn resolve<'a>(config: &'a Config, section: &str, key: &str, global_key: &str) -> Option<&'a str> {
    config
        .get_override(GLOBAL, global_key)
        .or_else(|| config.get(section, key))
        .or_else(|| config.get(GLOBAL, global_key))
}

/// A constructed client, one variant per family.
#[derive(Clone)]
pub enum ApiClient {
    Compute(ComputeClient),
    Images(ImagesClient),
    Storage(StorageClient),
}

impl ApiClient {
    pub fn family(&self) -> ApiFamily {
        match self {
            ApiClient::Compute(_) => ApiFamily::Compute,
            ApiClient::Images(_) => ApiFamily::Images,
            ApiClient::Storage(_) => ApiFamily::Storage,
        }
    }
}

/// Builds the client a command tagged `api` needs. Commands without a tag get none.
pub fn build_client(
    api: Option<Api>,
    config: &Config,
    transport: Rc<dyn Transport>,
) -> Option<ApiClient> {
    api.map(|api| api.family().connect(config, transport))
}
