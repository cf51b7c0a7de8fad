//! # Commands
//!
//! Every command is a [`Handler`] registered under a group and a name. The
//! dispatcher hands each handler a [`Context`] holding everything a run needs:
//! the configuration, the parsed options, the API client for the command's
//! family (if it declared one) and the output sink.
//!
//! Handlers never print to stdout directly and never exit the process; they
//! write to `ctx.out` and return a [`Result`], leaving exit codes to the CLI
//! layer.
//!
//! [`builtin`] builds the registry of every shipped command, one group module
//! at a time, in help order.

use crate::api::ApiClient;
use crate::clients::{ComputeClient, ImagesClient, StorageClient};
use crate::config::Config;
use crate::error::{CirrusError, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;

pub mod config;
pub mod flavor;
pub mod glance;
pub mod image;
pub mod network;
pub mod registry;
pub mod server;
pub mod spec;
pub mod store;

pub use registry::{is_visible, EnabledApis, Registry};
pub use spec::{render_syntax, split_identifier, CommandDef, CommandSpec, Param};

/// Everything a handler may touch during one run.
pub struct Context<'a> {
    pub config: &'a mut Config,
    pub options: &'a ArgMatches,
    pub client: Option<ApiClient>,
    pub out: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    /// A boolean option; false if the command never declared it.
    pub fn flag(&self, id: &str) -> bool {
        matches!(self.options.try_get_one::<bool>(id), Ok(Some(true)))
    }

    pub fn values(&self, id: &str) -> Vec<String> {
        match self.options.try_get_many::<String>(id) {
            Ok(Some(values)) => values.cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub fn compute(&self) -> Result<&ComputeClient> {
        match &self.client {
            Some(ApiClient::Compute(client)) => Ok(client),
            _ => Err(missing_client("compute")),
        }
    }

    pub fn images(&self) -> Result<&ImagesClient> {
        match &self.client {
            Some(ApiClient::Images(client)) => Ok(client),
            _ => Err(missing_client("images")),
        }
    }

    pub fn storage(&mut self) -> Result<&mut StorageClient> {
        match &mut self.client {
            Some(ApiClient::Storage(client)) => Ok(client),
            _ => Err(missing_client("storage")),
        }
    }
}

fn missing_client(family: &str) -> CirrusError {
    CirrusError::InvalidInput(format!("No {} client available for this command", family))
}

/// The entry point of a command.
pub trait Handler {
    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<()>;

    /// Adds command-specific options and help text to the parser.
    fn configure(&self, command: Command) -> Command {
        command
    }
}

pub type RunFn = fn(&mut Context, &[String]) -> Result<()>;
pub type ConfigureFn = fn(Command) -> Command;

/// Adapts plain functions into a [`Handler`].
#[derive(Clone, Copy)]
pub struct FnHandler {
    run: RunFn,
    configure: Option<ConfigureFn>,
}

impl FnHandler {
    pub fn new(run: RunFn) -> Self {
        Self {
            run,
            configure: None,
        }
    }

    pub fn with_options(mut self, configure: ConfigureFn) -> Self {
        self.configure = Some(configure);
        self
    }
}

impl Handler for FnHandler {
    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<()> {
        (self.run)(ctx, args)
    }

    fn configure(&self, command: Command) -> Command {
        match self.configure {
            Some(configure) => configure(command),
            None => command,
        }
    }
}

/// `-l` for the list commands.
pub(crate) fn detail_option(command: Command) -> Command {
    command.arg(
        Arg::new("detail")
            .short('l')
            .action(ArgAction::SetTrue)
            .help("show detailed output"),
    )
}

/// Parses a numeric id, reporting a usage error otherwise.
pub(crate) fn parse_id(value: &str, what: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| CirrusError::Usage(format!("Invalid {}: {}", what, value)))
}

/// Positional argument `i`, if given.
pub(crate) fn arg(args: &[String], i: usize) -> Option<&str> {
    args.get(i).map(String::as_str)
}

/// Positional argument `i`, which the arity check already guaranteed.
pub(crate) fn required(args: &[String], i: usize) -> Result<&str> {
    arg(args, i).ok_or_else(|| CirrusError::Usage("Missing argument".to_string()))
}

/// Every shipped command, in help order.
pub fn builtin() -> Registry {
    let mut registry = Registry::new();
    let groups: [fn() -> Vec<CommandSpec>; 7] = [
        config::commands,
        server::commands,
        flavor::commands,
        image::commands,
        network::commands,
        glance::commands,
        store::commands,
    ];
    for group in groups {
        for spec in group() {
            registry.register(spec);
        }
    }
    registry
}
