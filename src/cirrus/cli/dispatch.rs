//! # Dispatcher
//!
//! Turns `argv` into exactly one command run, in stages:
//!
//! 1. **Preliminary parse.** Global options and positionals only. Options a
//!    command declares are skipped here and nothing is ever an error, so help
//!    can always be shown.
//! 2. **Group.** Missing group prints help and the visible groups (exit 0);
//!    an unknown or hidden group prints the same (exit 1).
//! 3. **Command.** Same again one level down, listing the group's commands.
//! 4. **Command parse.** The handler adds its own options; the full line is
//!    parsed strictly. `--help` prints the specialised usage (exit 0).
//! 5. **Client.** Built from the command's API tag and the configuration.
//! 6. **Run.** Wrong arity prints help (exit 1); a remote failure logs its
//!    message and details (exit 2).
//!
//! Visibility is recomputed on every run from the configuration after the
//! command-line overrides are applied.

use crate::api::build_client;
use crate::clients::Transport;
use crate::commands::{CommandSpec, Context, EnabledApis, Registry};
use crate::config::{Config, GLOBAL};
use crate::error::{CirrusError, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, error, info};

/// Process exit status of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success = 0,
    Usage = 1,
    Remote = 2,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Options that override a `global` configuration key for one run.
const OVERRIDES: &[(&str, &str)] = &[
    ("compute-url", "compute_url"),
    ("images-url", "images_url"),
    ("storage-url", "storage_url"),
    ("token", "token"),
    ("account", "account"),
    ("container", "container"),
];

/// The global parser every stage starts from.
pub fn base_command(usage: String) -> Command {
    let mut command = Command::new("cirrus")
        .no_binary_name(true)
        .override_usage(usage)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("help")
                .long("help")
                .action(ArgAction::SetTrue)
                .help("show this help message and exit"),
        )
        .arg(
            Arg::new("api")
                .long("api")
                .value_name("API")
                .action(ArgAction::Append)
                .help("API to use (can be used multiple times)"),
        );

    let urls = [
        ("compute-url", "URL for the compute API"),
        ("images-url", "URL for the images API"),
        ("storage-url", "URL for the storage API"),
    ];
    for (id, help) in urls {
        command = command.arg(Arg::new(id).long(id).value_name("URL").help(help));
    }

    command
        .arg(
            Arg::new("token")
                .long("token")
                .value_name("TOKEN")
                .help("use token TOKEN"),
        )
        .arg(
            Arg::new("account")
                .long("account")
                .value_name("NAME")
                .help("use storage account NAME"),
        )
        .arg(
            Arg::new("container")
                .long("container")
                .value_name("NAME")
                .help("use storage container NAME"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("use verbose output"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .action(ArgAction::SetTrue)
                .help("use debug output"),
        )
        .arg(
            Arg::new("args")
                .num_args(1..)
                .action(ArgAction::Append)
                .hide(true),
        )
}

/// Parses global options and positionals, skipping options only a command
/// knows about. Never fails.
pub fn preliminary_parse(argv: &[String]) -> ArgMatches {
    let command = base_command(top_usage()).ignore_errors(true);
    let words = known_words(&command, argv);
    command.try_get_matches_from(words).unwrap_or_default()
}

fn find_long<'c>(command: &'c Command, name: &str) -> Option<&'c Arg> {
    command.get_arguments().find(|a| a.get_long() == Some(name))
}

fn find_short(command: &Command, c: char) -> Option<&Arg> {
    command.get_arguments().find(|a| a.get_short() == Some(c))
}

/// The words of `argv` that `command` can parse: positionals, plus the options
/// it declares along with their values.
fn known_words(command: &Command, argv: &[String]) -> Vec<String> {
    let mut words = Vec::with_capacity(argv.len());
    let mut iter = argv.iter();

    while let Some(word) = iter.next() {
        if word == "--" {
            words.push(word.clone());
            words.extend(iter.cloned());
            break;
        }

        if let Some(long) = word.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            if let Some(arg) = find_long(command, name) {
                words.push(word.clone());
                if arg.get_action().takes_values() && !inline_value {
                    words.extend(iter.next().cloned());
                }
            }
        } else if let Some(shorts) = word.strip_prefix('-').filter(|s| !s.is_empty()) {
            let known = shorts.chars().all(|c| {
                find_short(command, c).is_some_and(|a| !a.get_action().takes_values())
            });
            if known {
                words.push(word.clone());
            }
        } else {
            words.push(word.clone());
        }
    }
    words
}

fn top_usage() -> String {
    "cirrus <group> <command> [options]".to_string()
}

fn group_usage(group: &str) -> String {
    format!("cirrus {} <command> [options]", group)
}

fn command_usage(group: &str, spec: &CommandSpec) -> String {
    if spec.syntax.is_empty() {
        format!("cirrus {} {} [options]", group, spec.name)
    } else {
        format!("cirrus {} {} {} [options]", group, spec.name, spec.syntax)
    }
}

fn positionals(matches: &ArgMatches) -> Vec<String> {
    match matches.try_get_many::<String>("args") {
        Ok(Some(values)) => values.cloned().collect(),
        _ => Vec::new(),
    }
}

fn one<'m>(matches: &'m ArgMatches, id: &str) -> Option<&'m String> {
    matches.try_get_one::<String>(id).ok().flatten()
}

/// Applies command-line values to the override layer. Repeated `--api` flags
/// accumulate and together replace the configured list.
fn apply_overrides(matches: &ArgMatches, config: &mut Config) {
    if let Ok(Some(apis)) = matches.try_get_many::<String>("api") {
        let apis: Vec<&str> = apis.map(String::as_str).collect();
        config.override_value(GLOBAL, "apis", &apis.join(" "));
    }
    for (id, key) in OVERRIDES {
        if let Some(value) = one(matches, id) {
            config.override_value(GLOBAL, key, value);
        }
    }
}

fn print_help(out: &mut dyn Write, command: &mut Command) -> Result<()> {
    let help = command.render_help().to_string();
    writeln!(out, "{}", help.trim_end())?;
    Ok(())
}

fn print_groups(out: &mut dyn Write, groups: &[&str]) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Groups:")?;
    for group in groups {
        writeln!(out, "  {}", group)?;
    }
    Ok(())
}

fn print_commands(out: &mut dyn Write, commands: &[&CommandSpec]) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Commands:")?;
    for spec in commands {
        writeln!(out, "  {:<10} {}", spec.name, spec.description)?;
    }
    Ok(())
}

pub struct Dispatcher {
    registry: Registry,
    transport: Rc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(registry: Registry, transport: Rc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs one command line. `argv` excludes the program name.
    pub fn run(&self, argv: &[String], config: &mut Config, out: &mut dyn Write) -> Status {
        match self.dispatch(argv, config, out) {
            Ok(status) => status,
            Err(e) => {
                error!("{}", e);
                Status::Usage
            }
        }
    }

    fn dispatch(&self, argv: &[String], config: &mut Config, out: &mut dyn Write) -> Result<Status> {
        let preliminary = preliminary_parse(argv);
        apply_overrides(&preliminary, config);
        let enabled = EnabledApis::from_config(config);
        let args = positionals(&preliminary);

        let groups = self.registry.visible_groups(&enabled);
        let Some(group) = args.first() else {
            print_help(out, &mut base_command(top_usage()))?;
            print_groups(out, &groups)?;
            return Ok(Status::Success);
        };
        if !groups.contains(&group.as_str()) {
            debug!("Group '{}' is not available", group);
            print_help(out, &mut base_command(top_usage()))?;
            print_groups(out, &groups)?;
            return Ok(Status::Usage);
        }

        let commands = self.registry.visible_commands(group, &enabled);
        let Some(name) = args.get(1) else {
            print_help(out, &mut base_command(group_usage(group)))?;
            print_commands(out, &commands)?;
            return Ok(Status::Success);
        };
        if !commands.iter().any(|c| c.name == *name) {
            debug!("Command '{} {}' is not available", group, name);
            print_help(out, &mut base_command(group_usage(group)))?;
            print_commands(out, &commands)?;
            return Ok(Status::Usage);
        }

        let spec = self.registry.get(Some(group), name)?;
        let mut command = spec
            .handler
            .configure(base_command(command_usage(group, spec)));

        let matches = match command.clone().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("{}", e.kind());
                print_help(out, &mut command)?;
                return Ok(Status::Usage);
            }
        };
        if matches.get_flag("help") {
            print_help(out, &mut command)?;
            return Ok(Status::Success);
        }
        apply_overrides(&matches, config);

        let args = positionals(&matches);
        let args = args.get(2..).unwrap_or_default();
        if !spec.accepts(args.len()) {
            debug!(
                "{} {} takes {} to {} arguments, got {}",
                group,
                name,
                spec.required_count(),
                spec.params.len(),
                args.len()
            );
            print_help(out, &mut command)?;
            return Ok(Status::Usage);
        }

        let client = build_client(spec.api, config, self.transport.clone());
        let result = {
            let mut ctx = Context {
                config: &mut *config,
                options: &matches,
                client,
                out: &mut *out,
            };
            spec.handler.run(&mut ctx, args)
        };

        match result {
            Ok(()) => Ok(Status::Success),
            Err(CirrusError::Client(err)) => {
                error!("{}", err.message);
                if !err.details.is_empty() {
                    info!("{}", err.details);
                }
                Ok(Status::Remote)
            }
            Err(CirrusError::Usage(message)) => {
                error!("{}", message);
                print_help(out, &mut command)?;
                Ok(Status::Usage)
            }
            Err(e) => {
                error!("{}", e);
                Ok(Status::Usage)
            }
        }
    }
}
