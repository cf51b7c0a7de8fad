//! # CLI Layer
//!
//! The only place that knows about the real stdout, stderr, the environment and
//! process exit codes. Everything here is wiring:
//!
//! - [`dispatch`]: the two-pass argument parser and the group/command state machine
//! - [`render`]: plain-text output of API responses
//! - [`run`]: logging setup, configuration loading and the production transport
//!
//! ## Exit codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | success, or help shown on request |
//! | 1 | usage error, unknown group or command, bad configuration |
//! | 2 | the remote API (or a storage precondition) reported a failure |

pub mod dispatch;
pub mod render;

pub use dispatch::{Dispatcher, Status};

use crate::clients::HttpTransport;
use crate::commands;
use crate::config::Config;
use std::io::Write;
use std::rc::Rc;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Installs the stderr logger: warnings by default, `-v` for info, `-d` for
/// debug. `RUST_LOG` takes precedence when set.
pub fn init_logging(argv: &[String]) {
    let matches = dispatch::preliminary_parse(argv);
    let flag = |id: &str| matches!(matches.try_get_one::<bool>(id), Ok(Some(true)));
    let level = if flag("debug") {
        "debug"
    } else if flag("verbose") {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,cirrus={}", level)));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_level(false)
        .try_init();
}

/// Runs the command line of this process and returns its exit code.
pub fn run() -> i32 {
    let argv: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    init_logging(&argv);

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Status::Usage.code();
        }
    };
    let transport = match HttpTransport::new() {
        Ok(transport) => transport,
        Err(e) => {
            error!("{}", e.message);
            return Status::Remote.code();
        }
    };

    let dispatcher = Dispatcher::new(commands::builtin(), Rc::new(transport));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let status = dispatcher.run(&argv, &mut config, &mut out);
    let _ = out.flush();
    status.code()
}
