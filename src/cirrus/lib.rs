//! # Cirrus Architecture
//!
//! Cirrus is a command-line client for a cloud's compute, image and
//! object-storage REST APIs. An invocation names a group and a command,
//! `cirrus <group> <command> [options] [args...]`, and runs exactly one
//! authenticated request sequence before exiting.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Two-pass argument parsing, help, exit codes              │
//! │  - The ONLY place that touches stdout/stderr/env            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/)                                  │
//! │  - Registry of group/name → CommandSpec                     │
//! │  - API availability filter                                  │
//! │  - One module per group, handlers write to a Context        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client Layer (api.rs, clients/)                            │
//! │  - API tag → family → client factory                        │
//! │  - Compute, images and storage clients over a Transport     │
//! │  - HttpTransport (production), MemoryTransport (testing)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration (`config.rs`) runs alongside all three: built-in defaults,
//! the persisted `~/.cirrusrc` and per-run overrides from flags, in increasing
//! precedence.
//!
//! ## Adding a command
//!
//! 1. Write a handler `fn(&mut Context, &[String]) -> Result<()>` in the
//!    group's module under `commands/`.
//! 2. Describe it with [`commands::CommandDef`]: identifier, API tag,
//!    description and its positional [`commands::Param`]s. The group, name and
//!    help syntax are derived from these.
//! 3. Add it to that module's `commands()` list. Order there is help order.
//!
//! ## Testing Strategy
//!
//! - **Clients**: scripted [`clients::memory::MemoryTransport`] responses, asserting
//!   on the requests sent and the errors decoded.
//! - **Commands**: each handler runs against a memory transport and its output
//!   is compared as text.
//! - **Dispatcher**: whole command lines against the built-in registry, checking
//!   exit status and help output.
//! - **Binary** (`tests/`): `assert_cmd` runs with an isolated config file.
//!
//! ## Module Overview
//!
//! - [`api`]: API tags, families and the client factory
//! - [`cli`]: dispatcher, rendering, process entry point
//! - [`clients`]: transports and the per-family REST clients
//! - [`commands`]: registry, availability filter and every command
//! - [`config`]: layered configuration and its TOML file
//! - [`error`]: error types

pub mod api;
pub mod cli;
pub mod clients;
pub mod commands;
pub mod config;
pub mod error;
