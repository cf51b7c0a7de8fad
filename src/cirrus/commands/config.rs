//! `config` group: read and edit the persisted configuration.
//!
//! Keys are `key` for the global section or `section.key` for any other.

use super::{required, CommandDef, CommandSpec, Context, FnHandler, Param};
use crate::config::{split_key, GLOBAL};
use crate::error::Result;
use std::io::Write;

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("config_list", FnHandler::new(list))
            .description("list configuration options")
            .build(),
        CommandDef::new("config_get", FnHandler::new(get))
            .description("get a configuration option")
            .params(&[Param::required("key")])
            .build(),
        CommandDef::new("config_set", FnHandler::new(set))
            .description("set a configuration option")
            .params(&[Param::required("key"), Param::required("val")])
            .build(),
        CommandDef::new("config_del", FnHandler::new(del))
            .description("delete a configuration option")
            .params(&[Param::required("key")])
            .build(),
    ]
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    for section in ctx.config.sections() {
        for (key, val) in ctx.config.items(&section, true) {
            if section == GLOBAL {
                writeln!(ctx.out, "{}={}", key, val)?;
            } else {
                writeln!(ctx.out, "{}.{}={}", section, key, val)?;
            }
        }
    }
    Ok(())
}

fn get(ctx: &mut Context, args: &[String]) -> Result<()> {
    let (section, key) = split_key(required(args, 0)?);
    if let Some(val) = ctx.config.get(section, key) {
        writeln!(ctx.out, "{}", val)?;
    }
    Ok(())
}

fn set(ctx: &mut Context, args: &[String]) -> Result<()> {
    let (section, key) = split_key(required(args, 0)?);
    ctx.config.set(section, key, required(args, 1)?);
    ctx.config.write()?;
    Ok(())
}

fn del(ctx: &mut Context, args: &[String]) -> Result<()> {
    let (section, key) = split_key(required(args, 0)?);
    ctx.config.delete(section, key);
    ctx.config.write()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::clients::memory::MemoryTransport;
    use crate::commands::testing::{find, run_command};
    use crate::config::{Config, GLOBAL};
    use std::rc::Rc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config, Rc<MemoryTransport>) {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path().join("cirrusrc"));
        (dir, config, Rc::new(MemoryTransport::new()))
    }

    #[test]
    fn test_set_then_get_persists() {
        let (dir, mut config, transport) = setup();

        let (result, _) = run_command(
            &find("config", "set"),
            &mut config,
            &transport,
            &[],
            &["token", "ABC123"],
        );
        result.unwrap();

        let mut reloaded = Config::load(dir.path().join("cirrusrc")).unwrap();
        let (result, out) = run_command(
            &find("config", "get"),
            &mut reloaded,
            &transport,
            &[],
            &["token"],
        );
        result.unwrap();
        assert_eq!(out, "ABC123\n");
    }

    #[test]
    fn test_set_section_key() {
        let (_dir, mut config, transport) = setup();
        let (result, _) = run_command(
            &find("config", "set"),
            &mut config,
            &transport,
            &[],
            &["storage.url", "http://s.test"],
        );
        result.unwrap();
        assert_eq!(config.get("storage", "url"), Some("http://s.test"));
    }

    #[test]
    fn test_get_unknown_prints_nothing() {
        let (_dir, mut config, transport) = setup();
        let (result, out) = run_command(
            &find("config", "get"),
            &mut config,
            &transport,
            &[],
            &["nope"],
        );
        result.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_del_removes_value() {
        let (_dir, mut config, transport) = setup();
        config.set(GLOBAL, "token", "x");

        let (result, _) = run_command(
            &find("config", "del"),
            &mut config,
            &transport,
            &[],
            &["token"],
        );
        result.unwrap();
        assert_eq!(config.get(GLOBAL, "token"), Some(""));
    }

    #[test]
    fn test_list_shows_defaults_and_sections() {
        let (_dir, mut config, transport) = setup();
        config.set(GLOBAL, "token", "secret");
        config.set("compute", "url", "http://c.test");

        let (result, out) = run_command(
            &find("config", "list"),
            &mut config,
            &transport,
            &[],
            &[],
        );
        result.unwrap();
        assert!(out.contains("token=secret\n"));
        assert!(out.contains("apis=nova synnefo glance plankton\n"));
        assert!(out.contains("compute.url=http://c.test\n"));
        assert!(out.find("token=").unwrap() < out.find("compute.url").unwrap());
    }
}
