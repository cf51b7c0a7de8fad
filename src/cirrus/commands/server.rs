//! `server` group: virtual machine lifecycle against the compute API.

use super::{
    arg, detail_option, parse_id, required, CommandDef, CommandSpec, Context, FnHandler, Param,
};
use crate::api::Api;
use crate::cli::render::{print_addresses, print_dict, print_items};
use crate::clients::compute::Personality;
use crate::error::{CirrusError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Arg, ArgAction, Command};
use serde_json::Value;
use std::fs;
use std::path::Path;

const SERVER_ID: Param = Param::required("server_id");

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("server_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Nova)
            .description("list servers")
            .build(),
        CommandDef::new("server_info", FnHandler::new(info))
            .api(Api::Nova)
            .description("get server details")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new(
            "server_create",
            FnHandler::new(create).with_options(personality_option),
        )
        .api(Api::Nova)
        .description("create server")
        .params(&[
            Param::required("name"),
            Param::required("flavor_id"),
            Param::required("image_id"),
        ])
        .build(),
        CommandDef::new("server_rename", FnHandler::new(rename))
            .api(Api::Nova)
            .description("update server name")
            .params(&[SERVER_ID, Param::required("new_name")])
            .build(),
        CommandDef::new("server_delete", FnHandler::new(delete))
            .api(Api::Nova)
            .description("delete server")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new("server_reboot", FnHandler::new(reboot).with_options(hard_option))
            .api(Api::Nova)
            .description("reboot server")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new("server_start", FnHandler::new(start))
            .api(Api::Synnefo)
            .description("start server")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new("server_shutdown", FnHandler::new(shutdown))
            .api(Api::Synnefo)
            .description("shutdown server")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new("server_console", FnHandler::new(console))
            .api(Api::Synnefo)
            .description("get a VNC console")
            .params(&[SERVER_ID])
            .build(),
        CommandDef::new("server_firewall", FnHandler::new(firewall))
            .api(Api::Synnefo)
            .description("set the firewall profile")
            .params(&[SERVER_ID, Param::required("profile")])
            .build(),
        CommandDef::new("server_addr", FnHandler::new(addr))
            .api(Api::Synnefo)
            .description("list server addresses")
            .params(&[SERVER_ID, Param::optional("network")])
            .build(),
        CommandDef::new("server_meta", FnHandler::new(meta))
            .api(Api::Nova)
            .description("get server metadata")
            .params(&[SERVER_ID, Param::optional("key")])
            .build(),
        CommandDef::new("server_addmeta", FnHandler::new(addmeta))
            .api(Api::Nova)
            .description("add server metadata")
            .params(&[SERVER_ID, Param::required("key"), Param::required("val")])
            .build(),
        CommandDef::new("server_setmeta", FnHandler::new(setmeta))
            .api(Api::Nova)
            .description("update server metadata")
            .params(&[SERVER_ID, Param::required("key"), Param::required("val")])
            .build(),
        CommandDef::new("server_delmeta", FnHandler::new(delmeta))
            .api(Api::Nova)
            .description("delete server metadata")
            .params(&[SERVER_ID, Param::required("key")])
            .build(),
        CommandDef::new("server_stats", FnHandler::new(stats))
            .api(Api::Synnefo)
            .description("get server statistics")
            .params(&[SERVER_ID])
            .build(),
    ]
}

fn server_id(args: &[String]) -> Result<u64> {
    parse_id(required(args, 0)?, "server id")
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let servers = ctx.compute()?.list_servers(detail)?;
    print_items(ctx.out, &servers, detail)?;
    Ok(())
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let server = ctx.compute()?.get_server_details(server_id(args)?)?;
    print_dict(ctx.out, &server, &[])?;
    Ok(())
}

fn personality_option(command: Command) -> Command {
    command
        .arg(
            Arg::new("personality")
                .long("personality")
                .value_name("PATH[,SERVER PATH[,OWNER[,GROUP[,MODE]]]]")
                .action(ArgAction::Append)
                .help("add a personality file"),
        )
        .after_help(
            "If missing, optional personality values will be filled based on the file at PATH.",
        )
}

fn create(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = required(args, 0)?;
    let flavor_id = parse_id(required(args, 1)?, "flavor id")?;
    let image_id = required(args, 2)?;

    let personalities = ctx
        .values("personality")
        .iter()
        .map(|p| parse_personality(p))
        .collect::<Result<Vec<_>>>()?;

    let reply = ctx
        .compute()?
        .create_server(name, flavor_id, image_id, &personalities)?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

/// Parses `PATH[,SERVER PATH[,OWNER[,GROUP[,MODE]]]]`, filling the blanks
/// from the local file. `MODE` is octal.
pub fn parse_personality(spec: &str) -> Result<Personality> {
    let fields: Vec<&str> = spec.split(',').collect();
    let field = |i: usize| fields.get(i).copied().filter(|f| !f.is_empty());

    let path = field(0)
        .ok_or_else(|| CirrusError::InvalidInput(format!("Invalid personality argument '{}'", spec)))?;
    let local = Path::new(path);
    let metadata = fs::metadata(local)
        .map_err(|_| CirrusError::InvalidInput(format!("File {} does not exist", path)))?;
    let contents = STANDARD.encode(fs::read(local)?);
    let (owner, group, file_mode) = file_identity(&metadata);

    let server_path = match field(1) {
        Some(p) => p.to_string(),
        None => fs::canonicalize(local)?.display().to_string(),
    };
    let mode = match field(4) {
        Some(m) => u32::from_str_radix(m, 8)
            .map_err(|_| CirrusError::InvalidInput(format!("Invalid personality mode '{}'", m)))?,
        None => file_mode,
    };

    Ok(Personality {
        path: server_path,
        owner: field(2).map(str::to_string).unwrap_or(owner),
        group: field(3).map(str::to_string).unwrap_or(group),
        mode,
        contents,
    })
}

#[cfg(unix)]
fn file_identity(metadata: &fs::Metadata) -> (String, String, u32) {
    use std::os::unix::fs::MetadataExt;
    (
        metadata.uid().to_string(),
        metadata.gid().to_string(),
        metadata.mode() & 0o7777,
    )
}

#[cfg(not(unix))]
fn file_identity(metadata: &fs::Metadata) -> (String, String, u32) {
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    (String::new(), String::new(), mode)
}

fn rename(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .update_server_name(server_id(args)?, required(args, 1)?)?;
    Ok(())
}

fn delete(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?.delete_server(server_id(args)?)?;
    Ok(())
}

fn hard_option(command: Command) -> Command {
    command.arg(
        Arg::new("hard")
            .short('f')
            .action(ArgAction::SetTrue)
            .help("perform a hard reboot"),
    )
}

fn reboot(ctx: &mut Context, args: &[String]) -> Result<()> {
    let hard = ctx.flag("hard");
    ctx.compute()?.reboot_server(server_id(args)?, hard)?;
    Ok(())
}

fn start(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?.start_server(server_id(args)?)?;
    Ok(())
}

fn shutdown(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?.shutdown_server(server_id(args)?)?;
    Ok(())
}

fn console(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.get_server_console(server_id(args)?)?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn firewall(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .set_firewall_profile(server_id(args)?, required(args, 1)?)?;
    Ok(())
}

fn addr(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx
        .compute()?
        .list_server_addresses(server_id(args)?, arg(args, 1))?;
    let margin = reply
        .iter()
        .filter_map(|a| a.get("name").and_then(Value::as_str))
        .map(str::len)
        .max()
        .unwrap_or(0);
    print_addresses(ctx.out, &reply, margin)?;
    Ok(())
}

fn meta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx
        .compute()?
        .get_server_metadata(server_id(args)?, arg(args, 1))?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn addmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.create_server_metadata(
        server_id(args)?,
        required(args, 1)?,
        required(args, 2)?,
    )?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn setmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.update_server_metadata(
        server_id(args)?,
        required(args, 1)?,
        required(args, 2)?,
    )?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn delmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .delete_server_metadata(server_id(args)?, required(args, 1)?)?;
    Ok(())
}

fn stats(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.get_server_stats(server_id(args)?)?;
    print_dict(ctx.out, &reply, &["serverRef"])?;
    Ok(())
}
