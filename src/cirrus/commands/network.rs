use super::{detail_option, required, CommandDef, CommandSpec, Context, FnHandler, Param};
use crate::api::Api;
use crate::cli::render::{print_dict, print_items};
use crate::error::Result;

const NETWORK_ID: Param = Param::required("network_id");

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("network_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Synnefo)
            .description("list networks")
            .build(),
        CommandDef::new("network_create", FnHandler::new(create))
            .api(Api::Synnefo)
            .description("create a network")
            .params(&[Param::required("name")])
            .build(),
        CommandDef::new("network_info", FnHandler::new(info))
            .api(Api::Synnefo)
            .description("get network details")
            .params(&[NETWORK_ID])
            .build(),
        CommandDef::new("network_rename", FnHandler::new(rename))
            .api(Api::Synnefo)
            .description("update network name")
            .params(&[NETWORK_ID, Param::required("new_name")])
            .build(),
        CommandDef::new("network_delete", FnHandler::new(delete))
            .api(Api::Synnefo)
            .description("delete a network")
            .params(&[NETWORK_ID])
            .build(),
        CommandDef::new("network_connect", FnHandler::new(connect))
            .api(Api::Synnefo)
            .description("connect a server to a network")
            .params(&[Param::required("server_id"), NETWORK_ID])
            .build(),
        CommandDef::new("network_disconnect", FnHandler::new(disconnect))
            .api(Api::Synnefo)
            .description("disconnect a server from a network")
            .params(&[Param::required("server_id"), NETWORK_ID])
            .build(),
    ]
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let networks = ctx.compute()?.list_networks(detail)?;
    print_items(ctx.out, &networks, detail)?;
    Ok(())
}

fn create(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.create_network(required(args, 0)?)?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let network = ctx.compute()?.get_network_details(required(args, 0)?)?;
    print_dict(ctx.out, &network, &[])?;
    Ok(())
}

fn rename(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .update_network_name(required(args, 0)?, required(args, 1)?)?;
    Ok(())
}

fn delete(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?.delete_network(required(args, 0)?)?;
    Ok(())
}

fn connect(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .connect_server(required(args, 0)?, required(args, 1)?)?;
    Ok(())
}

fn disconnect(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .disconnect_server(required(args, 0)?, required(args, 1)?)?;
    Ok(())
}
