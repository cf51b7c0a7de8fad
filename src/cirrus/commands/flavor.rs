use super::{detail_option, parse_id, required, CommandDef, CommandSpec, Context, FnHandler, Param};
use crate::api::Api;
use crate::cli::render::{print_dict, print_items};
use crate::error::Result;

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("flavor_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Nova)
            .description("list flavors")
            .build(),
        CommandDef::new("flavor_info", FnHandler::new(info))
            .api(Api::Nova)
            .description("get flavor details")
            .params(&[Param::required("flavor_id")])
            .build(),
    ]
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let flavors = ctx.compute()?.list_flavors(detail)?;
    print_items(ctx.out, &flavors, detail)?;
    Ok(())
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let flavor_id = parse_id(required(args, 0)?, "flavor id")?;
    let flavor = ctx.compute()?.get_flavor_details(flavor_id)?;
    print_dict(ctx.out, &flavor, &[])?;
    Ok(())
}
