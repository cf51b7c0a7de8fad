use super::{detail_option, CommandDef, CommandSpec, Context, FnHandler};
use crate::api::Api;
use crate::cli::render::print_items;
use crate::error::Result;

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("glance_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Glance)
            .description("list images")
            .build(),
    ]
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let images = ctx.images()?.list_public(detail)?;
    print_items(ctx.out, &images, detail)?;
    Ok(())
}
