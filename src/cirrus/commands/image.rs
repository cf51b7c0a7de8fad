//! `image` group: images as seen through the compute API.

use super::{
    arg, detail_option, parse_id, required, CommandDef, CommandSpec, Context, FnHandler, Param,
};
use crate::api::Api;
use crate::cli::render::{print_dict, print_items};
use crate::error::Result;

const IMAGE_ID: Param = Param::required("image_id");

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("image_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Nova)
            .description("list images")
            .build(),
        CommandDef::new("image_info", FnHandler::new(info))
            .api(Api::Nova)
            .description("get image details")
            .params(&[IMAGE_ID])
            .build(),
        CommandDef::new("image_create", FnHandler::new(create))
            .api(Api::Nova)
            .description("create image")
            .params(&[Param::required("server_id"), Param::required("name")])
            .build(),
        CommandDef::new("image_delete", FnHandler::new(delete))
            .api(Api::Nova)
            .description("delete image")
            .params(&[IMAGE_ID])
            .build(),
        CommandDef::new("image_meta", FnHandler::new(meta))
            .api(Api::Nova)
            .description("get image metadata")
            .params(&[IMAGE_ID, Param::optional("key")])
            .build(),
        CommandDef::new("image_addmeta", FnHandler::new(addmeta))
            .api(Api::Nova)
            .description("add image metadata")
            .params(&[IMAGE_ID, Param::required("key"), Param::required("val")])
            .build(),
        CommandDef::new("image_setmeta", FnHandler::new(setmeta))
            .api(Api::Nova)
            .description("update image metadata")
            .params(&[IMAGE_ID, Param::required("key"), Param::required("val")])
            .build(),
        CommandDef::new("image_delmeta", FnHandler::new(delmeta))
            .api(Api::Nova)
            .description("delete image metadata")
            .params(&[IMAGE_ID, Param::required("key")])
            .build(),
    ]
}

fn list(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let images = ctx.compute()?.list_images(detail)?;
    print_items(ctx.out, &images, detail)?;
    Ok(())
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let image = ctx.compute()?.get_image_details(required(args, 0)?)?;
    print_dict(ctx.out, &image, &[])?;
    Ok(())
}

fn create(ctx: &mut Context, args: &[String]) -> Result<()> {
    let server_id = parse_id(required(args, 0)?, "server id")?;
    let reply = ctx.compute()?.create_image(server_id, required(args, 1)?)?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn delete(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?.delete_image(required(args, 0)?)?;
    Ok(())
}

fn meta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx
        .compute()?
        .get_image_metadata(required(args, 0)?, arg(args, 1))?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn addmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.create_image_metadata(
        required(args, 0)?,
        required(args, 1)?,
        required(args, 2)?,
    )?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn setmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    let reply = ctx.compute()?.update_image_metadata(
        required(args, 0)?,
        required(args, 1)?,
        required(args, 2)?,
    )?;
    print_dict(ctx.out, &reply, &[])?;
    Ok(())
}

fn delmeta(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.compute()?
        .delete_image_metadata(required(args, 0)?, required(args, 1)?)?;
    Ok(())
}
