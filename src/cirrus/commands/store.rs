//! `store` group: containers and objects in object storage.
//!
//! The account and the default container come from configuration (or
//! `--account` / `--container`); commands that take a container argument use it
//! instead of the configured one.

use super::{arg, detail_option, required, CommandDef, CommandSpec, Context, FnHandler, Param};
use crate::api::Api;
use crate::cli::render::{print_dict, print_headers};
use crate::error::{ClientError, CirrusError, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

const CONTAINER: Param = Param::required("container");
const OBJECT: Param = Param::required("object");

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandDef::new("store_account", FnHandler::new(account))
            .api(Api::Pithos)
            .description("get account information")
            .build(),
        CommandDef::new("store_list", FnHandler::new(list).with_options(detail_option))
            .api(Api::Pithos)
            .description("list containers, or the objects of a container")
            .params(&[Param::optional("container")])
            .build(),
        CommandDef::new("store_create", FnHandler::new(create))
            .api(Api::Pithos)
            .description("create a container")
            .params(&[CONTAINER])
            .build(),
        CommandDef::new("store_info", FnHandler::new(info))
            .api(Api::Pithos)
            .description("get container information")
            .params(&[Param::optional("container")])
            .build(),
        CommandDef::new("store_delete", FnHandler::new(delete))
            .api(Api::Pithos)
            .description("delete an empty container")
            .params(&[CONTAINER])
            .build(),
        CommandDef::new("store_upload", FnHandler::new(upload))
            .api(Api::Pithos)
            .description("upload a file")
            .params(&[Param::required("path"), Param::optional("object")])
            .build(),
        CommandDef::new("store_download", FnHandler::new(download))
            .api(Api::Pithos)
            .description("download an object")
            .params(&[OBJECT, Param::optional("path")])
            .build(),
        CommandDef::new("store_remove", FnHandler::new(remove))
            .api(Api::Pithos)
            .description("remove an object")
            .params(&[OBJECT])
            .build(),
    ]
}

fn sorted(mut headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers.sort();
    headers
}

fn account(ctx: &mut Context, _args: &[String]) -> Result<()> {
    let headers = ctx.storage()?.get_account_info()?;
    print_headers(ctx.out, &sorted(headers))?;
    Ok(())
}

fn list(ctx: &mut Context, args: &[String]) -> Result<()> {
    let detail = ctx.flag("detail");
    let items = match arg(args, 0) {
        Some(container) => {
            let storage = ctx.storage()?;
            storage.set_container(container);
            storage.list_objects(None)?
        }
        None => ctx.storage()?.list_containers()?,
    };

    for item in &items {
        let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
        writeln!(ctx.out, "{}", name)?;
        if detail {
            print_dict(ctx.out, item, &["name"])?;
            writeln!(ctx.out)?;
        }
    }
    Ok(())
}

fn create(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.storage()?.create_container(required(args, 0)?)?;
    Ok(())
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let storage = ctx.storage()?;
    let container = match arg(args, 0) {
        Some(container) => container.to_string(),
        None => storage
            .container()
            .map(str::to_string)
            .ok_or_else(|| ClientError::new("Please provide a container"))?,
    };
    let headers = storage.get_container_info(&container)?;
    print_headers(ctx.out, &sorted(headers))?;
    Ok(())
}

fn delete(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.storage()?.delete_container(required(args, 0)?)?;
    Ok(())
}

fn upload(ctx: &mut Context, args: &[String]) -> Result<()> {
    let path = Path::new(required(args, 0)?);
    if !path.is_file() {
        return Err(CirrusError::InvalidInput(format!(
            "File {} does not exist",
            path.display()
        )));
    }
    let object = match arg(args, 1) {
        Some(object) => object.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CirrusError::InvalidInput(format!("Cannot name an object after {}", path.display()))
            })?,
    };

    let data = fs::read(path)?;
    ctx.storage()?.create_object(&object, data)?;
    Ok(())
}

fn download(ctx: &mut Context, args: &[String]) -> Result<()> {
    let data = ctx.storage()?.get_object(required(args, 0)?)?;
    match arg(args, 1) {
        Some(path) => fs::write(path, data)?,
        None => ctx.out.write_all(&data)?,
    }
    Ok(())
}

fn remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    ctx.storage()?.delete_object(required(args, 0)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory::MemoryTransport;
    use crate::clients::{Body, Response};
    use crate::commands::testing::{config_with, find, run_command};
    use crate::config::{Config, GLOBAL};
    use reqwest::Method;
    use serde_json::json;
    use std::rc::Rc;
    use tempfile::TempDir;

    const BASE: &str = "http://storage.test";

    fn config(container: Option<&str>) -> Config {
        let mut config = config_with(Api::Pithos, BASE);
        config.set(GLOBAL, "account", "alice");
        if let Some(container) = container {
            config.set(GLOBAL, "container", container);
        }
        config
    }

    #[test]
    fn test_list_containers() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::GET,
            "http://storage.test/alice",
            Response::new(200).with_json(json!([
                {"name": "docs", "count": 2, "bytes": 10},
                {"name": "photos", "count": 0, "bytes": 0}
            ])),
        );
        let mut config = config(None);

        let (result, out) = run_command(&find("store", "list"), &mut config, &transport, &[], &[]);
        result.unwrap();
        assert_eq!(out, "docs\nphotos\n");
    }

    #[test]
    fn test_list_objects_of_named_container() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::GET,
            "http://storage.test/alice/docs",
            Response::new(200).with_json(json!([{"name": "a.txt", "bytes": 3}])),
        );
        let mut config = config(None);

        let (result, out) = run_command(
            &find("store", "list"),
            &mut config,
            &transport,
            &["-l"],
            &["docs"],
        );
        result.unwrap();
        assert!(out.starts_with("a.txt\n"));
        assert!(out.contains("bytes: 3"));
    }

    #[test]
    fn test_missing_account_is_client_error() {
        let transport = Rc::new(MemoryTransport::new());
        let mut config = config_with(Api::Pithos, BASE);

        let (result, _) = run_command(&find("store", "account"), &mut config, &transport, &[], &[]);
        let Err(CirrusError::Client(err)) = result else {
            panic!("expected a client error");
        };
        assert_eq!(err.message, "Please provide an account");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_info_needs_a_container() {
        let transport = Rc::new(MemoryTransport::new());
        let mut config = config(None);

        let (result, _) = run_command(&find("store", "info"), &mut config, &transport, &[], &[]);
        assert!(matches!(result, Err(CirrusError::Client(_))));
    }

    #[test]
    fn test_info_prints_sorted_headers() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::HEAD,
            "http://storage.test/alice/docs",
            Response::new(204)
                .with_header("x-container-object-count", "2")
                .with_header("x-container-bytes-used", "10"),
        );
        let mut config = config(Some("docs"));

        let (result, out) = run_command(&find("store", "info"), &mut config, &transport, &[], &[]);
        result.unwrap();
        assert_eq!(
            out,
            "  x-container-bytes-used: 10\nx-container-object-count: 2\n"
        );
    }

    #[test]
    fn test_upload_names_object_after_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hi").unwrap();

        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::PUT,
            "http://storage.test/alice/docs/notes.txt",
            Response::new(201),
        );
        let mut config = config(Some("docs"));

        let (result, _) = run_command(
            &find("store", "upload"),
            &mut config,
            &transport,
            &[],
            &[path.to_str().unwrap()],
        );
        result.unwrap();
        assert_eq!(
            transport.last_request().unwrap().body,
            Body::Bytes(b"hi".to_vec())
        );
    }

    #[test]
    fn test_upload_missing_file() {
        let transport = Rc::new(MemoryTransport::new());
        let mut config = config(Some("docs"));

        let (result, _) = run_command(
            &find("store", "upload"),
            &mut config,
            &transport,
            &[],
            &["/no/such/file"],
        );
        assert!(matches!(result, Err(CirrusError::InvalidInput(_))));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_download_to_stdout_and_file() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::GET,
            "http://storage.test/alice/docs/a.txt",
            Response::new(200).with_body("content"),
        );
        let mut config = config(Some("docs"));

        let (result, out) = run_command(
            &find("store", "download"),
            &mut config,
            &transport,
            &[],
            &["a.txt"],
        );
        result.unwrap();
        assert_eq!(out, "content");

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("copy.txt");
        let (result, out) = run_command(
            &find("store", "download"),
            &mut config,
            &transport,
            &[],
            &["a.txt", target.to_str().unwrap()],
        );
        result.unwrap();
        assert!(out.is_empty());
        assert_eq!(fs::read_to_string(&target).unwrap(), "content");
    }

    #[test]
    fn test_delete_non_empty_container() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::DELETE,
            "http://storage.test/alice/docs",
            Response::new(409),
        );
        let mut config = config(None);

        let (result, _) = run_command(
            &find("store", "delete"),
            &mut config,
            &transport,
            &[],
            &["docs"],
        );
        let Err(CirrusError::Client(err)) = result else {
            panic!("expected a client error");
        };
        assert_eq!(err.message, "Container is not empty");
    }
}
