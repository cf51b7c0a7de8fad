//! Compute API client: servers, flavors, images, and the network and
//! server-lifecycle extensions.

use super::{default_error, take_field, take_list, ClientResult, Response, RestClient, Transport};
use crate::error::ClientError;
use serde::Serialize;
use serde_json::{json, Value};
use std::rc::Rc;

/// A file to inject into a new server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Personality {
    pub path: String,
    pub owner: String,
    pub group: String,
    pub mode: u32,
    /// Base64-encoded file contents.
    pub contents: String,
}

#[derive(Clone)]
pub struct ComputeClient {
    rest: RestClient,
}

/// Faults come back as `{"<kind>": {"message": ..., "details": ...}}`.
fn decode_error(response: &Response) -> ClientError {
    let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(&response.body) else {
        return default_error(response);
    };
    let Some((kind, fault)) = body.iter().next() else {
        return default_error(response);
    };

    let message = fault.get("message").and_then(Value::as_str).unwrap_or("");
    let details = fault.get("details").and_then(Value::as_str).unwrap_or("");
    ClientError::new(format!("{}: {}", kind, message))
        .with_status(response.status)
        .with_details(details)
}

impl ComputeClient {
    pub fn new(base_url: &str, token: &str, transport: Rc<dyn Transport>) -> Self {
        Self {
            rest: RestClient::new(base_url, token, transport).with_error_decoder(decode_error),
        }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    // Servers

    pub fn list_servers(&self, detail: bool) -> ClientResult<Vec<Value>> {
        let path = if detail { "/servers/detail" } else { "/servers" };
        let r = self.rest.get(path, &[200])?;
        take_list(r.json()?, "servers")
    }

    pub fn get_server_details(&self, server_id: u64) -> ClientResult<Value> {
        let r = self.rest.get(&format!("/servers/{}", server_id), &[200])?;
        take_field(r.json()?, "server")
    }

    pub fn create_server(
        &self,
        name: &str,
        flavor_id: u64,
        image_id: &str,
        personality: &[Personality],
    ) -> ClientResult<Value> {
        let mut server = json!({
            "name": name,
            "flavorRef": flavor_id,
            "imageRef": image_id,
        });
        if !personality.is_empty() {
            server["personality"] = json!(personality);
        }

        let r = self.rest.post("/servers", json!({ "server": server }), &[202])?;
        take_field(r.json()?, "server")
    }

    /// Renames the server as reported by the API; the hostname inside the
    /// server is left alone.
    pub fn update_server_name(&self, server_id: u64, new_name: &str) -> ClientResult<()> {
        let req = json!({"server": {"name": new_name}});
        self.rest
            .put(&format!("/servers/{}", server_id), req, &[204])?;
        Ok(())
    }

    pub fn delete_server(&self, server_id: u64) -> ClientResult<()> {
        self.rest.delete(&format!("/servers/{}", server_id), &[204])?;
        Ok(())
    }

    pub fn reboot_server(&self, server_id: u64, hard: bool) -> ClientResult<()> {
        let kind = if hard { "HARD" } else { "SOFT" };
        self.action(server_id, json!({"reboot": {"type": kind}}), &[202])?;
        Ok(())
    }

    pub fn start_server(&self, server_id: u64) -> ClientResult<()> {
        self.action(server_id, json!({"start": {}}), &[202])?;
        Ok(())
    }

    pub fn shutdown_server(&self, server_id: u64) -> ClientResult<()> {
        self.action(server_id, json!({"shutdown": {}}), &[202])?;
        Ok(())
    }

    pub fn get_server_console(&self, server_id: u64) -> ClientResult<Value> {
        let r = self.action(server_id, json!({"console": {"type": "vnc"}}), &[200])?;
        take_field(r.json()?, "console")
    }

    pub fn set_firewall_profile(&self, server_id: u64, profile: &str) -> ClientResult<()> {
        let req = json!({"firewallProfile": {"profile": profile}});
        self.action(server_id, req, &[202])?;
        Ok(())
    }

    pub fn list_server_addresses(
        &self,
        server_id: u64,
        network: Option<&str>,
    ) -> ClientResult<Vec<Value>> {
        match network {
            Some(network) => {
                let path = format!("/servers/{}/ips/{}", server_id, network);
                let r = self.rest.get(&path, &[200])?;
                Ok(vec![take_field(r.json()?, "network")?])
            }
            None => {
                let r = self.rest.get(&format!("/servers/{}/ips", server_id), &[200])?;
                take_list(r.json()?, "addresses")
            }
        }
    }

    pub fn get_server_stats(&self, server_id: u64) -> ClientResult<Value> {
        let r = self
            .rest
            .get(&format!("/servers/{}/stats", server_id), &[200])?;
        take_field(r.json()?, "stats")
    }

    pub fn get_server_metadata(&self, server_id: u64, key: Option<&str>) -> ClientResult<Value> {
        self.get_metadata(&format!("/servers/{}", server_id), key)
    }

    pub fn create_server_metadata(&self, server_id: u64, key: &str, val: &str) -> ClientResult<Value> {
        self.create_metadata(&format!("/servers/{}", server_id), key, val)
    }

    pub fn update_server_metadata(&self, server_id: u64, key: &str, val: &str) -> ClientResult<Value> {
        self.update_metadata(&format!("/servers/{}", server_id), key, val)
    }

    pub fn delete_server_metadata(&self, server_id: u64, key: &str) -> ClientResult<()> {
        self.delete_metadata(&format!("/servers/{}", server_id), key)
    }

    // Flavors

    pub fn list_flavors(&self, detail: bool) -> ClientResult<Vec<Value>> {
        let path = if detail { "/flavors/detail" } else { "/flavors" };
        let r = self.rest.get(path, &[200])?;
        take_list(r.json()?, "flavors")
    }

    pub fn get_flavor_details(&self, flavor_id: u64) -> ClientResult<Value> {
        let r = self.rest.get(&format!("/flavors/{}", flavor_id), &[200])?;
        take_field(r.json()?, "flavor")
    }

    // Images

    pub fn list_images(&self, detail: bool) -> ClientResult<Vec<Value>> {
        let path = if detail { "/images/detail" } else { "/images" };
        let r = self.rest.get(path, &[200])?;
        take_list(r.json()?, "images")
    }

    pub fn get_image_details(&self, image_id: &str) -> ClientResult<Value> {
        let r = self.rest.get(&format!("/images/{}", image_id), &[200])?;
        take_field(r.json()?, "image")
    }

    /// Snapshots a server into a new image.
    pub fn create_image(&self, server_id: u64, name: &str) -> ClientResult<Value> {
        let req = json!({"image": {"serverRef": server_id, "name": name}});
        let r = self.rest.post("/images", req, &[202])?;
        take_field(r.json()?, "image")
    }

    pub fn delete_image(&self, image_id: &str) -> ClientResult<()> {
        self.rest.delete(&format!("/images/{}", image_id), &[204])?;
        Ok(())
    }

    pub fn get_image_metadata(&self, image_id: &str, key: Option<&str>) -> ClientResult<Value> {
        self.get_metadata(&format!("/images/{}", image_id), key)
    }

    pub fn create_image_metadata(&self, image_id: &str, key: &str, val: &str) -> ClientResult<Value> {
        self.create_metadata(&format!("/images/{}", image_id), key, val)
    }

    pub fn update_image_metadata(&self, image_id: &str, key: &str, val: &str) -> ClientResult<Value> {
        self.update_metadata(&format!("/images/{}", image_id), key, val)
    }

    pub fn delete_image_metadata(&self, image_id: &str, key: &str) -> ClientResult<()> {
        self.delete_metadata(&format!("/images/{}", image_id), key)
    }

    // Networks

    pub fn list_networks(&self, detail: bool) -> ClientResult<Vec<Value>> {
        let path = if detail { "/networks/detail" } else { "/networks" };
        let r = self.rest.get(path, &[200])?;
        take_list(r.json()?, "networks")
    }

    pub fn create_network(&self, name: &str) -> ClientResult<Value> {
        let r = self
            .rest
            .post("/networks", json!({"network": {"name": name}}), &[202])?;
        take_field(r.json()?, "network")
    }

    pub fn get_network_details(&self, network_id: &str) -> ClientResult<Value> {
        let r = self.rest.get(&format!("/networks/{}", network_id), &[200])?;
        take_field(r.json()?, "network")
    }

    pub fn update_network_name(&self, network_id: &str, new_name: &str) -> ClientResult<()> {
        let req = json!({"network": {"name": new_name}});
        self.rest
            .put(&format!("/networks/{}", network_id), req, &[204])?;
        Ok(())
    }

    pub fn delete_network(&self, network_id: &str) -> ClientResult<()> {
        self.rest
            .delete(&format!("/networks/{}", network_id), &[204])?;
        Ok(())
    }

    pub fn connect_server(&self, server_id: &str, network_id: &str) -> ClientResult<()> {
        let req = json!({"add": {"serverRef": server_id}});
        self.rest
            .post(&format!("/networks/{}/action", network_id), req, &[202])?;
        Ok(())
    }

    pub fn disconnect_server(&self, server_id: &str, network_id: &str) -> ClientResult<()> {
        let req = json!({"remove": {"serverRef": server_id}});
        self.rest
            .post(&format!("/networks/{}/action", network_id), req, &[202])?;
        Ok(())
    }

    fn action(&self, server_id: u64, req: Value, success: &[u16]) -> ClientResult<Response> {
        self.rest
            .post(&format!("/servers/{}/action", server_id), req, success)
    }

    fn get_metadata(&self, prefix: &str, key: Option<&str>) -> ClientResult<Value> {
        match key {
            Some(key) => {
                let r = self.rest.get(&format!("{}/meta/{}", prefix, key), &[200])?;
                take_field(r.json()?, "meta")
            }
            None => {
                let r = self.rest.get(&format!("{}/meta", prefix), &[200])?;
                let metadata = take_field(r.json()?, "metadata")?;
                match metadata {
                    Value::Object(mut wrapped) if wrapped.contains_key("values") => {
                        Ok(wrapped.remove("values").unwrap_or(Value::Null))
                    }
                    other => Ok(other),
                }
            }
        }
    }

    fn create_metadata(&self, prefix: &str, key: &str, val: &str) -> ClientResult<Value> {
        let req = json!({"meta": {key: val}});
        let r = self
            .rest
            .put(&format!("{}/meta/{}", prefix, key), req, &[201])?;
        take_field(r.json()?, "meta")
    }

    fn update_metadata(&self, prefix: &str, key: &str, val: &str) -> ClientResult<Value> {
        let req = json!({"metadata": {key: val}});
        let r = self.rest.post(&format!("{}/meta", prefix), req, &[201])?;
        take_field(r.json()?, "metadata")
    }

    fn delete_metadata(&self, prefix: &str, key: &str) -> ClientResult<()> {
        self.rest
            .delete(&format!("{}/meta/{}", prefix, key), &[204])?;
        Ok(())
    }
}
