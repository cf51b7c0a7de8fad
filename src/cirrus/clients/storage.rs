//! Object storage client.
//!
//! Every operation is scoped to an account, and object operations to a
//! container as well. Missing context is reported as a [`ClientError`] before
//! any request goes out.

use super::{Body, ClientResult, Response, RestClient, Transport};
use crate::error::ClientError;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde_json::Value;
use std::rc::Rc;

/// Characters escaped in a path segment. `/` is kept so that object names can
/// carry pseudo-directories.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn path_for(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", utf8_percent_encode(s, SEGMENT)))
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Clone)]
pub struct StorageClient {
    rest: RestClient,
    account: Option<String>,
    container: Option<String>,
}

impl StorageClient {
    pub fn new(
        base_url: &str,
        token: &str,
        transport: Rc<dyn Transport>,
        account: Option<&str>,
        container: Option<&str>,
    ) -> Self {
        Self {
            rest: RestClient::new(base_url, token, transport),
            account: non_empty(account),
            container: non_empty(container),
        }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Replaces the container the object operations work on.
    pub fn set_container(&mut self, container: &str) {
        self.container = non_empty(Some(container));
    }

    fn assert_account(&self) -> ClientResult<&str> {
        self.account
            .as_deref()
            .ok_or_else(|| ClientError::new("Please provide an account"))
    }

    fn assert_container(&self) -> ClientResult<(&str, &str)> {
        let account = self.assert_account()?;
        let container = self
            .container
            .as_deref()
            .ok_or_else(|| ClientError::new("Please provide a container"))?;
        Ok((account, container))
    }

    pub fn get_account_info(&self) -> ClientResult<Vec<(String, String)>> {
        let account = self.assert_account()?;
        let r = self.rest.head(&path_for(&[account]), &[204, 401])?;
        if r.status == 401 {
            return Err(ClientError::new("No authorization").with_status(401));
        }
        Ok(r.headers)
    }

    pub fn list_containers(&self) -> ClientResult<Vec<Value>> {
        let account = self.assert_account()?;
        let request = self
            .rest
            .request(Method::GET, &path_for(&[account]))
            .query("format", "json");
        let r = self.rest.execute(request, &[200, 204])?;
        json_list(&r)
    }

    pub fn create_container(&self, container: &str) -> ClientResult<()> {
        let account = self.assert_account()?;
        let r = self
            .rest
            .execute(
                self.rest.request(Method::PUT, &path_for(&[account, container])),
                &[201, 202],
            )?;
        if r.status == 202 {
            return Err(ClientError::new("Container already exists").with_status(202));
        }
        Ok(())
    }

    pub fn get_container_info(&self, container: &str) -> ClientResult<Vec<(String, String)>> {
        let account = self.assert_account()?;
        let r = self
            .rest
            .head(&path_for(&[account, container]), &[204, 404])?;
        if r.status == 404 {
            return Err(ClientError::new("Container does not exist").with_status(404));
        }
        Ok(r.headers)
    }

    pub fn delete_container(&self, container: &str) -> ClientResult<()> {
        let account = self.assert_account()?;
        let r = self
            .rest
            .delete(&path_for(&[account, container]), &[204, 404, 409])?;
        match r.status {
            404 => Err(ClientError::new("Container does not exist").with_status(404)),
            409 => Err(ClientError::new("Container is not empty").with_status(409)),
            _ => Ok(()),
        }
    }

    /// Lists the objects of the current container, optionally under a path prefix.
    pub fn list_objects(&self, prefix: Option<&str>) -> ClientResult<Vec<Value>> {
        let (account, container) = self.assert_container()?;
        let mut request = self
            .rest
            .request(Method::GET, &path_for(&[account, container]))
            .query("format", "json");
        if let Some(prefix) = prefix {
            request = request.query("path", prefix);
        }

        let r = self.rest.execute(request, &[200, 204, 404])?;
        if r.status == 404 {
            return Err(ClientError::new(format!(
                "Incorrect account ({}) for that container",
                account
            ))
            .with_status(404));
        }
        json_list(&r)
    }

    pub fn create_object(&self, object: &str, data: Vec<u8>) -> ClientResult<()> {
        let (account, container) = self.assert_container()?;
        let request = self
            .rest
            .request(Method::PUT, &path_for(&[account, container, object]))
            .body(Body::Bytes(data));
        self.rest.execute(request, &[201])?;
        Ok(())
    }

    pub fn get_object(&self, object: &str) -> ClientResult<Vec<u8>> {
        let (account, container) = self.assert_container()?;
        let r = self
            .rest
            .get(&path_for(&[account, container, object]), &[200])?;
        Ok(r.body)
    }

    pub fn get_object_info(&self, object: &str) -> ClientResult<Vec<(String, String)>> {
        let (account, container) = self.assert_container()?;
        let r = self
            .rest
            .head(&path_for(&[account, container, object]), &[200])?;
        Ok(r.headers)
    }

    pub fn delete_object(&self, object: &str) -> ClientResult<()> {
        let (account, container) = self.assert_container()?;
        let r = self
            .rest
            .delete(&path_for(&[account, container, object]), &[204, 404])?;
        if r.status == 404 {
            return Err(ClientError::new(format!("Object {} not found", object)).with_status(404));
        }
        Ok(())
    }
}

fn json_list(response: &Response) -> ClientResult<Vec<Value>> {
    match response.json()? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        _ => Err(ClientError::new("Unexpected response: expected a list").with_status(response.status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::memory::MemoryTransport;
    use serde_json::json;

    const BASE: &str = "http://storage.test/v1";

    fn client(
        transport: &Rc<MemoryTransport>,
        account: Option<&str>,
        container: Option<&str>,
    ) -> StorageClient {
        StorageClient::new(BASE, "tok", transport.clone(), account, container)
    }

    #[test]
    fn test_missing_account_fails_before_request() {
        let transport = Rc::new(MemoryTransport::new());
        let storage = client(&transport, Some(""), None);

        let err = storage.list_containers().unwrap_err();
        assert_eq!(err.message, "Please provide an account");
        assert_eq!(err.status, None);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_missing_container_fails_before_request() {
        let transport = Rc::new(MemoryTransport::new());
        let storage = client(&transport, Some("alice"), None);

        let err = storage.delete_object("notes.txt").unwrap_err();
        assert_eq!(err.message, "Please provide a container");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_delete_non_empty_container() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::DELETE,
            &format!("{}/alice/photos", BASE),
            Response::new(409),
        );
        let storage = client(&transport, Some("alice"), None);

        let err = storage.delete_container("photos").unwrap_err();
        assert_eq!(err.message, "Container is not empty");
        assert_eq!(err.status, Some(409));
    }

    #[test]
    fn test_create_existing_container() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::PUT,
            &format!("{}/alice/photos", BASE),
            Response::new(202),
        );
        let storage = client(&transport, Some("alice"), None);

        let err = storage.create_container("photos").unwrap_err();
        assert_eq!(err.message, "Container already exists");
    }

    #[test]
    fn test_list_objects_with_prefix_and_escaping() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::GET,
            &format!("{}/alice/my%20photos", BASE),
            Response::new(200).with_json(json!([{"name": "2024/beach.jpg", "bytes": 10}])),
        );
        let storage = client(&transport, Some("alice"), Some("my photos"));

        let objects = storage.list_objects(Some("2024")).unwrap();
        assert_eq!(objects[0]["name"], "2024/beach.jpg");

        let request = transport.last_request().unwrap();
        assert!(request
            .query
            .contains(&("path".to_string(), "2024".to_string())));
        assert!(request
            .query
            .contains(&("format".to_string(), "json".to_string())));
    }

    #[test]
    fn test_empty_listing_is_204() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(Method::GET, &format!("{}/alice", BASE), Response::new(204));
        let storage = client(&transport, Some("alice"), None);

        assert!(storage.list_containers().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_object() {
        let transport = Rc::new(MemoryTransport::new());
        let storage = client(&transport, Some("alice"), Some("docs"));

        let err = storage.delete_object("a/b.txt").unwrap_err();
        assert_eq!(err.message, "Object a/b.txt not found");
        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{}/alice/docs/a/b.txt", BASE)
        );
    }

    #[test]
    fn test_upload_sends_bytes() {
        let transport = Rc::new(MemoryTransport::new());
        transport.respond(
            Method::PUT,
            &format!("{}/alice/docs/readme", BASE),
            Response::new(201),
        );
        let storage = client(&transport, Some("alice"), Some("docs"));

        storage.create_object("readme", b"hello".to_vec()).unwrap();
        assert_eq!(
            transport.last_request().unwrap().body,
            Body::Bytes(b"hello".to_vec())
        );
    }
}
