use super::{take_list, ClientResult, RestClient, Transport};
use serde_json::Value;
use std::rc::Rc;

/// Image registry client.
#[derive(Clone)]
pub struct ImagesClient {
    rest: RestClient,
}

impl ImagesClient {
    pub fn new(base_url: &str, token: &str, transport: Rc<dyn Transport>) -> Self {
        Self {
            rest: RestClient::new(base_url, token, transport),
        }
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Lists the public images, with every attribute when `detail` is set.
    pub fn list_public(&self, detail: bool) -> ClientResult<Vec<Value>> {
        let path = if detail { "/images/detail" } else { "/images" };
        let r = self.rest.get(path, &[200])?;
        take_list(r.json()?, "images")
    }
}
