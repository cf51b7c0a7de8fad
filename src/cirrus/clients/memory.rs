use super::{ClientResult, Request, Response, Transport};
use reqwest::Method;
use std::cell::RefCell;

/// In-memory transport for testing.
///
/// Responses are scripted per `(method, url)`; the query string is not part of
/// the match. Unscripted requests get a `404` with an empty body. Every request
/// is recorded so tests can assert on what was sent.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: RefCell<Vec<(Method, String, Response)>>,
    requests: RefCell<Vec<Request>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `response` for `method url`. A later script for the same route wins.
    pub fn respond(&self, method: Method, url: &str, response: Response) -> &Self {
        self.routes
            .borrow_mut()
            .push((method, url.to_string(), response));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.borrow().last().cloned()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, request: &Request) -> ClientResult<Response> {
        self.requests.borrow_mut().push(request.clone());

        let response = self
            .routes
            .borrow()
            .iter()
            .rev()
            .find(|(method, url, _)| *method == request.method && *url == request.url)
            .map(|(_, _, response)| response.clone())
            .unwrap_or_else(|| Response::new(404));
        Ok(response)
    }
}
