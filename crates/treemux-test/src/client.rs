//! In-memory client that dispatches requests without a socket.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method};
use serde::Serialize;
use treemux_core::Dispatch;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight to a dispatcher and captures the responses.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use treemux_core::{text_response, TreeMux};
/// use treemux_test::TestClient;
///
/// let mux = TreeMux::builder()
///     .handle_func("/foo/*", |_req| Ok(text_response(StatusCode::OK, "foo")))
///     .build();
///
/// let client = TestClient::new(mux);
/// client.get("/foo/bar").send().assert_status(StatusCode::OK);
/// client.get("/baz").send().assert_not_found();
/// ```
#[derive(Debug)]
pub struct TestClient<D> {
    dispatcher: Arc<D>,
    default_headers: HeaderMap,
}

impl<D: Dispatch> TestClient<D> {
    /// Creates a client that owns its dispatcher.
    pub fn new(dispatcher: D) -> Self {
        Self::from_shared(Arc::new(dispatcher))
    }

    /// Creates a client over a shared dispatcher.
    pub fn from_shared(dispatcher: Arc<D>) -> Self {
        Self {
            dispatcher,
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request.
    ///
    /// Invalid names or values are ignored.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D> {
        self.request(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_, D> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_, D> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
            match_path: None,
        }
    }
}

impl<D> Clone for TestClient<D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            default_headers: self.default_headers.clone(),
        }
    }
}

/// A request being assembled by a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a, D> {
    client: &'a TestClient<D>,
    builder: TestRequestBuilder,
    match_path: Option<String>,
}

impl<D: Dispatch> TestClientRequest<'_, D> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Matches against `path` instead of the request URI's path.
    ///
    /// The handler still sees the original URI. Use this for lookups under
    /// paths a URI cannot carry, such as unrooted ones.
    pub fn match_path(mut self, path: impl Into<String>) -> Self {
        self.match_path = Some(path.into());
        self
    }

    /// Dispatches the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be built.
    pub fn try_send(self) -> Result<TestResponse, TestError> {
        let mut request = self.builder.build()?;
        for (name, value) in &self.client.default_headers {
            request
                .headers_mut()
                .entry(name)
                .or_insert_with(|| value.clone());
        }

        let response = match self.match_path {
            Some(path) => self.client.dispatcher.dispatch_path(&path, &request),
            None => self.client.dispatcher.dispatch(&request),
        };
        Ok(TestResponse::from_response(response))
    }

    /// Dispatches the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    #[track_caller]
    pub fn send(self) -> TestResponse {
        self.try_send()
            .unwrap_or_else(|e| panic!("failed to build test request: {e}"))
    }
}
