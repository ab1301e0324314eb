//! Per-request state that middleware reads from and writes to.
//!
//! This module contains:
//! - `RequestContext`: the request header, its route parameters, the data stacks and the response
//! - `PathParams`: named segments matched from the request path
//! - `DataStack`: the per-request map extracted documents are attached to

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use matchit::Params;
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::error::Failure;
use crate::storage::Document;

/// Owns everything a single request carries through a pipeline.
///
/// The context is created per request and dropped with it, so the data stacks it owns never
/// outlive the request.
#[derive(Debug)]
pub struct RequestContext {
    request_header: Request<()>,
    path_params: Option<PathParams>,
    state: HashMap<String, DataStack>,
    slots: HashMap<String, DataStack>,
    response: Response<Bytes>,
}

impl RequestContext {
    /// Creates a context without route parameters
    pub fn new(request_header: Request<()>) -> Self {
        Self {
            request_header,
            path_params: None,
            state: HashMap::new(),
            slots: HashMap::new(),
            response: Response::new(Bytes::new()),
        }
    }

    /// Attaches the route parameters matched for this request
    pub fn with_params(mut self, path_params: PathParams) -> Self {
        self.path_params = Some(path_params);
        self
    }

    /// Replaces the route parameters
    pub fn set_params(&mut self, path_params: PathParams) {
        self.path_params = Some(path_params);
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        self.request_header.method()
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        self.request_header.uri()
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        self.request_header.headers()
    }

    /// Returns the route parameters, `None` when the host never matched a route
    pub fn path_params(&self) -> Option<&PathParams> {
        self.path_params.as_ref()
    }

    /// Returns the data stack at `location`, if anything has been stashed there
    pub fn data_stack(&self, location: &StackLocation) -> Option<&DataStack> {
        self.container(location.nested).get(&location.name)
    }

    /// Returns the data stack at `location`, creating it on first access
    pub fn data_stack_mut(&mut self, location: &StackLocation) -> &mut DataStack {
        let container = if location.nested { &mut self.state } else { &mut self.slots };
        container.entry(location.name.clone()).or_default()
    }

    /// Looks a stack up in the `state` container
    pub fn state(&self, name: &str) -> Option<&DataStack> {
        self.state.get(name)
    }

    /// Looks a stack up among the context's top level slots
    pub fn slot(&self, name: &str) -> Option<&DataStack> {
        self.slots.get(name)
    }

    fn container(&self, nested: bool) -> &HashMap<String, DataStack> {
        if nested { &self.state } else { &self.slots }
    }

    /// Returns the response written so far
    pub fn response(&self) -> &Response<Bytes> {
        &self.response
    }

    /// Returns the status of the response written so far
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Writes a plain text response
    pub fn send(&mut self, status: StatusCode, body: impl Into<Bytes>) {
        *self.response.status_mut() = status;
        *self.response.body_mut() = body.into();
        if let Ok(content_type) = HeaderValue::from_str(mime::TEXT_PLAIN_UTF_8.as_ref()) {
            self.response.headers_mut().insert(http::header::CONTENT_TYPE, content_type);
        }
    }

    /// Writes the failure's code as status and its message as body
    pub fn send_failure(&mut self, failure: &Failure) {
        self.send(failure.status(), failure.message().to_string());
    }

    /// Consumes the context, returning its response
    pub fn into_response(self) -> Response<Bytes> {
        self.response
    }
}

/// Where a data stack lives inside a [`RequestContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackLocation {
    name: String,
    nested: bool,
}

impl StackLocation {
    /// A stack stored directly on the context
    pub fn top_level(name: impl Into<String>) -> Self {
        Self { name: name.into(), nested: false }
    }

    /// A stack nested one level under the context's `state` container
    pub fn in_state(name: impl Into<String>) -> Self {
        Self { name: name.into(), nested: true }
    }

    /// Returns the key the stack is stored under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true when the stack sits under the `state` container
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

/// Extracted documents of one request, keyed by stash name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStack {
    documents: HashMap<String, Document>,
}

impl DataStack {
    /// Returns the document stashed under `stash_name`
    pub fn get(&self, stash_name: &str) -> Option<&Document> {
        self.documents.get(stash_name)
    }

    /// Attaches a document, replacing whatever was stashed under the same name
    pub fn insert(&mut self, stash_name: impl Into<String>, document: Document) -> Option<Document> {
        self.documents.insert(stash_name.into(), document)
    }

    /// Returns true if a document is stashed under `stash_name`
    pub fn contains(&self, stash_name: &str) -> bool {
        self.documents.contains_key(stash_name)
    }

    /// Returns the number of stashed documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if nothing has been stashed
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be extracted and accessed
/// by name. For example, in the path "/widgets/{id}", "id" is a path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Percent-decodes the matched values, a value that does not decode to UTF-8 is left out
impl<'k, 'v> From<Params<'k, 'v>> for PathParams {
    fn from(params: Params<'k, 'v>) -> Self {
        params
            .iter()
            .filter_map(|(key, value)| match percent_decode_str(value).decode_utf8() {
                Ok(decoded) => Some((key, decoded.into_owned())),
                Err(e) => {
                    debug!(key, cause = %e, "route parameter is not valid utf-8");
                    None
                }
            })
            .collect()
    }
}
