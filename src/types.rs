use crate::context::RequestContext;
use http::{HeaderMap, Method, Request, Uri, Version};
use std::net::SocketAddr;
use std::sync::Arc;

/// Represents the route parameters extracted from a matched path, in the order they appear
/// in the route pattern.
///
/// ```txt
/// Route path: /users/:userName/books/:bookName
/// Request URL: http://localhost:3000/users/alice/books/HarryPotter
/// params: [("userName", "alice"), ("bookName", "HarryPotter")]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

pub(crate) static EMPTY_ROUTE_PARAMS: RouteParams = RouteParams(Vec::new());

impl RouteParams {
    pub fn new() -> RouteParams {
        RouteParams(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> RouteParams {
        RouteParams(Vec::with_capacity(capacity))
    }

    /// Sets a parameter, replacing an earlier value with the same name.
    pub fn set<N: Into<String>, V: Into<String>>(&mut self, param_name: N, param_val: V) {
        let param_name = param_name.into();
        let param_val = param_val.into();
        match self.0.iter_mut().find(|(name, _)| *name == param_name) {
            Some(entry) => entry.1 = param_val,
            None => self.0.push((param_name, param_val)),
        }
    }

    pub fn get<N: AsRef<str>>(&self, param_name: N) -> Option<&String> {
        let param_name = param_name.as_ref();
        self.0.iter().find(|(name, _)| name == param_name).map(|(_, val)| val)
    }

    pub fn has<N: AsRef<str>>(&self, param_name: N) -> bool {
        self.get(param_name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, val)| val.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, val)| (name.as_str(), val.as_str()))
    }
}

/// Connection metadata stored in the request extensions by the request service.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestMeta {
    pub(crate) remote_addr: SocketAddr,
}

/// A snapshot of the request (headers, method, uri, ...) taken before the rest of the chain
/// runs. It is handed to middleware `after` phases and to the error handler, which no longer
/// have access to the request itself.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    inner: Arc<RequestInfoInner>,
}

#[derive(Debug)]
struct RequestInfoInner {
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    version: Version,
    remote_addr: Option<SocketAddr>,
    context: RequestContext,
}

impl RequestInfo {
    pub(crate) fn new_from_req<T>(req: &Request<T>) -> Self {
        let context = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        RequestInfo {
            inner: Arc::new(RequestInfoInner {
                headers: req.headers().clone(),
                method: req.method().clone(),
                uri: req.uri().clone(),
                version: req.version(),
                remote_addr: req.extensions().get::<RequestMeta>().map(|meta| meta.remote_addr),
                context,
            }),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    pub fn version(&self) -> Version {
        self.inner.version
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.inner.remote_addr
    }

    /// The request context shared with the handler that produced the response.
    pub fn context(&self) -> &RequestContext {
        &self.inner.context
    }
}
