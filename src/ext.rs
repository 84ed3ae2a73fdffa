//! Extension traits for the hyper request type.

use crate::context::{AppState, RequestContext};
use crate::types::{RequestMeta, RouteParams, EMPTY_ROUTE_PARAMS};
use hyper::Request;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

/// A extension trait which extends the [`hyper::Request`](https://docs.rs/hyper/1/hyper/struct.Request.html) type with some helpful methods.
pub trait RequestExt {
    /// It returns the route parameters as [RouteParams](../struct.RouteParams.html) type with the name of the parameter specified in the path as their respective keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::{Router, RouteParams};
    /// use routekit::ext::RequestExt;
    /// use hyper::{Response, body::Bytes};
    /// use http_body_util::Full;
    /// # use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Infallible> {
    /// let router = Router::builder()
    ///     .get("/users/:userName/books/:bookName", |req| async move {
    ///         let params: &RouteParams = req.params();
    ///         let user_name = params.get("userName").unwrap();
    ///         let book_name = params.get("bookName").unwrap();
    ///
    ///         Ok(Response::new(Full::new(Bytes::from(format!("Username: {}, Book Name: {}", user_name, book_name)))))
    ///      })
    ///      .build()
    ///      .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    fn params(&self) -> &RouteParams;

    /// This method is used to get a specific route parameter value without much hassle.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::{Router, RouteParams};
    /// use routekit::ext::RequestExt;
    /// use hyper::{Response, body::Bytes};
    /// use http_body_util::Full;
    /// # use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Infallible> {
    /// let router = Router::builder()
    ///     .get("/users/:userName/books/:bookName", |req| async move {
    ///         let user_name = req.param("userName").unwrap();
    ///         let book_name = req.param("bookName").unwrap();
    ///
    ///         Ok(Response::new(Full::new(Bytes::from(format!("Username: {}, Book Name: {}", user_name, book_name)))))
    ///      })
    ///      .build()
    ///      .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String>;

    /// The address of the client, when the request came in through a connection.
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// The context of this request, shared by the middleware and the handler.
    fn context(&self) -> RequestContext;

    /// Reads a value from the request context, see [`RequestContext::get`](../struct.RequestContext.html#method.get).
    fn context_value<T: Any + Clone>(&self, key: &str) -> Option<T>;

    /// Writes a value to the request context. Returns `false` when the key is read-only.
    fn set_context<K: Into<String>, T: Any + Send + Sync>(&self, key: K, val: T) -> bool;

    /// The application state: named routes, templates and global data.
    fn app_state(&self) -> Option<&Arc<AppState>>;
}

impl<B> RequestExt for Request<B> {
    fn params(&self) -> &RouteParams {
        self.extensions().get::<RouteParams>().unwrap_or(&EMPTY_ROUTE_PARAMS)
    }

    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String> {
        self.params().get(param_name)
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.extensions().get::<RequestMeta>().map(|meta| meta.remote_addr)
    }

    fn context(&self) -> RequestContext {
        self.extensions().get::<RequestContext>().cloned().unwrap_or_default()
    }

    fn context_value<T: Any + Clone>(&self, key: &str) -> Option<T> {
        self.extensions().get::<RequestContext>()?.get(key)
    }

    fn set_context<K: Into<String>, T: Any + Send + Sync>(&self, key: K, val: T) -> bool {
        match self.extensions().get::<RequestContext>() {
            Some(ctx) => ctx.set(key, val),
            None => false,
        }
    }

    fn app_state(&self) -> Option<&Arc<AppState>> {
        self.extensions().get::<Arc<AppState>>()
    }
}
