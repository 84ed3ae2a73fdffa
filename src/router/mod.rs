use crate::context::AppState;
use crate::helpers;
use crate::middleware::chain::{self, Next};
use crate::middleware::Middleware;
use crate::route::Route;
use crate::router::tree::{split_path, RouteLookup, RouteTree};
use crate::status::{self, status_response};
use crate::types::RequestInfo;
use crate::{Error, RouteError};
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use self::builder::RouterBuilder;
pub use self::names::NamedRoutes;

mod builder;
mod names;
pub(crate) mod tree;

pub(crate) type ErrHandlerWithoutInfo = Box<dyn Fn(RouteError) -> ErrHandlerReturn + Send + Sync + 'static>;
pub(crate) type ErrHandlerWithInfo = Box<dyn Fn(RouteError, RequestInfo) -> ErrHandlerReturn + Send + Sync + 'static>;
pub(crate) type ErrHandlerReturn = Box<dyn Future<Output = Response<Full<Bytes>>> + Send + 'static>;

pub(crate) enum ErrHandler {
    WithoutInfo(ErrHandlerWithoutInfo),
    WithInfo(ErrHandlerWithInfo),
}

impl ErrHandler {
    fn should_gen_req_info(&self) -> bool {
        matches!(self, ErrHandler::WithInfo(_))
    }

    async fn execute(&self, err: RouteError, req_info: Option<RequestInfo>) -> Response<Full<Bytes>> {
        match (self, req_info) {
            (ErrHandler::WithInfo(handler), Some(req_info)) => Pin::from(handler(err, req_info)).await,
            (ErrHandler::WithInfo(_), None) => status_response(StatusCode::INTERNAL_SERVER_ERROR),
            (ErrHandler::WithoutInfo(handler), _) => Pin::from(handler(err)).await,
        }
    }
}

impl Default for ErrHandler {
    fn default() -> ErrHandler {
        ErrHandler::WithoutInfo(Box::new(|_: RouteError| -> ErrHandlerReturn {
            Box::new(async move { status_response(StatusCode::INTERNAL_SERVER_ERROR) })
        }))
    }
}

/// Represents a modular, lightweight and mountable router type.
///
/// A router consists of some routes, some middleware, the templates and the global data. The
/// routes are kept in one segment tree per http method, so the lookup cost depends on the depth
/// of the path rather than on the number of registered routes.
///
/// This `Router<E>` type accepts a single type parameter: `E`.
///
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error
///   type must be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
///
/// A request first runs through the middleware chain, in registration order. When every
/// middleware lets it pass, the route is resolved: a missing path is answered with
/// `404 not found` and a path registered only for other methods with `405 method not allowed`.
/// Errors from middleware or handlers are turned into a response by the error handler.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response};
/// use routekit::prelude::*;
/// use routekit::Router;
/// use std::convert::Infallible;
///
/// async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     let id = req.param("id").cloned().unwrap_or_default();
///     Ok(Response::new(Full::new(Bytes::from(format!("user {}", id)))))
/// }
///
/// fn run() -> Router<Infallible> {
///     Router::builder()
///         .get("/users/:id", user_handler)
///         .name("user")
///         .build()
///         .unwrap()
/// }
///
/// let router = run();
/// assert_eq!(router.reverse_url("user", [42]), "/users/42");
/// ```
pub struct Router<E> {
    pub(crate) routes: Vec<Route<E>>,
    tree: RouteTree,
    pub(crate) middlewares: Vec<Box<dyn Middleware>>,
    err_handler: ErrHandler,
    state: Arc<AppState>,
    cleaned_up: AtomicBool,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Router<E> {
    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder<E> {
        RouterBuilder::new()
    }

    pub(crate) fn new(
        routes: Vec<Route<E>>,
        tree: RouteTree,
        middlewares: Vec<Box<dyn Middleware>>,
        err_handler: ErrHandler,
        state: AppState,
    ) -> Router<E> {
        Router {
            routes,
            tree,
            middlewares,
            err_handler,
            state: Arc::new(state),
            cleaned_up: AtomicBool::new(false),
        }
    }

    /// Runs a request through the middleware chain and the matching route handler.
    pub(crate) async fn process(&self, mut req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        req.extensions_mut().insert(self.state.clone());

        let req_info = if self.err_handler.should_gen_req_info() {
            Some(RequestInfo::new_from_req(&req))
        } else {
            None
        };

        let endpoint = |req: Request<Full<Bytes>>| self.dispatch(req).boxed();

        match Next::new(&self.middlewares, &endpoint).run(req).await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = %err, "Request failed");
                self.err_handler.execute(err, req_info).await
            }
        }
    }

    async fn dispatch(&self, req: Request<Full<Bytes>>) -> crate::Result<Response<Full<Bytes>>> {
        // Segments are decoded one by one, so an encoded `/` stays inside its segment.
        let segments = split_path(req.uri().path())
            .map(helpers::percent_decode_segment)
            .collect::<crate::Result<Vec<_>>>()
            .map_err(|e| Error::new(format!("Couldn't percent decode request path: {}", e)))?;

        let lookup = self.tree.find(req.method(), &segments);
        match lookup {
            RouteLookup::Found(found) => {
                let route = &self.routes[found.leaf.route];
                route.process(req, found.params, self.state.clone()).await
            }
            RouteLookup::MethodNotAllowed(allowed) => {
                tracing::info!(method = %req.method(), path = %req.uri().path(), "405 method not allowed");
                Ok(status::method_not_allowed(&allowed))
            }
            RouteLookup::NotFound => {
                tracing::info!(method = %req.method(), path = %req.uri().path(), "404 page not found");
                Ok(status_response(StatusCode::NOT_FOUND))
            }
        }
    }
}

impl<E> Router<E> {
    /// Generates the path of a named route, see [`NamedRoutes::reverse_url`](./struct.NamedRoutes.html#method.reverse_url).
    pub fn reverse_url<I, A>(&self, name: &str, args: I) -> String
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        self.state.routes().reverse_url(name, args)
    }

    /// Generates the path of a named route, see [`NamedRoutes::try_reverse_url`](./struct.NamedRoutes.html#method.try_reverse_url).
    pub fn try_reverse_url<I, A>(&self, name: &str, args: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        self.state.routes().try_reverse_url(name, args)
    }

    /// The application state shared with every request: named routes, templates and global data.
    pub fn app_state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> &[Route<E>] {
        &self.routes
    }

    /// Runs the `cleanup` of every middleware once, in registration order. Later calls do nothing.
    pub(crate) fn cleanup_middleware(&self) {
        if self.cleaned_up.swap(true, Ordering::SeqCst) {
            return;
        }
        chain::cleanup_all(&self.middlewares);
    }
}

impl<E> Debug for Router<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let middlewares = self.middlewares.iter().map(|mw| mw.name()).collect::<Vec<_>>();
        write!(
            f,
            "{{ Routes: {:?}, Middlewares: {:?}, State: {:?} }}",
            self.routes, middlewares, self.state
        )
    }
}
