use crate::constants;
use crate::context::{AppState, RequestContext};
use crate::router::tree;
use crate::types::RouteParams;
use crate::Error;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub(crate) type Handler<E> =
    Box<dyn Fn(Request<Full<Bytes>>, Arc<AppState>) -> HandlerReturn<E> + Send + Sync + 'static>;
pub(crate) type HandlerReturn<E> = Box<dyn Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static>;

/// The controller type name and action a route was registered with, e.g. `Users` and `Show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ControllerAction {
    pub(crate) controller: String,
    pub(crate) action: String,
}

/// Represents a single route.
///
/// A route consists of an http method, a path pattern and a handler. Path patterns are made of
/// `/`-separated segments; a segment starting with `:` captures one path component under that
/// name and a final segment starting with `*` captures the rest of the path.
///
/// Routes shouldn't be created directly, use the [RouterBuilder](./struct.RouterBuilder.html)
/// methods to create a route. A route is immutable once the router is built.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response};
/// use routekit::Router;
///
/// async fn home_handler(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, hyper::Error> {
///     Ok(Response::new(Full::new(Bytes::from("home"))))
/// }
///
/// fn run() -> Router<hyper::Error> {
///     let router = Router::builder().get("/", home_handler).build().unwrap();
///     router
/// }
/// ```
pub struct Route<E> {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) route_params: Vec<String>,
    pub(crate) controller: Option<ControllerAction>,
    // Explicit names given with `RouterBuilder::name`, in call order.
    pub(crate) names: Vec<String>,
    // `None` for an inert route, which is kept for naming but never dispatched.
    pub(crate) handler: Option<Handler<E>>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Route<E> {
    pub(crate) fn new_with_boxed_handler<P: Into<String>>(
        method: Method,
        path: P,
        handler: Option<Handler<E>>,
        controller: Option<ControllerAction>,
    ) -> Route<E> {
        let path = path.into();
        let route_params = tree::pattern_params(&path);

        Route {
            method,
            path,
            route_params,
            controller,
            names: Vec::new(),
            handler,
        }
    }

    pub(crate) fn new<P, H, R>(method: Method, path: P, handler: H) -> Route<E>
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        let handler: Handler<E> = Box::new(move |req: Request<Full<Bytes>>, _: Arc<AppState>| Box::new(handler(req)));
        Route::new_with_boxed_handler(method, path, Some(handler), None)
    }

    pub(crate) async fn process(
        &self,
        mut req: Request<Full<Bytes>>,
        route_params: RouteParams,
        state: Arc<AppState>,
    ) -> crate::Result<Response<Full<Bytes>>> {
        if let Some(ctx) = req.extensions().get::<RequestContext>() {
            ctx.set_read_only(constants::ROUTE_PARAMS_KEY, route_params.clone());
        }
        req.extensions_mut().insert(route_params);

        let handler = self
            .handler
            .as_ref()
            .ok_or_else(|| Error::new(format!("Route {} {} has no handler", self.method, self.path)))?;

        Pin::from(handler(req, state)).await.map_err(Into::into)
    }
}

impl<E> Route<E> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the route was registered without a usable handler. Inert routes never match.
    pub fn is_inert(&self) -> bool {
        self.handler.is_none()
    }

    /// The wildcard names of the path pattern, left to right.
    pub fn route_params(&self) -> &[String] {
        &self.route_params
    }

    /// The name under which controller routes are registered automatically:
    /// `lowercase(controller + "#" + action)`.
    pub fn controller_route_name(&self) -> Option<String> {
        self.controller
            .as_ref()
            .map(|c| format!("{}#{}", c.controller, c.action).to_lowercase())
    }
}

impl<E> Debug for Route<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ method: {:?}, path: {:?}, route_params: {:?}, controller: {:?}, names: {:?}, inert: {:?} }}",
            self.method,
            self.path,
            self.route_params,
            self.controller,
            self.names,
            self.is_inert()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn should_record_params_and_controller_name() {
        let mut route: Route<Infallible> = Route::new(Method::GET, "/admin/users/:id", |_| async move {
            Ok(Response::new(Full::new(Bytes::new())))
        });
        assert_eq!(route.route_params(), ["id".to_owned()]);
        assert_eq!(route.controller_route_name(), None);

        route.controller = Some(ControllerAction {
            controller: "Users".to_owned(),
            action: "Show".to_owned(),
        });
        assert_eq!(route.controller_route_name().as_deref(), Some("users#show"));
    }
}
