use crate::context::{AppState, GlobalData};
use crate::controller::{self, Controller};
use crate::middleware::{chain, Middleware, Setup};
use crate::route::{ControllerAction, Route};
use crate::router::tree::RouteTree;
use crate::router::{ErrHandler, ErrHandlerReturn, ErrHandlerWithInfo, ErrHandlerWithoutInfo, NamedRoutes, Router};
use crate::template::TemplateManager;
use crate::types::RequestInfo;
use crate::{Error, RouteError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;

/// Builder for the [Router](./struct.Router.html) type.
///
/// This `RouterBuilder<E>` type accepts a single type parameter: `E`.
///
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error
///   type must be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
///
/// Errors raised while registering are kept and reported by [`build`](#method.build).
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response};
/// use routekit::{Router, RouterBuilder};
///
/// async fn home_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, hyper::Error> {
///     Ok(Response::new(Full::new(Bytes::from("home"))))
/// }
///
/// # fn run() -> Router<hyper::Error> {
/// // Use Router::builder() method to create a new RouterBuilder instance.
/// // We will use this error type for the handlers and middlewares.
/// let router: Router<hyper::Error> = Router::builder()
///     .get("/", home_handler)
///     .name("home")
///     .build()
///     .unwrap();
/// # router
/// # }
/// # run();
/// ```
pub struct RouterBuilder<E> {
    inner: crate::Result<BuilderInner<E>>,
}

struct BuilderInner<E> {
    routes: Vec<Route<E>>,
    middlewares: Vec<Box<dyn Middleware>>,
    templates: TemplateManager,
    globals: GlobalData,
    err_handler: Option<ErrHandler>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> RouterBuilder<E> {
    /// Creates a new `RouterBuilder` instance with default options.
    pub fn new() -> RouterBuilder<E> {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    ///
    /// Every route is inserted into the route tree and named, every middleware is initialized in
    /// registration order and the templates are compiled. Duplicate routes and invalid patterns
    /// are reported here.
    pub fn build(self) -> crate::Result<Router<E>> {
        let BuilderInner {
            routes,
            mut middlewares,
            mut templates,
            mut globals,
            err_handler,
        } = self.inner?;

        let mut tree = RouteTree::new();
        let mut names = NamedRoutes::new();

        for (idx, route) in routes.iter().enumerate() {
            if !route.is_inert() {
                tree.insert(route.method.clone(), &route.path, idx)?;

                if let Some(name) = route.controller_route_name() {
                    names.insert(name, route.path.as_str());
                }
            }

            for name in &route.names {
                names.insert(name, route.path.as_str());
            }
        }

        chain::initialize_all(
            &mut middlewares,
            &mut Setup {
                templates: &mut templates,
                globals: &mut globals,
            },
        )?;
        templates.compile();

        tracing::debug!(
            routes = routes.len(),
            named_routes = names.len(),
            middlewares = middlewares.len(),
            "Router built"
        );

        let state = AppState::new(names, templates, globals);
        Ok(Router::new(
            routes,
            tree,
            middlewares,
            err_handler.unwrap_or_default(),
            state,
        ))
    }

    fn and_then<F>(self, func: F) -> Self
    where
        F: FnOnce(BuilderInner<E>) -> crate::Result<BuilderInner<E>>,
    {
        RouterBuilder {
            inner: self.inner.and_then(func),
        }
    }
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> RouterBuilder<E> {
    /// Adds a new route with `GET` method and the handler at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::Router;
    /// use hyper::{Response, body::Bytes};
    /// use http_body_util::Full;
    /// use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Infallible> {
    /// let router = Router::builder()
    ///     .get("/", |req| async move {
    ///         Ok(Response::new(Full::new(Bytes::from("Hello world"))))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn get<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::GET, path, handler)
    }

    /// Adds a new route with `POST` method and the handler at the specified path.
    pub fn post<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::POST, path, handler)
    }

    /// Adds a new route with `PUT` method and the handler at the specified path.
    pub fn put<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::PUT, path, handler)
    }

    /// Adds a new route with `DELETE` method and the handler at the specified path.
    pub fn delete<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::DELETE, path, handler)
    }

    /// Adds a new route with `PATCH` method and the handler at the specified path.
    pub fn patch<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::PATCH, path, handler)
    }

    /// Adds a new route with `HEAD` method and the handler at the specified path.
    ///
    /// Without an explicit `HEAD` route, `HEAD` requests are served by the `GET` route of the path.
    pub fn head<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::HEAD, path, handler)
    }

    /// Adds a new route with `OPTIONS` method and the handler at the specified path.
    pub fn options<P, H, R>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.add(Method::OPTIONS, path, handler)
    }

    /// Adds a new route with the specified method and the handler at the specified path.
    ///
    /// A path segment starting with `:` captures one path component, a final segment starting
    /// with `*` captures the rest of the path.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::Router;
    /// use hyper::{Response, Method, body::Bytes};
    /// use http_body_util::Full;
    /// use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Infallible> {
    /// let router = Router::builder()
    ///     .add(Method::from_bytes(b"PURGE").unwrap(), "/cache/*key", |req| async move {
    ///         Ok(Response::new(Full::new(Bytes::from("purged"))))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn add<P, H, R>(self, method: Method, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.and_then(move |mut inner| {
            inner.routes.push(Route::new(method, path, handler));
            crate::Result::Ok(inner)
        })
    }

    /// Adds a controller action.
    ///
    /// For every request a fresh `C` is created, its [base](./trait.Controller.html#tymethod.base)
    /// is filled with the request, the request context, the application state and the
    /// `controller`/`action` names, and the action is called with it. The route is also
    /// registered under the name `lowercase(controller + "#" + action)`.
    ///
    /// An empty `controller` or `action` name leaves the route inert: it is logged and never
    /// matched.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Method, Response};
    /// use routekit::{Controller, ControllerBase, Router};
    /// use std::convert::Infallible;
    ///
    /// #[derive(Default)]
    /// struct Users {
    ///     base: ControllerBase,
    /// }
    ///
    /// impl Controller for Users {
    ///     fn base(&self) -> &ControllerBase {
    ///         &self.base
    ///     }
    ///
    ///     fn base_mut(&mut self) -> &mut ControllerBase {
    ///         &mut self.base
    ///     }
    /// }
    ///
    /// async fn show(users: Users) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     let id = users.param("id").unwrap_or_default();
    ///     Ok(Response::new(Full::new(Bytes::from(format!("user {}", id)))))
    /// }
    ///
    /// let router: Router<Infallible> = Router::builder()
    ///     .controller(Method::GET, "/users/:id", "Users", "Show", show)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(router.reverse_url("users#show", [7]), "/users/7");
    /// ```
    pub fn controller<P, C, H, R>(self, method: Method, path: P, controller: &str, action: &str, handler: H) -> Self
    where
        P: Into<String>,
        C: Controller,
        H: Fn(C) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        let controller = controller.to_owned();
        let action = action.to_owned();

        self.and_then(move |mut inner| {
            let path = path.into();

            let handler = if controller.is_empty() || action.is_empty() {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    controller_type = std::any::type_name::<C>(),
                    "Can't resolve controller action: controller and action names must not be empty, the route stays inert"
                );
                None
            } else {
                Some(controller::action_handler::<C, H, R, E>(
                    controller.clone(),
                    action.clone(),
                    handler,
                ))
            };

            let controller_action = Some(ControllerAction { controller, action }).filter(|_| handler.is_some());
            inner
                .routes
                .push(Route::new_with_boxed_handler(method, path, handler, controller_action));
            crate::Result::Ok(inner)
        })
    }

    /// Adds a controller action with `GET` method, see [`controller`](#method.controller).
    pub fn get_action<P, C, H, R>(self, path: P, controller: &str, action: &str, handler: H) -> Self
    where
        P: Into<String>,
        C: Controller,
        H: Fn(C) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.controller(Method::GET, path, controller, action, handler)
    }

    /// Adds a controller action with `POST` method, see [`controller`](#method.controller).
    pub fn post_action<P, C, H, R>(self, path: P, controller: &str, action: &str, handler: H) -> Self
    where
        P: Into<String>,
        C: Controller,
        H: Fn(C) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.controller(Method::POST, path, controller, action, handler)
    }

    /// Adds a controller action with `PUT` method, see [`controller`](#method.controller).
    pub fn put_action<P, C, H, R>(self, path: P, controller: &str, action: &str, handler: H) -> Self
    where
        P: Into<String>,
        C: Controller,
        H: Fn(C) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.controller(Method::PUT, path, controller, action, handler)
    }

    /// Adds a controller action with `DELETE` method, see [`controller`](#method.controller).
    pub fn delete_action<P, C, H, R>(self, path: P, controller: &str, action: &str, handler: H) -> Self
    where
        P: Into<String>,
        C: Controller,
        H: Fn(C) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        self.controller(Method::DELETE, path, controller, action, handler)
    }

    /// Names the most recently added route for [reverse URL generation](./struct.Router.html#method.reverse_url).
    ///
    /// Names are case-insensitive. A route may carry several names; when two routes use the same
    /// name, the one added last wins.
    pub fn name<N: Into<String>>(self, name: N) -> Self {
        self.and_then(move |mut inner| {
            let name = name.into();
            match inner.routes.last_mut() {
                Some(route) => {
                    route.names.push(name.to_lowercase());
                    crate::Result::Ok(inner)
                }
                None => Err(Error::new(format!("Can't name `{}`: no route has been added yet", name)).into()),
            }
        })
    }
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> RouterBuilder<E> {
    /// Adds a middleware to the end of the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::{pre, Csrf, Router, SecurityHeaders};
    /// use std::convert::Infallible;
    ///
    /// # fn run() -> Router<Infallible> {
    /// let router = Router::builder()
    ///     .middleware(SecurityHeaders::new())
    ///     .middleware(Csrf::new())
    ///     .middleware(pre(|req| async move {
    ///         println!("{} {}", req.method(), req.uri());
    ///         Ok::<_, Infallible>(req)
    ///     }))
    ///     .build()
    ///     .unwrap();
    /// # router
    /// # }
    /// # run();
    /// ```
    pub fn middleware<M: Middleware>(self, m: M) -> Self {
        self.and_then(move |mut inner| {
            inner.middlewares.push(Box::new(m));
            crate::Result::Ok(inner)
        })
    }

    /// Adds a template source. Names are case-insensitive, controllers render `controller/action.html`.
    pub fn template<N: AsRef<str>, S: Into<String>>(self, name: N, source: S) -> Self {
        self.and_then(move |mut inner| {
            inner.templates.add_template(name, source);
            crate::Result::Ok(inner)
        })
    }

    /// Adds a template function, rendered with the request context wherever `{{name}}` appears.
    pub fn template_function<N, F>(self, name: N, func: F) -> Self
    where
        N: Into<String>,
        F: Fn(&crate::RequestContext) -> String + Send + Sync + 'static,
    {
        self.and_then(move |mut inner| {
            inner.templates.add_function(name, func);
            crate::Result::Ok(inner)
        })
    }

    /// Stores an application-wide value, available through the [`AppState`](./struct.AppState.html).
    pub fn global<K, V>(self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        self.insert_global(key.into(), value, false)
    }

    /// Stores an application-wide value which can't be replaced afterwards.
    pub fn global_read_only<K, V>(self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        self.insert_global(key.into(), value, true)
    }

    fn insert_global<V: Any + Send + Sync>(self, key: String, value: V, read_only: bool) -> Self {
        self.and_then(move |mut inner| {
            if !inner.globals.insert(key.clone(), value, read_only) {
                tracing::warn!(key = %key, "Global value is read-only, the new value is ignored");
            }
            crate::Result::Ok(inner)
        })
    }

    /// Adds a handler to handle any error raised by the routes or any middlewares.
    ///
    /// The default handler answers with `500 internal server error`.
    pub fn err_handler<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler: ErrHandlerWithoutInfo = Box::new(move |err: RouteError| -> ErrHandlerReturn { Box::new(handler(err)) });

        self.and_then(move |mut inner| {
            inner.err_handler = Some(ErrHandler::WithoutInfo(handler));
            crate::Result::Ok(inner)
        })
    }

    /// Adds a handler to handle any error raised by the routes or any middlewares.
    ///
    /// Here, the handler also receives the [request info](./struct.RequestInfo.html) of the failed request.
    pub fn err_handler_with_info<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler: ErrHandlerWithInfo =
            Box::new(move |err: RouteError, req_info: RequestInfo| -> ErrHandlerReturn { Box::new(handler(err, req_info)) });

        self.and_then(move |mut inner| {
            inner.err_handler = Some(ErrHandler::WithInfo(handler));
            crate::Result::Ok(inner)
        })
    }
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Default for RouterBuilder<E> {
    fn default() -> RouterBuilder<E> {
        RouterBuilder {
            inner: Ok(BuilderInner {
                routes: Vec::new(),
                middlewares: Vec::new(),
                templates: TemplateManager::new(),
                globals: GlobalData::new(),
                err_handler: None,
            }),
        }
    }
}

impl<E> Debug for RouterBuilder<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.inner {
            Ok(ref inner) => write!(
                f,
                "{{ routes: {:?}, middlewares: {}, templates: {:?} }}",
                inner.routes,
                inner.middlewares.len(),
                inner.templates
            ),
            Err(ref err) => write!(f, "{{ error: {} }}", err),
        }
    }
}
