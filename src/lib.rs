//! `routekit` is a request router with middleware, controllers and reverse URLs for the Rust HTTP library [hyper](https://hyper.rs/).
//!
//! Its core features:
//!
//! - Fast route matching with one segment tree per http method, with `:name` wildcards and `*name` catch-all segments
//!
//! - Named routes and reverse URL generation
//!
//! - Two-phase middleware: a `before` phase which may answer the request itself and an `after` phase which sees the response
//!
//! - Controllers which render templates named after themselves
//!
//! - A per-request context store and application-wide global data
//!
//! - Built-in [CSRF protection](./struct.Csrf.html) and [security headers](./struct.SecurityHeaders.html)
//!
//! - A [server](./struct.Server.html) which drains in-flight requests on shutdown
//!
//! ## Basic Example
//!
//! ```no_run
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Request, Response, StatusCode};
//! // Import the prelude traits.
//! use routekit::prelude::*;
//! use routekit::{pre, shutdown_signal, RequestInfo, Router, SecurityHeaders, Server};
//! use routekit::config::ServerConfig;
//! use std::convert::Infallible;
//!
//! // A handler for "/" page.
//! async fn home_handler(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     Ok(Response::new(Full::new(Bytes::from("Home page"))))
//! }
//!
//! // A handler for "/users/:userId" page.
//! async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let user_id = req.param("userId").unwrap();
//!     Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
//! }
//!
//! // A middleware which logs an http request.
//! async fn logger(req: Request<Full<Bytes>>) -> Result<Request<Full<Bytes>>, Infallible> {
//!     println!("{:?} {} {}", req.remote_addr(), req.method(), req.uri().path());
//!     Ok(req)
//! }
//!
//! // An error handler which receives the `routekit::RouteError` and the request information.
//! async fn error_handler(err: routekit::RouteError, _: RequestInfo) -> Response<Full<Bytes>> {
//!     eprintln!("{}", err);
//!     Response::builder()
//!         .status(StatusCode::INTERNAL_SERVER_ERROR)
//!         .body(Full::new(Bytes::from(format!("Something went wrong: {}", err))))
//!         .unwrap()
//! }
//!
//! fn router() -> Router<Infallible> {
//!     Router::builder()
//!         .middleware(SecurityHeaders::new())
//!         .middleware(pre(logger))
//!         .get("/", home_handler)
//!         .name("home")
//!         .get("/users/:userId", user_handler)
//!         .name("user")
//!         .err_handler_with_info(error_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() -> routekit::Result<()> {
//!     let router = router();
//!     assert_eq!(router.reverse_url("user", ["alice"]), "/users/alice");
//!
//!     let config = ServerConfig { hostname: "127.0.0.1".into(), port: 3001 };
//!     let listener = Server::<Infallible>::bind(&config).await?;
//!
//!     // Serve until Ctrl-C, then wait for the requests in flight.
//!     Server::new(router)?.serve(listener, shutdown_signal()).await
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Paths
//!
//! A route path is made of `/`-separated segments. Empty segments are ignored, so `/users/`
//! and `/users` are the same path.
//!
//! - A literal segment matches itself: `/about`.
//! - A `:name` segment matches any single segment and captures it under `name`: `/users/:id`.
//! - A final `*name` segment matches the rest of the path, one or more segments: `/public/*path`.
//!
//! Literal segments win over wildcards, and wildcards win over catch-all segments. Registering
//! the same method and path twice is an error reported by [`RouterBuilder::build`](./struct.RouterBuilder.html#method.build).
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response};
//! use routekit::prelude::*;
//! use routekit::Router;
//! # use std::convert::Infallible;
//!
//! # fn run() -> Router<Infallible> {
//! let router = Router::builder()
//!     .get("/users/:userName/books/:bookName", |req| async move {
//!         let user_name = req.param("userName").unwrap();
//!         let book_name = req.param("bookName").unwrap();
//!
//!         Ok(Response::new(Full::new(Bytes::from(format!(
//!             "Username: {}, Book Name: {}",
//!             user_name, book_name
//!         )))))
//!     })
//!     .get("/public/*path", |req| async move {
//!         let path = req.param("path").cloned().unwrap_or_default();
//!         Ok(Response::new(Full::new(Bytes::from(path))))
//!     })
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! #### 404 and 405
//!
//! A request whose path matches no route is answered with `404 not found`. When the path exists
//! only for other methods the answer is `405 method not allowed` with an `Allow` header. `HEAD`
//! requests are served by the `GET` route of the path unless a `HEAD` route is registered.
//! Both responses pass through the middleware like any other.
//!
//! ### Named Routes
//!
//! [`RouterBuilder::name`](./struct.RouterBuilder.html#method.name) names the most recently added
//! route. [`Router::reverse_url`](./struct.Router.html#method.reverse_url) substitutes its
//! arguments into the wildcards of the named path, left to right.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response};
//! use routekit::Router;
//! # use std::convert::Infallible;
//!
//! let router: Router<Infallible> = Router::builder()
//!     .get("/users/:id/books/:book", |_| async move { Ok(Response::new(Full::new(Bytes::new()))) })
//!     .name("book")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(router.reverse_url("book", [7, 3]), "/users/7/books/3");
//! ```
//!
//! ## Middleware
//!
//! A middleware implements the [`Middleware`](./trait.Middleware.html) trait. Closures can be
//! turned into middleware with [`pre`](./fn.pre.html), [`guard`](./fn.guard.html),
//! [`post`](./fn.post.html) and [`post_with_info`](./fn.post_with_info.html).
//!
//! ```
//! use hyper::StatusCode;
//! use routekit::status::status_response;
//! use routekit::{guard, post, Flow, Router};
//! # use std::convert::Infallible;
//!
//! # fn run() -> Router<Infallible> {
//! let router = Router::builder()
//!     // Answer every request to /admin with 403 before any route runs.
//!     .middleware(guard(|req| async move {
//!         if req.uri().path().starts_with("/admin") {
//!             return Ok::<_, Infallible>(Flow::Halt(status_response(StatusCode::FORBIDDEN)));
//!         }
//!         Ok(Flow::Continue(req))
//!     }))
//!     // Add a header to every response.
//!     .middleware(post(|mut res| async move {
//!         res.headers_mut().insert("x-powered-by", "routekit".parse().unwrap());
//!         Ok::<_, Infallible>(res)
//!     }))
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```
//!
//! ## Request Context
//!
//! Every request carries a [`RequestContext`](./struct.RequestContext.html), reachable with
//! [`RequestExt::context`](./ext/trait.RequestExt.html#tymethod.context). Middleware use it to
//! hand values to the handler; it is cleared once the response is produced.
//!
//! ## Error Handling
//!
//! Any error returned by a handler or a middleware is passed to the error handler, which turns it
//! into a response. The default answers with `500 internal server error`.
//!
//! ```
//! use http_body_util::Full;
//! use hyper::{body::Bytes, Response, StatusCode};
//! use routekit::{RouteError, Router};
//!
//! async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
//!     Response::builder()
//!         .status(StatusCode::INTERNAL_SERVER_ERROR)
//!         .body(Full::new(Bytes::from(format!("Something went wrong: {}", err))))
//!         .unwrap()
//! }
//!
//! # fn run() -> Router<routekit::Error> {
//! let router = Router::builder()
//!     .get("/", |_| async move { Err(routekit::Error::new("boom")) })
//!     .err_handler(error_handler)
//!     .build()
//!     .unwrap();
//! # router
//! # }
//! # run();
//! ```

pub use self::context::{AppState, GlobalData, RequestContext};
pub use self::controller::{Controller, ControllerBase};
pub use self::error::{Error, RouteError};
pub use self::middleware::{
    guard, post, post_with_info, pre, Csrf, Flow, Middleware, Next, PostMiddleware, PreMiddleware, SecurityHeaders,
    Setup,
};
pub use self::route::Route;
pub use self::router::{NamedRoutes, Router, RouterBuilder};
#[doc(hidden)]
pub use self::service::RequestService;
pub use self::service::{shutdown_signal, RequestServiceBuilder, RouterService, Server};
pub use self::template::{RenderArgs, TemplateFn, TemplateManager};
pub use self::types::{RequestInfo, RouteParams};

pub mod config;
mod constants;
mod context;
mod controller;
mod error;
pub mod ext;
mod helpers;
pub mod logging;
mod middleware;
pub mod prelude;
mod route;
mod router;
mod service;
pub mod status;
mod template;
mod types;

/// A Result type often returned from methods that can have routekit errors.
pub type Result<T> = std::result::Result<T, RouteError>;
