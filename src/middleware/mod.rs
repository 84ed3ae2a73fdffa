//! Middleware and the chain that runs them.
//!
//! A middleware has two phases. The `before` phase sees the request on its way to the handler
//! and either lets it through ([`Flow::Continue`]) or answers it itself ([`Flow::Halt`]), in
//! which case no later middleware and no handler runs. A middleware that [`wraps`](Middleware::wraps)
//! the rest of the chain also gets an `after` phase, called with the response once every later
//! middleware and the handler have finished. `after` phases run in reverse registration order.
//!
//! Middleware are initialized once, in registration order, when the router is built and cleaned
//! up once, in registration order, when the server shuts down.

use crate::context::GlobalData;
use crate::template::TemplateManager;
use crate::types::RequestInfo;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};

pub use self::chain::Next;
pub use self::csrf::Csrf;
pub use self::post::{post, post_with_info, PostMiddleware};
pub use self::pre::{guard, pre, PreMiddleware};
pub use self::security_headers::SecurityHeaders;

pub(crate) mod chain;
mod csrf;
mod post;
mod pre;
mod security_headers;

/// The outcome of a middleware `before` phase.
#[derive(Debug)]
pub enum Flow {
    /// Pass the (possibly modified) request on to the rest of the chain.
    Continue(Request<Full<Bytes>>),
    /// Stop here and answer with this response.
    Halt(Response<Full<Bytes>>),
}

/// What a middleware may touch while the application is being set up.
#[derive(Debug)]
pub struct Setup<'a> {
    pub(crate) templates: &'a mut TemplateManager,
    pub(crate) globals: &'a mut GlobalData,
}

impl<'a> Setup<'a> {
    pub fn templates(&mut self) -> &mut TemplateManager {
        &mut *self.templates
    }

    pub fn globals(&mut self) -> &mut GlobalData {
        &mut *self.globals
    }
}

/// A request interceptor. Please refer to the [module docs](./index.html) for the execution model.
///
/// # Examples
///
/// ```
/// use futures::future::BoxFuture;
/// use http_body_util::Full;
/// use hyper::{body::Bytes, Request, Response, StatusCode};
/// use routekit::{Flow, Middleware};
///
/// struct RequireApiKey;
///
/// impl Middleware for RequireApiKey {
///     fn before(&self, req: Request<Full<Bytes>>) -> BoxFuture<'_, routekit::Result<Flow>> {
///         Box::pin(async move {
///             if req.headers().contains_key("x-api-key") {
///                 return Ok(Flow::Continue(req));
///             }
///             Ok(Flow::Halt(routekit::status::status_response(StatusCode::UNAUTHORIZED)))
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once when the router is built.
    fn initialize(&mut self, _setup: &mut Setup<'_>) -> crate::Result<()> {
        Ok(())
    }

    /// Called once when the server shuts down, after every in-flight request has finished.
    fn cleanup(&self) {}

    fn before(&self, req: Request<Full<Bytes>>) -> BoxFuture<'_, crate::Result<Flow>> {
        Box::pin(async move { Ok(Flow::Continue(req)) })
    }

    /// Whether [`after`](#method.after) has to run once the rest of the chain is done.
    fn wraps(&self) -> bool {
        false
    }

    fn after(
        &self,
        res: Response<Full<Bytes>>,
        _req_info: RequestInfo,
    ) -> BoxFuture<'_, crate::Result<Response<Full<Bytes>>>> {
        Box::pin(async move { Ok(res) })
    }
}
