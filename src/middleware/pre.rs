use super::{Flow, Middleware};
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Request;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;

type PassHandler<E> = Box<dyn Fn(Request<Full<Bytes>>) -> PassHandlerReturn<E> + Send + Sync + 'static>;
type PassHandlerReturn<E> = Box<dyn Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static>;

type FlowHandler<E> = Box<dyn Fn(Request<Full<Bytes>>) -> FlowHandlerReturn<E> + Send + Sync + 'static>;
type FlowHandlerReturn<E> = Box<dyn Future<Output = Result<Flow, E>> + Send + 'static>;

enum Handler<E> {
    Pass(PassHandler<E>),
    Flow(FlowHandler<E>),
}

/// A middleware built from a closure which runs before the route handler and has no `after` phase.
///
/// This `PreMiddleware<E>` type accepts a single type parameter: `E`.
///
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error
///   type must be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
pub struct PreMiddleware<E> {
    handler: Handler<E>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> PreMiddleware<E> {
    /// Creates a pre middleware which transforms the request and always lets it through.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::{PreMiddleware, Router};
    /// use std::convert::Infallible;
    ///
    /// fn run() -> Router<Infallible> {
    ///     Router::builder()
    ///         .middleware(PreMiddleware::<Infallible>::new(|req| async move {
    ///             /* Do some operations */
    ///             Ok(req)
    ///         }))
    ///         .build()
    ///         .unwrap()
    /// }
    /// ```
    pub fn new<H, R>(handler: H) -> PreMiddleware<E>
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static,
    {
        let handler: PassHandler<E> = Box::new(move |req: Request<Full<Bytes>>| Box::new(handler(req)));
        PreMiddleware {
            handler: Handler::Pass(handler),
        }
    }

    /// Creates a pre middleware which decides whether the request goes on, see [`Flow`](../enum.Flow.html).
    pub fn new_with_flow<H, R>(handler: H) -> PreMiddleware<E>
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Flow, E>> + Send + 'static,
    {
        let handler: FlowHandler<E> = Box::new(move |req: Request<Full<Bytes>>| Box::new(handler(req)));
        PreMiddleware {
            handler: Handler::Flow(handler),
        }
    }
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Middleware for PreMiddleware<E> {
    fn before(&self, req: Request<Full<Bytes>>) -> BoxFuture<'_, crate::Result<Flow>> {
        match self.handler {
            Handler::Pass(ref handler) => {
                let fut = Pin::from(handler(req));
                Box::pin(async move { fut.await.map(Flow::Continue).map_err(Into::into) })
            }
            Handler::Flow(ref handler) => {
                let fut = Pin::from(handler(req));
                Box::pin(async move { fut.await.map_err(Into::into) })
            }
        }
    }
}

impl<E> Debug for PreMiddleware<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match self.handler {
            Handler::Pass(_) => "pass",
            Handler::Flow(_) => "flow",
        };
        write!(f, "{{ kind: {:?} }}", kind)
    }
}

/// Shorthand for [`PreMiddleware::new`](./struct.PreMiddleware.html#method.new).
pub fn pre<E, H, R>(handler: H) -> PreMiddleware<E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static,
{
    PreMiddleware::new(handler)
}

/// Shorthand for [`PreMiddleware::new_with_flow`](./struct.PreMiddleware.html#method.new_with_flow).
///
/// # Examples
///
/// ```
/// use routekit::status::status_response;
/// use routekit::{guard, Flow, Router};
/// use hyper::StatusCode;
/// use std::convert::Infallible;
///
/// fn run() -> Router<Infallible> {
///     Router::builder()
///         .middleware(guard(|req| async move {
///             if req.uri().path().starts_with("/private") {
///                 return Ok::<_, Infallible>(Flow::Halt(status_response(StatusCode::FORBIDDEN)));
///             }
///             Ok(Flow::Continue(req))
///         }))
///         .build()
///         .unwrap()
/// }
/// ```
pub fn guard<E, H, R>(handler: H) -> PreMiddleware<E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Flow, E>> + Send + 'static,
{
    PreMiddleware::new_with_flow(handler)
}
