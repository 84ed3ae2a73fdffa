use super::Middleware;
use crate::types::RequestInfo;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;

type HandlerWithoutInfo<E> = Box<dyn Fn(Response<Full<Bytes>>) -> HandlerWithoutInfoReturn<E> + Send + Sync + 'static>;
type HandlerWithoutInfoReturn<E> = Box<dyn Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static>;

type HandlerWithInfo<E> =
    Box<dyn Fn(Response<Full<Bytes>>, RequestInfo) -> HandlerWithInfoReturn<E> + Send + Sync + 'static>;
type HandlerWithInfoReturn<E> = Box<dyn Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static>;

enum Handler<E> {
    WithoutInfo(HandlerWithoutInfo<E>),
    WithInfo(HandlerWithInfo<E>),
}

/// A middleware built from a closure which transforms the response once the rest of the chain
/// has produced it.
///
/// This `PostMiddleware<E>` type accepts a single type parameter: `E`.
///
/// * The `E` represents any error type which will be used by route handlers and the middlewares. This error
///   type must be convertible into a boxed [std::error::Error](https://doc.rust-lang.org/std/error/trait.Error.html).
pub struct PostMiddleware<E> {
    handler: Handler<E>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> PostMiddleware<E> {
    /// Creates a post middleware.
    ///
    /// # Examples
    ///
    /// ```
    /// use routekit::{PostMiddleware, Router};
    /// use std::convert::Infallible;
    ///
    /// fn run() -> Router<Infallible> {
    ///     Router::builder()
    ///         .middleware(PostMiddleware::<Infallible>::new(|res| async move {
    ///             /* Do some operations */
    ///             Ok(res)
    ///         }))
    ///         .build()
    ///         .unwrap()
    /// }
    /// ```
    pub fn new<H, R>(handler: H) -> PostMiddleware<E>
    where
        H: Fn(Response<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        let handler: HandlerWithoutInfo<E> = Box::new(move |res: Response<Full<Bytes>>| Box::new(handler(res)));
        PostMiddleware {
            handler: Handler::WithoutInfo(handler),
        }
    }

    /// Creates a post middleware which can access [request info](../struct.RequestInfo.html) e.g. headers, method,
    /// uri etc. It should be used when the post middleware transforms the response based on the request information.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use routekit::{PostMiddleware, RequestInfo, Router};
    /// use std::convert::Infallible;
    ///
    /// async fn echo_method(mut res: Response<Full<Bytes>>, req_info: RequestInfo) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     let method = req_info.method().as_str().parse().unwrap();
    ///     res.headers_mut().insert("x-request-method", method);
    ///     Ok(res)
    /// }
    ///
    /// fn run() -> Router<Infallible> {
    ///     Router::builder()
    ///         .middleware(PostMiddleware::new_with_info(echo_method))
    ///         .build()
    ///         .unwrap()
    /// }
    /// ```
    pub fn new_with_info<H, R>(handler: H) -> PostMiddleware<E>
    where
        H: Fn(Response<Full<Bytes>>, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    {
        let handler: HandlerWithInfo<E> =
            Box::new(move |res: Response<Full<Bytes>>, req_info: RequestInfo| Box::new(handler(res, req_info)));
        PostMiddleware {
            handler: Handler::WithInfo(handler),
        }
    }
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Middleware for PostMiddleware<E> {
    fn wraps(&self) -> bool {
        true
    }

    fn after(&self, res: Response<Full<Bytes>>, req_info: RequestInfo) -> BoxFuture<'_, crate::Result<Response<Full<Bytes>>>> {
        let fut = match self.handler {
            Handler::WithoutInfo(ref handler) => Pin::from(handler(res)),
            Handler::WithInfo(ref handler) => Pin::from(handler(res, req_info)),
        };
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

impl<E> Debug for PostMiddleware<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let with_info = matches!(self.handler, Handler::WithInfo(_));
        write!(f, "{{ with_info: {:?} }}", with_info)
    }
}

/// Shorthand for [`PostMiddleware::new`](./struct.PostMiddleware.html#method.new).
pub fn post<E, H, R>(handler: H) -> PostMiddleware<E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    H: Fn(Response<Full<Bytes>>) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
{
    PostMiddleware::new(handler)
}

/// Shorthand for [`PostMiddleware::new_with_info`](./struct.PostMiddleware.html#method.new_with_info).
pub fn post_with_info<E, H, R>(handler: H) -> PostMiddleware<E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    H: Fn(Response<Full<Bytes>>, RequestInfo) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
{
    PostMiddleware::new_with_info(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;
    use std::convert::Infallible;

    fn info(method: &str) -> RequestInfo {
        let req = Request::builder().method(method).uri("/x").body(()).unwrap();
        RequestInfo::new_from_req(&req)
    }

    #[tokio::test]
    async fn should_transform_response() {
        let mw = post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-post", "1".parse().unwrap());
            Ok::<_, Infallible>(res)
        });
        assert!(mw.wraps());

        let res = mw.after(Response::new(Full::new(Bytes::new())), info("GET")).await.unwrap();
        assert_eq!(res.headers()["x-post"], "1");
    }

    #[tokio::test]
    async fn should_pass_request_info() {
        let mw = post_with_info(|mut res: Response<Full<Bytes>>, req_info: RequestInfo| async move {
            let method = req_info.method().as_str().parse().unwrap();
            res.headers_mut().insert("x-method", method);
            Ok::<_, Infallible>(res)
        });

        let res = mw.after(Response::new(Full::new(Bytes::new())), info("DELETE")).await.unwrap();
        assert_eq!(res.headers()["x-method"], "DELETE");
    }
}
