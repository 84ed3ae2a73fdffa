use crate::constants::{METHOD_OVERRIDE_FIELD, METHOD_OVERRIDE_HEADER};
use crate::context::RequestContext;
use crate::helpers;
use crate::router::Router;
use crate::service::active::ActiveRequests;
use crate::types::RequestMeta;
use crate::RouteError;
use http::request::Parts;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{service::Service, Method, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// The per-connection hyper [`Service`] which feeds requests into a [`Router`].
///
/// The request body is buffered before the middleware chain runs, so middleware and handlers
/// always see a `Request<Full<Bytes>>`.
pub struct RequestService<E> {
    pub(crate) router: Arc<Router<E>>,
    pub(crate) active: Arc<ActiveRequests>,
    pub(crate) remote_addr: SocketAddr,
}

impl<T, E> Service<Request<T>> for RequestService<E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
    T: Body + Send + 'static,
    T::Data: Send,
    T::Error: Into<RouteError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<T>) -> Self::Future {
        let router = self.router.clone();
        let active = self.active.clone();
        let remote_addr = self.remote_addr;

        let fut = async move {
            let _guard = active.enter();
            let started = Instant::now();

            let (mut parts, body) = req.into_parts();
            let body = body.collect().await.map_err(|e| -> RouteError { e.into() })?.to_bytes();
            apply_method_override(&mut parts, &body);

            let mut req = Request::from_parts(parts, Full::new(body));
            req.extensions_mut().insert(RequestMeta { remote_addr });

            let method = req.method().clone();
            let uri = req.uri().clone();
            tracing::info!(method = %method, uri = %uri, remote_addr = %remote_addr, "Request started");

            let context = RequestContext::new();
            req.extensions_mut().insert(context.clone());

            let res = router.process(req).await;
            context.clear();

            tracing::info!(
                method = %method,
                uri = %uri,
                status = res.status().as_u16(),
                elapsed = ?started.elapsed(),
                "Request finished"
            );
            Ok(res)
        };

        Box::pin(fut)
    }
}

impl<E> std::fmt::Debug for RequestService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestService")
            .field("remote_addr", &self.remote_addr)
            .field("active_requests", &self.active.count())
            .finish()
    }
}

/// Creates [`RequestService`]s for incoming connections, all sharing the same router.
#[derive(Debug)]
pub struct RequestServiceBuilder<E> {
    router: Arc<Router<E>>,
    active: Arc<ActiveRequests>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> RequestServiceBuilder<E> {
    pub fn new(router: Router<E>) -> crate::Result<Self> {
        Ok(Self {
            router: Arc::new(router),
            active: Arc::new(ActiveRequests::new()),
        })
    }

    pub fn build(&self, remote_addr: SocketAddr) -> RequestService<E> {
        RequestService {
            router: self.router.clone(),
            active: self.active.clone(),
            remote_addr,
        }
    }

    pub fn router(&self) -> &Arc<Router<E>> {
        &self.router
    }

    /// The number of requests currently being processed.
    pub fn active_requests(&self) -> usize {
        self.active.count()
    }

    /// Waits for every in-flight request to finish, then cleans up the middleware.
    pub async fn shutdown(&self) {
        self.active.wait_idle().await;
        self.router.cleanup_middleware();
    }
}

// A POST may stand in for another method through the `_method` form field or the
// `X-HTTP-Method-Override` header.
fn apply_method_override(parts: &mut Parts, body: &[u8]) {
    if parts.method != Method::POST {
        return;
    }

    let requested = parts
        .headers
        .get(METHOD_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| {
            if helpers::is_form_urlencoded(&parts.headers) {
                helpers::form_value(body, METHOD_OVERRIDE_FIELD)
            } else {
                None
            }
        });

    let Some(requested) = requested.filter(|m| !m.trim().is_empty()) else {
        return;
    };

    match Method::from_bytes(requested.trim().to_ascii_uppercase().as_bytes()) {
        Ok(method) => {
            tracing::debug!(method = %method, "Method overridden");
            parts.method = method;
        }
        Err(_) => tracing::debug!(method = %requested, "Ignoring invalid method override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, RouteError};
    use http::header;
    use http_body_util::Empty;
    use std::str::FromStr;

    fn builder() -> RequestServiceBuilder<Error> {
        let router: Router<Error> = Router::builder()
            .get("/", |_| async move { Ok(Response::new(Full::new(Bytes::from("Hello world!")))) })
            .put("/items/:id", |req: Request<Full<Bytes>>| async move {
                let body = req.into_body().collect().await.map(|c| c.to_bytes()).unwrap_or_default();
                Ok(Response::new(Full::new(body)))
            })
            .build()
            .unwrap();
        RequestServiceBuilder::new(router).unwrap()
    }

    async fn text(res: Response<Full<Bytes>>) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn should_route_request() {
        let remote_addr = SocketAddr::from_str("0.0.0.0:8080").unwrap();
        let service = builder().build(remote_addr);

        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let resp: Result<Response<Full<Bytes>>, RouteError> = service.call(req).await;
        assert_eq!(text(resp.unwrap()).await, "Hello world!");
    }

    #[tokio::test]
    async fn should_override_method_from_form_field() {
        let service = builder().build(SocketAddr::from(([127, 0, 0, 1], 1)));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/items/1")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from("_method=put&name=x")))
            .unwrap();

        let res = service.call(req).await.unwrap();
        assert_eq!(text(res).await, "_method=put&name=x");
    }

    #[test]
    fn should_only_override_post() {
        let (mut parts, _) = Request::builder()
            .method(Method::GET)
            .header(METHOD_OVERRIDE_HEADER, "delete")
            .body(())
            .unwrap()
            .into_parts();
        apply_method_override(&mut parts, b"");
        assert_eq!(parts.method, Method::GET);

        parts.method = Method::POST;
        apply_method_override(&mut parts, b"");
        assert_eq!(parts.method, Method::DELETE);
    }
}
