use super::Middleware;
use crate::types::RequestInfo;
use futures::future::BoxFuture;
use http::header::{self, HeaderName, HeaderValue};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

const DEFAULT_HEADERS: [(HeaderName, &str); 4] = [
    (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000;includeSubDomains"),
    (header::X_FRAME_OPTIONS, "sameorigin"),
    (header::X_XSS_PROTECTION, "1;mode=block"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
];

/// Adds the usual browser security headers to every response which doesn't already carry them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityHeaders;

impl SecurityHeaders {
    pub fn new() -> SecurityHeaders {
        SecurityHeaders
    }
}

impl Middleware for SecurityHeaders {
    fn name(&self) -> &str {
        "security_headers"
    }

    fn wraps(&self) -> bool {
        true
    }

    fn after(&self, mut res: Response<Full<Bytes>>, _: RequestInfo) -> BoxFuture<'_, crate::Result<Response<Full<Bytes>>>> {
        Box::pin(async move {
            let headers = res.headers_mut();
            for (name, value) in DEFAULT_HEADERS {
                if !headers.contains_key(&name) {
                    headers.insert(name, HeaderValue::from_static(value));
                }
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    #[tokio::test]
    async fn should_add_missing_headers_only() {
        let mut res = Response::new(Full::new(Bytes::new()));
        res.headers_mut()
            .insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));

        let req_info = RequestInfo::new_from_req(&Request::new(()));
        let res = SecurityHeaders::new().after(res, req_info).await.unwrap();

        let headers = res.headers();
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], "max-age=31536000;includeSubDomains");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "deny");
        assert_eq!(headers[header::X_XSS_PROTECTION], "1;mode=block");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
