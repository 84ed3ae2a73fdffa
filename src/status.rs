//! Canned responses for client error status codes, e.g. `404 not found`.

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// The text used as the body of canned responses: the code followed by the lowercased reason.
pub fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason.to_lowercase()),
        None => status.as_u16().to_string(),
    }
}

/// Builds a plain text response for `status` with the canned body.
pub fn status_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::from(status_text(status))));
    *res.status_mut() = status;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}

/// A `405` response which lists the methods the path is registered for.
pub fn method_not_allowed(allowed: &[Method]) -> Response<Full<Bytes>> {
    let mut res = status_response(StatusCode::METHOD_NOT_ALLOWED);
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        res.headers_mut().insert(header::ALLOW, value);
    }
    res
}
