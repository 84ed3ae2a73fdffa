use super::{Flow, Middleware, Setup};
use crate::constants::{
    CSRF_FORM_FIELD, CSRF_HEADER, CSRF_ISSUED_ID_KEY, CSRF_SECRET_LENGTH, CSRF_TEMPLATE_FN, CSRF_TOKEN_KEY,
    ID_COOKIE_NAME, ID_LENGTH,
};
use crate::context::RequestContext;
use crate::helpers;
use crate::status::status_response;
use crate::types::{RequestInfo, RequestMeta};
use crate::Error;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::BoxFuture;
use hmac::{digest::KeyInit as HmacKeyInit, Hmac, Mac};
use http::header::{self, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::{Captures, Regex};
use sha2::Sha512;
use std::fmt::{self, Debug, Formatter};

type HmacSha512 = Hmac<Sha512>;

lazy_static! {
    static ref UNSAFE_FORM: Regex =
        Regex::new(r#"(?i)<form\s[^>]*method\s*=\s*["']?(?:post|put|delete)["']?[^>]*>"#).unwrap();
}

/// Cross-site request forgery protection.
///
/// Every client is identified by a random id kept in the `APP_ID` cookie; the expected token is
/// the base64 HMAC-SHA512 of that id under a secret generated at startup. The token is stored
/// read-only in the request context under `_csrf` and is available to templates as `{{csrfToken}}`.
///
/// `GET` and `HEAD` requests always pass. Any other request must submit the token, either in the
/// `_csrf-token` field of an urlencoded form body or in the `X-CSRF-Token` header, and is
/// answered with `400 bad request` otherwise.
///
/// While templates are compiled a `<meta name="csrf-token">` tag is injected after `<head>` and a
/// hidden `_csrf-token` input after every `POST`, `PUT` and `DELETE` form.
#[derive(Default)]
pub struct Csrf {
    secret: Option<Vec<u8>>,
}

impl Csrf {
    pub fn new() -> Csrf {
        Csrf::default()
    }

    /// Uses a fixed secret instead of generating one on initialization, so tokens stay valid
    /// across restarts.
    pub fn with_secret<S: Into<Vec<u8>>>(secret: S) -> Csrf {
        Csrf {
            secret: Some(secret.into()),
        }
    }

    fn token(&self, id: &[u8]) -> crate::Result<String> {
        Ok(STANDARD.encode(self.mac(id)?.finalize().into_bytes()))
    }

    fn verify(&self, id: &[u8], submitted: &str) -> crate::Result<bool> {
        let Ok(submitted) = STANDARD.decode(submitted.trim()) else {
            return Ok(false);
        };
        Ok(self.mac(id)?.verify_slice(&submitted).is_ok())
    }

    fn mac(&self, id: &[u8]) -> crate::Result<HmacSha512> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| Error::new("The csrf middleware is used before it was initialized"))?;

        let mut mac = <HmacSha512 as HmacKeyInit>::new_from_slice(secret)
            .map_err(|e| Error::new(format!("Invalid csrf secret: {}", e)))?;
        mac.update(id);
        Ok(mac)
    }
}

impl Middleware for Csrf {
    fn name(&self) -> &str {
        "csrf"
    }

    fn initialize(&mut self, setup: &mut Setup<'_>) -> crate::Result<()> {
        if self.secret.is_none() {
            let mut secret = vec![0u8; CSRF_SECRET_LENGTH];
            OsRng.fill_bytes(&mut secret);
            self.secret = Some(secret);
        }

        let templates = setup.templates();
        templates.add_function(CSRF_TEMPLATE_FN, |ctx: &RequestContext| {
            ctx.get::<String>(CSRF_TOKEN_KEY).unwrap_or_default()
        });
        templates.add_hook_before_parse(|_, source| inject_meta_tag(source));
        templates.add_hook_before_parse(|_, source| inject_form_fields(source));

        Ok(())
    }

    fn before(&self, mut req: Request<Full<Bytes>>) -> BoxFuture<'_, crate::Result<Flow>> {
        Box::pin(async move {
            let (id, issued) = match helpers::cookie_value(req.headers(), ID_COOKIE_NAME).and_then(|v| parse_id(&v)) {
                Some(id) => (id, false),
                None => (generate_id(), true),
            };

            let ctx = match req.extensions().get::<RequestContext>().cloned() {
                Some(ctx) => ctx,
                None => {
                    let ctx = RequestContext::new();
                    req.extensions_mut().insert(ctx.clone());
                    ctx
                }
            };
            ctx.set_read_only(CSRF_TOKEN_KEY, self.token(&id)?);
            if issued {
                ctx.set_read_only(CSRF_ISSUED_ID_KEY, hex::encode(&id));
            }

            if req.method() == Method::GET || req.method() == Method::HEAD {
                return Ok(Flow::Continue(req));
            }

            let header_token = req
                .headers()
                .get(CSRF_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let submitted = match header_token {
                Some(token) => Some(token),
                None if helpers::is_form_urlencoded(req.headers()) => {
                    let body = std::mem::take(req.body_mut()).collect().await?.to_bytes();
                    let token = helpers::form_value(&body, CSRF_FORM_FIELD);
                    *req.body_mut() = Full::new(body);
                    token
                }
                None => None,
            };

            if let Some(ref token) = submitted {
                if self.verify(&id, token)? {
                    return Ok(Flow::Continue(req));
                }
            }

            let remote_addr = req
                .extensions()
                .get::<RequestMeta>()
                .map(|meta| meta.remote_addr.to_string())
                .unwrap_or_else(|| "unknown".to_owned());
            tracing::warn!(
                remote_addr = %remote_addr,
                method = %req.method(),
                path = %req.uri().path(),
                token_submitted = submitted.is_some(),
                "CSRF detected"
            );

            let mut res = status_response(StatusCode::BAD_REQUEST);
            if issued {
                append_id_cookie(&mut res, &hex::encode(&id))?;
            }
            Ok(Flow::Halt(res))
        })
    }

    fn wraps(&self) -> bool {
        true
    }

    fn after(&self, mut res: Response<Full<Bytes>>, req_info: RequestInfo) -> BoxFuture<'_, crate::Result<Response<Full<Bytes>>>> {
        Box::pin(async move {
            if let Some(id) = req_info.context().get::<String>(CSRF_ISSUED_ID_KEY) {
                append_id_cookie(&mut res, &id)?;
            }
            Ok(res)
        })
    }
}

impl Debug for Csrf {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ initialized: {:?} }}", self.secret.is_some())
    }
}

fn parse_id(val: &str) -> Option<Vec<u8>> {
    hex::decode(val).ok().filter(|id| id.len() == ID_LENGTH)
}

fn generate_id() -> Vec<u8> {
    let mut id = vec![0u8; ID_LENGTH];
    OsRng.fill_bytes(&mut id);
    id
}

fn append_id_cookie(res: &mut Response<Full<Bytes>>, id: &str) -> crate::Result<()> {
    let cookie = HeaderValue::from_str(&format!("{}={}; Path=/; HttpOnly", ID_COOKIE_NAME, id))?;
    res.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(())
}

fn inject_meta_tag(source: &mut String) {
    if let Some(offset) = source.find("<head>") {
        let at = offset + "<head>".len();
        source.insert_str(
            at,
            &format!("<meta name=\"csrf-token\" content=\"{{{{{}}}}}\">", CSRF_TEMPLATE_FN),
        );
    }
}

fn inject_form_fields(source: &mut String) {
    if !UNSAFE_FORM.is_match(source) {
        return;
    }

    let replaced = UNSAFE_FORM.replace_all(source, |caps: &Captures<'_>| {
        format!(
            "{}<input type=\"hidden\" name=\"{}\" value=\"{{{{{}}}}}\">",
            &caps[0], CSRF_FORM_FIELD, CSRF_TEMPLATE_FN
        )
    });
    *source = replaced.into_owned();
}
