//! Controllers: handlers which render templates named after themselves.
//!
//! A controller is a plain struct embedding a [`ControllerBase`]. The router creates a fresh,
//! default-constructed controller for every request, fills its base and hands it to the action
//! by value, so controllers never share state between requests.

use crate::context::{AppState, RequestContext};
use crate::route::{Handler, HandlerReturn};
use crate::status::status_response;
use crate::template::RenderArgs;
use crate::types::{RouteParams, EMPTY_ROUTE_PARAMS};
use crate::Error;
use http::header::{self, HeaderValue};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

/// The per-request fields every controller carries.
#[derive(Default)]
pub struct ControllerBase {
    request: Option<Request<Full<Bytes>>>,
    context: RequestContext,
    name: String,
    action: String,
    render_args: RenderArgs,
    state: Option<Arc<AppState>>,
}

impl ControllerBase {
    pub(crate) fn init(&mut self, req: Request<Full<Bytes>>, state: Arc<AppState>, name: &str, action: &str) {
        self.context = req.extensions().get::<RequestContext>().cloned().unwrap_or_default();
        self.request = Some(req);
        self.name = name.to_owned();
        self.action = action.to_owned();
        self.render_args = RenderArgs::new();
        self.state = Some(state);
    }
}

impl Debug for ControllerBase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBase")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("uri", &self.request.as_ref().map(|req| req.uri()))
            .field("render_args", &self.render_args)
            .finish()
    }
}

/// The controller capability.
///
/// Implementors only expose their embedded [`ControllerBase`]; everything else is provided.
/// See [`RouterBuilder::controller`](../struct.RouterBuilder.html#method.controller) for how
/// controller actions are registered.
pub trait Controller: Default + Send + 'static {
    fn base(&self) -> &ControllerBase;

    fn base_mut(&mut self) -> &mut ControllerBase;

    /// The controller name the action was registered with, e.g. `Users`.
    fn name(&self) -> &str {
        &self.base().name
    }

    /// The action name the route was registered with, e.g. `Show`.
    fn action(&self) -> &str {
        &self.base().action
    }

    fn request(&self) -> Option<&Request<Full<Bytes>>> {
        self.base().request.as_ref()
    }

    /// Takes the request out of the controller, e.g. to consume its body.
    fn take_request(&mut self) -> Option<Request<Full<Bytes>>> {
        self.base_mut().request.take()
    }

    fn context(&self) -> &RequestContext {
        &self.base().context
    }

    fn params(&self) -> &RouteParams {
        self.request()
            .and_then(|req| req.extensions().get::<RouteParams>())
            .unwrap_or(&EMPTY_ROUTE_PARAMS)
    }

    fn param(&self, name: &str) -> Option<String> {
        self.params().get(name).cloned()
    }

    fn render_args(&self) -> &RenderArgs {
        &self.base().render_args
    }

    fn render_args_mut(&mut self) -> &mut RenderArgs {
        &mut self.base_mut().render_args
    }

    fn app_state(&self) -> Option<&Arc<AppState>> {
        self.base().state.as_ref()
    }

    fn reverse_url<I, A>(&self, name: &str, args: I) -> String
    where
        I: IntoIterator<Item = A>,
        A: ToString,
        Self: Sized,
    {
        self.app_state()
            .map(|state| state.reverse_url(name, args))
            .unwrap_or_default()
    }

    /// The template rendered by [`render`](#method.render): `lowercase(name/action.html)`.
    fn template_name(&self) -> String {
        format!("{}/{}.html", self.name(), self.action()).to_lowercase()
    }

    fn try_render(&self) -> Result<Response<Full<Bytes>>, Error> {
        self.try_render_template(&self.template_name())
    }

    fn try_render_template(&self, name: &str) -> Result<Response<Full<Bytes>>, Error> {
        let state = self
            .app_state()
            .ok_or_else(|| Error::new("The controller has no application state"))?;
        let body = state.templates().render(name, self.render_args(), self.context())?;

        let mut res = Response::new(Full::new(Bytes::from(body)));
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        Ok(res)
    }

    /// Renders the controller's template with its render arguments.
    ///
    /// A failure is logged and answered with `500 internal server error`.
    fn render(&self) -> Response<Full<Bytes>> {
        self.render_template(&self.template_name())
    }

    fn render_template(&self, name: &str) -> Response<Full<Bytes>> {
        match self.try_render_template(name) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(
                    controller = self.name(),
                    action = self.action(),
                    template = name,
                    error = %err,
                    "Failed to render template"
                );
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Answers with `302 Found` pointing at the named route.
    fn redirect<I, A>(&self, name: &str, args: I) -> Response<Full<Bytes>>
    where
        I: IntoIterator<Item = A>,
        A: ToString,
        Self: Sized,
    {
        let mut url = self.reverse_url(name, args);
        if url.is_empty() {
            tracing::warn!(route = name, "Can't redirect to an unknown route, redirecting to `/`");
            url.push('/');
        }

        let mut res = status_response(StatusCode::FOUND);
        match HeaderValue::from_str(&url) {
            Ok(location) => {
                res.headers_mut().insert(header::LOCATION, location);
            }
            Err(err) => {
                tracing::error!(route = name, url = %url, error = %err, "Invalid redirect location");
                return status_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
        res
    }
}

/// Wraps a controller action into a route handler which creates and fills a fresh `C` for every request.
pub(crate) fn action_handler<C, H, R, E>(controller: String, action: String, handler: H) -> Handler<E>
where
    C: Controller,
    H: Fn(C) -> R + Send + Sync + 'static,
    R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
    E: 'static,
{
    Box::new(
        move |req: Request<Full<Bytes>>, state: Arc<AppState>| -> HandlerReturn<E> {
            let mut instance = C::default();
            instance.base_mut().init(req, state, &controller, &action);
            Box::new(handler(instance))
        },
    )
}
