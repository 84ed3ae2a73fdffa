use super::{Flow, Middleware, Setup};
use crate::types::RequestInfo;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};

/// The innermost step of the chain: route lookup and handler dispatch.
pub type Endpoint<'a> =
    dyn Fn(Request<Full<Bytes>>) -> BoxFuture<'a, crate::Result<Response<Full<Bytes>>>> + Send + Sync + 'a;

/// The remainder of a middleware chain.
///
/// Running it executes the `before` phase of the first middleware, then recursively the rest of
/// the chain and finally, for a wrapping middleware, its `after` phase. An error from any phase
/// propagates straight to the router's error handler, skipping pending `after` phases.
pub struct Next<'a> {
    middlewares: &'a [Box<dyn Middleware>],
    endpoint: &'a Endpoint<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middlewares: &'a [Box<dyn Middleware>], endpoint: &'a Endpoint<'a>) -> Next<'a> {
        Next { middlewares, endpoint }
    }

    pub fn run(self, req: Request<Full<Bytes>>) -> BoxFuture<'a, crate::Result<Response<Full<Bytes>>>> {
        Box::pin(async move {
            let Some((mw, rest)) = self.middlewares.split_first() else {
                return (self.endpoint)(req).await;
            };

            let req = match mw.before(req).await? {
                Flow::Continue(req) => req,
                Flow::Halt(res) => {
                    tracing::debug!(middleware = mw.name(), status = res.status().as_u16(), "Request halted");
                    return Ok(res);
                }
            };

            let req_info = if mw.wraps() {
                Some(RequestInfo::new_from_req(&req))
            } else {
                None
            };

            let res = Next::new(rest, self.endpoint).run(req).await?;

            match req_info {
                Some(req_info) => mw.after(res, req_info).await,
                None => Ok(res),
            }
        })
    }
}

pub(crate) fn initialize_all(middlewares: &mut [Box<dyn Middleware>], setup: &mut Setup<'_>) -> crate::Result<()> {
    for mw in middlewares.iter_mut() {
        mw.initialize(setup)?;
        tracing::debug!(middleware = mw.name(), "Initialized middleware");
    }
    Ok(())
}

pub(crate) fn cleanup_all(middlewares: &[Box<dyn Middleware>]) {
    for mw in middlewares {
        mw.cleanup();
        tracing::debug!(middleware = mw.name(), "Cleaned up middleware");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GlobalData;
    use crate::template::TemplateManager;
    use futures::FutureExt;
    use hyper::StatusCode;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        halt: bool,
        wraps: bool,
    }

    impl Recorder {
        fn boxed(name: &'static str, log: &Log, halt: bool, wraps: bool) -> Box<dyn Middleware> {
            Box::new(Recorder {
                name,
                log: log.clone(),
                halt,
                wraps,
            })
        }
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn initialize(&mut self, _: &mut Setup<'_>) -> crate::Result<()> {
            self.log.lock().unwrap().push(format!("{}:init", self.name));
            Ok(())
        }

        fn cleanup(&self) {
            self.log.lock().unwrap().push(format!("{}:cleanup", self.name));
        }

        fn before(&self, req: Request<Full<Bytes>>) -> BoxFuture<'_, crate::Result<Flow>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                if self.halt {
                    let mut res = Response::new(Full::new(Bytes::from(self.name)));
                    *res.status_mut() = StatusCode::BAD_REQUEST;
                    return Ok(Flow::Halt(res));
                }
                Ok(Flow::Continue(req))
            })
        }

        fn wraps(&self) -> bool {
            self.wraps
        }

        fn after(&self, res: Response<Full<Bytes>>, _: RequestInfo) -> BoxFuture<'_, crate::Result<Response<Full<Bytes>>>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                Ok(res)
            })
        }
    }

    async fn run_chain(middlewares: &[Box<dyn Middleware>], log: &Log) -> Response<Full<Bytes>> {
        let endpoint_log = log.clone();
        let endpoint = move |_req: Request<Full<Bytes>>| {
            let log = endpoint_log.clone();
            async move {
                log.lock().unwrap().push("handler".to_owned());
                Ok(Response::new(Full::new(Bytes::from("handled"))))
            }
            .boxed()
        };
        Next::new(middlewares, &endpoint)
            .run(Request::new(Full::new(Bytes::new())))
            .await
            .unwrap()
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn should_short_circuit_on_halt() {
        let log = Log::default();
        let chain = vec![
            Recorder::boxed("a", &log, true, false),
            Recorder::boxed("b", &log, false, false),
            Recorder::boxed("c", &log, false, false),
        ];

        let res = run_chain(&chain, &log).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(entries(&log), vec!["a:before"]);
    }

    #[tokio::test]
    async fn should_run_rest_of_chain_before_after_phase() {
        let log = Log::default();
        let chain = vec![
            Recorder::boxed("a", &log, false, true),
            Recorder::boxed("b", &log, false, false),
        ];

        run_chain(&chain, &log).await;

        assert_eq!(entries(&log), vec!["a:before", "b:before", "handler", "a:after"]);
    }

    #[tokio::test]
    async fn should_unwind_after_phases_in_reverse_order() {
        let log = Log::default();
        let chain = vec![
            Recorder::boxed("a", &log, false, true),
            Recorder::boxed("b", &log, false, true),
            Recorder::boxed("c", &log, true, true),
        ];

        let res = run_chain(&chain, &log).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(entries(&log), vec!["a:before", "b:before", "c:before", "b:after", "a:after"]);
    }

    #[test]
    fn should_initialize_and_cleanup_in_registration_order() {
        let log = Log::default();
        let mut chain = vec![
            Recorder::boxed("a", &log, false, false),
            Recorder::boxed("b", &log, false, false),
        ];
        let mut templates = TemplateManager::new();
        let mut globals = GlobalData::new();
        let mut setup = Setup {
            templates: &mut templates,
            globals: &mut globals,
        };

        initialize_all(&mut chain, &mut setup).unwrap();
        cleanup_all(&chain);

        assert_eq!(entries(&log), vec!["a:init", "b:init", "a:cleanup", "b:cleanup"]);
    }
}
