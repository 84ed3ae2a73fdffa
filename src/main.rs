use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, Response};
use parking_lot::Mutex;
use routekit::config::{Config, ServerConfig};
use routekit::prelude::*;
use routekit::{logging, shutdown_signal, ControllerBase, Csrf, Error, Router, SecurityHeaders, Server};

const INDEX_TEMPLATE: &str = r#"<html>
<head><title>routekit</title></head>
<body>
<h1>Guestbook</h1>
<pre>{{ messages }}</pre>
<form method="post" action="{{ create_url }}">
<input name="text"><button>Sign</button>
</form>
</body>
</html>
"#;

// Guestbook entries, shared by every request through the global data.
#[derive(Default)]
struct Messages(Mutex<Vec<String>>);

#[derive(Default)]
struct Guestbook {
    base: ControllerBase,
}

impl Controller for Guestbook {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase {
        &mut self.base
    }
}

impl Guestbook {
    fn messages(&self) -> Option<&Messages> {
        self.app_state()?.globals().get::<Messages>("messages")
    }
}

async fn index(mut page: Guestbook) -> Result<Response<Full<Bytes>>, Error> {
    let messages = page.messages().map(|m| m.0.lock().join("\n")).unwrap_or_default();
    let create_url = page.reverse_url("guestbook#create", Vec::<String>::new());

    page.render_args_mut()
        .insert("messages", messages)
        .insert("create_url", create_url);
    Ok(page.render())
}

async fn create(mut page: Guestbook) -> Result<Response<Full<Bytes>>, Error> {
    let req = page
        .take_request()
        .ok_or_else(|| Error::new("The request was already taken"))?;
    let body = req.into_body().collect().await.map(|c| c.to_bytes()).unwrap_or_default();

    let text = url::form_urlencoded::parse(&body)
        .find(|(key, _)| key == "text")
        .map(|(_, value)| value.trim().to_owned())
        .filter(|text| !text.is_empty());

    if let (Some(text), Some(messages)) = (text, page.messages()) {
        tracing::info!(text = %text, "New guestbook entry");
        messages.0.lock().push(text);
    }

    Ok(page.redirect("guestbook#index", Vec::<String>::new()))
}

fn router() -> routekit::Result<Router<Error>> {
    Router::builder()
        .middleware(SecurityHeaders::new())
        .middleware(Csrf::new())
        .global_read_only("messages", Messages::default())
        .template("guestbook/index.html", INDEX_TEMPLATE)
        .get_action("/", "Guestbook", "Index", index)
        .post_action("/entries", "Guestbook", "Create", create)
        .get("/hello/:name", |req| async move {
            let name = req.param("name").cloned().unwrap_or_default();
            Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", name)))))
        })
        .name("hello")
        .build()
}

#[tokio::main]
async fn main() -> routekit::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config {
            server: ServerConfig {
                port: 3000,
                ..ServerConfig::default()
            },
            ..Config::default()
        },
    };
    logging::init(&config.log);

    let router = router()?;
    tracing::info!(hello = %router.reverse_url("hello", ["world"]), "Routes ready");

    let listener = Server::<Error>::bind(&config.server).await?;
    Server::new(router)?.serve(listener, shutdown_signal()).await
}
