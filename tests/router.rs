use self::support::{into_text, request, Harness};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{header, Response, StatusCode};
use routekit::prelude::*;
use routekit::{Error, RouteError, Router};
use std::convert::Infallible;

mod support;

fn text(body: &'static str) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(Response::new(Full::new(Bytes::from(body))))
}

#[tokio::test]
async fn can_route_literal_paths_and_params() {
    let router: Router<Infallible> = Router::builder()
        .get("/", |_| async move { text("home") })
        .get("/users/new", |_| async move { text("new user form") })
        .get("/users/:userName/books/:bookName", |req| async move {
            let user = req.param("userName").cloned().unwrap_or_default();
            let book = req.param("bookName").cloned().unwrap_or_default();
            Ok(Response::new(Full::new(Bytes::from(format!("{} reads {}", user, book)))))
        })
        .get("/users/:id", |req| async move {
            let names = req.params().names().collect::<Vec<_>>().join(",");
            Ok(Response::new(Full::new(Bytes::from(format!("{}={}", names, req.param("id").unwrap())))))
        })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    assert_eq!(into_text(harness.get("/").await).await, "home");
    assert_eq!(into_text(harness.get("/users/new").await).await, "new user form");
    assert_eq!(into_text(harness.get("/users/42").await).await, "id=42");
    assert_eq!(into_text(harness.get("/users/42/").await).await, "id=42");
    assert_eq!(
        into_text(harness.get("/users/alice/books/HarryPotter").await).await,
        "alice reads HarryPotter"
    );
}

#[tokio::test]
async fn can_decode_percent_encoded_params() {
    let router: Router<Infallible> = Router::builder()
        .get("/users/:name", |req| async move {
            Ok(Response::new(Full::new(Bytes::from(req.param("name").cloned().unwrap_or_default()))))
        })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    assert_eq!(into_text(harness.get("/users/j%C3%B6rg").await).await, "jörg");
    assert_eq!(into_text(harness.get("/users/a%2Fb").await).await, "a/b");
    assert_eq!(harness.get("/users/a/b").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn can_capture_catch_all_segments() {
    let router: Router<Infallible> = Router::builder()
        .get("/public/*path", |req| async move {
            Ok(Response::new(Full::new(Bytes::from(req.param("path").cloned().unwrap_or_default()))))
        })
        .get("/public/robots.txt", |_| async move { text("robots") })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    assert_eq!(into_text(harness.get("/public/css/site.css").await).await, "css/site.css");
    assert_eq!(into_text(harness.get("/public/robots.txt").await).await, "robots");
    assert_eq!(harness.get("/public").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn can_answer_not_found_and_method_not_allowed() {
    let router: Router<Infallible> = Router::builder()
        .get("/items/:id", |_| async move { text("item") })
        .delete("/items/:id", |_| async move { text("deleted") })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    let res = harness.get("/nothing/here").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(into_text(res).await, "404 not found");

    let res = harness
        .send(request("PUT", "/items/1").body(Full::new(Bytes::new())).unwrap())
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.headers()[header::ALLOW], "DELETE, GET, HEAD");
    assert_eq!(into_text(res).await, "405 method not allowed");
}

#[tokio::test]
async fn can_serve_head_with_get_route() {
    let router: Router<Infallible> = Router::builder()
        .get("/ping", |req| async move {
            Ok(Response::new(Full::new(Bytes::from(req.method().to_string()))))
        })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    let res = harness
        .send(request("HEAD", "/ping").body(Full::new(Bytes::new())).unwrap())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(into_text(res).await, "HEAD");
}

#[tokio::test]
async fn can_generate_reverse_urls() {
    let router: Router<Infallible> = Router::builder()
        .get("/", |_| async move { text("home") })
        .name("Home")
        .get("/users/:id/books/:book", |_| async move { text("book") })
        .name("book")
        .name("user_book")
        .get("/files/*path", |_| async move { text("file") })
        .name("file")
        .build()
        .unwrap();

    assert_eq!(router.reverse_url("home", Vec::<String>::new()), "/");
    assert_eq!(router.reverse_url("HOME", Vec::<String>::new()), "/");
    assert_eq!(router.reverse_url("book", [7, 3]), "/users/7/books/3");
    assert_eq!(router.reverse_url("user_book", ["a", "b"]), "/users/a/books/b");
    assert_eq!(router.reverse_url("file", ["docs/readme.md"]), "/files/docs/readme.md");
    assert_eq!(router.reverse_url("missing", [1]), "");

    assert!(matches!(
        router.try_reverse_url("book", [7]),
        Err(Error::ReverseArgs { expected: 2, given: 1, .. })
    ));
    assert!(matches!(
        router.try_reverse_url("missing", [1]),
        Err(Error::UnknownRouteName(_))
    ));
}

#[tokio::test]
async fn can_reach_named_routes_from_handlers() {
    let router: Router<Infallible> = Router::builder()
        .get("/users/:id", |_| async move { text("user") })
        .name("user")
        .get("/link", |req| async move {
            let url = req
                .app_state()
                .map(|state| state.reverse_url("user", [5]))
                .unwrap_or_default();
            Ok(Response::new(Full::new(Bytes::from(url))))
        })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    assert_eq!(into_text(harness.get("/link").await).await, "/users/5");
}

#[test]
fn can_report_builder_errors() {
    let duplicate = Router::<Infallible>::builder()
        .get("/a/:id", |_| async move { text("a") })
        .get("/a/:other", |_| async move { text("b") })
        .build();
    let err = duplicate.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::DuplicateRoute { pattern, .. }) if pattern == "/a/:other"
    ));

    let bad_pattern = Router::<Infallible>::builder()
        .get("/files/*rest/more", |_| async move { text("a") })
        .build();
    assert!(matches!(
        bad_pattern.unwrap_err().downcast_ref::<Error>(),
        Some(Error::InvalidPattern { .. })
    ));
}

#[tokio::test]
async fn can_handle_errors_with_err_handler() {
    let router: Router<Error> = Router::builder()
        .get("/boom", |_| async move { Err(Error::new("boom")) })
        .err_handler(|err: RouteError| async move {
            let mut res = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
            *res.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
            res
        })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    let res = harness.get("/boom").await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(into_text(res).await, "Something went wrong: boom");
}

#[tokio::test]
async fn can_fall_back_to_internal_server_error() {
    let router: Router<Error> = Router::builder()
        .get("/boom", |_| async move { Err(Error::new("boom")) })
        .build()
        .unwrap();
    let harness = Harness::new(router);

    let res = harness.get("/boom").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(into_text(res).await, "500 internal server error");
}
