//! End-to-end dispatch scenarios through the facade.

use http::StatusCode;
use serde_json::json;
use treemux::prelude::*;
use treemux_test::TestClient;

struct PathEcho;

impl Handler for PathEcho {
    fn serve(&self, request: &Request) -> HandlerResult {
        Ok(text_response(
            StatusCode::OK,
            format!("{}!", request.uri().path()),
        ))
    }
}

fn foo_bar(_request: &Request) -> HandlerResult {
    Ok(text_response(StatusCode::OK, "foo!bar!"))
}

fn tagged(tag: &'static str) -> impl Fn(&Request) -> HandlerResult + Send + Sync + 'static {
    move |_request| Ok(text_response(StatusCode::OK, tag))
}

#[test]
fn mixed_handler_shapes() {
    let mut mux = TreeMux::new();
    mux.handle_func("foo/bar", foo_bar);
    mux.handle_func("/moo", foo_bar);
    mux.handle("/moo/", PathEcho);
    let client = TestClient::new(mux);

    let cases = [
        ("/foo/bar", StatusCode::OK, "foo!bar!"),
        ("/foo/bla", StatusCode::NOT_FOUND, "404 page not found\n"),
        ("/moo", StatusCode::OK, "foo!bar!"),
        ("/moo/", StatusCode::OK, "/moo/!"),
        ("/moo/meh", StatusCode::OK, "/moo/meh!"),
    ];
    for (path, status, body) in cases {
        client
            .get(path)
            .send()
            .assert_status(status)
            .assert_body_eq(body);
    }
}

#[test]
fn wildcard_matches_single_segment() {
    let client = TestClient::new(
        TreeMux::builder()
            .handle_func("/foo/*/bla", tagged("bla"))
            .build(),
    );

    client.get("/foo/anything/bla").send().assert_body_eq("bla");
    client.get("/foo/anything").send().assert_not_found();
    client.get("/foo/a/b/bla").send().assert_not_found();
}

#[test]
fn insertion_order_breaks_ties() {
    let wildcard_first = TestClient::new(
        TreeMux::builder()
            .handle_func("/foo/*", tagged("wildcard"))
            .handle_func("/foo/bar", tagged("literal"))
            .build(),
    );
    wildcard_first.get("/foo/bar").send().assert_body_eq("wildcard");

    let literal_first = TestClient::new(
        TreeMux::builder()
            .handle_func("/foo/bar", tagged("literal"))
            .handle_func("/foo/*", tagged("wildcard"))
            .build(),
    );
    literal_first.get("/foo/bar").send().assert_body_eq("literal");
    literal_first.get("/foo/baz").send().assert_body_eq("wildcard");
}

#[test]
fn custom_wildcard_token() {
    let client = TestClient::new(
        TreeMux::builder()
            .wildcard(":seg")
            .handle_func("/users/:seg", tagged("user"))
            .handle_func("/files/*", tagged("star"))
            .build(),
    );

    client.get("/users/42").send().assert_body_eq("user");
    // `*` is a plain literal under another token.
    client.get("/files/*").send().assert_body_eq("star");
    client.get("/files/readme").send().assert_not_found();
}

#[test]
fn custom_not_found_route() {
    let mux = TreeMux::with_not_found(Some(Route::func(|_req| {
        Ok(text_response(StatusCode::GONE, "gone"))
    })));
    TestClient::new(mux)
        .get("/nowhere")
        .send()
        .assert_status(StatusCode::GONE);
}

#[test]
fn waypoint_uses_not_found() {
    let client = TestClient::new(
        TreeMux::builder()
            .handle_func("/a/b/c", tagged("deep"))
            .build(),
    );

    client.get("/a/b").send().assert_not_found();
    client.get("/a/b/c").send().assert_body_eq("deep");
}

#[test]
fn handler_errors_become_envelopes() {
    let client = TestClient::new(
        TreeMux::builder()
            .handle_func("/conflict", |_req| {
                Err(MuxError::handler(StatusCode::CONFLICT, "version mismatch"))
            })
            .handle_func("/boom", |_req| {
                Err(MuxError::internal_with_source(
                    "storage unavailable",
                    std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
                ))
            })
            .build(),
    );

    client
        .get("/conflict")
        .send()
        .assert_status(StatusCode::CONFLICT)
        .assert_content_type("application/json")
        .assert_json_eq(&json!({
            "error": {"code": "HANDLER_ERROR", "message": "version mismatch"}
        }));

    let response = client.get("/boom").send();
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().unwrap().contains("disk on fire"));
}

#[test]
fn named_routes_from_registry() {
    let mut registry = HandlerRegistry::new();
    registry.register_handler("echo", PathEcho);
    registry.register_func("foo", foo_bar);

    let mux = TreeMux::builder()
        .named_route("/moo/", "echo", &registry)
        .and_then(|b| b.named_route("/foo/bar", "foo", &registry))
        .unwrap()
        .build();
    let client = TestClient::new(mux);
    client.get("/moo/x").send().assert_body_eq("/moo/x!");
    client.get("/foo/bar").send().assert_body_eq("foo!bar!");

    let err = TreeMux::builder()
        .named_route("/users", "listUsers", &registry)
        .unwrap_err();
    assert!(matches!(err, MuxError::MalformedPayload { .. }));
}
