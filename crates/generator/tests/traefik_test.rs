//! Integration tests for the Traefik generator

use kusk_gen_common::OptionsResolver;
use kusk_gen_generator::{Generator, TraefikGenerator};
use kusk_gen_parser::{get_options, parse};
use serde::Deserialize;
use serde_json::{json, Value};
use serde_yaml::Value as Yaml;

const BOOKSTORE: &str = r#"
openapi: 3.0.0
x-kusk:
  cors:
    origins: ["*"]
  timeouts:
    request_timeout: 10
paths:
  /books:
    get:
      operationId: listBooks
    post:
      operationId: createBook
      x-kusk:
        rate_limits:
          rps: 5
  /authors:
    x-kusk:
      cors:
        origins: ["http://authors.example"]
      timeouts:
        request_timeout: 30
    get:
      operationId: listAuthors
    delete:
      operationId: deleteAuthor
      x-kusk:
        disabled: true
"#;

fn generate(spec: &str, flags: Value) -> String {
    let api = parse(spec.as_bytes()).unwrap();
    let options = OptionsResolver::new()
        .resolve(&get_options(&api), &flags)
        .unwrap();
    TraefikGenerator.generate(&options, &api).unwrap()
}

fn documents(stream: &str) -> Vec<Yaml> {
    serde_yaml::Deserializer::from_str(stream)
        .map(|doc| Yaml::deserialize(doc).unwrap())
        .collect()
}

fn names(docs: &[Yaml], kind: &str) -> Vec<String> {
    docs.iter()
        .filter(|d| d["kind"] == kind)
        .map(|d| d["metadata"]["name"].as_str().unwrap().to_string())
        .collect()
}

fn middleware_names(route: &Yaml) -> Vec<&str> {
    route["middlewares"]
        .as_sequence()
        .map(|refs| refs.iter().map(|r| r["name"].as_str().unwrap()).collect())
        .unwrap_or_default()
}

fn bookstore_flags() -> Value {
    json!({"service": {"name": "bookstore", "namespace": "books", "port": 8080}})
}

#[test]
fn test_object_order_and_names() {
    let docs = documents(&generate(BOOKSTORE, bookstore_flags()));

    let kinds: Vec<_> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec![
            "Middleware",
            "Middleware",
            "Middleware",
            "ServersTransport",
            "ServersTransport",
            "IngressRoute"
        ]
    );
    assert_eq!(
        names(&docs, "Middleware"),
        vec!["bookstore-authors-cors", "bookstore-books-post-ratelimit", "bookstore-cors"]
    );
    assert_eq!(
        names(&docs, "ServersTransport"),
        vec!["bookstore-authors-transport", "bookstore-transport"]
    );
    assert_eq!(names(&docs, "IngressRoute"), vec!["bookstore"]);
    assert!(docs
        .iter()
        .all(|d| d["apiVersion"] == "traefik.containo.us/v1alpha1"));
}

#[test]
fn test_routes_reference_scoped_objects() {
    let docs = documents(&generate(BOOKSTORE, bookstore_flags()));
    let route = docs.last().unwrap();
    let routes = route["spec"]["routes"].as_sequence().unwrap();

    let matches: Vec<_> = routes.iter().map(|r| r["match"].as_str().unwrap()).collect();
    assert_eq!(
        matches,
        vec![
            r#"PathPrefix("/authors") && Method("GET")"#,
            r#"PathPrefix("/books") && Method("GET")"#,
            r#"PathPrefix("/books") && Method("POST")"#,
        ]
    );

    assert_eq!(middleware_names(&routes[0]), vec!["bookstore-authors-cors"]);
    assert_eq!(
        routes[0]["services"][0]["serversTransport"],
        "bookstore-authors-transport"
    );

    assert_eq!(middleware_names(&routes[1]), vec!["bookstore-cors"]);
    assert_eq!(routes[1]["services"][0]["serversTransport"], "bookstore-transport");

    assert_eq!(
        middleware_names(&routes[2]),
        vec!["bookstore-cors", "bookstore-books-post-ratelimit"]
    );

    let service = &routes[1]["services"][0];
    assert_eq!(service["name"], "bookstore");
    assert_eq!(service["namespace"], "books");
    assert_eq!(service["port"], 8080);
}

#[test]
fn test_colliding_path_slugs_get_distinct_objects() {
    // "/" and "/root" both slug to "root"
    let spec = r#"
openapi: 3.0.0
paths:
  /:
    x-kusk:
      cors:
        origins: ["http://a.example"]
    get: {}
  /root:
    x-kusk:
      cors:
        origins: ["http://b.example"]
    get: {}
"#;
    let mut flags = bookstore_flags();
    flags["path"] = json!({"split": true});
    let docs = documents(&generate(spec, flags));

    assert_eq!(
        names(&docs, "Middleware"),
        vec!["bookstore-root-cors", "bookstore-root-cors-2"]
    );
    let origin_of = |name: &str| {
        docs.iter()
            .find(|d| d["metadata"]["name"] == name)
            .unwrap()["spec"]["headers"]["accessControlAllowOriginList"][0]
            .clone()
    };
    assert_eq!(origin_of("bookstore-root-cors"), "http://a.example");
    assert_eq!(origin_of("bookstore-root-cors-2"), "http://b.example");

    let routes = docs.last().unwrap()["spec"]["routes"].as_sequence().unwrap().clone();
    assert_eq!(routes[0]["match"], r#"PathPrefix("/") && Method("GET")"#);
    assert_eq!(middleware_names(&routes[0]), vec!["bookstore-root-cors"]);
    assert_eq!(routes[1]["match"], r#"PathPrefix("/root") && Method("GET")"#);
    assert_eq!(middleware_names(&routes[1]), vec!["bookstore-root-cors-2"]);
}

#[test]
fn test_case_only_path_difference_keeps_both_configs() {
    let spec = r#"
openapi: 3.0.0
paths:
  /Pets:
    x-kusk:
      rate_limits:
        rps: 5
    get: {}
  /pets:
    x-kusk:
      rate_limits:
        rps: 50
    get: {}
"#;
    let docs = documents(&generate(spec, bookstore_flags()));
    let limits: Vec<_> = docs
        .iter()
        .filter(|d| d["kind"] == "Middleware")
        .map(|d| {
            (
                d["metadata"]["name"].as_str().unwrap().to_string(),
                d["spec"]["rateLimit"]["average"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        limits,
        vec![
            ("bookstore-pets-ratelimit".to_string(), 5),
            ("bookstore-pets-ratelimit-2".to_string(), 50),
        ]
    );
}

#[test]
fn test_path_and_operation_overrides_across_methods() {
    let spec = r#"
openapi: 3.0.0
x-kusk:
  timeouts:
    request_timeout: 10
paths:
  /pets:
    x-kusk:
      cors:
        origins: ["http://path.example"]
      timeouts:
        request_timeout: 20
    get:
      x-kusk:
        cors:
          origins: ["http://get.example"]
    post:
      x-kusk:
        cors:
          origins: ["http://post.example"]
        timeouts:
          request_timeout: 40
    delete: {}
"#;
    let docs = documents(&generate(spec, bookstore_flags()));
    assert_eq!(
        names(&docs, "Middleware"),
        vec![
            "bookstore-pets-cors",
            "bookstore-pets-get-cors",
            "bookstore-pets-post-cors"
        ]
    );
    // the global transport is unused since /pets overrides it
    assert_eq!(
        names(&docs, "ServersTransport"),
        vec!["bookstore-pets-post-transport", "bookstore-pets-transport"]
    );

    let routes = docs.last().unwrap()["spec"]["routes"].as_sequence().unwrap().clone();
    let by_method = |method: &str| {
        routes
            .iter()
            .find(|r| r["match"].as_str().unwrap().ends_with(&format!("Method(\"{method}\")")))
            .unwrap()
            .clone()
    };

    let delete = by_method("DELETE");
    assert_eq!(middleware_names(&delete), vec!["bookstore-pets-cors"]);
    assert_eq!(delete["services"][0]["serversTransport"], "bookstore-pets-transport");

    let get = by_method("GET");
    assert_eq!(middleware_names(&get), vec!["bookstore-pets-get-cors"]);
    assert_eq!(get["services"][0]["serversTransport"], "bookstore-pets-transport");

    let post = by_method("POST");
    assert_eq!(middleware_names(&post), vec!["bookstore-pets-post-cors"]);
    assert_eq!(
        post["services"][0]["serversTransport"],
        "bookstore-pets-post-transport"
    );

    let origin_of = |name: &str| {
        docs.iter()
            .find(|d| d["metadata"]["name"] == name)
            .unwrap()["spec"]["headers"]["accessControlAllowOriginList"][0]
            .clone()
    };
    assert_eq!(origin_of("bookstore-pets-cors"), "http://path.example");
    assert_eq!(origin_of("bookstore-pets-get-cors"), "http://get.example");
    assert_eq!(origin_of("bookstore-pets-post-cors"), "http://post.example");
}

#[test]
fn test_middleware_specs() {
    let docs = documents(&generate(BOOKSTORE, bookstore_flags()));
    let find = |name: &str| {
        docs.iter()
            .find(|d| d["metadata"]["name"] == name)
            .unwrap()
            .clone()
    };

    let cors = find("bookstore-authors-cors");
    let headers = &cors["spec"]["headers"];
    assert_eq!(headers["accessControlAllowOriginList"][0], "http://authors.example");
    assert_eq!(headers["addVaryHeader"], true);

    let limit = find("bookstore-books-post-ratelimit");
    assert_eq!(limit["spec"]["rateLimit"]["average"], 5);

    let transport = find("bookstore-authors-transport");
    assert_eq!(
        transport["spec"]["forwardingTimeouts"]["responseHeaderTimeout"],
        "30s"
    );
}

#[test]
fn test_override_equal_to_global_reuses_object() {
    let spec = r#"
openapi: 3.0.0
x-kusk:
  cors:
    origins: ["*"]
paths:
  /a:
    get: {}
  /b:
    x-kusk:
      cors:
        origins: ["*"]
    get: {}
"#;
    let docs = documents(&generate(spec, bookstore_flags()));
    assert_eq!(names(&docs, "Middleware"), vec!["bookstore-cors"]);
}

#[test]
fn test_strip_prefix_and_host() {
    let mut flags = bookstore_flags();
    flags["path"] = json!({"base": "/bookstore/api", "trim_prefix": "/bookstore", "split": true});
    flags["host"] = json!("books.example.com");

    let docs = documents(&generate(BOOKSTORE, flags));
    assert!(names(&docs, "Middleware").contains(&"bookstore-strip-prefix".to_string()));

    let strip = docs
        .iter()
        .find(|d| d["metadata"]["name"] == "bookstore-strip-prefix")
        .unwrap();
    assert_eq!(strip["spec"]["stripPrefix"]["prefixes"][0], "/bookstore");

    let routes = docs.last().unwrap()["spec"]["routes"].as_sequence().unwrap().clone();
    assert_eq!(
        routes[0]["match"],
        r#"Host("books.example.com") && PathPrefix("/bookstore/api/authors") && Method("GET")"#
    );
    assert_eq!(middleware_names(&routes[0])[0], "bookstore-strip-prefix");
}

#[test]
fn test_root_only_single_route() {
    let mut flags = bookstore_flags();
    flags["path"] = json!({"base": "/api", "split": false});

    let docs = documents(&generate(BOOKSTORE, flags));
    let routes = docs.last().unwrap()["spec"]["routes"].as_sequence().unwrap().clone();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0]["match"], r#"PathPrefix("/api")"#);
    assert_eq!(names(&docs, "Middleware"), vec!["bookstore-cors"]);
}

#[test]
fn test_output_is_deterministic() {
    assert_eq!(
        generate(BOOKSTORE, bookstore_flags()),
        generate(BOOKSTORE, bookstore_flags())
    );
}
