use crate::test_utils::{build, config};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use sparql_facets::transport::{HttpTransport, SparqlTransport};
use sparql_facets::{Repository, SearchError, TransportConfig, TransportError};
use std::time::Duration;
use tokio::net::TcpListener;

const EMPTY_COUNT: &str = r#"{
    "head": {"vars": ["__count__"]},
    "results": {"bindings": [
        {"__count__": {"type": "literal", "datatype": "http://www.w3.org/2001/XMLSchema#integer", "value": "0"}}
    ]}
}"#;

/// Serves `router` on a random local port and returns the URL of its query endpoint.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });
    format!("http://{address}/query")
}

async fn counts(headers: HeaderMap, body: String) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let accept = headers.get(ACCEPT).and_then(|v| v.to_str().ok());
    if content_type != Some("application/sparql-query")
        || accept != Some("application/sparql-results+json")
        || !body.starts_with("PREFIX")
    {
        return StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response();
    }
    (
        [(CONTENT_TYPE, "application/sparql-results+json")],
        EMPTY_COUNT,
    )
        .into_response()
}

async fn search(endpoint: String) -> Result<sparql_facets::SearchResponse, SearchError> {
    let config = config();
    let transport = HttpTransport::new(endpoint);
    Repository::new(transport)
        .with_config(TransportConfig {
            timeout: Duration::from_millis(500),
            ..TransportConfig::default()
        })
        .search(&build(&config, |b| b))
        .await
}

#[tokio::test]
async fn search_over_http() {
    let endpoint = serve(Router::new().route("/query", post(counts))).await;
    let response = search(endpoint).await.unwrap();

    assert_eq!(response.total(), 0);
    assert!(response.documents().is_empty());
    // The facet variable is unbound in the canned solution.
    assert!(response.facets().iter().all(|f| f.items().is_empty()));
}

#[tokio::test]
async fn client_errors_are_invalid_queries() {
    let router = Router::new().route(
        "/query",
        post(|| async { (StatusCode::BAD_REQUEST, "Parse error at line 1") }),
    );
    let endpoint = serve(router).await;
    let error = search(endpoint).await.unwrap_err();

    let SearchError::Transport(TransportError::InvalidQuery { query, message }) = &error else {
        panic!("unexpected error {error:?}");
    };
    assert!(query.contains("COUNT(DISTINCT ?id)"));
    assert_eq!(message, "400 Bad Request: Parse error at line 1");
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn server_errors() {
    let router = Router::new().route(
        "/query",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "out of memory") }),
    );
    let endpoint = serve(router).await;
    let error = search(endpoint).await.unwrap_err();

    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Server(_))
    ));
}

#[tokio::test]
async fn unparsable_results_are_server_errors() {
    let router = Router::new().route("/query", post(|| async { "<html>maintenance</html>" }));
    let endpoint = serve(router).await;
    let error = search(endpoint).await.unwrap_err();

    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Server(_))
    ));
}

#[tokio::test]
async fn refused_connections() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let error = search(format!("http://{address}/query")).await.unwrap_err();
    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Connection(_))
    ));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn slow_endpoints_time_out() {
    let router = Router::new().route(
        "/query",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            EMPTY_COUNT
        }),
    );
    let endpoint = serve(router).await;
    let error = search(endpoint).await.unwrap_err();

    assert!(matches!(
        error,
        SearchError::Transport(TransportError::Connection(_))
    ));
}

#[tokio::test]
async fn client_timeout() {
    let router = Router::new().route(
        "/query",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            EMPTY_COUNT
        }),
    );
    let endpoint = serve(router).await;
    let transport = HttpTransport::with_timeout(endpoint, Duration::from_millis(50)).unwrap();
    let config = config();
    let request = build(&config, |b| b);
    let query = match sparql_facets_query::build_count(&request) {
        sparql_facets_query::CountPlan::Query(query) => query,
        sparql_facets_query::CountPlan::Known(_) => unreachable!(),
    };

    let error = transport.execute(&query).await.unwrap_err();
    assert!(matches!(error, TransportError::Connection(_)));
}
