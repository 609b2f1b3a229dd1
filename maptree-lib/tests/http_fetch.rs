//! End-to-end tests against a local HTTP server.
//!
//! The server records every request and answers from a fixed route table.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use maptree_lib::FeatureClient;
use maptree_lib::FeatureSource;
use maptree_lib::InteractiveMap;
use maptree_lib::LayerState;
use maptree_lib::LazyLayer;
use maptree_lib::LoadOutcome;
use maptree_lib::config::LayerSource;
use maptree_lib::config::MapConfig;
use maptree_lib::csrf::StaticCsrfToken;
use maptree_lib::error::FetchError;
use maptree_lib::error::LoadError;
use maptree_lib::model::Bounds;
use maptree_lib::model::FeatureLayerOptions;
use maptree_lib::model::LatLng;
use maptree_lib::tree;
use maptree_lib::widget::HeadlessWidget;

const EMPTY_COLLECTION: &str = r#"{"type":"FeatureCollection","features":[]}"#;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    content_type: Option<String>,
    csrf: Option<String>,
    body: String,
}

struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn client(&self) -> FeatureClient {
        FeatureClient::builder()
            .base_url(self.base_url())
            .csrf(StaticCsrfToken::new("csrf-123"))
            .build()
            .unwrap()
    }
}

async fn serve(routes: &[(&str, u16, &str)]) -> TestServer {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
        routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect(),
    );
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let routes = routes.clone();
            let recorded = recorded.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let routes = routes.clone();
                    let recorded = recorded.clone();
                    async move {
                        let header = |name: &str| {
                            req.headers()
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        let content_type = header("content-type");
                        let csrf = header("x-csrftoken");
                        let method = req.method().to_string();
                        let path = req.uri().path().to_string();
                        let body = req.into_body().collect().await?.to_bytes();

                        recorded.lock().unwrap().push(Recorded {
                            method,
                            path: path.clone(),
                            content_type,
                            csrf,
                            body: String::from_utf8_lossy(&body).into_owned(),
                        });

                        let (status, body) = routes
                            .get(&path)
                            .cloned()
                            .unwrap_or((404, "not found".to_string()));

                        Ok::<_, hyper::Error>(
                            Response::builder()
                                .status(status)
                                .header("Content-Type", "application/json")
                                .body(Full::new(Bytes::from(body)))
                                .unwrap(),
                        )
                    }
                });

                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    TestServer { addr, requests }
}

fn bounds() -> Bounds {
    Bounds::new(LatLng::new(-10.5, 153.25), LatLng::new(-28.75, 137.5))
}

fn layer(client: FeatureClient, widget: Arc<HeadlessWidget>, url: &str) -> LazyLayer {
    LazyLayer::new(
        "Roads",
        Some(url.to_string()),
        FeatureLayerOptions::new(),
        Arc::new(client),
        widget,
    )
}

#[tokio::test]
async fn test_toggle_on_posts_bounds() {
    let server = serve(&[("/roads", 200, EMPTY_COLLECTION)]).await;
    let widget = Arc::new(HeadlessWidget::new(bounds()));
    let roads = layer(server.client(), widget, "/roads");

    let outcome = roads.show().await;

    assert_eq!(outcome, LoadOutcome::Populated { features: 0 });
    assert_eq!(roads.state(), LayerState::Populated);
    assert_eq!(roads.feature_count(), 0);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/roads");
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(request.csrf.as_deref(), Some("csrf-123"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "northEast": {"lat": -10.5, "lng": 153.25},
            "southWest": {"lat": -28.75, "lng": 137.5},
        })
    );
}

#[tokio::test]
async fn test_double_encoded_collection() {
    let inner = r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[142.7,-20.9]},"properties":{"permit_id":"EPM 1"}}]}"#;
    let encoded = serde_json::to_string(inner).unwrap();
    let server = serve(&[("/epm", 200, encoded.as_str())]).await;

    let features = server
        .client()
        .fetch_features("/epm", &bounds())
        .await
        .unwrap();

    assert_eq!(features.features.len(), 1);
}

#[tokio::test]
async fn test_non_success_status() {
    let server = serve(&[("/roads", 500, "Internal Server Error")]).await;

    let err = server
        .client()
        .fetch_features("/roads", &bounds())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert!(err.is_network());
}

#[tokio::test]
async fn test_non_json_body() {
    let server = serve(&[("/roads", 200, "<html>oops</html>")]).await;
    let widget = Arc::new(HeadlessWidget::new(bounds()));
    let roads = layer(server.client(), widget, "/roads");

    assert_eq!(roads.show().await, LoadOutcome::Failed(LoadError::Parse));
    assert_eq!(roads.state(), LayerState::Empty);
}

#[tokio::test]
async fn test_connection_refused_is_swallowed() {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = FeatureClient::builder()
        .base_url(format!("http://{}", addr))
        .csrf(StaticCsrfToken::empty())
        .build()
        .unwrap();

    let err = client.fetch_features("/roads", &bounds()).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));

    let widget = Arc::new(HeadlessWidget::new(bounds()));
    let roads = layer(client, widget, "/roads");

    let outcome = roads.show().await;

    assert_eq!(outcome, LoadOutcome::Failed(LoadError::Network));
    assert_eq!(roads.state(), LayerState::Empty);
    assert_eq!(roads.error_count(), 1);

    roads.hide();
    assert_eq!(roads.state(), LayerState::Empty);
    assert_eq!(roads.feature_count(), 0);
}

#[tokio::test]
async fn test_map_loads_tree_and_toggles_leaf() {
    let tree = r#"[
        {"label": "Roads", "url": "/roads", "id": "roads"},
        {"label": "Admin", "children": [{"label": "States", "url": "/states", "id": "states"}]}
    ]"#;
    let states = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":null,"properties":{"name":"QLD"}},
        {"type":"Feature","geometry":null,"properties":{"name":"NSW"}}
    ]}"#;
    let server = serve(&[
        ("/map/tree/", 200, tree),
        ("/roads", 200, EMPTY_COLLECTION),
        ("/states", 200, states),
    ])
    .await;

    let widget = Arc::new(HeadlessWidget::new(bounds()));
    let config = MapConfig::default().with_layer(LayerSource::tree("/map/tree/"));
    let map = InteractiveMap::new("map", config, widget, Arc::new(server.client())).unwrap();

    assert_eq!(map.load_layers().await, 1);
    assert_eq!(server.requests().len(), 1);

    let installed = map.tree().unwrap();
    assert_eq!(installed.len(), 2);
    let admin = installed[1].as_category().unwrap();
    assert!(admin.collapsed);

    let states_layer = tree::find_leaf(&installed, "States").unwrap().layer.clone();
    let outcome = map.set_layer_visible(states_layer.id(), true).await;
    assert_eq!(outcome, Some(LoadOutcome::Populated { features: 2 }));

    let requests = server.requests();
    assert_eq!(requests.last().unwrap().path, "/states");

    map.set_layer_visible(states_layer.id(), false).await;
    assert_eq!(states_layer.feature_count(), 0);
    assert_eq!(server.requests().len(), 2);
}
