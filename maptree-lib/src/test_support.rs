//! Shared fixtures for unit tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use geojson::Feature;
use geojson::FeatureCollection;
use tokio::sync::oneshot;

use crate::error::FetchError;
use crate::model::Bounds;
use crate::model::LatLng;
use crate::model::TreeNodeDescriptor;
use crate::source::FeatureSource;
use crate::widget::HeadlessWidget;

type FeatureReply = Result<FeatureCollection, FetchError>;

enum Reply {
    Ready(FeatureReply),
    Deferred(oneshot::Receiver<FeatureReply>),
}

/// A [`FeatureSource`] that answers from a queue of scripted replies.
///
/// Requests with nothing queued get an empty collection.
#[derive(Default)]
pub struct ScriptedSource {
    requests: Mutex<Vec<(String, Bounds)>>,
    replies: Mutex<VecDeque<Reply>>,
    tree: Mutex<Option<Result<Vec<TreeNodeDescriptor>, FetchError>>>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, collection: FeatureCollection) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Ready(Ok(collection)));
    }

    pub fn push_err(&self, err: FetchError) {
        self.replies.lock().unwrap().push_back(Reply::Ready(Err(err)));
    }

    /// Queues a reply that is released through the returned sender.
    pub fn push_deferred(&self) -> oneshot::Sender<FeatureReply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Deferred(rx));
        tx
    }

    pub fn set_tree(&self, tree: Result<Vec<TreeNodeDescriptor>, FetchError>) {
        *self.tree.lock().unwrap() = Some(tree);
    }

    pub fn requests(&self) -> Vec<(String, Bounds)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeatureSource for ScriptedSource {
    async fn fetch_features(&self, url: &str, bounds: &Bounds) -> FeatureReply {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), *bounds));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::parse("reply sender dropped"))),
            None => Ok(collection(0)),
        }
    }

    async fn fetch_tree(
        &self,
        url: &str,
        bounds: &Bounds,
    ) -> Result<Vec<TreeNodeDescriptor>, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), *bounds));
        self.tree
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn bounds() -> Bounds {
    Bounds::new(LatLng::new(-10.0, 154.0), LatLng::new(-29.0, 138.0))
}

pub fn widget() -> Arc<HeadlessWidget> {
    Arc::new(HeadlessWidget::new(bounds()))
}

/// A collection of `n` point features numbered through their `n` property.
pub fn collection(n: usize) -> FeatureCollection {
    let features = (0..n)
        .map(|i| {
            serde_json::from_value::<Feature>(serde_json::json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [142.0, -20.0]},
                "properties": {"n": i},
            }))
            .unwrap()
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// `[Roads -> /roads, Admin -> [States -> /states]]`
pub fn roads_and_admin() -> Vec<TreeNodeDescriptor> {
    vec![
        TreeNodeDescriptor::leaf("Roads", "/roads"),
        TreeNodeDescriptor::category(
            "Admin",
            vec![TreeNodeDescriptor::leaf("States", "/states")],
        ),
    ]
}
