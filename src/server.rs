//! HTTP dashboard: `GET /` renders, `GET /?operation=read&item=ID&time=SECS`
//! marks an item visited and redirects back.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::types::FilterConfig;
use crate::render::{render, render_page};
use crate::store::{SharedStore, StoreError};
use crate::types::ItemId;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing query parameter `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{name}`: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),
    #[error("store update failed: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Store(ref e) => {
                tracing::error!("server: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => {
                tracing::debug!("server: rejected request: {self}");
                StatusCode::BAD_REQUEST
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// A parsed mark-visited request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkVisited {
    pub id: ItemId,
    /// `time=0` parses to the never-visited marker.
    pub at: DateTime<Utc>,
}

impl MarkVisited {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, RequestError> {
        let item = params.get("item").ok_or(RequestError::Missing("item"))?;
        let time = params.get("time").ok_or(RequestError::Missing("time"))?;
        let id = item.trim().parse().map_err(|_| RequestError::Invalid {
            name: "item",
            value: item.clone(),
        })?;
        let at = parse_epoch_seconds(time.trim()).ok_or_else(|| RequestError::Invalid {
            name: "time",
            value: time.clone(),
        })?;
        Ok(Self { id, at })
    }
}

/// Non-negative Unix seconds, integral or fractional.
fn parse_epoch_seconds(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = s.parse::<i64>() {
        return (secs >= 0)
            .then(|| DateTime::from_timestamp(secs, 0))
            .flatten();
    }
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (whole, nanos) = (secs.trunc() as i64, (secs.fract() * 1e9) as u32);
    DateTime::from_timestamp(whole, nanos)
}

/// Serves dashboard requests against the shared store.
pub struct DashboardService {
    store: Arc<SharedStore>,
    filters: FilterConfig,
    refresh_seconds: u32,
}

impl DashboardService {
    pub fn new(store: Arc<SharedStore>, filters: FilterConfig, refresh_seconds: u32) -> Self {
        Self {
            store,
            filters,
            refresh_seconds,
        }
    }

    /// Dispatch one `GET /` by its query parameters.
    pub fn handle(&self, params: &HashMap<String, String>) -> Result<Response, RequestError> {
        match params.get("operation").map(String::as_str) {
            None => Ok(self.view().into_response()),
            Some("read") => {
                self.mark_visited(MarkVisited::from_query(params)?)?;
                Ok(Redirect::to("/").into_response())
            }
            Some(other) => Err(RequestError::UnknownOperation(other.to_owned())),
        }
    }

    /// The rendered dashboard for the current store contents.
    pub fn view(&self) -> Html<String> {
        let snapshot = self.store.snapshot();
        let entries = render(&snapshot.items, &snapshot.visited, &self.filters);
        Html(render_page(&entries, self.refresh_seconds, Utc::now()))
    }

    pub fn mark_visited(&self, req: MarkVisited) -> Result<(), RequestError> {
        tracing::info!("server: marking #{} visited at {}", req.id, req.at);
        self.store.set_visited(req.id, req.at)?;
        Ok(())
    }
}

async fn dashboard(
    State(service): State<Arc<DashboardService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // Store writes hit the disk; keep them off the async workers.
    match tokio::task::spawn_blocking(move || service.handle(&params)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            tracing::error!("server: request task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn router(service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .with_state(service)
}

/// Accept dashboard connections on `addr` until the process exits.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dashboard listener on {addr}"))?;
    tracing::info!("server: serving dashboard on http://{addr}");
    axum::serve(listener, router)
        .await
        .context("dashboard server failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn parses_integer_and_fractional_seconds() {
        let req = MarkVisited::from_query(&query(&[("item", "12"), ("time", "1700000000")]))
            .unwrap();
        assert_eq!(req.id, 12);
        assert_eq!(req.at.timestamp(), 1_700_000_000);

        let req = MarkVisited::from_query(&query(&[("item", "12"), ("time", "1700000000.0")]))
            .unwrap();
        assert_eq!(req.at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn zero_time_is_never_visited() {
        let req = MarkVisited::from_query(&query(&[("item", "3"), ("time", "0")])).unwrap();
        assert_eq!(req.at, crate::types::NEVER_VISITED);
    }

    #[test]
    fn rejects_malformed_parameters() {
        for pairs in [
            &[("time", "5")][..],
            &[("item", "5")][..],
            &[("item", "abc"), ("time", "5")][..],
            &[("item", "5"), ("time", "soon")][..],
            &[("item", "5"), ("time", "-1")][..],
            &[("item", "5"), ("time", "NaN")][..],
            &[("item", "-5"), ("time", "5")][..],
        ] {
            assert!(
                MarkVisited::from_query(&query(pairs)).is_err(),
                "accepted {pairs:?}"
            );
        }
    }

    #[test]
    fn bad_request_and_server_error_statuses() {
        let resp = RequestError::Missing("item").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let io = std::io::Error::other("disk full");
        let resp = RequestError::Store(StoreError::Io {
            path: "visited.json".into(),
            source: io,
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
