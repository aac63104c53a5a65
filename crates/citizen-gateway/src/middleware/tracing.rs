//! Request span, request id and HTTP metrics.

use crate::domain::{RequestId, REQUEST_ID_HEADER};
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use ledger_telemetry::metrics::HTTP_REQUESTS_TOTAL;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{info, info_span, Instrument, Span};

/// Routes reported as metric labels; anything else is `other`.
const KNOWN_ROUTES: &[&str] = &[
    "/api/getCitizen",
    "/api/createCitizen",
    "/api/updateCitizen",
    "/api/deleteCitizen",
    "/api/verifyProof",
    "/health",
    "/metrics",
];

fn route_label(path: &str) -> &'static str {
    KNOWN_ROUTES
        .iter()
        .find(|route| **route == path)
        .copied()
        .unwrap_or("other")
}

/// Tracing layer that creates a span for each request
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();
        let route = route_label(req.uri().path());

        let span = info_span!(
            "api_request",
            request_id = %request_id,
            http.method = %req.method(),
            http.target = %req.uri().path(),
            http.status_code = tracing::field::Empty,
            otel.kind = "server",
            otel.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let mut response = inner.call(req).await?;
                let status = response.status();

                let current = Span::current();
                current.record("http.status_code", status.as_u16());
                current.record(
                    "otel.status_code",
                    if status.is_server_error() { "ERROR" } else { "OK" },
                );
                HTTP_REQUESTS_TOTAL
                    .with_label_values(&[route, status.as_str()])
                    .inc();
                info!(status = status.as_u16(), "Request finished");

                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/api/getCitizen"), "/api/getCitizen");
        assert_eq!(route_label("/health"), "/health");
        assert_eq!(route_label("/api/getCitizen/extra"), "other");
        assert_eq!(route_label("/wp-admin"), "other");
    }
}
