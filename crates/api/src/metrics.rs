// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry, a middleware
//! observing request durations, and the handler served on the debug listener.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramVec, TextEncoder, register_histogram_vec};
use tracing::error;

use crate::{context::RequestContext, handler::Handler, middleware::Middleware};

/// `path` label of requests no route matched
pub const UNMATCHED_PATH_LABEL: &str = "unmatched";

/// Histogram for HTTP request durations in seconds.
pub static HTTP_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "accounts_api_http_request_duration_seconds",
        "HTTP request durations in seconds, labeled by method, route and status",
        &["method", "path", "status"],
        vec![0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create HTTP request duration histogram")
});

/// Observe the duration of a completed request
///
/// # Arguments
/// * `method` - Request method
/// * `path` - Matched route pattern
/// * `status` - Response status code
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_request_duration(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path, status.as_str()])
        .observe(duration_secs);
}

/// Middleware recording every request into [`HTTP_REQUEST_DURATION`]
///
/// Matched requests are labelled with their route pattern. Unmatched requests
/// share [`UNMATCHED_PATH_LABEL`] so arbitrary client paths never become
/// label values.
pub fn request_metrics() -> Middleware {
    Middleware::new("request_metrics", |next| {
        Handler::new(move |request| {
            let next = next.clone();
            async move {
                let context = RequestContext::from_request(&request);
                let response = next.call(request).await;
                if let Some(context) = context {
                    context.record_status(response.status());
                    let status = context.status().unwrap_or(response.status());
                    let path = if context.is_matched() {
                        context.path()
                    } else {
                        UNMATCHED_PATH_LABEL
                    };
                    observe_request_duration(
                        context.method().as_str(),
                        path,
                        status.as_u16(),
                        context.elapsed().as_secs_f64(),
                    );
                }
                response
            }
        })
    })
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, extract::Request, http::Method};
    use tower::ServiceExt;

    use super::*;
    use crate::{context::attach, routes::Endpoint, server::Server};

    #[tokio::test]
    async fn middleware_observes_routed_requests() {
        let handler = request_metrics().apply(Handler::new(|request: Request| async move {
            crate::response::Responder::for_request(&request).empty(StatusCode::NO_CONTENT)
        }));

        let context = Arc::new(RequestContext::new(Method::GET, "/metrics-test/:id"));
        let request = Request::builder()
            .uri("/metrics-test/1")
            .body(Body::empty())
            .expect("request should build");

        let response = handler.call(attach(request, context)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let count = HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/metrics-test/:id", "204"])
            .get_sample_count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn exports_text_format() {
        observe_request_duration("GET", "/export-test", 200, 0.01);

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let text = String::from_utf8(body.to_vec()).expect("metrics should be UTF-8");
        assert!(text.contains("accounts_api_http_request_duration_seconds"));
    }

    #[tokio::test]
    async fn unmatched_paths_share_one_series() {
        let server = Server::builder()
            .with_middleware(request_metrics())
            .route(Endpoint::new(
                Method::GET,
                "/inventory/:id",
                Handler::new(|_request| async { StatusCode::OK.into_response() }),
            ))
            .build()
            .expect("server should build");

        let unmatched =
            HTTP_REQUEST_DURATION.with_label_values(&["GET", UNMATCHED_PATH_LABEL, "404"]);
        let before = unmatched.get_sample_count();

        for i in 0..200 {
            let request = Request::builder()
                .uri(format!("/scan-target/{i}"))
                .body(Body::empty())
                .expect("request should build");
            let response = server
                .clone()
                .oneshot(request)
                .await
                .expect("service is infallible");
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        assert!(unmatched.get_sample_count() >= before + 200);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .expect("metrics should encode");
        let text = String::from_utf8(buffer).expect("metrics should be UTF-8");
        assert!(!text.contains("/scan-target/"));
    }
}
