use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Level;

/// Request spans named `METHOD /matched/route`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer;

impl<Body> MakeSpan<Body> for Tracer {
    fn make_span(&mut self, request: &Request<Body>) -> tracing::Span {
        let route = http_route(request);
        let span_name = format!("{} {}", request.method(), route);

        tracing::span!(
            Level::INFO,
            "server.request",
            otel.name = span_name,
            kind = "server",
            url.path = %request.uri().path(),
            url.query = request.uri().query(),
            http.route = route,
            http.request.method = %request.method(),
            http.request.header.origin = header(request.headers(), "origin"),
            http.request.header.forwarded_for = header(request.headers(), "x-forwarded-for"),
            user_agent.original = header(request.headers(), "user-agent"),

            http.response.status_code = tracing::field::Empty,
            http.response.header.content_type = tracing::field::Empty,
        )
    }
}

impl<Body> OnResponse<Body> for Tracer {
    fn on_response(
        self,
        response: &Response<Body>,
        latency: std::time::Duration,
        span: &tracing::Span,
    ) {
        let status_code = response.status().as_u16();
        if response.status().is_server_error() {
            tracing::event!(
                Level::WARN,
                status = status_code,
                latency = format_args!("{} ms", latency.as_millis()),
                "request failed"
            );
        } else {
            tracing::event!(
                Level::INFO,
                status = status_code,
                latency = format_args!("{} ms", latency.as_millis()),
                "finished processing request"
            );
        }

        span.record("http.response.status_code", status_code);
        span.record(
            "http.response.header.content_type",
            header(response.headers(), "content-type"),
        );
    }
}

fn header<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

#[inline]
fn http_route<B>(req: &Request<B>) -> &str {
    req.extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "", |mp| mp.as_str())
}
