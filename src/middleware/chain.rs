//! Gate chain runner: composes the policy gates with the wrapped service.
//!
//! One tower layer owns the ordered gate list and the request log sink. Per
//! request it derives a [`RequestContext`] once, runs the gates in order, and
//! short-circuits on the first rejection: later gates never run and the
//! rate limiter records nothing for a request rejected earlier in the chain.
//! When every gate allows, the inner service is invoked and its response
//! returned unchanged.
//!
//! A gate that panics is not caught here; it unwinds into the hosting
//! framework's fault boundary like any other handler fault.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use tower::{Layer, Service};
use tracing::warn;

use crate::metrics;

use super::context::RequestContext;
use super::gate::{Gate, GateDecision, Rejection};
use super::request_log::{LogSink, access_line, rate_limit_block_line};

/// Policy gate chain layer for the tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let chain = GateChainLayer::new(
///     vec![Arc::new(time_gate), Arc::new(rate_gate)],
///     Arc::new(TracingSink),
/// );
/// let app = Router::new().route("/chats/{id}/messages", post(handler)).layer(chain);
/// ```
#[derive(Clone)]
pub struct GateChainLayer {
    gates: Arc<Vec<Arc<dyn Gate>>>,
    sink: Arc<dyn LogSink>,
}

impl GateChainLayer {
    /// Build a chain from gates (run in order) and a request log sink.
    pub fn new(gates: Vec<Arc<dyn Gate>>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            gates: Arc::new(gates),
            sink,
        }
    }
}

impl<S> Layer<S> for GateChainLayer {
    type Service = GateChainService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GateChainService {
            inner,
            gates: self.gates.clone(),
            sink: self.sink.clone(),
        }
    }
}

/// Service wrapper produced by [`GateChainLayer`].
#[derive(Clone)]
pub struct GateChainService<S> {
    inner: S,
    gates: Arc<Vec<Arc<dyn Gate>>>,
    sink: Arc<dyn LogSink>,
}

impl<S> GateChainService<S> {
    /// Run the gates for `ctx`, returning the first rejection, if any.
    fn run_gates(&self, ctx: &RequestContext) -> Option<(&'static str, Rejection)> {
        for gate in self.gates.iter() {
            match gate.decide(ctx) {
                GateDecision::Allow => {}
                GateDecision::Reject(rejection) => return Some((gate.name(), rejection)),
            }
        }
        None
    }
}

impl<S> Service<Request<Body>> for GateChainService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let ctx = RequestContext::from_request(&req);

        // Decide synchronously; only the delegated path needs the executor.
        let verdict = self.run_gates(&ctx);
        self.sink.append(&access_line(&ctx));

        let mut inner = self.inner.clone();
        let sink = self.sink.clone();

        Box::pin(async move {
            match verdict {
                Some((gate_name, rejection)) => {
                    if matches!(rejection, Rejection::RateExceeded { .. }) {
                        sink.append(&rate_limit_block_line(&ctx));
                    }
                    warn!(
                        gate = gate_name,
                        reason = rejection.reason(),
                        client = %ctx.identity,
                        path = %ctx.path,
                        "Request rejected by policy gate"
                    );
                    metrics::record_request_rejected(rejection.reason());
                    Ok(rejection.into_response())
                }
                None => {
                    metrics::record_request_allowed();
                    inner.call(req).await
                }
            }
        })
    }
}
