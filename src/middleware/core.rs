use std::time::Duration;

use crate::pipeline::{HandlerRequest, HandlerResponse};

/// A pluggable filter in the request pipeline.
///
/// `before` runs ahead of the downstream handler and may short-circuit the
/// exchange by returning a terminal response (the CORS preflight answer, for
/// example). `after` runs once a response exists - whether it came from the
/// downstream handler or from an early `before` - and may mutate it in place.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
