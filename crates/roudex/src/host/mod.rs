//! Minimal hosts, one per control-flow model.
//!
//! Each host is an ordered middleware chain with its own middleware signature and its own way of
//! continuing to the next stage:
//! - [`callback`]: `next` is a signal, the chain proceeds once the middleware completes
//! - [`coroutine`]: the middleware awaits `next.run(ctx)` and resumes after downstream
//! - [`promise`]: the middleware returns a future, `next.call(ctx)` returns downstream's future
//!
//! All of them render failures thrown by a responder as a response, and return any other error.

pub mod callback;
pub mod coroutine;
pub mod promise;
mod router;

use async_trait::async_trait;

use crate::config::FrameworkKind;
use crate::context::RequestContext;
use crate::error::MiddlewareError;

pub use router::{RouteMatch, Router, RouterBuilder};

/// A pipeline a request can be handed to
#[async_trait]
pub trait Host: Send + Sync {
    fn kind(&self) -> FrameworkKind;

    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError>;
}

#[async_trait]
impl<H: Host + ?Sized> Host for Box<H> {
    fn kind(&self) -> FrameworkKind {
        (**self).kind()
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        (**self).handle(ctx).await
    }
}

/// Renders a thrown failure onto the response, passes every other outcome through
fn catch_thrown(ctx: &mut RequestContext, result: Result<(), MiddlewareError>) -> Result<(), MiddlewareError> {
    match result {
        Err(MiddlewareError::Thrown { source }) => {
            ctx.send_failure(&source);
            Ok(())
        }
        other => other,
    }
}
