//! Callback style host.
//!
//! A middleware receives the context and a [`Next`] signal. Calling [`Next::call`] only marks
//! that the chain may go on; the host runs the following middleware after the current one has
//! completed. Dropping `next` without calling it ends the chain.

use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::trace;

use crate::adapter::ExtractMiddleware;
use crate::config::FrameworkKind;
use crate::context::RequestContext;
use crate::error::{ConfigError, MiddlewareError};
use crate::host::{catch_thrown, Host};

pub trait Middleware: Send + Sync {
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext, next: Next) -> BoxFuture<'a, Result<(), MiddlewareError>>;
}

/// Synchronous middleware written as a closure
impl<F> Middleware for F
where
    F: Fn(&mut RequestContext, Next) -> Result<(), MiddlewareError> + Send + Sync,
{
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext, next: Next) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        future::ready((self)(ctx, next)).boxed()
    }
}

/// Continuation signal handed to a callback middleware
#[derive(Debug)]
pub struct Next {
    signal: oneshot::Sender<()>,
}

impl Next {
    /// Lets the host continue with the next middleware
    pub fn call(self) {
        if self.signal.send(()).is_err() {
            trace!("pipeline finished before next was called");
        }
    }
}

pub struct Pipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        for (index, middleware) in self.middlewares.iter().enumerate() {
            let (signal, mut continued) = oneshot::channel();
            middleware.handle(ctx, Next { signal }).await?;
            if continued.try_recv().is_err() {
                trace!(index, "pipeline stopped");
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Host for Pipeline {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Callback
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        let result = self.run(ctx).await;
        catch_thrown(ctx, result)
    }
}

pub struct PipelineBuilder {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self { middlewares: vec![] }
    }

    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    /// Appends an extraction middleware, which must have been built for this host's kind
    pub fn mount(self, middleware: ExtractMiddleware) -> Result<Self, ConfigError> {
        Ok(self.with(middleware.into_callback()?))
    }

    pub fn build(self) -> Pipeline {
        Pipeline { middlewares: self.middlewares }
    }
}
