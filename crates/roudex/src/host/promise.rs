//! Promise style host.
//!
//! A middleware returns a future for its eventual completion. [`Next::call`] returns the future
//! of everything downstream, which the middleware chains into its own.

use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::adapter::ExtractMiddleware;
use crate::config::FrameworkKind;
use crate::context::RequestContext;
use crate::error::{ConfigError, MiddlewareError};
use crate::host::{catch_thrown, Host};

pub trait Middleware: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, Result<(), MiddlewareError>>;
}

/// The rest of the chain after the running middleware
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Box<dyn Middleware>],
}

impl<'a> Next<'a> {
    /// Returns the eventual completion of everything downstream
    pub fn call(self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        match self.rest.split_first() {
            Some((head, rest)) => head.call(ctx, Next { rest }),
            None => future::ok(()).boxed(),
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
}

#[async_trait]
impl Host for Pipeline {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Promise
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        let result = Next { rest: &self.middlewares }.call(ctx).await;
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
        Ok(self.with(middleware.into_promise()?))
    }

    pub fn build(self) -> Pipeline {
        Pipeline { middlewares: self.middlewares }
    }
}
