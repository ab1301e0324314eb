//! Coroutine style host.
//!
//! A middleware is a suspendable routine: it awaits [`Next::run`] to hand control downstream and
//! resumes once everything after it has completed, so it can act on the way back out.

use async_trait::async_trait;

use crate::adapter::ExtractMiddleware;
use crate::config::FrameworkKind;
use crate::context::RequestContext;
use crate::error::{ConfigError, MiddlewareError};
use crate::host::{catch_thrown, Host};

#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<(), MiddlewareError>;
}

/// The rest of the chain after the running middleware
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Box<dyn Middleware>],
}

impl Next<'_> {
    /// Runs everything downstream and resumes with its outcome
    pub async fn run(self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(ctx, Next { rest }).await,
            None => Ok(()),
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
        FrameworkKind::Coroutine
    }

    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        let result = Next { rest: &self.middlewares }.run(ctx).await;
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
        Ok(self.with(middleware.into_coroutine()?))
    }

    pub fn build(self) -> Pipeline {
        Pipeline { middlewares: self.middlewares }
    }
}
