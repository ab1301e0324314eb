use std::sync::Arc;

use futures::future::{self, BoxFuture, Either};
use futures::{FutureExt, TryFutureExt};
use tracing::debug;

use crate::adapter::{ExtractMiddleware, Extraction, FrameworkAdapter};
use crate::config::FrameworkKind;
use crate::context::{RequestContext, StackLocation};
use crate::error::MiddlewareError;
use crate::host::promise::{Middleware, Next};
use crate::responder::{FailureResponder, ThrowResponder};

/// Adapter for [`host::promise`](crate::host::promise).
///
/// Failures are thrown by default and rendered by the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromiseAdapter;

impl FrameworkAdapter for PromiseAdapter {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Promise
    }

    fn default_responder(&self) -> Arc<dyn FailureResponder> {
        Arc::new(ThrowResponder)
    }

    fn stack_location(&self, stack_name: &str, state_stack: bool) -> StackLocation {
        if state_stack { StackLocation::in_state(stack_name) } else { StackLocation::top_level(stack_name) }
    }

    fn wrap(&self, extraction: Extraction) -> ExtractMiddleware {
        ExtractMiddleware::Promise(PromiseExtract { extraction })
    }
}

/// Extraction middleware for the promise host.
///
/// Downstream's future is returned from the success branch of the fetch. A rejection of
/// downstream's future is logged and propagated to the host.
#[derive(Debug)]
pub struct PromiseExtract {
    extraction: Extraction,
}

impl PromiseExtract {
    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }
}

impl Middleware for PromiseExtract {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        let id = match self.extraction.param(ctx) {
            Ok(id) => id.to_string(),
            Err(e) => return future::ready(Err(e.into())).boxed(),
        };

        let extraction = &self.extraction;
        async move { extraction.fetch(&id).await }
            .then(move |fetched| match fetched {
                Ok(document) => {
                    extraction.stash(ctx, document);
                    let downstream = next.call(ctx).inspect_err(move |e| {
                        debug!(collection = extraction.binding().collection(), cause = %e, "downstream rejected");
                    });
                    Either::Left(downstream)
                }
                Err(failure) => Either::Right(future::ready(extraction.fail(failure, ctx))),
            })
            .boxed()
    }
}
