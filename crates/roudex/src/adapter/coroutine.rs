use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::adapter::{ExtractMiddleware, Extraction, FrameworkAdapter};
use crate::config::FrameworkKind;
use crate::context::{RequestContext, StackLocation};
use crate::error::MiddlewareError;
use crate::host::coroutine::{Middleware, Next};
use crate::responder::{FailureResponder, WriteResponder};

/// Adapter for [`host::coroutine`](crate::host::coroutine)
#[derive(Debug, Default, Clone, Copy)]
pub struct CoroutineAdapter;

impl FrameworkAdapter for CoroutineAdapter {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Coroutine
    }

    fn default_responder(&self) -> Arc<dyn FailureResponder> {
        Arc::new(WriteResponder)
    }

    fn stack_location(&self, stack_name: &str, state_stack: bool) -> StackLocation {
        if state_stack { StackLocation::in_state(stack_name) } else { StackLocation::top_level(stack_name) }
    }

    fn wrap(&self, extraction: Extraction) -> ExtractMiddleware {
        ExtractMiddleware::Coroutine(CoroutineExtract { extraction })
    }
}

/// Extraction middleware for the coroutine host.
///
/// Suspends once on the fetch and, on success, a second time on downstream.
#[derive(Debug)]
pub struct CoroutineExtract {
    extraction: Extraction,
}

impl CoroutineExtract {
    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }
}

#[async_trait]
impl Middleware for CoroutineExtract {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<(), MiddlewareError> {
        let id = self.extraction.param(ctx)?.to_string();

        match self.extraction.fetch(&id).await {
            Ok(document) => {
                self.extraction.stash(ctx, document);
                let downstream = next.run(ctx).await;
                trace!(
                    collection = self.extraction.binding().collection(),
                    id = %id,
                    ok = downstream.is_ok(),
                    "resumed after downstream"
                );
                downstream
            }
            Err(failure) => self.extraction.fail(failure, ctx),
        }
    }
}
