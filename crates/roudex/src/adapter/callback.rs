use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::FutureExt;

use crate::adapter::{ExtractMiddleware, Extraction, FrameworkAdapter};
use crate::config::FrameworkKind;
use crate::context::{RequestContext, StackLocation};
use crate::error::MiddlewareError;
use crate::host::callback::{Middleware, Next};
use crate::responder::{FailureResponder, WriteResponder};
use crate::storage::StorageAdapterExt;

/// Adapter for [`host::callback`](crate::host::callback).
///
/// The host has no `state` container, so the data stack always sits at the top level.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallbackAdapter;

impl FrameworkAdapter for CallbackAdapter {
    fn kind(&self) -> FrameworkKind {
        FrameworkKind::Callback
    }

    fn default_responder(&self) -> Arc<dyn FailureResponder> {
        Arc::new(WriteResponder)
    }

    fn stack_location(&self, stack_name: &str, _state_stack: bool) -> StackLocation {
        StackLocation::top_level(stack_name)
    }

    fn wrap(&self, extraction: Extraction) -> ExtractMiddleware {
        ExtractMiddleware::Callback(CallbackExtract { extraction })
    }
}

/// Extraction middleware for the callback host.
///
/// Stashing and `next`, or responding, happen inside the completion callback of the fetch.
#[derive(Debug)]
pub struct CallbackExtract {
    extraction: Extraction,
}

impl CallbackExtract {
    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }
}

impl Middleware for CallbackExtract {
    fn handle<'a>(&'a self, ctx: &'a mut RequestContext, next: Next) -> BoxFuture<'a, Result<(), MiddlewareError>> {
        let id = match self.extraction.param(ctx) {
            Ok(id) => id.to_string(),
            Err(e) => return future::ready(Err(e.into())).boxed(),
        };

        let extraction = &self.extraction;
        async move {
            let collection = extraction.binding().collection();
            extraction
                .storage()
                .fetch_then(collection, &id, |fetched| match fetched {
                    Ok(document) => {
                        extraction.stash(ctx, document);
                        next.call();
                        Ok(())
                    }
                    Err(failure) => extraction.fail(failure, ctx),
                })
                .await
        }
        .boxed()
    }
}
