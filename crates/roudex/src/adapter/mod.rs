//! Framework adapters.
//!
//! Every extraction middleware runs the same protocol, held by [`Extraction`]:
//!
//! ```text
//! START -> PARAM_EXTRACTED -> FETCH_OK -> STASHED -> CONTINUED
//!                          \-> FETCH_FAILED -> RESPONDED
//! ```
//!
//! A missing route parameter ends the request before any storage call with a
//! [`ParamError`]; it never reaches the responder. Storage failures are classified and handed to
//! the responder; the chain does not continue after them.
//!
//! A [`FrameworkAdapter`] wraps that protocol into one host's middleware signature. The factory
//! selects one adapter at construction and routes every binding through it.

mod callback;
mod coroutine;
mod promise;

use std::fmt;
use std::sync::Arc;

use crate::binding::RouteBinding;
use crate::classifier::Classifier;
use crate::config::FrameworkKind;
use crate::context::{RequestContext, StackLocation};
use crate::error::{ConfigError, Failure, MiddlewareError, ParamError};
use crate::responder::FailureResponder;
use crate::storage::{Document, StorageAdapter};

pub use callback::{CallbackAdapter, CallbackExtract};
pub use coroutine::{CoroutineAdapter, CoroutineExtract};
pub use promise::{PromiseAdapter, PromiseExtract};

pub trait FrameworkAdapter: Send + Sync {
    fn kind(&self) -> FrameworkKind;

    /// Responder used when the configuration does not supply one
    fn default_responder(&self) -> Arc<dyn FailureResponder>;

    /// Where this host keeps the data stack
    fn stack_location(&self, stack_name: &str, state_stack: bool) -> StackLocation;

    /// Wraps the protocol into this host's middleware
    fn wrap(&self, extraction: Extraction) -> ExtractMiddleware;
}

/// Returns the adapter for `kind`
pub fn select(kind: FrameworkKind) -> Box<dyn FrameworkAdapter> {
    match kind {
        FrameworkKind::Callback => Box::new(CallbackAdapter),
        FrameworkKind::Coroutine => Box::new(CoroutineAdapter),
        FrameworkKind::Promise => Box::new(PromiseAdapter),
    }
}

/// The extract, stash, continue-or-fail protocol of one route binding
pub struct Extraction {
    binding: RouteBinding,
    storage: Arc<dyn StorageAdapter>,
    classifier: Arc<dyn Classifier>,
    responder: Arc<dyn FailureResponder>,
    stack: StackLocation,
}

impl Extraction {
    pub(crate) fn new(
        binding: RouteBinding,
        storage: Arc<dyn StorageAdapter>,
        classifier: Arc<dyn Classifier>,
        responder: Arc<dyn FailureResponder>,
        stack: StackLocation,
    ) -> Self {
        Self { binding, storage, classifier, responder, stack }
    }

    pub fn binding(&self) -> &RouteBinding {
        &self.binding
    }

    pub fn stack(&self) -> &StackLocation {
        &self.stack
    }

    /// Reads the bound route parameter, an empty value counts as missing
    pub fn param<'c>(&self, ctx: &'c RequestContext) -> Result<&'c str, ParamError> {
        let params = ctx.path_params().ok_or(ParamError::MissingParams)?;
        params
            .get(self.binding.param())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ParamError::missing_param(self.binding.param()))
    }

    pub fn storage(&self) -> &dyn StorageAdapter {
        self.storage.as_ref()
    }

    pub async fn fetch(&self, id: &str) -> Result<Document, Failure> {
        self.storage.fetch_by_id(self.binding.collection(), id).await
    }

    pub fn stash(&self, ctx: &mut RequestContext, document: Document) {
        ctx.data_stack_mut(&self.stack).insert(self.binding.stash(), document);
    }

    /// Classifies the failure and hands it to the responder
    pub fn fail(&self, failure: Failure, ctx: &mut RequestContext) -> Result<(), MiddlewareError> {
        let failure = self.classifier.classify(failure);
        self.responder.respond(failure, ctx)
    }
}

impl fmt::Debug for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extraction").field("binding", &self.binding).field("stack", &self.stack).finish_non_exhaustive()
    }
}

/// A built extraction middleware, shaped for the host it was built for
#[derive(Debug)]
pub enum ExtractMiddleware {
    Callback(CallbackExtract),
    Coroutine(CoroutineExtract),
    Promise(PromiseExtract),
}

impl ExtractMiddleware {
    pub fn kind(&self) -> FrameworkKind {
        match self {
            ExtractMiddleware::Callback(_) => FrameworkKind::Callback,
            ExtractMiddleware::Coroutine(_) => FrameworkKind::Coroutine,
            ExtractMiddleware::Promise(_) => FrameworkKind::Promise,
        }
    }

    pub fn extraction(&self) -> &Extraction {
        match self {
            ExtractMiddleware::Callback(m) => m.extraction(),
            ExtractMiddleware::Coroutine(m) => m.extraction(),
            ExtractMiddleware::Promise(m) => m.extraction(),
        }
    }

    pub fn into_callback(self) -> Result<CallbackExtract, ConfigError> {
        match self {
            ExtractMiddleware::Callback(m) => Ok(m),
            other => Err(ConfigError::framework_mismatch(FrameworkKind::Callback, other.kind())),
        }
    }

    pub fn into_coroutine(self) -> Result<CoroutineExtract, ConfigError> {
        match self {
            ExtractMiddleware::Coroutine(m) => Ok(m),
            other => Err(ConfigError::framework_mismatch(FrameworkKind::Coroutine, other.kind())),
        }
    }

    pub fn into_promise(self) -> Result<PromiseExtract, ConfigError> {
        match self {
            ExtractMiddleware::Promise(m) => Ok(m),
            other => Err(ConfigError::framework_mismatch(FrameworkKind::Promise, other.kind())),
        }
    }
}
