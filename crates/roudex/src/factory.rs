use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapter::{self, ExtractMiddleware, Extraction, FrameworkAdapter};
use crate::binding::RouteBinding;
use crate::config::{Config, ConfigBuilder, FrameworkKind};
use crate::context::StackLocation;
use crate::error::ConfigError;
use crate::responder::FailureResponder;
use crate::storage::{self, StorageAdapter};

/// The middleware factory.
///
/// Construction validates the configuration and selects one storage adapter and one framework
/// adapter; every middleware built afterwards goes through the same pair.
///
/// ```
/// use std::sync::Arc;
/// use roudex::{FrameworkKind, Roudex};
/// use roudex::storage::{MemoryModel, MemoryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new().with_model("Widget", MemoryModel::from_iter([("42", json!({ "name": "gear" }))]));
/// let config = Roudex::builder().app(FrameworkKind::Coroutine).db(Arc::new(store)).build().unwrap();
/// let roudex = Roudex::new(config).unwrap();
///
/// let middleware = roudex.middleware("Widget", "id", None);
/// assert_eq!(middleware.kind(), FrameworkKind::Coroutine);
/// ```
pub struct Roudex {
    config: Config,
    storage: Arc<dyn StorageAdapter>,
    adapter: Box<dyn FrameworkAdapter>,
    responder: Arc<dyn FailureResponder>,
    stack: StackLocation,
}

impl Roudex {
    /// Starts a configuration, finish it with [`ConfigBuilder::build`] and [`Roudex::new`]
    pub fn builder() -> ConfigBuilder {
        Config::builder()
    }

    /// Selects the adapters for `config`, failing on an unsupported storage engine
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let storage = storage::select(Arc::clone(&config.db))?;
        let adapter = adapter::select(config.framework);
        let responder = config.on_error.clone().unwrap_or_else(|| adapter.default_responder());
        let stack = adapter.stack_location(&config.stack_name, config.state_stack);

        info!(framework = %config.framework, engine = config.db.engine(), stack = stack.name(), "extraction factory ready");
        Ok(Self { config, storage, adapter, responder, stack })
    }

    pub fn kind(&self) -> FrameworkKind {
        self.adapter.kind()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the built middlewares stash documents
    pub fn stack(&self) -> &StackLocation {
        &self.stack
    }

    /// Builds a middleware extracting from `collection` by the route parameter `param`, stashing
    /// the document under `stash` or the collection name
    pub fn middleware(&self, collection: &str, param: &str, stash: Option<&str>) -> ExtractMiddleware {
        self.bind(RouteBinding::new(collection, param, stash))
    }

    pub fn bind(&self, binding: RouteBinding) -> ExtractMiddleware {
        debug!(
            collection = binding.collection(),
            param = binding.param(),
            stash = binding.stash(),
            "building extraction middleware"
        );
        let extraction = Extraction::new(
            binding,
            Arc::clone(&self.storage),
            Arc::clone(&self.config.classifier),
            Arc::clone(&self.responder),
            self.stack.clone(),
        );
        self.adapter.wrap(extraction)
    }
}

impl TryFrom<Config> for Roudex {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

impl fmt::Debug for Roudex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Roudex").field("config", &self.config).field("stack", &self.stack).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Roudex;
    use crate::adapter::ExtractMiddleware;
    use crate::classifier::RedactingClassifier;
    use crate::config::FrameworkKind;
    use crate::context::{DataStack, PathParams, RequestContext, StackLocation};
    use crate::error::{BoxError, ConfigError, Failure, MiddlewareError, ParamError};
    use crate::host::{callback, coroutine, promise, Host, Router};
    use crate::storage::{Document, DocumentStore, MemoryModel, MemoryStore, Model};
    use async_trait::async_trait;
    use futures::future::{self, BoxFuture};
    use futures::FutureExt;
    use http::{Request, StatusCode};
    use mockall::mock;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const KINDS: [FrameworkKind; 3] = [FrameworkKind::Callback, FrameworkKind::Coroutine, FrameworkKind::Promise];

    mock! {
        pub Collection {}

        #[async_trait]
        impl Model for Collection {
            async fn find_by_id(&self, id: &str) -> Result<Option<Document>, BoxError>;
        }
    }

    /// Serves one mocked model under every collection name
    struct MockStore(Arc<MockCollection>);

    impl DocumentStore for MockStore {
        fn engine(&self) -> &str {
            "document"
        }

        fn model(&self, _name: &str) -> Option<Arc<dyn Model>> {
            let model: Arc<dyn Model> = Arc::clone(&self.0) as Arc<dyn Model>;
            Some(model)
        }
    }

    struct LedgerStore;

    impl DocumentStore for LedgerStore {
        fn engine(&self) -> &str {
            "ledger"
        }

        fn model(&self, _name: &str) -> Option<Arc<dyn Model>> {
            None
        }
    }

    /// Last middleware of every test pipeline, records what downstream observes
    #[derive(Clone)]
    struct Recorder {
        calls: Arc<AtomicUsize>,
        seen: Arc<Mutex<Option<DataStack>>>,
        stack: StackLocation,
        reject: bool,
    }

    impl Recorder {
        fn new(stack: &StackLocation) -> Self {
            Self { calls: Arc::default(), seen: Arc::default(), stack: stack.clone(), reject: false }
        }

        fn rejecting(stack: &StackLocation) -> Self {
            Self { reject: true, ..Self::new(stack) }
        }

        fn observe(&self, ctx: &RequestContext) -> Result<(), MiddlewareError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = ctx.data_stack(&self.stack).cloned();
            if self.reject { Err(MiddlewareError::other("downstream failed")) } else { Ok(()) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn seen(&self) -> Option<DataStack> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl callback::Middleware for Recorder {
        fn handle<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            next: callback::Next,
        ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
            let result = self.observe(ctx);
            next.call();
            future::ready(result).boxed()
        }
    }

    #[async_trait]
    impl coroutine::Middleware for Recorder {
        async fn handle(&self, ctx: &mut RequestContext, next: coroutine::Next<'_>) -> Result<(), MiddlewareError> {
            self.observe(ctx)?;
            next.run(ctx).await
        }
    }

    impl promise::Middleware for Recorder {
        fn call<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            next: promise::Next<'a>,
        ) -> BoxFuture<'a, Result<(), MiddlewareError>> {
            match self.observe(ctx) {
                Ok(()) => next.call(ctx),
                Err(e) => future::ready(Err(e)).boxed(),
            }
        }
    }

    fn pipeline(kind: FrameworkKind, middlewares: Vec<ExtractMiddleware>, recorder: &Recorder) -> Box<dyn Host> {
        match kind {
            FrameworkKind::Callback => {
                let builder = middlewares.into_iter().fold(callback::Pipeline::builder(), |b, m| b.mount(m).unwrap());
                Box::new(builder.with(recorder.clone()).build())
            }
            FrameworkKind::Coroutine => {
                let builder = middlewares.into_iter().fold(coroutine::Pipeline::builder(), |b, m| b.mount(m).unwrap());
                Box::new(builder.with(recorder.clone()).build())
            }
            FrameworkKind::Promise => {
                let builder = middlewares.into_iter().fold(promise::Pipeline::builder(), |b, m| b.mount(m).unwrap());
                Box::new(builder.with(recorder.clone()).build())
            }
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_model(
                "Widget",
                MemoryModel::from_iter([
                    ("42", json!({ "_id": "42", "name": "gear" })),
                    ("7", json!({ "_id": "7", "name": "cog" })),
                ]),
            )
            .with_model("Gadget", MemoryModel::from_iter([("42", json!({ "_id": "42", "name": "lever" }))]))
    }

    fn factory(kind: FrameworkKind) -> Roudex {
        Roudex::new(Roudex::builder().app(kind).db(Arc::new(store())).build().unwrap()).unwrap()
    }

    /// A factory whose responder records every failure it receives
    fn recording_factory(kind: FrameworkKind) -> (Roudex, Arc<Mutex<Vec<Failure>>>) {
        let failures = Arc::new(Mutex::new(vec![]));
        let log = Arc::clone(&failures);
        let responder = move |failure: Failure, ctx: &mut RequestContext| -> Result<(), MiddlewareError> {
            ctx.send_failure(&failure);
            log.lock().unwrap().push(failure);
            Ok(())
        };
        let config = Roudex::builder().app(kind).db(Arc::new(store())).on_error(responder).build().unwrap();
        (Roudex::new(config).unwrap(), failures)
    }

    fn request(params: &[(&str, &str)]) -> RequestContext {
        RequestContext::new(Request::builder().body(()).unwrap()).with_params(params.iter().copied().collect())
    }

    #[tokio::test]
    async fn test_existing_document_is_stashed_before_continuing() {
        for kind in KINDS {
            let (roudex, failures) = recording_factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("id", "42")]);
            host.handle(&mut ctx).await.unwrap();

            let expected = json!({ "_id": "42", "name": "gear" });
            assert_eq!(recorder.calls(), 1, "{kind}");
            assert_eq!(recorder.seen().unwrap().get("Widget"), Some(&expected), "{kind}");
            assert_eq!(ctx.data_stack(roudex.stack()).unwrap().get("Widget"), Some(&expected), "{kind}");
            assert!(failures.lock().unwrap().is_empty(), "{kind}");
            assert_eq!(ctx.status(), StatusCode::OK, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_missing_document_responds_404_once() {
        for kind in KINDS {
            let (roudex, failures) = recording_factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("id", "99")]);
            host.handle(&mut ctx).await.unwrap();

            assert_eq!(*failures.lock().unwrap(), vec![Failure::new("data not found", 404)], "{kind}");
            assert_eq!(recorder.calls(), 0, "{kind}");
            assert!(ctx.data_stack(roudex.stack()).is_none(), "{kind}");
        }
    }

    #[tokio::test]
    async fn test_default_responders_render_failure() {
        for kind in KINDS {
            let roudex = factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("id", "99")]);
            host.handle(&mut ctx).await.unwrap();

            let response = ctx.into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{kind}");
            assert_eq!(response.body().as_ref(), b"data not found", "{kind}");
            assert_eq!(recorder.calls(), 0, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_unregistered_collection_responds_500() {
        for kind in KINDS {
            let (roudex, failures) = recording_factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Sprocket", "id", None)], &recorder);

            let mut ctx = request(&[("id", "42")]);
            host.handle(&mut ctx).await.unwrap();

            assert_eq!(*failures.lock().unwrap(), vec![Failure::missing_collection()], "{kind}");
            assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR, "{kind}");
            assert_eq!(recorder.calls(), 0, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_missing_param_fails_before_storage() {
        for kind in KINDS {
            let mut collection = MockCollection::new();
            collection.expect_find_by_id().never();
            let failures = Arc::new(Mutex::new(vec![]));
            let log = Arc::clone(&failures);
            let config = Roudex::builder()
                .app(kind)
                .db(Arc::new(MockStore(Arc::new(collection))))
                .on_error(move |failure: Failure, _ctx: &mut RequestContext| -> Result<(), MiddlewareError> {
                    log.lock().unwrap().push(failure);
                    Ok(())
                })
                .build()
                .unwrap();
            let roudex = Roudex::new(config).unwrap();
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("key", "42")]);
            let err = host.handle(&mut ctx).await.unwrap_err();
            assert!(
                matches!(&err, MiddlewareError::Param { source } if *source == ParamError::missing_param("id")),
                "{kind}"
            );

            let mut ctx = RequestContext::new(Request::builder().body(()).unwrap());
            let err = host.handle(&mut ctx).await.unwrap_err();
            assert!(matches!(&err, MiddlewareError::Param { source } if *source == ParamError::MissingParams), "{kind}");

            assert!(failures.lock().unwrap().is_empty(), "{kind}");
            assert_eq!(recorder.calls(), 0, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_storage_error_goes_through_classifier() {
        for kind in KINDS {
            let mut collection = MockCollection::new();
            collection.expect_find_by_id().times(1).returning(|_| Err("connection reset by peer".into()));
            let config = Roudex::builder()
                .app(kind)
                .db(Arc::new(MockStore(Arc::new(collection))))
                .classifier(RedactingClassifier)
                .build()
                .unwrap();
            let roudex = Roudex::new(config).unwrap();
            let recorder = Recorder::new(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("id", "42")]);
            host.handle(&mut ctx).await.unwrap();

            assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR, "{kind}");
            assert_eq!(ctx.response().body().as_ref(), b"data extraction error", "{kind}");
            assert_eq!(recorder.calls(), 0, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_two_instances_behave_identically() {
        for kind in KINDS {
            let roudex = factory(kind);
            let first = pipeline(kind, vec![roudex.middleware("Widget", "id", Some("w"))], &Recorder::new(roudex.stack()));
            let second = pipeline(kind, vec![roudex.middleware("Widget", "id", Some("w"))], &Recorder::new(roudex.stack()));

            for id in ["42", "7", "99"] {
                let mut ctx_1 = request(&[("id", id)]);
                let mut ctx_2 = request(&[("id", id)]);
                first.handle(&mut ctx_1).await.unwrap();
                second.handle(&mut ctx_2).await.unwrap();

                assert_eq!(ctx_1.data_stack(roudex.stack()), ctx_2.data_stack(roudex.stack()), "{kind} {id}");
                assert_eq!(ctx_1.status(), ctx_2.status(), "{kind} {id}");
                assert_eq!(ctx_1.response().body(), ctx_2.response().body(), "{kind} {id}");
            }
        }
    }

    #[tokio::test]
    async fn test_stash_isolation() {
        for kind in KINDS {
            let roudex = factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let middlewares =
                vec![roudex.middleware("Widget", "id", Some("widget")), roudex.middleware("Gadget", "gid", Some("gadget"))];
            let host = pipeline(kind, middlewares, &recorder);

            let mut ctx = request(&[("id", "7"), ("gid", "42")]);
            host.handle(&mut ctx).await.unwrap();

            let seen = recorder.seen().unwrap();
            assert_eq!(seen.len(), 2, "{kind}");
            assert_eq!(seen.get("widget").unwrap()["name"], "cog", "{kind}");
            assert_eq!(seen.get("gadget").unwrap()["name"], "lever", "{kind}");
        }
    }

    #[tokio::test]
    async fn test_same_stash_name_last_write_wins() {
        for kind in KINDS {
            let roudex = factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let middlewares =
                vec![roudex.middleware("Widget", "id", Some("item")), roudex.middleware("Gadget", "id", Some("item"))];
            let host = pipeline(kind, middlewares, &recorder);

            let mut ctx = request(&[("id", "42")]);
            host.handle(&mut ctx).await.unwrap();

            let seen = recorder.seen().unwrap();
            assert_eq!(seen.len(), 1, "{kind}");
            assert_eq!(seen.get("item").unwrap()["name"], "lever", "{kind}");
        }
    }

    #[tokio::test]
    async fn test_stack_placement() {
        for kind in KINDS {
            let config = Roudex::builder()
                .app(kind)
                .db(Arc::new(store()))
                .stack_name("data")
                .state_stack(false)
                .build()
                .unwrap();
            let roudex = Roudex::new(config).unwrap();
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &Recorder::new(roudex.stack()));

            let mut ctx = request(&[("id", "42")]);
            host.handle(&mut ctx).await.unwrap();

            assert!(ctx.slot("data").unwrap().contains("Widget"), "{kind}");
            assert!(ctx.state("data").is_none(), "{kind}");
        }

        // the callback host has no state container, the flag does not apply to it
        let roudex = factory(FrameworkKind::Callback);
        assert_eq!(roudex.stack(), &StackLocation::top_level("$$"));
        assert_eq!(factory(FrameworkKind::Promise).stack(), &StackLocation::in_state("$$"));
    }

    #[tokio::test]
    async fn test_downstream_rejection_is_propagated() {
        for kind in KINDS {
            let roudex = factory(kind);
            let recorder = Recorder::rejecting(roudex.stack());
            let host = pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder);

            let mut ctx = request(&[("id", "42")]);
            let err = host.handle(&mut ctx).await.unwrap_err();

            assert!(matches!(err, MiddlewareError::Other { .. }), "{kind}");
            assert_eq!(recorder.calls(), 1, "{kind}");
        }
    }

    #[test]
    fn test_unsupported_configuration() {
        let config = Roudex::builder().app("callback").db(Arc::new(LedgerStore)).build().unwrap();
        let err = Roudex::new(config).err().unwrap();
        assert!(matches!(err, ConfigError::UnsupportedStorage(name) if name == "ledger"));

        let err = Roudex::builder().app("servlet").db(Arc::new(store())).build().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFramework(name) if name == "servlet"));
    }

    #[test]
    fn test_mount_on_wrong_host() {
        let roudex = factory(FrameworkKind::Callback);
        let err = promise::Pipeline::builder().mount(roudex.middleware("Widget", "id", None)).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::FrameworkMismatch { expected: FrameworkKind::Promise, actual: FrameworkKind::Callback }
        ));
    }

    #[tokio::test]
    async fn test_widget_scenario_through_router() {
        for kind in KINDS {
            let roudex = factory(kind);
            let recorder = Recorder::new(roudex.stack());
            let router = Router::builder()
                .route("/widgets/{id}", pipeline(kind, vec![roudex.middleware("Widget", "id", None)], &recorder))
                .build()
                .unwrap();

            let response = router.dispatch(Request::builder().uri("/widgets/42").body(()).unwrap()).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{kind}");
            assert_eq!(recorder.seen().unwrap().get("Widget").unwrap()["_id"], "42", "{kind}");

            let response = router.dispatch(Request::builder().uri("/widgets/99").body(()).unwrap()).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{kind}");
            assert_eq!(response.body().as_ref(), b"data not found", "{kind}");
            assert_eq!(recorder.calls(), 1, "{kind}");
        }
    }

    #[test]
    fn test_params_collect() {
        let params: PathParams = [("id", "42")].into_iter().collect();
        assert_eq!(params.get("id"), Some("42"));
    }
}
