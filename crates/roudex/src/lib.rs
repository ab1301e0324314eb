//! Route data extraction middleware.
//!
//! `roudex` builds middlewares that read a named route parameter, fetch the document with that
//! id from a collection of a document store, and stash it on the request's data stack before
//! handing control downstream. Missing documents and storage errors are classified and handed
//! to a failure responder instead.
//!
//! One factory, [`Roudex`], serves three host styles, each with its own middleware signature:
//! - [`host::callback`]: the middleware signals `next` when it is done
//! - [`host::coroutine`]: the middleware awaits downstream and resumes afterwards
//! - [`host::promise`]: the middleware returns a future chained onto downstream's future
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use http::{Request, StatusCode};
//! use roudex::host::{coroutine, Router};
//! use roudex::storage::{MemoryModel, MemoryStore};
//! use roudex::{FrameworkKind, Roudex, Settings};
//! use serde_json::json;
//!
//! # tokio_test();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test() {
//! let store = MemoryStore::new().with_model("Widget", MemoryModel::from_iter([("42", json!({ "name": "gear" }))]));
//! let settings = Settings::from_json(r#"{ "app": "coroutine" }"#).unwrap();
//!
//! let config = Roudex::builder().settings(settings).db(Arc::new(store)).build().unwrap();
//! let roudex = Roudex::new(config).unwrap();
//! assert_eq!(roudex.kind(), FrameworkKind::Coroutine);
//!
//! let pipeline = coroutine::Pipeline::builder().mount(roudex.middleware("Widget", "id", None)).unwrap().build();
//! let router = Router::builder().route("/widgets/{id}", pipeline).build().unwrap();
//!
//! let response = router.dispatch(Request::builder().uri("/widgets/7").body(()).unwrap()).await.unwrap();
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! assert_eq!(response.body().as_ref(), b"data not found");
//! # }
//! ```

mod binding;
mod config;
mod context;
mod error;
mod factory;

pub mod adapter;
pub mod classifier;
pub mod host;
pub mod responder;
pub mod storage;

#[cfg(test)]
mod testing;

pub use adapter::ExtractMiddleware;
pub use binding::RouteBinding;
pub use config::{Config, ConfigBuilder, FrameworkKind, Settings, DEFAULT_STACK_NAME};
pub use context::{DataStack, PathParams, RequestContext, StackLocation};
pub use error::{BoxError, ConfigError, Failure, MiddlewareError, ParamError, DATA_EXTRACTION_ERROR, DATA_NOT_FOUND};
pub use factory::Roudex;
pub use storage::Document;
