use std::sync::Arc;

use http::Request;
use roudex::classifier::{ClassifierExt, LoggingClassifier, RedactingClassifier};
use roudex::host::{promise, Router};
use roudex::storage::{MemoryModel, MemoryStore};
use roudex::{Failure, MiddlewareError, RequestContext, Roudex};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

struct Render;

impl promise::Middleware for Render {
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: promise::Next<'a>,
    ) -> futures::future::BoxFuture<'a, Result<(), MiddlewareError>> {
        let stack = ctx.state("$$").and_then(|stack| stack.get("widget")).cloned();
        if let Some(widget) = stack {
            ctx.send(http::StatusCode::OK, widget.to_string());
        }
        next.call(ctx)
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let widgets = MemoryModel::from_iter([
        ("42", json!({ "_id": "42", "name": "gear" })),
        ("7", json!({ "_id": "7", "name": "cog" })),
    ]);
    let store = MemoryStore::new().with_model("Widget", widgets);

    let config = Roudex::builder()
        .app("promise")
        .db(Arc::new(store))
        .classifier(LoggingClassifier.and_then(RedactingClassifier))
        .on_error(|failure: Failure, ctx: &mut RequestContext| -> Result<(), MiddlewareError> {
            ctx.send(failure.status(), json!({ "error": failure.message() }).to_string());
            Ok(())
        })
        .build()
        .unwrap();
    let roudex = Roudex::new(config).unwrap();

    let pipeline = promise::Pipeline::builder()
        .mount(roudex.middleware("Widget", "id", Some("widget")))
        .unwrap()
        .with(Render)
        .build();
    let router = Router::builder().route("/widgets/{id}", pipeline).build().unwrap();

    for path in ["/widgets/42", "/widgets/99", "/gadgets/1"] {
        let response = router.dispatch(Request::builder().uri(path).body(()).unwrap()).await.unwrap();
        info!(path, status = %response.status(), body = ?response.body(), "dispatched");
    }
}
