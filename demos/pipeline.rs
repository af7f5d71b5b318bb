//! Pipeline - async stages chained through completion callbacks.
//!
//! This example demonstrates:
//! - Adapting async handlers with `wrap` and `wrap_terminal`
//! - Stopping the pipeline by returning `false`
//! - Forwarding a handler error to the next stage
//!
//! # Running
//!
//! ```text
//! RUST_LOG=co_next=debug cargo run --example pipeline
//! ```

use std::sync::Arc;
use std::time::Duration;

use co_next::{wrap, wrap_terminal, Adapted, Arg, Args, BoxError, Handler, Options};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

type Stage = Arc<dyn Fn(Vec<Arg<Value>>) + Send + Sync>;

/// Erase an adapted stage into a plain callback-style function.
fn erase<H>(stage: Adapted<H, Value>) -> Stage
where
    H: Handler<Value>,
{
    Arc::new(move |args| {
        stage.call(args);
    })
}

/// Call `stages[index]` with `(req, res, next)`, where `next` advances to
/// the following stage or reports the pipeline's outcome.
fn dispatch(stages: Arc<Vec<Stage>>, index: usize, req: Value, done: mpsc::UnboundedSender<String>) {
    let Some(stage) = stages.get(index).cloned() else {
        let _ = done.send("fell through: 404".to_string());
        return;
    };

    let next_req = req.clone();
    let next_done = done.clone();
    let next = Arg::next(move |err| {
        match err {
            Some(err) => {
                let _ = next_done.send(format!("error handler: {}", err));
            }
            None => dispatch(stages.clone(), index + 1, next_req.clone(), next_done.clone()),
        }
        Ok(())
    });

    stage(vec![Arg::value(req), Arg::value(json!({})), next]);
}

async fn lookup_user(id: &str) -> Result<Value, BoxError> {
    tokio::time::sleep(Duration::from_millis(5)).await;
    match id {
        "1" => Ok(json!({ "name": "ada", "admin": true })),
        "2" => Ok(json!({ "name": "bob", "admin": false })),
        _ => Err(format!("no user with id {}", id).into()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let log = done_tx.clone();
    let logger = wrap(
        move |args: Args<Value>| {
            let log = log.clone();
            async move {
                let path = args.value(0).and_then(|r| r["path"].as_str()).unwrap_or("?");
                let _ = log.send(format!("request {}", path));
                Ok::<_, BoxError>(())
            }
        },
        Options::default(),
    );

    let deny = done_tx.clone();
    let auth = wrap(
        move |args: Args<Value>| {
            let deny = deny.clone();
            async move {
                let id = args.value(0).and_then(|r| r["user"].as_str()).unwrap_or_default();
                let user = lookup_user(id).await?;
                if user["admin"] != json!(true) {
                    let _ = deny.send(format!("403 for {}", user["name"]));
                    return Ok(false);
                }
                Ok::<_, BoxError>(true)
            }
        },
        Options::default(),
    );

    let reply = done_tx.clone();
    let render = wrap_terminal(
        move |args: Args<Value>| {
            let reply = reply.clone();
            async move {
                let path = args.value(0).and_then(|r| r["path"].as_str()).unwrap_or("?");
                let _ = reply.send(format!("200 {}", path));
                Ok::<_, BoxError>(())
            }
        },
        Options::default(),
    );

    let stages = Arc::new(vec![erase(logger), erase(auth), erase(render)]);

    for req in [
        json!({ "path": "/admin", "user": "1" }),
        json!({ "path": "/admin", "user": "2" }),
        json!({ "path": "/admin", "user": "3" }),
    ] {
        dispatch(stages.clone(), 0, req, done_tx.clone());
        for _ in 0..2 {
            if let Some(line) = done_rx.recv().await {
                println!("{}", line);
            }
        }
    }
}
