//! Listen command implementation.
//!
//! A small webhook receiver for trying out the extraction service: every
//! POST to `/` is printed and acknowledged with `{"received": true}`.

use crate::cli::ListenArgs;
use crate::error::Result;
use crate::output::Formatter;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use ruleforge_jobs::{EVENT_HEADER, JOB_ID_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Execute the listen command.
pub async fn execute_listen(args: ListenArgs, formatter: &Formatter) -> Result<()> {
    let address = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&address).await?;

    println!("{}", formatter.info(&format!("Listening for webhooks on http://{}/", address)));
    info!(%address, "Webhook receiver started");

    axum::serve(listener, receiver_router(formatter.clone()))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!("{}", formatter.info("Receiver stopped"));
    Ok(())
}

/// Router that prints each delivered event
pub fn receiver_router(formatter: Formatter) -> Router {
    Router::new()
        .route("/", post(receive_event))
        .with_state(Arc::new(formatter))
}

async fn receive_event(
    State(formatter): State<Arc<Formatter>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let event = headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok());
    let job_id = headers.get(JOB_ID_HEADER).and_then(|v| v.to_str().ok());

    match formatter.format_event(event, job_id, &payload) {
        Ok(text) => println!("{}\n", text),
        Err(e) => eprintln!("{}", formatter.error(&format!("Could not render event: {}", e))),
    }

    Json(json!({ "received": true }))
}
