use serde_json::Value;
use swcache_core::{CacheError, Event};
use tokio::sync::oneshot;

use super::build_worker;
use crate::cli::args::{GlobalArgs, MessageArgs};
use crate::exit_codes::SUCCESS;

pub async fn run(global: &GlobalArgs, args: MessageArgs) -> anyhow::Result<i32> {
    let data: Value = serde_json::from_str(&args.data).map_err(|e| CacheError::InvalidRequest {
        message: format!("message is not JSON: {}", e),
    })?;

    let worker = build_worker(global)?;
    let (port, reply) = oneshot::channel();
    worker
        .dispatch(Event::Message {
            data,
            port: Some(port),
        })
        .await?;

    // Only GET_CACHE_SIZE answers on the port.
    if let Ok(reply) = reply.await {
        println!("{}", serde_json::to_string(&reply)?);
    }
    Ok(SUCCESS)
}
