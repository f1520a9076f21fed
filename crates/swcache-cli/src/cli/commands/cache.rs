use swcache_core::CacheSizeReply;

use super::build_worker;
use crate::cli::args::GlobalArgs;
use crate::exit_codes::SUCCESS;

pub async fn size(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let reply = CacheSizeReply {
        cache_size: worker.cache_size().await?,
    };
    println!("{}", serde_json::to_string(&reply)?);
    Ok(SUCCESS)
}

pub async fn clear(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let deleted = worker.partitions().clear_all().await?;
    for name in &deleted {
        println!("deleted {}", name);
    }
    tracing::info!(count = deleted.len(), "cleared partitions");
    Ok(SUCCESS)
}
