use bytes::Bytes;
use serde_json::json;
use swcache_core::{Event, EventOutcome, Notification};

use super::build_worker;
use crate::cli::args::{ClickArgs, GlobalArgs, PushArgs};
use crate::exit_codes::SUCCESS;

pub async fn push(global: &GlobalArgs, args: PushArgs) -> anyhow::Result<i32> {
    let payload = match (&args.payload, &args.file) {
        (Some(inline), _) => Some(Bytes::from(inline.clone())),
        (None, Some(path)) => Some(Bytes::from(std::fs::read(path).map_err(|e| {
            anyhow::anyhow!("failed to read payload {}: {}", path.display(), e)
        })?)),
        (None, None) => None,
    };

    let worker = build_worker(global)?;
    match worker.dispatch(Event::Push(payload)).await? {
        EventOutcome::NotificationShown(notification) => {
            println!("{}", serde_json::to_string_pretty(&notification)?);
        }
        _ => eprintln!("no notification shown"),
    }
    Ok(SUCCESS)
}

pub async fn click(global: &GlobalArgs, args: ClickArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let icon = worker.engine().config().notification_icon.clone();
    let notification = Notification {
        title: args.title,
        body: args.body,
        badge: icon.clone(),
        icon,
        data: args.url.map(|url| json!({ "url": url })),
        require_interaction: false,
        silent: false,
    };

    if let EventOutcome::WindowOpened(url) =
        worker.dispatch(Event::NotificationClick(notification)).await?
    {
        println!("{}", url);
    }
    Ok(SUCCESS)
}
