use swcache_core::{CacheError, Destination, Method, Request, Response, WorkerConfig};

use super::build_worker;
use crate::cli::args::{DestinationArg, FetchArgs, GlobalArgs};
use crate::exit_codes::{NOT_INTERCEPTED, SUCCESS};

impl From<DestinationArg> for Destination {
    fn from(arg: DestinationArg) -> Self {
        match arg {
            DestinationArg::Document => Self::Document,
            DestinationArg::Image => Self::Image,
            DestinationArg::Script => Self::Script,
            DestinationArg::Style => Self::Style,
            DestinationArg::Font => Self::Font,
            DestinationArg::Other => Self::Other,
        }
    }
}

pub async fn run(global: &GlobalArgs, args: FetchArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let request = build_request(worker.engine().config(), &args)?;

    let Some(response) = worker.handle_fetch(&request).await? else {
        eprintln!("not intercepted: {} {}", request.method, request.url);
        return Ok(NOT_INTERCEPTED);
    };

    print_response(&response, args.head);
    Ok(SUCCESS)
}

fn build_request(config: &WorkerConfig, args: &FetchArgs) -> anyhow::Result<Request> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes()).map_err(|e| {
        CacheError::InvalidRequest {
            message: format!("invalid method {:?}: {}", args.method, e),
        }
    })?;
    let url = config.resolve(&args.url)?;

    let mut request = Request::new(method, url).with_destination(args.destination.into());
    for raw in &args.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| CacheError::InvalidRequest {
                message: format!("header must be `name: value`, got {:?}", raw),
            })?;
        request = request.with_header(name.trim(), value.trim());
    }
    Ok(request)
}

fn print_response(response: &Response, head: bool) {
    println!("HTTP {}", response.status);
    for (name, value) in &response.headers {
        println!("{}: {}", name, value);
    }
    if !head {
        println!();
        println!("{}", response.text());
    }
}
