use super::super::args::*;
use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = &cli.global;
    match cli.cmd {
        Command::Install => super::lifecycle::install(global).await,
        Command::Activate => super::lifecycle::activate(global).await,
        Command::Fetch(args) => super::fetch::run(global, args).await,
        Command::CacheSize => super::cache::size(global).await,
        Command::Clear => super::cache::clear(global).await,
        Command::Push(args) => super::notify::push(global, args).await,
        Command::Click(args) => super::notify::click(global, args).await,
        Command::Message(args) => super::message::run(global, args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
