// Copyright 2026 profstore Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `profstore-cli` inspects a profile store kept in redis.

mod command;
mod error;

use std::time::Duration;

use clap::Parser;
use command::Command;
use profstore::{Namespace, ProfileStoreBuilder, RedisBackend};

/// Reads within this interval after a sweep do not sweep again.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Redis url of the shared store.
    #[arg(long, default_value = "redis://127.0.0.1:6379/0")]
    url: String,

    /// Key prefix of the store.
    #[arg(long, default_value = "profstore")]
    namespace: String,

    /// How long records live after they started.
    #[arg(long, default_value = "1day")]
    cache_duration: humantime::Duration,

    #[command(subcommand)]
    command: Command,
}

fn init_logger() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    tracing::debug!("[profstore cli]: {cli:?}");

    let backend = RedisBackend::connect(&cli.url).await?;
    let store = ProfileStoreBuilder::new()
        .with_name("profstore-cli")
        .with_namespace(Namespace::new(&cli.namespace))
        .with_cache_duration(cli.cache_duration.into())
        .with_sweep_interval(SWEEP_INTERVAL)
        .build(backend)?;

    let mut out = std::io::stdout().lock();
    command::run(&store, cli.command, &mut out).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli =
            Cli::try_parse_from(["profstore-cli", "--cache-duration", "2h", "list", "--since", "30m", "--asc"]).unwrap();
        assert_eq!(Duration::from(cli.cache_duration), Duration::from_secs(7200));
        assert_eq!(cli.namespace, "profstore");
        assert!(matches!(cli.command, Command::List(_)));

        assert!(Cli::try_parse_from(["profstore-cli", "viewed", "alice"]).is_err());
        assert!(Cli::try_parse_from(["profstore-cli", "show", "not-an-id"]).is_err());
        assert!(Cli::try_parse_from(["profstore-cli", "list", "--since", "soon"]).is_err());
    }
}
