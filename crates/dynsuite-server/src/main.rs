// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use clap::Parser;
use dynsuite_server::{config::Config, server::Server};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dynsuite", version, about = "DynamicSuite application server")]
pub struct Cli {
    /// Address to listen on (overrides $DYNSUITE_BIND_ADDRESS)
    #[arg(long)]
    pub bind: Option<String>,

    /// Installation root (overrides $DYNSUITE_ROOT)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// URL prefix to serve under (overrides $DYNSUITE_MOUNT)
    #[arg(long)]
    pub mount: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(mount) = cli.mount {
        config.mount = mount;
    }
    info!("Loaded configuration: bind_address={}, root={}", config.bind_address, config.root.display());

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
