//! Replica entry point.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trichain_node::ReplicaNode;
use trichain_production::{Network, NodeConfig, ProductionRunner};
use trichain_types::ReplicaId;

/// A chained-HotStuff replica.
#[derive(Debug, Parser)]
#[command(name = "replica")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Override the replica id from the configuration file.
    #[arg(long)]
    id: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = NodeConfig::load(&args.config)?;
    if let Some(id) = args.id {
        config.id = id;
    }

    let id = ReplicaId(config.id);
    let consensus_config = config.consensus();
    let listen_addr = config.listen_addr()?;

    info!(replica = %id, %listen_addr, roster = config.peers.len(), "starting replica");

    let (inbound_tx, inbound_rx) = mpsc::channel(64);
    let listener = TcpListener::bind(listen_addr).await?;
    let network = Arc::new(Network::start(
        id,
        consensus_config.is_byzantine(id),
        listener,
        config.peer_addrs(),
        inbound_tx,
    ));

    let node = ReplicaNode::new(id, &config.algorithm, &consensus_config, config.batch_size);
    let runner = ProductionRunner::new(node, network, consensus_config);
    runner.run(inbound_rx).await?;
    Ok(())
}
