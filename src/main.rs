use kmer_dht::group::node::start_participant;
use kmer_dht::group::types::{GroupConfig, ParticipantId};
use kmer_dht::kmer::KmerPair;
use std::net::SocketAddr;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 5 {
        eprintln!(
            "Usage: {} --id <n> --capacity <slots> --peer <addr:port>... [--bind <addr:port>] [--stop-at-empty]",
            args[0]
        );
        eprintln!(
            "Example: {} --id 0 --capacity 1024 --peer 127.0.0.1:7000 --peer 127.0.0.1:7001",
            args[0]
        );
        std::process::exit(1);
    }

    let mut participant: Option<usize> = None;
    let mut capacity: Option<usize> = None;
    let mut peers: Vec<SocketAddr> = vec![];
    let mut bind_addr: Option<SocketAddr> = None;
    let mut stop_at_empty = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => {
                participant = Some(flag_value(&args, i)?.parse()?);
                i += 2;
            }
            "--capacity" => {
                capacity = Some(flag_value(&args, i)?.parse()?);
                i += 2;
            }
            "--peer" => {
                peers.push(flag_value(&args, i)?.parse()?);
                i += 2;
            }
            "--bind" => {
                bind_addr = Some(flag_value(&args, i)?.parse()?);
                i += 2;
            }
            "--stop-at-empty" => {
                stop_at_empty = true;
                i += 1;
            }
            other => {
                tracing::warn!("Ignoring unknown argument {}", other);
                i += 1;
            }
        }
    }

    let participant = participant.ok_or_else(|| anyhow::anyhow!("--id is required"))?;
    let capacity = capacity.ok_or_else(|| anyhow::anyhow!("--capacity is required"))?;

    let mut config = GroupConfig::new(ParticipantId(participant), capacity, peers);
    config.options.stop_at_empty = stop_at_empty;
    config.validate()?;

    let bind_addr = bind_addr.unwrap_or(config.peers[participant]);
    tracing::info!(
        "Starting participant {} of {} on {} (capacity {})",
        participant,
        config.participants(),
        bind_addr,
        capacity
    );

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let table = start_participant::<KmerPair>(listener, config).await?;

    let layout = *table.layout();
    let owned = layout.segment_range(table.participant());
    tracing::info!(
        "Table ready: slots {}..{} of {} are local",
        owned.start,
        owned.end,
        layout.capacity()
    );

    let stats_table = table.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;
            let stats = stats_table.local_stats();
            tracing::info!(
                "Segment stats: {} ready, {} reserved, {} empty of {} slots",
                stats.ready,
                stats.reserved,
                stats.empty,
                stats.slots
            );
        }
    });

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down participant {}", participant);

    Ok(())
}

fn flag_value(args: &[String], i: usize) -> anyhow::Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} expects a value", args[i]))
}
