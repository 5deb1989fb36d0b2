//! Peer Sync Demo
//!
//! Three simulated clients join a rated match and exchange ratings over one
//! shared in-memory channel. Each keeps its own save directory; afterwards
//! every ledger lists the other players.
//!
//! Usage: `peer_sync [config.ron]`. Set `RUST_LOG=debug` to watch the chunks.

use rankwire_core::{time, PlayerRatingRecord, PlayerTag, RatingConfig, SlotId};
use rankwire_store::{LedgerStore, RecordStore, StorageLayout};
use rankwire_sync::{MemoryChannel, Participant, PeerSyncCoordinator, SyncOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

const STEP_MS: u64 = 50;

fn main() -> rankwire_sync::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RatingConfig::load(path)?,
        None => RatingConfig::default(),
    };
    let root = std::env::temp_dir().join(format!("rankwire-demo-{}", std::process::id()));
    println!("=== Rankwire Peer Sync Demo ===\n");
    println!("Save root: {}\n", root.display());

    let players = [("ranger", 1612.0, 9), ("sapper", 1488.0, 4), ("medic", 1530.0, 12)];
    let channel = MemoryChannel::new();
    let now = time::now();

    let mut peers = Vec::new();
    let mut participants = Vec::new();
    for (i, (name, rating, games)) in players.iter().enumerate() {
        let slot = SlotId::new(i as u32)?;
        let layout = StorageLayout::from_config(root.join(name), &config);

        let mut record = PlayerRatingRecord::new(PlayerTag::new(*name)?, now - i as i64);
        record.rating = *rating;
        record.games_played = *games;
        RecordStore::from_config(&layout, &config).write(&record)?;

        peers.push(PeerSyncCoordinator::from_layout(
            config.clone(),
            channel.clone(),
            &layout,
            slot,
            "demo-match",
        )?);
        participants.push(Participant::eligible(slot));
    }

    let mut remaining = 0;
    for peer in peers.iter_mut() {
        match peer.start_sync(&participants, 0) {
            None => remaining += 1,
            Some(outcome) => info!(slot = %peer.local_slot(), ?outcome, "peer finished at start"),
        }
    }

    let mut clock = 0;
    while remaining > 0 {
        clock += STEP_MS;
        for peer in peers.iter_mut() {
            if let Some(SyncOutcome::Completed(report)) = peer.advance(clock) {
                remaining -= 1;
                info!(slot = %peer.local_slot(), at_ms = clock, ?report, "peer finished");
            }
        }
    }
    println!("Channel holds {} chunks\n", channel.len());

    for (name, _, _) in &players {
        let layout = StorageLayout::from_config(root.join(name), &config);
        let ledger = LedgerStore::from_config(&layout, &config);
        println!("{}'s ledger:", name);
        for entry in ledger.entries() {
            println!(
                "  {:<8} rating {:>6} games {:>3}",
                entry.identity.as_str(),
                entry.rating,
                entry.games_played
            );
        }
    }
    Ok(())
}
