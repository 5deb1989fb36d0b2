//! Several peers running full exchanges over a shared channel

use rankwire_core::{PlayerRatingRecord, PlayerTag, RatingConfig, SlotId};
use rankwire_store::{LedgerStore, RecordStore, StorageLayout};
use rankwire_sync::{
    channel_key, BroadcastChannel, DirectoryChannel, MemoryChannel, Participant,
    PeerSyncCoordinator, SyncOutcome, SyncReport,
};
use std::path::Path;

fn slot(n: u32) -> SlotId {
    SlotId::new(n).unwrap()
}

fn tag(s: &str) -> PlayerTag {
    PlayerTag::new(s).unwrap()
}

fn config(encrypted: bool) -> RatingConfig {
    RatingConfig {
        sync_timeout_secs: 3.0,
        chunk_delay_secs: 0.05,
        poll_interval_secs: 0.25,
        max_chunk_size: 12,
        encryption_enabled: encrypted,
        season_id: 2,
        ..RatingConfig::default()
    }
}

fn record(identity: &str, rating: f64, last_updated: i64) -> PlayerRatingRecord {
    let mut r = PlayerRatingRecord::new(tag(identity), last_updated);
    r.rating = rating;
    r.games_played = 3;
    r.wins = 2;
    r.losses = 1;
    r
}

fn layout(root: &Path, peer: u32, config: &RatingConfig) -> StorageLayout {
    StorageLayout::from_config(root.join(format!("peer{}", peer)), config)
}

/// Advance every coordinator in lockstep until each has completed
fn run<C: BroadcastChannel>(
    peers: &mut [PeerSyncCoordinator<C>],
    participants: &[Participant],
) -> Vec<SyncReport> {
    let mut reports: Vec<Option<SyncReport>> = vec![None; peers.len()];
    for peer in peers.iter_mut() {
        assert_eq!(peer.start_sync(participants, 0), None);
    }
    for now in (0..=3_000).step_by(50) {
        for (peer, report) in peers.iter_mut().zip(reports.iter_mut()) {
            if let Some(SyncOutcome::Completed(r)) = peer.advance(now) {
                assert!(report.replace(r).is_none(), "completed twice");
            }
        }
    }
    reports
        .into_iter()
        .map(|r| r.expect("every peer completes by the deadline"))
        .collect()
}

#[test]
fn test_existing_newer_entry_survives_exchange() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(true);
    let channel = MemoryChannel::new();
    let a_layout = layout(dir.path(), 0, &config);
    let b_layout = layout(dir.path(), 1, &config);

    RecordStore::from_config(&a_layout, &config)
        .write(&record("peer-a", 1500.0, 100))
        .unwrap();
    RecordStore::from_config(&b_layout, &config)
        .write(&record("peer-b", 1600.0, 50))
        .unwrap();
    let a_ledger = LedgerStore::from_config(&a_layout, &config);
    a_ledger.merge(vec![record("peer-b", 1550.0, 200)]).unwrap();

    let mut peers = vec![
        PeerSyncCoordinator::from_layout(config.clone(), channel.clone(), &a_layout, slot(0), "m")
            .unwrap(),
        PeerSyncCoordinator::from_layout(config.clone(), channel.clone(), &b_layout, slot(1), "m")
            .unwrap(),
    ];
    let participants = [Participant::eligible(slot(0)), Participant::eligible(slot(1))];
    let reports = run(&mut peers, &participants);

    assert_eq!(reports[0].complete_senders, vec![slot(1)]);
    let summary = reports[0].merge.unwrap();
    assert_eq!((summary.inserted, summary.kept, summary.total), (1, 1, 2));

    let b = a_ledger.lookup(&tag("peer-b")).unwrap();
    assert_eq!((b.rating, b.last_updated), (1550.0, 200));
    let a = a_ledger.lookup(&tag("peer-a")).unwrap();
    assert_eq!((a.rating, a.last_updated), (1500.0, 100));

    // B had no ledger yet and learns both
    let b_ledger = LedgerStore::from_config(&b_layout, &config);
    let b_view = b_ledger.lookup(&tag("peer-b")).unwrap();
    assert_eq!((b_view.rating, b_view.last_updated), (1600.0, 50));
    assert!(b_ledger.lookup(&tag("peer-a")).is_some());
}

#[test]
fn test_three_peers_over_directory_channel() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(true);
    let bus = dir.path().join("bus");

    let identities = ["north:one", "east:two", "south:three"];
    let mut peers = Vec::new();
    for (i, identity) in identities.iter().enumerate() {
        let i = i as u32;
        let layout = layout(dir.path(), i, &config);
        RecordStore::from_config(&layout, &config)
            .write(&record(identity, 1500.0 + 10.0 * i as f64, 1_000 + i as i64))
            .unwrap();
        let channel = DirectoryChannel::open(&bus).unwrap();
        peers.push(
            PeerSyncCoordinator::from_layout(config.clone(), channel, &layout, slot(i * 5), "m-3")
                .unwrap(),
        );
    }
    let participants: Vec<_> = [0, 5, 10]
        .into_iter()
        .map(|s| Participant::eligible(slot(s)))
        .collect();
    let reports = run(&mut peers, &participants);

    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.complete_senders.len(), 2, "peer {}", i);
        assert!(report.incomplete_senders.is_empty());
        assert_eq!(report.rejected_messages, 0);
        assert!(report.published_chunks > 1);

        let ledger = LedgerStore::from_config(&layout(dir.path(), i as u32, &config), &config);
        let names: Vec<_> = ledger
            .entries()
            .into_iter()
            .map(|r| r.identity.as_str().to_string())
            .collect();
        assert_eq!(names, ["east:two", "north:one", "south:three"]);
    }
}

#[test]
fn test_missing_record_and_garbage_do_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(false);
    let channel = MemoryChannel::new();

    let mut peers = Vec::new();
    for i in 0..3u32 {
        let layout = layout(dir.path(), i, &config);
        // Peer 2 has never played a rated match
        if i < 2 {
            RecordStore::from_config(&layout, &config)
                .write(&record(&format!("p{}", i), 1500.0, 10))
                .unwrap();
        }
        peers.push(
            PeerSyncCoordinator::from_layout(config.clone(), channel.clone(), &layout, slot(i), "g")
                .unwrap(),
        );
    }
    // A fourth, ineligible slot scribbles garbage where slot 3 would publish
    channel
        .publish(&channel_key("g", slot(3), 0), "RWSYNC|3|0/1|!!")
        .unwrap();
    let participants = [
        Participant::eligible(slot(0)),
        Participant::eligible(slot(1)),
        Participant::eligible(slot(2)),
        Participant {
            slot: slot(3),
            eligible: false,
        },
    ];
    let reports = run(&mut peers, &participants);

    assert_eq!(reports[0].complete_senders, vec![slot(1)]);
    assert_eq!(reports[0].incomplete_senders, vec![slot(2)]);
    assert_eq!(reports[1].complete_senders, vec![slot(0)]);
    assert_eq!(reports[2].published_chunks, 0);
    assert_eq!(reports[2].merged_records, 2);
    for report in &reports {
        assert_eq!(report.rejected_messages, 0);
    }
}
