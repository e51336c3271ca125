use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use touchline::config::EngineConfig;
use touchline::persist::{MemoryStore, SnapshotStore};
use touchline::roster::CardKind;
use touchline::session::MatchSession;
use touchline::state::MatchState;
use touchline::stats::{StatKey, TRACKED_STATS, TeamAggregates};

fn busy_state() -> MatchState {
    let config = EngineConfig::default();
    let mut session = MatchSession::new(&config);
    session.start_clock().unwrap();
    for second in 0..2400u64 {
        session.tick();
        let slot = format!("slot-{}", second % 17 + 1);
        let key = TRACKED_STATS[(second % TRACKED_STATS.len() as u64) as usize];
        if !key.needs_location() {
            session.apply_stat_delta(&slot, key, 1).unwrap();
        }
    }
    session.assign_card("slot-4", CardKind::Yellow, "Dissent").unwrap();
    session.state().clone()
}

fn bench_aggregates(c: &mut Criterion) {
    let state = busy_state();
    c.bench_function("team_aggregates_compute", |b| {
        b.iter(|| {
            let agg = TeamAggregates::compute(black_box(&state.players));
            black_box(agg.total(StatKey::Tackles));
        })
    });
}

fn bench_snapshot_save(c: &mut Criterion) {
    let state = busy_state();
    c.bench_function("snapshot_save_memory", |b| {
        let mut store = MemoryStore::default();
        b.iter(|| {
            store.save(black_box(&state)).unwrap();
        })
    });
}

criterion_group!(benches, bench_aggregates, bench_snapshot_save);
criterion_main!(benches);
