// tests/integration/sequencing_tests.rs
use std::collections::HashMap;
use std::sync::Arc;

use attendance_node::core::{
    attendance::types::{EventQuery, EventType},
    identity::types::IdentityId,
};
use test_log::test;

use crate::common::{test_state, wave, TEMPLATE_LEN};

const FREQUENCIES: [f32; 3] = [0.21, 0.57, 0.93];

#[test(tokio::test)]
async fn test_interleaved_scans_replay_as_alternating_history() {
    let state = test_state();

    let mut identities = Vec::new();
    for (i, frequency) in FREQUENCIES.iter().enumerate() {
        let identity = state
            .enrollment
            .enroll(&format!("worker-{}", i), wave(*frequency, 0.0, TEMPLATE_LEN).into())
            .await
            .expect("enrollment succeeds");
        identities.push((identity.id, *frequency));
    }

    // a fixed, uneven interleaving
    let schedule = [0, 1, 0, 2, 2, 1, 0, 0, 2, 1, 1, 0, 2];
    let mut expected: HashMap<IdentityId, Vec<EventType>> = HashMap::new();
    for (step, &who) in schedule.iter().enumerate() {
        let (id, frequency) = identities[who];
        let phase = 0.01 * (step % 4) as f32;
        let outcome = state
            .attendance
            .check_in_out(wave(frequency, phase, TEMPLATE_LEN).into(), Some("gate-a"))
            .await
            .expect("scan succeeds");

        assert_eq!(outcome.resolution.identity_id, id);
        let history = expected.entry(id).or_default();
        assert_eq!(outcome.event.event_type, EventType::next_after(history.last().copied()));
        history.push(outcome.event.event_type);
    }

    let report = state.reports.report(&EventQuery::default()).await.expect("report");
    assert_eq!(report.total_records, schedule.len());
    assert_eq!(report.records.len(), schedule.len());

    // total order, newest first, no two events share a position
    for pair in report.records.windows(2) {
        assert!(
            pair[0].timestamp > pair[1].timestamp
                || (pair[0].timestamp == pair[1].timestamp && pair[0].identity_id >= pair[1].identity_id)
        );
        assert_ne!(pair[0].id, pair[1].id);
    }

    for (id, _) in &identities {
        let per_identity = state
            .reports
            .report(&EventQuery::for_identity(*id))
            .await
            .expect("per-identity report");
        let replayed: Vec<EventType> = per_identity
            .records
            .iter()
            .rev()
            .map(|event| event.event_type)
            .collect();
        assert_eq!(&replayed, expected.get(id).expect("scanned at least once"));
        assert_eq!(replayed.first(), Some(&EventType::In));
        assert!(replayed.windows(2).all(|pair| pair[0] != pair[1]));
        assert!(per_identity.records.windows(2).all(|pair| pair[0].timestamp > pair[1].timestamp));
    }
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_concurrent_scans_of_one_identity_stay_consistent() {
    let state = test_state();
    let alice = state
        .enrollment
        .enroll("Alice", wave(FREQUENCIES[0], 0.0, TEMPLATE_LEN).into())
        .await
        .expect("enrollment succeeds");
    let bob = state
        .enrollment
        .enroll("Bob", wave(FREQUENCIES[2], 0.0, TEMPLATE_LEN).into())
        .await
        .expect("enrollment succeeds");

    let attendance = state.attendance.clone();
    let scans: Vec<_> = (0..40)
        .map(|i| {
            let attendance = Arc::clone(&attendance);
            let frequency = if i % 4 == 3 { FREQUENCIES[2] } else { FREQUENCIES[0] };
            tokio::spawn(async move {
                attendance
                    .check_in_out(wave(frequency, 0.0, TEMPLATE_LEN).into(), None)
                    .await
            })
        })
        .collect();

    for outcome in futures::future::join_all(scans).await {
        outcome.expect("task joins").expect("scan succeeds");
    }

    for (identity, scans) in [(alice.id, 30usize), (bob.id, 10usize)] {
        let report = state
            .reports
            .report(&EventQuery::for_identity(identity))
            .await
            .expect("report");
        assert_eq!(report.total_records, scans);

        let chronological: Vec<EventType> =
            report.records.iter().rev().map(|event| event.event_type).collect();
        assert_eq!(chronological[0], EventType::In);
        assert!(chronological.windows(2).all(|pair| pair[0] != pair[1]));

        let ins = chronological.iter().filter(|t| **t == EventType::In).count();
        assert_eq!(ins, scans / 2);
    }

    assert_eq!(state.metrics.snapshot().events_recorded, 40);
}

#[test(tokio::test)]
async fn test_failed_scans_leave_no_events() {
    let state = test_state();
    state
        .enrollment
        .enroll("Alice", wave(FREQUENCIES[1], 0.0, TEMPLATE_LEN).into())
        .await
        .expect("enrollment succeeds");

    assert!(state
        .attendance
        .check_in_out(wave(FREQUENCIES[1], 0.0, 8).into(), None)
        .await
        .is_err());
    assert!(state
        .attendance
        .check_in_out(wave(FREQUENCIES[2], 0.0, TEMPLATE_LEN).into(), None)
        .await
        .is_err());

    let report = state.reports.report(&EventQuery::default()).await.expect("report");
    assert_eq!(report.total_records, 0);
}
