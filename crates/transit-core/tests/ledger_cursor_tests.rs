// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Ledger-position selectors, the state container, and the ledger cursor.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{reference_network, reference_state, system_nodes, NetworkStateBuilder};
use transit_core::selectors::{get_head_alteration, get_next_alteration, peek_alteration_stack};
use transit_core::{
    AlterationId, CursorError, LedgerCursor, LedgerError, NetworkEvent, NetworkStore, ReducerError,
    StepResult,
};

fn loaded_store() -> NetworkStore {
    let mut store = NetworkStore::default();
    store.load_network(reference_network().unwrap());
    store
        .dispatch(NetworkEvent::Restore(reference_state()))
        .unwrap();
    store
}

fn aid(raw: &str) -> AlterationId {
    AlterationId::from(raw)
}

#[test]
fn next_alteration_walks_the_ledger() {
    let network = reference_network().unwrap();
    let empty = reference_state();
    assert_eq!(peek_alteration_stack(&empty), None);
    assert_eq!(get_head_alteration(Some(&network), &empty), None);
    let next = get_next_alteration(Some(&network), &empty).unwrap();
    assert_eq!(next.map(|a| a.id.as_str()), Some("a1"));

    let at_a2 = NetworkStateBuilder::new()
        .applied("a1")
        .applied("a2")
        .build();
    assert_eq!(peek_alteration_stack(&at_a2), Some(&aid("a2")));
    assert_eq!(
        get_head_alteration(Some(&network), &at_a2).map(|a| a.date.as_str()),
        Some("2020-02-01T00:00:00Z")
    );
    let next = get_next_alteration(Some(&network), &at_a2).unwrap();
    assert_eq!(next.map(|a| a.id.as_str()), Some("a3"));
}

#[test]
fn exhausted_and_unknown_head_are_distinct() {
    let network = reference_network().unwrap();
    let at_end = NetworkStateBuilder::new().applied("a3").build();
    assert_eq!(get_next_alteration(Some(&network), &at_end).unwrap(), None);

    let lost = NetworkStateBuilder::new().applied("zz").build();
    assert_eq!(
        get_next_alteration(Some(&network), &lost),
        Err(LedgerError::HeadNotFound(aid("zz")))
    );
    assert_eq!(get_next_alteration(None, &lost), Ok(None));
}

#[test]
fn reference_ledger_is_chronological() {
    assert_eq!(
        reference_network().unwrap().ledger.check_chronology(),
        Ok(())
    );
}

#[test]
fn listeners_fire_in_order_and_refusals_are_silent() {
    let mut store = loaded_store();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&seen);
    let a = store.subscribe(move |s| {
        first
            .borrow_mut()
            .push(format!("a:{}", s.alteration_stack.len()));
    });
    let second = Rc::clone(&seen);
    store.subscribe(move |s| {
        second
            .borrow_mut()
            .push(format!("b:{}", s.alteration_stack.len()));
    });

    let a1 = store.next_alteration().unwrap().cloned().unwrap();
    store.dispatch(NetworkEvent::ApplyAlteration(a1.clone())).unwrap();
    assert_eq!(*seen.borrow(), ["a:1", "b:1"]);

    let before = store.state();
    let a2 = store.network().unwrap().ledger.at(1).cloned().unwrap();
    let err = store.dispatch(NetworkEvent::RollBackAlteration(a2)).unwrap_err();
    assert!(matches!(err, ReducerError::InvalidRollback { .. }));
    assert!(std::sync::Arc::ptr_eq(&before, &store.state()));
    assert_eq!(seen.borrow().len(), 2);

    assert!(store.unsubscribe(a));
    assert!(!store.unsubscribe(a));
    store.dispatch(NetworkEvent::RollBackAlteration(a1)).unwrap();
    assert_eq!(*seen.borrow(), ["a:1", "b:1", "b:0"]);
    assert_eq!(
        store.select(|s| s.feature_count()),
        reference_state().feature_count()
    );
}

#[test]
fn snapshots_survive_later_dispatches() {
    let mut store = loaded_store();
    let seed = store.state();
    let mut cursor = LedgerCursor::new(store);
    cursor.fast_forward().unwrap();
    assert_eq!(*seed, reference_state());
    store = cursor.into_store();
    assert_eq!(store.head_alteration().map(|a| a.id.as_str()), Some("a3"));
}

#[test]
fn cursor_steps_and_reports_ends() {
    let mut cursor = LedgerCursor::new(loaded_store());
    assert_eq!(cursor.position().unwrap(), 0);
    assert_eq!(cursor.step_back().unwrap(), StepResult::ReachedOrigin);

    assert_eq!(cursor.step_forward().unwrap(), StepResult::Advanced);
    assert_eq!(cursor.step_forward().unwrap(), StepResult::Advanced);
    assert_eq!(cursor.step_forward().unwrap(), StepResult::Advanced);
    assert_eq!(cursor.position().unwrap(), 3);
    assert_eq!(cursor.step_forward().unwrap(), StepResult::ReachedFrontier);

    assert_eq!(cursor.step_back().unwrap(), StepResult::RolledBack);
    assert_eq!(cursor.position().unwrap(), 2);
    assert_eq!(cursor.rewind().unwrap(), StepResult::RolledBack);
    assert_eq!(*cursor.store().state(), reference_state());
    assert_eq!(cursor.rewind().unwrap(), StepResult::ReachedOrigin);
}

#[test]
fn cursor_seeks_both_ways() {
    let mut cursor = LedgerCursor::new(loaded_store());
    assert_eq!(
        cursor.seek_to(Some(&aid("a2"))).unwrap(),
        StepResult::Advanced
    );
    assert_eq!(
        system_nodes(&cursor.store().state(), "sys1"),
        ["s1", "s2", "s3", "s4"]
    );
    assert_eq!(cursor.seek_to(Some(&aid("a2"))).unwrap(), StepResult::NoOp);
    assert_eq!(
        cursor.seek_to(Some(&aid("a1"))).unwrap(),
        StepResult::RolledBack
    );
    assert_eq!(
        system_nodes(&cursor.store().state(), "sys1"),
        ["s1", "s2", "s3"]
    );
    assert!(matches!(
        cursor.seek_to(Some(&aid("nope"))),
        Err(CursorError::UnknownTarget(id)) if id == "nope"
    ));
}

#[test]
fn cursor_without_network_refuses_to_move() {
    let mut cursor = LedgerCursor::new(NetworkStore::default());
    assert!(matches!(cursor.step_forward(), Err(CursorError::NoNetwork)));
    assert!(matches!(cursor.position(), Err(CursorError::NoNetwork)));
}

#[test]
fn cursor_rejects_foreign_head() {
    let mut store = NetworkStore::default();
    store.load_network(reference_network().unwrap());
    let foreign = NetworkStateBuilder::new().applied("elsewhere").build();
    store.dispatch(NetworkEvent::Restore(foreign)).unwrap();
    let mut cursor = LedgerCursor::new(store);
    assert!(matches!(
        cursor.step_forward(),
        Err(CursorError::Ledger(LedgerError::HeadNotFound(_)))
    ));
    assert!(matches!(cursor.step_back(), Err(CursorError::Ledger(_))));
}
