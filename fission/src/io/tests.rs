// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mask arithmetic and binding-list bookkeeping. The poll loop itself is covered by
//! the end-to-end readiness test.

use super::*;
use crate::reaction::{Identifier, ReactionOptions, ReactionTask};
use pretty_assertions::assert_eq;
use smallvec::smallvec;
use std::os::fd::AsRawFd;

#[test]
fn ready_masks_compose() {
    let mask = Ready::READABLE | Ready::WRITABLE;
    assert!(mask.contains(Ready::READABLE));
    assert!(mask.contains(Ready::WRITABLE));
    assert!(!mask.contains(Ready::ERROR));
    assert!(mask.intersects(Ready::READABLE | Ready::ERROR));
    assert!(!Ready::READABLE.intersects(Ready::WRITABLE));
}

#[test]
fn only_read_write_interest_is_registerable() {
    assert_eq!(Ready::READABLE.to_interest(), Some(Interest::READABLE));
    assert_eq!(Ready::WRITABLE.to_interest(), Some(Interest::WRITABLE));
    assert_eq!(
        (Ready::READABLE | Ready::WRITABLE).to_interest(),
        Some(Interest::READABLE.add(Interest::WRITABLE))
    );
    assert_eq!(Ready::ERROR.to_interest(), None);
    assert_eq!(Ready::NONE.to_interest(), None);
}

fn test_reaction() -> Arc<Reaction> {
    Reaction::new(
        Identifier {
            reactor: "io-test".into(),
            label: "readable".into(),
            triggers: smallvec![],
        },
        ReactionOptions::default(),
        true,
        Box::new(|reaction| {
            Some(ReactionTask::new(
                Arc::clone(reaction),
                Box::new(|| {}),
                smallvec::SmallVec::new(),
            ))
        }),
    )
}

fn bind_message(fd: RawFd, reaction: &Arc<Reaction>) -> IoBind {
    IoBind { fd, interest: Ready::READABLE, reaction: Arc::clone(reaction) }
}

#[test]
fn bind_then_unbind_restores_the_entry_list() {
    let multiplexer = IoMultiplexer::new().unwrap();
    let (read_end, _write_end) = rustix::pipe::pipe().unwrap();
    let reaction = test_reaction();

    multiplexer.core.bind(&bind_message(read_end.as_raw_fd(), &reaction));
    assert_eq!(multiplexer.core.entry_count(), 1);

    multiplexer.core.unbind(reaction.id());
    assert_eq!(multiplexer.core.entry_count(), 0);

    // Unbinding an unknown reaction is a no-op.
    multiplexer.core.unbind(reaction.id());
    assert_eq!(multiplexer.core.entry_count(), 0);
}

#[test]
fn entries_stay_sorted_by_fd() {
    let multiplexer = IoMultiplexer::new().unwrap();
    let (first_read, _first_write) = rustix::pipe::pipe().unwrap();
    let (second_read, _second_write) = rustix::pipe::pipe().unwrap();
    let reaction = test_reaction();

    // Bind in descending fd order; the list sorts ascending.
    multiplexer.core.bind(&bind_message(second_read.as_raw_fd(), &reaction));
    multiplexer.core.bind(&bind_message(first_read.as_raw_fd(), &reaction));

    let state = multiplexer.core.state();
    let fds: Vec<RawFd> = state.entries.iter().map(|entry| entry.fd).collect();
    let mut sorted = fds.clone();
    sorted.sort_unstable();
    assert_eq!(fds, sorted);
}

#[test]
fn rebuild_merges_interests_per_fd() {
    let multiplexer = IoMultiplexer::new().unwrap();
    let (read_end, _write_end) = rustix::pipe::pipe().unwrap();
    let fd = read_end.as_raw_fd();
    let first = test_reaction();
    let second = test_reaction();

    multiplexer.core.bind(&bind_message(fd, &first));
    multiplexer.core.bind(&bind_message(fd, &second));

    multiplexer.core.rebuild_if_dirty();
    let state = multiplexer.core.state();
    assert_eq!(state.entries.len(), 2);
    // Two bindings, one registration.
    assert_eq!(state.registered, vec![fd]);
    assert!(!state.dirty);
}

#[test]
fn binds_after_shutdown_are_refused() {
    let multiplexer = IoMultiplexer::new().unwrap();
    let (read_end, _write_end) = rustix::pipe::pipe().unwrap();
    let reaction = test_reaction();

    multiplexer.core.kill();
    multiplexer.core.bind(&bind_message(read_end.as_raw_fd(), &reaction));
    assert_eq!(multiplexer.core.entry_count(), 0);
}
