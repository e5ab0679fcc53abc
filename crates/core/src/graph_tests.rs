// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::program::Intent;

fn two_programs() -> Registry {
    let mut reg = Registry::new();
    reg.add("from", Intent::Auto).unwrap();
    reg.add("to", Intent::Auto).unwrap();
    reg
}

#[test]
fn add_edge_updates_both_endpoints() {
    let mut reg = two_programs();
    add_edge(&mut reg, "from", "to");
    assert_eq!(reg.find("from").unwrap().outgoing(), ["to"]);
    assert_eq!(reg.find("to").unwrap().incoming(), ["from"]);
}

#[test]
fn remove_edge_detaches_both_endpoints() {
    let mut reg = two_programs();
    add_edge(&mut reg, "from", "to");
    remove_edge(&mut reg, "from", "to");
    assert!(reg.find("from").unwrap().outgoing().is_empty());
    assert!(reg.find("to").unwrap().incoming().is_empty());
}

#[test]
fn remove_missing_edge_is_noop() {
    let mut reg = two_programs();
    remove_edge(&mut reg, "from", "to");
    assert!(reg.find("from").unwrap().outgoing().is_empty());
}

#[test]
fn has_any_incoming_reflects_edge_count() {
    let mut reg = two_programs();
    assert!(!reg.find("to").unwrap().has_incoming());
    add_edge(&mut reg, "from", "to");
    assert!(reg.find("to").unwrap().has_incoming());
}

#[test]
fn multiple_dependents_are_all_tracked() {
    let mut reg = two_programs();
    reg.add("other", Intent::Auto).unwrap();
    add_edge(&mut reg, "from", "to");
    add_edge(&mut reg, "other", "to");
    assert_eq!(reg.find("to").unwrap().incoming(), ["from", "other"]);
}
