//! Unit tests for environment helpers.
#![expect(clippy::expect_used, reason = "tests panic on unexpected failures")]

use super::*;
use std::sync::{Arc, Barrier};
use std::thread;

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[test]
fn set_var_restores_original() {
    let _outer = set_var("TEST_HELPERS_SET_VAR", "orig");
    {
        let _inner = set_var("TEST_HELPERS_SET_VAR", "temp");
        assert_eq!(env_value("TEST_HELPERS_SET_VAR").as_deref(), Some("temp"));
    }
    assert_eq!(env_value("TEST_HELPERS_SET_VAR").as_deref(), Some("orig"));
}

#[test]
fn remove_var_restores_original() {
    let _outer = set_var("TEST_HELPERS_REMOVE_VAR", "orig");
    {
        let _inner = remove_var("TEST_HELPERS_REMOVE_VAR");
        assert_eq!(env_value("TEST_HELPERS_REMOVE_VAR"), None);
    }
    assert_eq!(env_value("TEST_HELPERS_REMOVE_VAR").as_deref(), Some("orig"));
}

#[test]
fn absent_variables_are_removed_again() {
    let key = "TEST_HELPERS_ABSENT_VAR";
    let _clear = remove_var(key);
    drop(set_var(key, "temp"));
    assert_eq!(env_value(key), None);
}

#[test]
fn stacked_guards_restore_in_lifo_order() {
    let key = "TEST_HELPERS_STACKED";
    let _clear = remove_var(key);
    let first = set_var(key, "one");
    let second = set_var(key, "two");
    drop(second);
    assert_eq!(env_value(key).as_deref(), Some("one"));
    drop(first);
    assert_eq!(env_value(key), None);
}

#[test]
fn scope_restores_every_guard() {
    let _clear = [remove_var("TEST_HELPERS_SCOPE_A"), remove_var("TEST_HELPERS_SCOPE_B")];
    {
        let _scope = scope_with(|lock| {
            vec![
                lock.set_var("TEST_HELPERS_SCOPE_A", "a"),
                lock.set_var("TEST_HELPERS_SCOPE_B", "b"),
            ]
        });
        assert_eq!(env_value("TEST_HELPERS_SCOPE_A").as_deref(), Some("a"));
        assert_eq!(env_value("TEST_HELPERS_SCOPE_B").as_deref(), Some("b"));
    }
    assert_eq!(env_value("TEST_HELPERS_SCOPE_A"), None);
    assert_eq!(env_value("TEST_HELPERS_SCOPE_B"), None);
}

#[test]
fn concurrent_guards_on_distinct_keys_do_not_interfere() {
    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let key = format!("TEST_HELPERS_WORKER_{worker}");
                barrier.wait();
                for iter in 0..50 {
                    let value = format!("value-{iter}");
                    let guard = set_var(&key, &value);
                    assert_eq!(env_value(&key), Some(value));
                    drop(guard);
                    assert_eq!(env_value(&key), None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}
