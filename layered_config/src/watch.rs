//! Long-poll watch of a single key.
//!
//! One background task owns the outstanding blocking query and reports its
//! single result over a oneshot channel. The watch loop races that channel
//! against the caller's context, so cancellation releases the caller at once
//! even while the query is still in flight; the abandoned query ends through
//! the client's own timeout.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{StoreError, WatchError};
use crate::loader::DynamicConfig;
use crate::remote::{BlockingQuery, KvClient, KvResponse};

/// Version state of one watch.
#[derive(Debug, Default)]
struct WatchState {
    index: u64,
    answered: bool,
    value: Option<Vec<u8>>,
}

impl WatchState {
    /// Index to send with the next blocking query.
    ///
    /// Only the first query asks for an immediate answer. Afterwards the
    /// index never drops below 1, since a zero index would make the store
    /// answer at once and the loop would never block.
    const fn next_index(&self) -> u64 {
        if self.answered {
            if self.index == 0 { 1 } else { self.index }
        } else {
            0
        }
    }

    /// Records `response`, returning whether it is a new version.
    ///
    /// A repeated index is a timeout, not a change. Any other index, including
    /// one lower than the last (a store restored from a snapshot), is a change.
    fn observe(&mut self, response: &KvResponse) -> bool {
        self.answered = true;
        if response.index == self.index {
            return false;
        }
        self.index = response.index;
        true
    }
}

fn spawn_query(
    client: &Arc<dyn KvClient>,
    key: &str,
    query: BlockingQuery,
) -> oneshot::Receiver<Result<KvResponse, StoreError>> {
    let (tx, rx) = oneshot::channel();
    let client = Arc::clone(client);
    let key = key.to_owned();
    tokio::spawn(async move {
        let result = client.get(&key, query).await;
        if tx.send(result).is_err() {
            trace!(key = %key, "watch ended before the blocking query returned");
        }
    });
    rx
}

/// Watches `key`, delivering each new version to the handler in `config`.
///
/// Returns when the context finishes, the handler fails or the store fails.
pub(crate) async fn watch_key(
    ctx: &Context,
    client: Arc<dyn KvClient>,
    key: String,
    mut config: DynamicConfig,
) -> WatchError {
    let mut state = WatchState::default();
    loop {
        if let Some(cause) = ctx.cause() {
            return cause.into();
        }
        let query = BlockingQuery {
            index: state.next_index(),
            wait: Some(config.refresh_interval),
        };
        let rx = spawn_query(&client, &key, query);
        let received = tokio::select! {
            biased;
            cause = ctx.done() => return cause.into(),
            received = rx => received,
        };
        let response = match received {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return WatchError::Store {
                    key_path: config.field_name,
                    source,
                };
            }
            Err(_) => {
                return WatchError::Store {
                    key_path: config.field_name,
                    source: StoreError::other("blocking query task stopped without a result"),
                };
            }
        };
        if !state.observe(&response) {
            continue;
        }
        if let Some(cause) = ctx.cause() {
            return cause.into();
        }
        debug!(
            key_path = %config.field_name,
            index = response.index,
            removed = response.value.is_none(),
            content_changed = response.value != state.value,
            "new dynamic value received"
        );
        if let Err(source) = (config.handler)(response.value.as_deref()) {
            return WatchError::Handler {
                key_path: config.field_name,
                source,
            };
        }
        state.value = response.value;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn at(index: u64) -> KvResponse {
        KvResponse {
            value: Some(b"v".to_vec()),
            index,
        }
    }

    #[rstest]
    fn repeated_indices_are_not_changes() {
        let mut state = WatchState::default();
        let seen: Vec<bool> = [0, 0, 1, 1, 2]
            .into_iter()
            .map(|index| state.observe(&at(index)))
            .collect();
        assert_eq!(seen, [false, false, true, false, true]);
    }

    #[rstest]
    fn next_query_never_sends_a_zero_index_after_an_answer() {
        let mut state = WatchState::default();
        assert_eq!(state.next_index(), 0);
        assert!(!state.observe(&at(0)));
        assert_eq!(state.next_index(), 1);
        assert!(!state.observe(&at(0)));
        assert_eq!(state.next_index(), 1);
        assert!(state.observe(&at(4)));
        assert_eq!(state.next_index(), 4);
    }

    #[rstest]
    fn lower_indices_are_changes() {
        let mut state = WatchState::default();
        assert!(state.observe(&at(9)));
        assert!(state.observe(&at(3)));
        assert!(!state.observe(&at(3)));
    }
}
