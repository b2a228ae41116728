//! Long-poll watches of a single Consul key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use layered_config::{
    BlockingQuery, Cause, Consul, Context, DynamicConfig, DynamicValue, ErrorKind, HandlerError,
    KvClient, KvResponse, StoreError, WatchError,
};
use parking_lot::Mutex;
use rstest::rstest;
use serial_test::serial;
use test_helpers::env;
use test_helpers::kv::{Reply, ScriptedKv};

type Seen = Arc<Mutex<Vec<Option<String>>>>;

fn recording(field: &str) -> (DynamicConfig, Seen) {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    let config = DynamicConfig::new("svc", field, move |value: Option<&[u8]>| {
        sink.lock().push(value.map(|bytes| String::from_utf8_lossy(bytes).into_owned()));
        Ok(())
    })
    .refresh_interval(Duration::from_secs(5));
    (config, seen)
}

fn seen_values(seen: &Seen) -> Vec<Option<String>> {
    seen.lock().clone()
}

async fn watch(replies: Vec<Reply>, config: DynamicConfig, ctx: &Context) -> (WatchError, Arc<ScriptedKv>) {
    let store = Arc::new(ScriptedKv::new(replies));
    let consul = Consul::new().with_client(Arc::clone(&store));
    let err = consul.dynamic_value(ctx, config).await;
    (err, store)
}

#[tokio::test(start_paused = true)]
async fn handler_runs_once_per_new_index() {
    let (config, seen) = recording("loglevel");
    let replies = vec![
        Reply::value("info", 0),
        Reply::value("info", 0),
        Reply::value("debug", 1),
        Reply::value("debug", 1),
        Reply::value("warn", 2),
    ];
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let (err, store) = watch(replies, config, &ctx).await;

    assert_eq!(err.cause(), Some(Cause::DeadlineExceeded));
    assert_eq!(
        seen_values(&seen),
        [Some(String::from("debug")), Some(String::from("warn"))]
    );
    let calls = store.calls();
    assert_eq!(calls.len(), 6);
    assert!(calls.iter().all(|call| call.key == "finops/svc/loglevel"));
    let indices: Vec<u64> = calls.iter().map(|call| call.query.index).collect();
    assert_eq!(indices, [0, 1, 1, 1, 1, 2]);
    assert!(
        calls
            .iter()
            .all(|call| call.query.wait == Some(Duration::from_secs(5)))
    );
}

/// Answers every read with index 0, holding a request with a non-zero index
/// for its full wait the way Consul does when nothing has changed.
#[derive(Debug, Default)]
struct ZeroIndexKv {
    calls: Mutex<Vec<BlockingQuery>>,
}

#[async_trait]
impl KvClient for ZeroIndexKv {
    async fn get(&self, _key: &str, query: BlockingQuery) -> Result<KvResponse, StoreError> {
        self.calls.lock().push(query);
        if query.index > 0
            && let Some(wait) = query.wait
        {
            tokio::time::sleep(wait).await;
        }
        Ok(KvResponse {
            value: Some(b"v".to_vec()),
            index: 0,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn zero_index_store_is_not_polled_in_a_loop() {
    let (config, seen) = recording("loglevel");
    let config = config.refresh_interval(Duration::from_secs(30));
    let store = Arc::new(ZeroIndexKv::default());
    let consul = Consul::new().with_client(Arc::clone(&store));
    let ctx = Context::background().with_timeout(Duration::from_millis(200));

    let err = consul.dynamic_value(&ctx, config).await;

    assert_eq!(err.cause(), Some(Cause::DeadlineExceeded));
    let indices: Vec<u64> = store.calls.lock().iter().map(|query| query.index).collect();
    assert_eq!(indices, [0, 1]);
    assert!(seen_values(&seen).is_empty());
}

#[tokio::test(start_paused = true)]
async fn lower_index_is_delivered_as_a_change() {
    let (config, seen) = recording("loglevel");
    let replies = vec![Reply::value("a", 7), Reply::value("b", 3), Reply::value("b", 3)];
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let (_, store) = watch(replies, config, &ctx).await;
    assert_eq!(
        seen_values(&seen),
        [Some(String::from("a")), Some(String::from("b"))]
    );
    let indices: Vec<u64> = store.calls().iter().map(|call| call.query.index).collect();
    assert_eq!(indices, [0, 7, 3, 3]);
}

#[tokio::test(start_paused = true)]
async fn removed_keys_reach_the_handler_as_none() {
    let (config, seen) = recording("struct/inner/field");
    let replies = vec![Reply::value("x", 4), Reply::absent(5)];
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let (_, store) = watch(replies, config, &ctx).await;
    assert_eq!(seen_values(&seen), [Some(String::from("x")), None]);
    assert_eq!(
        store.calls().first().map(|call| call.key.as_str()),
        Some("finops/svc/struct/inner/field")
    );
}

#[tokio::test(start_paused = true)]
async fn handler_failure_ends_the_watch() {
    let config = DynamicConfig::new("svc", "loglevel", |_: Option<&[u8]>| {
        Err(HandlerError::from("rejected"))
    });
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let (err, store) = watch(vec![Reply::value("bad", 1)], config, &ctx).await;
    assert_eq!(err.kind(), ErrorKind::Handler);
    assert!(
        matches!(&err, WatchError::Handler { key_path, .. } if key_path == "loglevel"),
        "{err}"
    );
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn store_failure_ends_the_watch() {
    let (config, seen) = recording("loglevel");
    let replies = vec![Reply::value("info", 1), Reply::fail("connection reset")];
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let (err, _) = watch(replies, config, &ctx).await;
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(err.to_string().contains("connection reset"), "{err}");
    assert_eq!(seen_values(&seen).len(), 1);
}

#[rstest]
#[case::canceled(true, Cause::Canceled)]
#[case::deadline(false, Cause::DeadlineExceeded)]
#[tokio::test(start_paused = true)]
async fn context_ends_an_idle_watch(#[case] cancel: bool, #[case] expected: Cause) {
    let (config, seen) = recording("loglevel");
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    if cancel {
        let canceler = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceler.cancel();
        });
    }
    let (err, _) = watch(Vec::new(), config, &ctx).await;
    assert_eq!(err.cause(), Some(expected));
    assert!(seen_values(&seen).is_empty());
}

#[tokio::test]
async fn finished_context_never_queries() {
    let (config, _) = recording("loglevel");
    let ctx = Context::background().with_cancel();
    ctx.cancel();
    let (err, store) = watch(vec![Reply::value("x", 1)], config, &ctx).await;
    assert_eq!(err.cause(), Some(Cause::Canceled));
    assert!(store.calls().is_empty());
}

#[tokio::test]
#[serial]
async fn missing_address_reports_no_client() {
    let _scope = env::scope_with(|lock| vec![lock.remove_var("CONSUL_HTTP_ADDR")]);
    let (config, _) = recording("loglevel");
    let err = Consul::new()
        .dynamic_value(&Context::background(), config)
        .await;
    assert!(matches!(err, WatchError::NoClient { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}
