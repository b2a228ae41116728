//! Unit tests for binding and summaries.
#![allow(
    unfulfilled_lint_expectations,
    reason = "clippy::expect_used is denied globally; tests may not hit those branches"
)]
#![expect(
    clippy::expect_used,
    reason = "tests panic to surface configuration mistakes"
)]

use figment::value::{Dict, Tag, Value};
use rstest::{fixture, rstest};

use super::{DefaultPolicy, bind, describe};
use crate::descriptor::SourceKind;
use crate::error::LoadError;
use crate::lookup::{EmptyLookup, FlatLookup, TreeLookup};
use crate::value::RawValue;
use crate::Layered;

#[derive(Debug, Default, Layered)]
struct Database {
    #[layered(name = "hostname", default = "localhost")]
    host: String,
    #[layered(default = "5432")]
    port: u16,
}

#[derive(Debug, Default, Layered)]
struct Service {
    #[layered(name = "logLevel", env = "LOG_LEVEL", default = "info")]
    log_level: String,
    #[layered(secret)]
    password: String,
    #[layered(secret, loggable = true)]
    api_key_id: String,
    verbose: bool,
    tags: Vec<String>,
    #[layered(name = "db")]
    database: Database,
}

fn text(value: &str) -> Value {
    Value::String(Tag::Default, value.to_owned())
}

#[fixture]
fn document() -> Dict {
    let mut db = Dict::new();
    db.insert(String::from("hostname"), text("db.internal"));
    let mut dict = Dict::new();
    dict.insert(String::from("logLevel"), text("debug"));
    dict.insert(String::from("verbose"), text("true"));
    dict.insert(String::from("db"), Value::Dict(Tag::Default, db));
    dict
}

#[rstest]
fn defaults_fill_every_declared_literal() {
    let mut service = Service::default();
    let bound = bind(&mut service, &EmptyLookup, DefaultPolicy::Apply).expect("defaults bind");
    assert_eq!(service.log_level, "info");
    assert_eq!(service.database.host, "localhost");
    assert_eq!(service.database.port, 5432);
    assert!(service.password.is_empty());
    assert_eq!(bound.len(), 3);
    assert!(bound.contains("database.port"));
}

#[rstest]
fn tree_values_override_and_leave_other_fields(document: Dict) {
    let mut service = Service {
        password: String::from("kept"),
        ..Service::default()
    };
    bind(&mut service, &EmptyLookup, DefaultPolicy::Apply).expect("defaults bind");
    let bound = bind(
        &mut service,
        &TreeLookup::new(SourceKind::File, &document),
        DefaultPolicy::Skip,
    )
    .expect("file binds");

    assert_eq!(service.log_level, "debug");
    assert!(service.verbose);
    assert_eq!(service.database.host, "db.internal");
    assert_eq!(service.database.port, 5432);
    assert_eq!(service.password, "kept");
    assert_eq!(
        bound.iter().collect::<Vec<_>>(),
        ["log_level", "verbose", "database.host"]
    );
}

#[rstest]
fn skipped_defaults_leave_fields_unset() {
    let mut service = Service::default();
    let bound = bind(&mut service, &EmptyLookup, DefaultPolicy::Skip).expect("nothing to bind");
    assert!(bound.is_empty());
    assert!(service.log_level.is_empty());
}

#[rstest]
fn source_specific_names_win_for_their_source() {
    let probe = |name: &str| match name {
        "LOG_LEVEL" => Some(RawValue::scalar("warn")),
        "logLevel" => Some(RawValue::scalar("error")),
        "db_port" => Some(RawValue::scalar("6543")),
        _ => None,
    };
    let mut service = Service::default();
    bind(
        &mut service,
        &FlatLookup::new(SourceKind::Env, "_", &probe),
        DefaultPolicy::Skip,
    )
    .expect("env binds");
    assert_eq!(service.log_level, "warn");
    assert_eq!(service.database.port, 6543);
}

#[rstest]
fn coercion_failures_name_the_nested_path() {
    let probe = |name: &str| (name == "db_port").then(|| RawValue::scalar("not-a-port"));
    let mut service = Service::default();
    let err = bind(
        &mut service,
        &FlatLookup::new(SourceKind::Env, "_", &probe),
        DefaultPolicy::Skip,
    )
    .expect_err("port is not numeric");
    match err {
        LoadError::InvalidValue {
            field, source_kind, ..
        } => {
            assert_eq!(field, "database.port");
            assert_eq!(source_kind, SourceKind::Env);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn lists_accept_comma_separated_scalars() {
    let probe = |name: &str| (name == "tags").then(|| RawValue::scalar("a, b ,c"));
    let mut service = Service::default();
    bind(
        &mut service,
        &FlatLookup::new(SourceKind::Env, "_", &probe),
        DefaultPolicy::Skip,
    )
    .expect("list binds");
    assert_eq!(service.tags, ["a", "b", "c"]);
}

#[rstest]
fn sequences_holding_tables_do_not_bind_as_shorter_lists() {
    let mut dict = Dict::new();
    dict.insert(
        String::from("tags"),
        Value::Array(
            Tag::Default,
            vec![text("one"), Value::Dict(Tag::Default, Dict::new()), text("two")],
        ),
    );
    let mut service = Service {
        tags: vec![String::from("kept")],
        ..Service::default()
    };
    let err = bind(
        &mut service,
        &TreeLookup::new(SourceKind::Consul, &dict),
        DefaultPolicy::Skip,
    )
    .expect_err("a table inside a list is malformed");
    assert!(
        matches!(&err, LoadError::InvalidValue { field, .. } if field == "tags"),
        "{err}"
    );
    assert_eq!(service.tags, ["kept"]);
}

#[derive(Debug, Default, Layered)]
struct BadDefault {
    #[layered(default = "info")]
    level: String,
    #[layered(default = "abc")]
    port: u16,
}

#[rstest]
fn malformed_default_literals_are_fatal() {
    let mut settings = BadDefault::default();
    let err = bind(&mut settings, &EmptyLookup, DefaultPolicy::Apply)
        .expect_err("abc is not a port");
    match err {
        LoadError::InvalidValue {
            field, source_kind, ..
        } => {
            assert_eq!(field, "port");
            assert_eq!(source_kind, SourceKind::Default);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(settings.level, "info");
    assert_eq!(settings.port, 0);
}

#[rstest]
fn describe_redacts_secrets_unless_loggable() {
    let service = Service {
        password: String::from("hunter2"),
        api_key_id: String::from("key-1"),
        ..Service::default()
    };
    let reports = describe(&service);
    let value_of = |path: &str| {
        reports
            .iter()
            .find(|report| report.path == path)
            .map(|report| (report.value.as_str(), report.secret))
    };
    assert_eq!(value_of("password"), Some(("***", true)));
    assert_eq!(value_of("api_key_id"), Some(("key-1", true)));
    assert_eq!(value_of("database.port"), Some(("0", false)));
    assert_eq!(reports.len(), 8);
}
