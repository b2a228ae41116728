//! Orchestrated loading across every source in precedence order.
#![allow(
    unfulfilled_lint_expectations,
    reason = "clippy::expect_used is denied globally; tests may not hit those branches"
)]
#![expect(
    clippy::expect_used,
    reason = "tests panic to surface configuration mistakes"
)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, ensure};
use layered_config::{
    CONFIG_PATH_ENV, Consul, Context, Defaults, Env, ErrorKind, File, Flags, Layered, Loader,
    Vault, load_with_loaders,
};
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;
use test_helpers::env;
use test_helpers::kv::{MemoryKv, MemorySecrets, Reply, ScriptedKv};

#[derive(Debug, Default, Layered)]
struct Settings {
    #[layered(name = "fromDefault", default = "default")]
    from_default: String,
    #[layered(name = "fromConsul", default = "default")]
    from_consul: String,
    #[layered(name = "fromVault", default = "default")]
    from_vault: String,
    #[layered(name = "fromFile", default = "default")]
    from_file: String,
    #[layered(name = "fromEnv", env = "PRECEDENCE_FROM_ENV", default = "default")]
    from_env: String,
    #[layered(name = "fromFlags", default = "default")]
    from_flags: String,
}

const ENV_VARS: &[&str] = &[
    "PRECEDENCE_FROM_ENV",
    "FROMDEFAULT",
    "FROMCONSUL",
    "FROMVAULT",
    "FROMFILE",
    "FROMENV",
    "FROMFLAGS",
    "FROM_DEFAULT",
    "FROM_CONSUL",
    "FROM_VAULT",
    "FROM_FILE",
    "FROM_ENV",
    "FROM_FLAGS",
];

/// Every source claims every field it is allowed to, so each field ends up
/// holding the value of the highest-ranked source that mentions it.
fn loaders(dir: &TempDir) -> Result<Vec<Box<dyn Loader>>> {
    let consul = MemoryKv::new().with_value(
        "finops/svc",
        "fromConsul: consul\nfromVault: consul\nfromFile: consul\nfromEnv: consul\nfromFlags: consul\n",
    );
    let vault = MemorySecrets::new().with_secret(
        "finops/svc",
        json!({"fromVault": "vault", "fromFile": "vault", "fromEnv": "vault", "fromFlags": "vault"}),
    );
    std::fs::write(
        dir.path().join("svc.yaml"),
        "fromFile: file\nfromEnv: file\nfromFlags: file\n",
    )?;
    Ok(vec![
        Box::new(Defaults),
        Box::new(Consul::new().with_client(consul)),
        Box::new(Vault::new().with_client(vault)),
        Box::new(File::new().with_search_dirs([dir.path()])),
        Box::new(Env),
        Box::new(Flags::from_args(["svc", "--fromFlags", "flags"])),
    ])
}

fn clean_env(extra: &[(&str, &str)]) -> env::EnvScope {
    env::scope_with(|lock| {
        let mut guards: Vec<_> = ENV_VARS.iter().map(|key| lock.remove_var(*key)).collect();
        guards.push(lock.remove_var(CONFIG_PATH_ENV));
        guards.extend(extra.iter().map(|(key, value)| lock.set_var(*key, value)));
        guards
    })
}

#[tokio::test]
#[serial]
async fn later_sources_override_earlier_ones() -> Result<()> {
    let _scope = clean_env(&[("PRECEDENCE_FROM_ENV", "env"), ("FROMFLAGS", "env")]);
    let dir = TempDir::new()?;
    let mut settings = Settings::default();
    load_with_loaders(&Context::background(), "svc", &mut settings, &loaders(&dir)?).await?;
    ensure!(settings.from_default == "default", "{settings:?}");
    ensure!(settings.from_consul == "consul", "{settings:?}");
    ensure!(settings.from_vault == "vault", "{settings:?}");
    ensure!(settings.from_file == "file", "{settings:?}");
    ensure!(settings.from_env == "env", "{settings:?}");
    ensure!(settings.from_flags == "flags", "{settings:?}");
    Ok(())
}

#[tokio::test]
#[serial]
async fn unavailable_sources_are_skipped() -> Result<()> {
    let _scope = env::scope_with(|lock| {
        vec![
            lock.remove_var("CONSUL_HTTP_ADDR"),
            lock.remove_var("VAULT_ADDR"),
            lock.remove_var(CONFIG_PATH_ENV),
        ]
    });
    let empty = TempDir::new()?;
    let loaders: Vec<Box<dyn Loader>> = vec![
        Box::new(Defaults),
        Box::new(Consul::new()),
        Box::new(Vault::new()),
        Box::new(File::new().with_search_dirs([empty.path()])),
        Box::new(Flags::from_args(["svc", "--fromFlags", "flags"])),
    ];
    let mut settings = Settings::default();
    load_with_loaders(&Context::background(), "svc", &mut settings, &loaders).await?;
    ensure!(settings.from_file == "default", "{settings:?}");
    ensure!(settings.from_flags == "flags", "{settings:?}");
    Ok(())
}

#[tokio::test]
async fn fatal_errors_stop_the_load_and_keep_earlier_values() {
    let loaders: Vec<Box<dyn Loader>> = vec![
        Box::new(Defaults),
        Box::new(Consul::new().with_client(MemoryKv::failing("acl denied"))),
        Box::new(Flags::from_args(["svc", "--fromFlags", "flags"])),
    ];
    let mut settings = Settings::default();
    let err = load_with_loaders(&Context::background(), "svc", &mut settings, &loaders)
        .await
        .expect_err("consul failure is fatal");
    assert_eq!(err.to_string(), "consul: acl denied");
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(settings.from_consul, "default");
    assert_eq!(settings.from_flags, "default");
}

#[tokio::test]
async fn finished_context_stops_before_the_next_loader() -> Result<()> {
    let ctx = Context::background().with_cancel();
    ctx.cancel();
    let loaders: Vec<Box<dyn Loader>> = vec![Box::new(Defaults)];
    let mut settings = Settings::default();
    load_with_loaders(&ctx, "svc", &mut settings, &loaders).await?;
    ensure!(settings.from_default.is_empty(), "{settings:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancel_during_a_remote_read_ends_the_load_successfully() -> Result<()> {
    let store = Arc::new(ScriptedKv::new(Vec::<Reply>::new()));
    let loaders: Vec<Box<dyn Loader>> = vec![
        Box::new(Consul::new().with_client(Arc::clone(&store))),
        Box::new(Flags::from_args(["svc", "--fromFlags", "flags"])),
    ];
    let ctx = Context::background().with_cancel();
    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceler.cancel();
    });

    let mut settings = Settings::default();
    load_with_loaders(&ctx, "svc", &mut settings, &loaders).await?;

    ensure!(settings.from_flags.is_empty(), "{settings:?}");
    ensure!(store.calls().len() == 1, "{:?}", store.calls());
    Ok(())
}

#[derive(Debug, Default, Layered)]
struct BadDefault {
    #[layered(default = "abc")]
    port: u16,
    #[layered(name = "fromFlags")]
    from_flags: String,
}

#[tokio::test]
async fn malformed_default_literal_stops_the_load() {
    let loaders: Vec<Box<dyn Loader>> = vec![
        Box::new(Defaults),
        Box::new(Flags::from_args(["svc", "--fromFlags", "flags"])),
    ];
    let mut settings = BadDefault::default();
    let err = load_with_loaders(&Context::background(), "svc", &mut settings, &loaders)
        .await
        .expect_err("abc is not a port");
    assert_eq!(err.kind(), ErrorKind::Malformed);
    assert!(err.to_string().starts_with("default: invalid value for 'port'"), "{err}");
    assert!(settings.from_flags.is_empty());
}
