//! Loads a service configuration from every source and watches its log
//! level.
//!
//! Run with `RUST_LOG=layered_config=debug` to see each source as it is
//! applied. Without `CONSUL_HTTP_ADDR` and `VAULT_ADDR` those sources are
//! skipped, and the watch reports that no client is available.
//!
//! ```text
//! LOG_LEVEL=debug cargo run --example service_config -- --db.port 6543
//! ```

use std::time::Duration;

use layered_config::{
    Consul, Context, DynamicConfig, DynamicValue, ErrorKind, Layered, LoadError, describe,
    is_display_request, load_config,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Layered)]
struct Database {
    #[layered(default = "localhost")]
    host: String,
    #[layered(default = 5432)]
    port: u16,
    #[layered(secret)]
    password: String,
}

#[derive(Debug, Default, Layered)]
struct ServiceConfig {
    #[layered(name = "logLevel", env = "LOG_LEVEL", default = "info")]
    log_level: String,
    #[layered(name = "listenAddr", default = "0.0.0.0:8080")]
    listen_addr: String,
    #[layered(name = "db")]
    database: Database,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = Context::background().with_timeout(Duration::from_secs(30));
    let mut config = ServiceConfig::default();
    if let Err(err) = load_config(&ctx, "adm0001s", &mut config).await {
        if let LoadError::Loader { source, .. } = &err
            && let LoadError::CliParsing(clap_err) = source.as_ref()
            && is_display_request(clap_err)
        {
            clap_err.exit();
        }
        return Err(err.into());
    }
    for report in describe(&config) {
        info!(field = %report.path, value = %report.value, "effective configuration");
    }

    let watch_ctx = Context::background().with_timeout(Duration::from_secs(120));
    let watch = DynamicConfig::new("adm0001s", "loglevel", |value: Option<&[u8]>| {
        let level = value.map_or_else(|| String::from("<removed>"), |bytes| {
            String::from_utf8_lossy(bytes).into_owned()
        });
        info!(level = %level, "log level changed");
        Ok(())
    })
    .refresh_interval(Duration::from_secs(10));
    let stopped = Consul::new().dynamic_value(&watch_ctx, watch).await;
    match stopped.kind() {
        ErrorKind::Canceled | ErrorKind::Unavailable => {
            info!(reason = %stopped, "log level watch ended");
        }
        _ => warn!(error = %stopped, "log level watch failed"),
    }
    Ok(())
}
