//! Process environment variables.

use async_trait::async_trait;

use super::Loader;
use crate::binder::{DefaultPolicy, bind};
use crate::context::Context;
use crate::descriptor::{Configurable, SourceKind};
use crate::error::LoadResult;
use crate::lookup::FlatLookup;
use crate::value::RawValue;

/// Reads fields from environment variables.
///
/// Each name hint is tried exactly as written, then upper-cased, then
/// lower-cased; the first variable that exists wins. Nested fields join the
/// parent and child names with `_`, so `db.port` is found as `DB_PORT`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Env;

/// A variable that exists but is not UTF-8 still counts as found, so the
/// binder reports it instead of falling through to the next spelling.
fn probe(name: &str) -> Option<RawValue> {
    [name.to_owned(), name.to_uppercase(), name.to_lowercase()]
        .iter()
        .find_map(std::env::var_os)
        .map(|value| {
            value.into_string().map_or_else(
                |raw| RawValue::NotUnicode(raw.to_string_lossy().into_owned()),
                RawValue::Scalar,
            )
        })
}

#[async_trait]
impl Loader for Env {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn load(
        &self,
        _ctx: &Context,
        _app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        let lookup = FlatLookup::new(SourceKind::Env, "_", &probe);
        bind(target, &lookup, DefaultPolicy::Skip).map(drop)
    }
}
