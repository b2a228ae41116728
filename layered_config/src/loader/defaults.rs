//! Declared default literals.

use async_trait::async_trait;

use super::Loader;
use crate::binder::{DefaultPolicy, bind};
use crate::context::Context;
use crate::descriptor::Configurable;
use crate::error::LoadResult;
use crate::lookup::EmptyLookup;

/// Applies `#[layered(default = "...")]` literals.
///
/// Usually the first loader, so every other source can override the
/// defaults it writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defaults;

#[async_trait]
impl Loader for Defaults {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn load(
        &self,
        _ctx: &Context,
        _app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        bind(target, &EmptyLookup, DefaultPolicy::Apply).map(drop)
    }
}
