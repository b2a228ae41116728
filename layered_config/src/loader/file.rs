//! Configuration files discovered on disk.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::Loader;
use crate::binder::{DefaultPolicy, bind};
use crate::codec::{SUFFIXES, decoder_for_path};
use crate::context::Context;
use crate::descriptor::{Configurable, SourceKind};
use crate::error::{LoadError, LoadResult};
use crate::lookup::TreeLookup;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Reads fields from a configuration file.
///
/// An explicit path, given with [`File::with_path`] or through
/// `CONFIG_PATH`, is used as is and must exist. Otherwise `<app>.yaml`,
/// `<app>.yml`, `<app>.json` and `<app>.toml` are searched for in the working
/// directory, then the user configuration directory (`<config>/<app>/`), then
/// `/etc/<app>/` on Unix. The first file found is decoded according to its
/// extension.
///
/// # Examples
///
/// ```
/// use layered_config::File;
///
/// let loader = File::new().with_search_dirs(["/srv/app/config"]);
/// assert_eq!(
///     loader.candidates("svc")[0],
///     std::path::Path::new("/srv/app/config/svc.yaml")
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct File {
    path: Option<PathBuf>,
    search_dirs: Option<Vec<PathBuf>>,
}

impl File {
    /// A loader using the default discovery order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads exactly `path`, skipping discovery.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replaces the searched directories.
    #[must_use]
    pub fn with_search_dirs<I>(mut self, dirs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.search_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    fn explicit_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            std::env::var_os(CONFIG_PATH_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
    }

    fn search_dirs(&self, app_name: &str) -> Vec<PathBuf> {
        if let Some(dirs) = &self.search_dirs {
            return dirs.clone();
        }
        let mut dirs = vec![PathBuf::from(".")];
        if let Some(config) = dirs::config_dir() {
            dirs.push(config.join(app_name));
        }
        if cfg!(unix) {
            dirs.push(Path::new("/etc").join(app_name));
        }
        dirs
    }

    /// Candidate paths for `app_name`, in search order.
    #[must_use]
    pub fn candidates(&self, app_name: &str) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        for dir in self.search_dirs(app_name) {
            for suffix in SUFFIXES {
                let candidate = dir.join(format!("{app_name}.{suffix}"));
                if seen.insert(candidate.clone()) {
                    paths.push(candidate);
                }
            }
        }
        paths
    }

    fn locate(&self, app_name: &str) -> LoadResult<PathBuf> {
        if let Some(path) = self.explicit_path() {
            return Ok(path);
        }
        let searched = self.candidates(app_name);
        searched
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .ok_or_else(|| LoadError::NoConfigFile {
                app_name: app_name.to_owned(),
                searched,
            })
    }
}

fn read(path: &Path) -> LoadResult<Vec<u8>> {
    std::fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => LoadError::file(path, "file does not exist"),
        _ => LoadError::file(path, err),
    })
}

#[async_trait]
impl Loader for File {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(
        &self,
        _ctx: &Context,
        app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        let path = self.locate(app_name)?;
        debug!(path = %path.display(), "loading configuration file");
        let data = read(&path)?;
        let dict = decoder_for_path(&path)
            .decode(&data)
            .map_err(|source| LoadError::Decode {
                origin: path.display().to_string(),
                source,
            })?;
        bind(
            target,
            &TreeLookup::new(SourceKind::File, &dict),
            DefaultPolicy::Skip,
        )
        .map(drop)
    }
}
