use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use parking_lot::RwLock;
use tracing::info;

use super::Catalog;
use crate::config::AppConfig;

/// Where the active catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// The dataset compiled into the crate.
    Embedded,
    /// A catalog document on disk.
    File(PathBuf),
}

/// Thread-safe catalog handle shared by planner sessions.
///
/// Sessions take cheap [`Arc`] snapshots; refreshing swaps the source and
/// drops the cache without disturbing snapshots already handed out.
#[derive(Clone)]
pub struct CatalogLoader {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    source: CatalogSource,
    cache: Option<Arc<Catalog>>,
}

impl CatalogLoader {
    /// Build a loader for the given source. Nothing is read until first use.
    pub fn new(source: CatalogSource) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                source,
                cache: None,
            })),
        }
    }

    /// Pick the source named by configuration, defaulting to the embedded data.
    pub fn from_config(config: &AppConfig) -> Self {
        let source = match &config.catalog_path {
            Some(path) => CatalogSource::File(path.clone()),
            None => CatalogSource::Embedded,
        };
        Self::new(source)
    }

    /// Source currently backing the loader.
    pub fn source(&self) -> CatalogSource {
        self.inner.read().source.clone()
    }

    /// Point the loader at a new source; the next [`catalog`](Self::catalog) call reloads.
    pub fn refresh(&self, source: CatalogSource) {
        let mut inner = self.inner.write();
        inner.source = source;
        inner.cache = None;
    }

    /// Return the active catalog, loading it on first use.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.inner.read().cache.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let mut inner = self.inner.write();
        if let Some(catalog) = inner.cache.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = match &inner.source {
            CatalogSource::Embedded => Catalog::embedded(),
            CatalogSource::File(path) => {
                let catalog = Arc::new(Catalog::from_path(path)?);
                info!(
                    "loaded catalog from {} ({} professions, {} skill boxes)",
                    path.display(),
                    catalog.professions().len(),
                    catalog.skill_box_count()
                );
                catalog
            }
        };
        inner.cache = Some(Arc::clone(&catalog));
        Ok(catalog)
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(CatalogSource::Embedded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TINY_CATALOG: &str = r#"{
        "species": [{"id": "human", "name": "Human"}],
        "professions": [{
            "id": "tinker",
            "name": "Tinker",
            "category": "basic",
            "novice": {"id": "tinker_novice", "name": "Novice Tinker", "skill_points": 3}
        }]
    }"#;

    #[test]
    fn loads_file_catalog_and_refreshes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("catalog.json");
        fs::write(&path, TINY_CATALOG)?;

        let loader = CatalogLoader::new(CatalogSource::File(path.clone()));
        let first = loader.catalog()?;
        assert_eq!(first.professions().len(), 1);
        assert!(Arc::ptr_eq(&first, &loader.catalog()?));

        loader.refresh(CatalogSource::Embedded);
        let embedded = loader.catalog()?;
        assert!(embedded.find_profession("brawler").is_some());
        assert_eq!(first.professions().len(), 1, "old snapshot must stay intact");
        assert_eq!(loader.source(), CatalogSource::Embedded);
        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let loader = CatalogLoader::new(CatalogSource::File(PathBuf::from(
            "/definitely/not/here/catalog.json",
        )));
        let err = loader.catalog().expect_err("missing file should fail");
        assert!(err.to_string().contains("failed to read catalog"));
    }
}
