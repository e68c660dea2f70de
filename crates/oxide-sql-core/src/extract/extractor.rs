//! Drives the catalog queries of one extraction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::error::{ExtractError, Result};
use super::row::{AsyncCatalogSource, CatalogRow, CatalogSource};
use super::state::ExtractionState;
use super::{CatalogDialect, ExtractionTarget};
use crate::model::Catalog;

/// Shared flag that stops an extraction before its next query or row.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExtractError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reads a catalog through a dialect's metadata queries.
///
/// Each call builds and owns a fresh [`Catalog`]. The synchronous and the
/// asynchronous path feed rows through the same state machine.
#[derive(Debug, Clone)]
pub struct CatalogExtractor<'d> {
    dialect: &'d dyn CatalogDialect,
    schemas: Option<Vec<String>>,
    cancellation: CancellationFlag,
}

impl<'d> CatalogExtractor<'d> {
    /// Creates an extractor reading every user schema.
    #[must_use]
    pub fn new(dialect: &'d dyn CatalogDialect) -> Self {
        Self {
            dialect,
            schemas: None,
            cancellation: CancellationFlag::new(),
        }
    }

    /// Restricts extraction to the given schemas; the first is the default.
    #[must_use]
    pub fn with_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schemas: Vec<String> = schemas.into_iter().map(Into::into).collect();
        self.schemas = (!schemas.is_empty()).then_some(schemas);
        self
    }

    /// Uses an externally owned cancellation flag.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = flag;
        self
    }

    /// Extracts a catalog named `name` over a blocking source.
    pub fn extract<S: CatalogSource>(&self, name: &str, source: &mut S) -> Result<Catalog> {
        let mut state = self.start(name)?;
        for (target, sql) in self.queries() {
            self.cancellation.check()?;
            let rows = source.fetch(&sql).map_err(ExtractError::Source)?;
            self.consume(&mut state, target, &rows)?;
        }
        self.complete(state)
    }

    /// Extracts a catalog named `name` over an asynchronous source.
    pub async fn extract_async<S: AsyncCatalogSource>(
        &self,
        name: &str,
        source: &mut S,
    ) -> Result<Catalog> {
        let mut state = self.start(name)?;
        for (target, sql) in self.queries() {
            self.cancellation.check()?;
            let rows = source.fetch(&sql).await.map_err(ExtractError::Source)?;
            self.consume(&mut state, target, &rows)?;
        }
        self.complete(state)
    }

    fn start(&self, name: &str) -> Result<ExtractionState<'_>> {
        info!(
            dialect = self.dialect.kind().as_str(),
            catalog = name,
            "Extracting catalog"
        );
        ExtractionState::new(self.dialect, name, self.schemas.as_deref())
    }

    fn queries(&self) -> Vec<(ExtractionTarget, String)> {
        ExtractionTarget::ALL
            .into_iter()
            .filter_map(|target| {
                self.dialect
                    .query(target)
                    .map(|sql| (target, sql.into_owned()))
            })
            .collect()
    }

    fn consume(
        &self,
        state: &mut ExtractionState<'_>,
        target: ExtractionTarget,
        rows: &[CatalogRow],
    ) -> Result<()> {
        debug!(query = target.as_str(), rows = rows.len(), "Read catalog rows");
        state.begin(target);
        for row in rows {
            self.cancellation.check()?;
            state.apply(target, row)?;
        }
        state.finish(target)
    }

    fn complete(&self, state: ExtractionState<'_>) -> Result<Catalog> {
        let catalog = state.into_catalog();
        if self.schemas.is_some() {
            catalog.validate_partial()?;
        } else {
            catalog.validate()?;
        }
        debug!(
            catalog = catalog.name(),
            tables = catalog.all_tables().count(),
            "Extracted catalog"
        );
        Ok(catalog)
    }
}
