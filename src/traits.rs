//! The collector capability.
//!
//! One [`Collector`] implementation per upstream service. The shared driver
//! in [`crate::runner`] owns everything the four sources have in common
//! (logger construction, text assembly, the output record, the write, and
//! exit-code mapping), so an implementation only has to turn a request into
//! formatted text blocks or a classified [`CollectError`].

use async_trait::async_trait;

use crate::logging::RunLogger;
use crate::models::{CollectError, CollectionRequest, Harvest, Source};

/// A source-specific unit implementing the fetch-and-normalize contract.
///
/// # Lifecycle
///
/// 1. The driver resolves the request (arguments, defaults, environment
///    snapshot) before construction; the request never changes mid-run.
/// 2. [`collect`](Collector::collect) resolves credentials from the request's
///    environment snapshot, builds the source-native query, performs the
///    bounded fetch plus per-item enrichment, and returns one formatted text
///    block per retained item.
/// 3. The driver joins the blocks, writes the uniform output record, and maps
///    the outcome to an exit code.
///
/// # Failure contract
///
/// Per-item enrichment failures must be handled inside `collect` (log and
/// skip, or log and keep the item degraded). Returning `Err` is reserved for
/// the classified top-level conditions of the shared taxonomy, all of which
/// still produce a written output file.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Which source tag this collector produces.
    fn source(&self) -> Source;

    /// Run the collection: credentials → query → fetch → per-item format.
    async fn collect(
        &self,
        request: &CollectionRequest,
        logger: &RunLogger,
    ) -> Result<Harvest, CollectError>;
}
