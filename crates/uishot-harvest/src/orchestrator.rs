//! Batch orchestration over many URLs
//!
//! Targets are processed strictly in order, one page at a time, and every
//! element of a page is resolved and captured before the next one is
//! touched: scrolling an element into view moves the viewport that all
//! later geometry reads depend on.

use crate::result::{CaptureEntry, ResultSet, UrlOutcome};
use crate::sink::OutputSink;
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, info, instrument, trace, warn};
use uishot_browser::{
    CaptureEngine, IdGenerator, PageSession, PageSource, RandomIds, VisibilityResolver,
};
use uishot_core::fail_open::fail_open;
use uishot_core::{CaptureSettings, Category, Result, TargetSpec};

/// Drives navigation, visibility resolution, capture and persistence
pub struct BatchOrchestrator<S, K, G = RandomIds>
where
    S: PageSource,
    K: OutputSink,
    G: IdGenerator,
{
    source: S,
    sink: K,
    resolver: VisibilityResolver,
    engine: CaptureEngine<G>,
    progress: Mutex<Box<dyn Write + Send>>,
}

impl<S: PageSource, K: OutputSink> BatchOrchestrator<S, K, RandomIds> {
    /// Orchestrator with random ids and progress on stdout
    pub fn new(source: S, sink: K, settings: &CaptureSettings) -> Self {
        Self::with_parts(
            source,
            sink,
            VisibilityResolver::from_settings(settings),
            CaptureEngine::new(settings),
        )
    }
}

impl<S: PageSource, K: OutputSink, G: IdGenerator> BatchOrchestrator<S, K, G> {
    pub fn with_parts(
        source: S,
        sink: K,
        resolver: VisibilityResolver,
        engine: CaptureEngine<G>,
    ) -> Self {
        Self {
            source,
            sink,
            resolver,
            engine,
            progress: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Redirect progress lines
    pub fn with_progress(mut self, writer: impl Write + Send + 'static) -> Self {
        self.progress = Mutex::new(Box::new(writer));
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Hand the page source back so the caller can release it
    pub fn into_source(self) -> S {
        self.source
    }

    /// Process every target in order; never fails as a whole
    pub async fn run(&self, targets: &[TargetSpec]) -> ResultSet {
        info!("Processing {} targets", targets.len());

        let mut results = ResultSet::new();
        for (index, target) in targets.iter().enumerate() {
            let outcome = self.process_target(target, index, targets.len()).await;
            results.push(outcome);
        }
        results.finish();

        info!("{}", results.summary());
        results
    }

    #[instrument(skip(self, target), fields(url = %target.url))]
    async fn process_target(&self, target: &TargetSpec, index: usize, total: usize) -> UrlOutcome {
        self.progress(&format!("Fetching {}/{} {}", index + 1, total, target.url));

        let page = match self.source.navigate(&target.url).await {
            Ok(page) => page,
            Err(e) => {
                self.progress(". Failed.\n");
                warn!("url {} failed with error {}", target.url, e);
                return UrlOutcome::failed(&target.url, e.to_string());
            }
        };

        let mut captures = Vec::new();
        let outcome = match self.extract(&page, target, &mut captures).await {
            Ok(()) => {
                let outcome = UrlOutcome::completed(&target.url, captures);
                self.progress(&format!(". Done. {}\n", outcome.summary_line()));
                outcome
            }
            Err(e) => {
                self.progress(". Failed.\n");
                warn!(
                    "url {} failed with error {} after {} captures",
                    target.url,
                    e,
                    captures.len()
                );
                // Already on disk, so keep them listed
                UrlOutcome::failed_with(&target.url, e.to_string(), captures)
            }
        };

        fail_open("page_close", || page.close()).await;
        outcome
    }

    /// All requested categories of one page, in canonical order.
    ///
    /// Entries are appended to `captures` as they are persisted, so a later
    /// failure leaves the earlier ones in place.
    async fn extract(
        &self,
        page: &S::Page,
        target: &TargetSpec,
        captures: &mut Vec<CaptureEntry>,
    ) -> Result<()> {
        for category in Category::ALL {
            if target.categories.contains(&category) {
                self.extract_category(page, category, captures).await?;
            }
        }
        Ok(())
    }

    /// A failing query aborts the page; a failing element is skipped
    async fn extract_category(
        &self,
        page: &S::Page,
        category: Category,
        captures: &mut Vec<CaptureEntry>,
    ) -> Result<()> {
        let elements = page.query(category.selector()).await?;
        debug!("Found {} {} candidates", elements.len(), category);

        for element in &elements {
            match self.capture_element(page, element, category).await {
                Ok(entries) => captures.extend(entries),
                Err(e) => warn!("Skipping {}: {}", category, e),
            }
        }
        Ok(())
    }

    async fn capture_element(
        &self,
        page: &S::Page,
        element: &<S::Page as PageSession>::Element,
        category: Category,
    ) -> Result<Vec<CaptureEntry>> {
        // Not laid out, or no intrinsic size: never reaches the resolver
        match page.measure(element).await? {
            Some(m) if !m.rect.is_degenerate() => {}
            _ => {
                trace!("Skipping unmeasurable {}", category);
                return Ok(Vec::new());
            }
        }

        let verdict = self.resolver.resolve(page, element, category).await?;
        if verdict.is_degenerate() {
            trace!("Skipping occluded {}", category);
            return Ok(Vec::new());
        }

        let records = self
            .engine
            .capture(page, element, &verdict.rect, category)
            .await;

        let mut entries = Vec::with_capacity(records.len());
        for record in &records {
            if let Some(paths) = fail_open("sink_persist", || self.sink.persist(record)).await {
                entries.push(CaptureEntry::from_record(record, paths));
            }
        }
        Ok(entries)
    }

    fn progress(&self, text: &str) {
        let Ok(mut out) = self.progress.lock() else {
            warn!("progress writer poisoned, dropping {:?}", text);
            return;
        };
        let written = out.write_all(text.as_bytes());
        if let Err(e) = written.and_then(|()| out.flush()) {
            warn!("Failed to write progress: {}", e);
        }
    }
}
