//! Bounded-concurrency dispatch of per-genre units
//!
//! One unit is spawned per work item. Each unit:
//! 1. waits for an admission permit (at most `max_concurrency` are out),
//! 2. waits on the shared rate limiter,
//! 3. fetches and parses the genre's detail page,
//! 4. reconciles artist weights with the shared cache,
//! 5. sends the finished record into the funnel,
//! 6. releases its permit.
//!
//! The first unit to fail records its error and cancels the run's token.
//! Every other unit notices at its next wait (permit, limiter or funnel) and
//! returns early; a fetch already in flight is allowed to finish. The
//! dispatcher returns only after every unit has settled.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, error};
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::artist_cache::ArtistWeightCache;
use super::fetcher::PageFetcher;
use super::funnel::FunnelSender;
use super::progress::ProgressReporter;
use super::rate_limiter::RateLimiter;
use super::scrape_types::{ScrapeError, ScrapeResult};
use crate::page_parser::{Record, WorkItem, parse_detail};
use crate::utils::detail_url;

/// Keeps the first error of a run and fires cancellation when it arrives
///
/// The error is stored before the token is cancelled, so errors caused by
/// the cancellation itself can never take the first slot.
#[derive(Debug)]
pub struct ErrorCollector {
    first: Mutex<Option<ScrapeError>>,
    failures: AtomicUsize,
    cancel: CancellationToken,
}

impl ErrorCollector {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            first: Mutex::new(None),
            failures: AtomicUsize::new(0),
            cancel,
        }
    }

    /// Record a unit's error; the first one cancels the run
    pub fn record(&self, err: ScrapeError) {
        if !err.is_cancelled() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut first = self.first.lock();
        if first.is_none() {
            error!("Aborting run: {err}");
            *first = Some(err);
            drop(first);
            self.cancel.cancel();
        } else {
            debug!("Suppressed follow-up error: {err}");
        }
    }

    /// Units that failed for a reason other than cancellation
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Take the first recorded error
    pub fn take_first(&self) -> Option<ScrapeError> {
        self.first.lock().take()
    }
}

/// Counts units holding an admission permit, and the most that ever did at once
#[derive(Debug, Default)]
struct AdmissionGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

/// An admission permit; the unit counts as admitted until this is dropped
struct Admitted {
    _permit: OwnedSemaphorePermit,
    gauge: Arc<AdmissionGauge>,
}

impl Admitted {
    fn new(permit: OwnedSemaphorePermit, gauge: Arc<AdmissionGauge>) -> Self {
        let now = gauge.current.fetch_add(1, Ordering::AcqRel) + 1;
        gauge.peak.fetch_max(now, Ordering::AcqRel);
        Self {
            _permit: permit,
            gauge,
        }
    }
}

impl Drop for Admitted {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Result of a dispatch: how far it got and why it stopped
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Records handed to the funnel
    pub completed: usize,
    /// Most units past the admission gate at the same time
    pub peak_admitted: usize,
    /// Units that failed for a reason other than cancellation
    pub failures: usize,
    /// First error observed, if any
    pub first_error: Option<ScrapeError>,
}

/// Everything one unit needs, cloned per spawn
struct ScrapeUnit<F, P> {
    fetcher: Arc<F>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ArtistWeightCache>,
    progress: Arc<P>,
    admission: Arc<Semaphore>,
    gauge: Arc<AdmissionGauge>,
    funnel: FunnelSender<Record>,
    cancel: CancellationToken,
    base_url: Arc<str>,
    completed: Arc<AtomicUsize>,
    total: usize,
}

impl<F: PageFetcher, P: ProgressReporter> ScrapeUnit<F, P> {
    async fn run(self, item: WorkItem) -> ScrapeResult<()> {
        // Held until this function returns, i.e. after the funnel send
        let _admitted = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
            permit = Arc::clone(&self.admission).acquire_owned() => {
                let permit = permit.map_err(|_| ScrapeError::Cancelled)?;
                Admitted::new(permit, Arc::clone(&self.gauge))
            }
        };

        self.limiter.acquire(&self.cancel).await?;

        let url = detail_url(&self.base_url, &item.name);
        let html = self.fetcher.fetch_page(&url).await?;
        let detail = parse_detail(&html)?;

        let genre = item.name.clone();
        let record = Record::enrich(item, detail, &self.cache);
        self.funnel.send(record, &self.cancel).await?;

        let processed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.progress
            .report_item_completed(&genre, processed, self.total);
        Ok(())
    }
}

/// Bounded-concurrency executor for one run's work items
pub struct TaskDispatcher<F, P> {
    fetcher: Arc<F>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ArtistWeightCache>,
    progress: Arc<P>,
    base_url: Arc<str>,
    max_concurrency: usize,
}

impl<F: PageFetcher, P: ProgressReporter + 'static> TaskDispatcher<F, P> {
    /// Create a dispatcher admitting at most `max_concurrency` units at once (minimum 1)
    pub fn new(
        fetcher: Arc<F>,
        limiter: Arc<RateLimiter>,
        cache: Arc<ArtistWeightCache>,
        progress: Arc<P>,
        base_url: impl Into<Arc<str>>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            cache,
            progress,
            base_url: base_url.into(),
            max_concurrency: max_concurrency.max(1),
        }
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run one unit per item and wait for all of them
    ///
    /// Consumes `funnel` and closes it only after the last unit has
    /// settled, so the consumer sees every record that was sent. Records
    /// arrive in completion order, not listing order.
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        funnel: FunnelSender<Record>,
        cancel: &CancellationToken,
    ) -> DispatchOutcome {
        let total = items.len();
        let admission = Arc::new(Semaphore::new(self.max_concurrency));
        let gauge = Arc::new(AdmissionGauge::default());
        let errors = Arc::new(ErrorCollector::new(cancel.clone()));
        let completed = Arc::new(AtomicUsize::new(0));

        // Aborts any unit still running if this future is dropped
        let mut active_tasks = JoinSet::new();

        for item in items {
            let unit = ScrapeUnit {
                fetcher: Arc::clone(&self.fetcher),
                limiter: Arc::clone(&self.limiter),
                cache: Arc::clone(&self.cache),
                progress: Arc::clone(&self.progress),
                admission: Arc::clone(&admission),
                gauge: Arc::clone(&gauge),
                funnel: funnel.clone(),
                cancel: cancel.clone(),
                base_url: Arc::clone(&self.base_url),
                completed: Arc::clone(&completed),
                total,
            };
            let errors = Arc::clone(&errors);
            let progress = Arc::clone(&self.progress);

            active_tasks.spawn(async move {
                let genre = item.name.clone();
                if let Err(e) = unit.run(item).await {
                    let e = e.for_genre(&genre);
                    progress.report_item_failed(&genre, &e);
                    errors.record(e);
                }
            });
        }

        while let Some(joined) = active_tasks.join_next().await {
            if let Err(e) = joined {
                errors.record(ScrapeError::TaskPanicked(e.to_string()));
            }
        }

        funnel.close();

        DispatchOutcome {
            completed: completed.load(Ordering::Relaxed),
            peak_admitted: gauge.peak.load(Ordering::Acquire),
            failures: errors.failures(),
            first_error: errors.take_first(),
        }
    }
}
