//! Run orchestration
//!
//! One [`Coordinator`] drives one invocation: for every configured site it
//! resolves the sitemaps, warms the discovered URLs and records every
//! outcome in the run log. Sites run one after another by default; in
//! concurrent mode each site writes into a private buffer and the buffers
//! are merged in configured site order once all sites are done.
//!
//! The run log is finished and flushed exactly once, after the last site.
//! Export failures are reported in the [`RunReport`] and never abort a run.

use crate::config::{Config, SiteConfig, SiteMode};
use crate::output::{
    FlushOutcome, LogFields, RecordSink, RowExporter, RunIdentity, RunLog, RunStatistics,
    WebhookExporter,
};
use crate::purge::{build_purger, CachePurger};
use crate::warmer::engine::{WarmSettings, WarmTally, WarmingEngine};
use crate::warmer::fetcher::{ProxyConnector, SiteConnector};
use crate::warmer::retry::RetryPolicy;
use crate::warmer::sitemap::SitemapResolver;
use crate::Result;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Summary of a finished run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub sheet_name: String,
    pub statistics: RunStatistics,
    /// What happened to the buffered rows at the end of the run
    pub export: FlushOutcome,
}

/// Per-site result of the pipeline
#[derive(Debug, Default, Clone, Copy)]
struct SiteOutcome {
    urls_found: usize,
    tally: WarmTally,
}

/// Everything needed to process a site, separate from the run log so both
/// can be borrowed at once
struct Pipeline {
    config: Arc<Config>,
    connector: Box<dyn SiteConnector>,
    purger: Arc<dyn CachePurger>,
}

impl Pipeline {
    async fn warm_site(&self, site: &SiteConfig, sink: &mut dyn RecordSink) -> SiteOutcome {
        tracing::info!("[{}] Starting {}", site.code, site.base_url);

        let fetcher = match self.connector.connect(site) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                tracing::warn!("[{}] Skipping site: {}", site.code, e);
                sink.log(LogFields {
                    tag: site.code.clone(),
                    url: site.base_url.clone(),
                    error: true,
                    message: e.to_string(),
                    ..LogFields::default()
                });
                return SiteOutcome::default();
            }
        };

        let warmer = &self.config.warmer;
        let resolver = SitemapResolver::new(
            fetcher.as_ref(),
            site,
            Duration::from_secs(warmer.sitemap_timeout_secs),
        );
        let urls = resolver.resolve_all().await;

        tracing::info!("[{}] Found {} URLs", site.code, urls.len());
        sink.log(LogFields::note(
            &site.code,
            format!("Found {} URLs for {}", urls.len(), site.code),
        ));

        let engine = WarmingEngine::new(
            WarmSettings::from_config(warmer),
            RetryPolicy::from_config(warmer),
            self.purger.as_ref(),
        );
        let tally = engine.warm_all(fetcher.as_ref(), &urls, site, sink).await;

        tracing::info!(
            "[{}] Done: {} warmed, {} failed, {} purges",
            site.code,
            tally.warmed_ok,
            tally.warmed_error,
            tally.purges_requested
        );

        SiteOutcome {
            urls_found: urls.len(),
            tally,
        }
    }
}

/// Drives one warming run over all configured sites
pub struct Coordinator {
    pipeline: Pipeline,
    exporter: Option<Arc<dyn RowExporter>>,
    run_log: RunLog,
}

impl Coordinator {
    /// Creates a coordinator using proxied HTTP clients and the purge and
    /// export destinations named by the config
    pub fn new(config: Config) -> Result<Self> {
        let purger = build_purger(&config);
        let exporter = WebhookExporter::from_config(&config)?
            .map(|exporter| Arc::new(exporter) as Arc<dyn RowExporter>);
        Ok(Self::with_parts(
            Arc::new(config),
            Box::new(ProxyConnector),
            purger,
            exporter,
        ))
    }

    /// Creates a coordinator from explicit collaborators
    pub fn with_parts(
        config: Arc<Config>,
        connector: Box<dyn SiteConnector>,
        purger: Arc<dyn CachePurger>,
        exporter: Option<Arc<dyn RowExporter>>,
    ) -> Self {
        let (offset, label) = config.run_label();
        let run_log = RunLog::new(RunIdentity::new(offset, &label));
        Self {
            pipeline: Pipeline {
                config,
                connector,
                purger,
            },
            exporter,
            run_log,
        }
    }

    pub fn run_log(&self) -> &RunLog {
        &self.run_log
    }

    /// Processes every site, then finishes and flushes the run log once
    pub async fn run(&mut self) -> RunReport {
        let config = Arc::clone(&self.pipeline.config);
        let identity = self.run_log.identity().clone();
        tracing::info!(
            "Run {} started ({} sites, {} mode, purge {})",
            identity.sheet_name,
            config.sites.len(),
            match config.warmer.site_mode {
                SiteMode::Sequential => "sequential",
                SiteMode::Concurrent => "concurrent",
            },
            if self.pipeline.purger.is_enabled() {
                "enabled"
            } else {
                "disabled"
            }
        );

        let mut statistics = RunStatistics::default();

        match config.warmer.site_mode {
            SiteMode::Sequential => {
                for site in &config.sites {
                    let outcome = self.pipeline.warm_site(site, &mut self.run_log).await;
                    statistics.record_site(outcome.urls_found, &outcome.tally);
                }
            }
            SiteMode::Concurrent => {
                let pipeline = &self.pipeline;
                let per_site = join_all(config.sites.iter().map(|site| async move {
                    let mut buffer: Vec<LogFields> = Vec::new();
                    let outcome = pipeline.warm_site(site, &mut buffer).await;
                    (outcome, buffer)
                }))
                .await;

                for (outcome, buffer) in per_site {
                    statistics.record_site(outcome.urls_found, &outcome.tally);
                    for fields in buffer {
                        self.run_log.log(fields);
                    }
                }
            }
        }

        statistics.rows_logged = self.run_log.len();
        self.run_log.set_finished();
        let export = self.run_log.flush(self.exporter.as_deref()).await;
        statistics.record_export(&export);

        tracing::info!(
            "Run {} finished: {} URLs warmed, {} failed",
            identity.sheet_name,
            statistics.warmed_ok,
            statistics.warmed_error
        );

        RunReport {
            run_id: identity.run_id,
            sheet_name: identity.sheet_name,
            statistics,
            export,
        }
    }
}
