use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use tokio::time::timeout;

use crate::{
    ai::GeminiClient,
    config::AppConfig,
    db::{self, NullScoreCache, ScoreCache, SqliteScoreCache},
    infrastructure::{directories::ResolvedPaths, settings::FileSettings, shutdown::Shutdown},
    page::{ExtractionStrategy, HtmlDocument},
    tasks::{
        extractor::{CandidateLimits, Extractor},
        pipeline::Pipeline,
        scheduler::Scheduler,
    },
};

pub struct ScannerApp {
    pipeline: Pipeline<HtmlDocument>,
    scheduler: Scheduler,
    shutdown: Shutdown,
}

impl ScannerApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        if config.pipeline.scan_interval >= config.pipeline.drain_interval {
            tracing::warn!(
                target: "config",
                scan = ?config.pipeline.scan_interval,
                drain = ?config.pipeline.drain_interval,
                "scan interval is not shorter than drain interval; batches will stay small"
            );
        }

        let cache = open_cache(&paths).await;

        let http_client = Client::builder()
            .user_agent(format!("comment-scanner/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let classifier = Arc::new(GeminiClient::new(http_client, config.gemini.clone()));

        let settings = Arc::new(FileSettings::new(
            &paths.settings_path,
            config.gemini.api_key.clone(),
        ));

        let document = HtmlDocument::from_file(&config.page_snapshot_path)?;
        let extractor = Extractor::new(
            ExtractionStrategy::v1(),
            CandidateLimits {
                max_identity_len: config.pipeline.max_identity_len,
                min_content_len: config.pipeline.min_content_len,
            },
        );

        let pipeline = Pipeline::new(document, extractor, cache, classifier, settings)
            .with_requeue_failed(config.pipeline.requeue_failed);

        let scheduler = Scheduler {
            scan_interval: config.pipeline.scan_interval,
            drain_interval: config.pipeline.drain_interval,
            batch_size: config.pipeline.batch_size,
        };

        tracing::info!(
            target: "lifecycle",
            page = %config.page_snapshot_path.display(),
            settings = %paths.settings_path.display(),
            model = %config.gemini.model,
            requeue_failed = config.pipeline.requeue_failed,
            "scanner initialized"
        );

        Ok(Self {
            pipeline,
            scheduler,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let ScannerApp {
            pipeline,
            scheduler,
            shutdown,
        } = self;

        tracing::info!(target: "lifecycle", "comment scanner started");
        scheduler.run(&pipeline, shutdown.subscribe()).await;

        let annotated = pipeline.with_document(|doc| doc.annotations().count());
        tracing::info!(
            target: "lifecycle",
            scans = pipeline.scan_count(),
            drains = pipeline.drain_count(),
            pending = pipeline.snapshot().pending,
            annotated,
            "shutting down"
        );

        let shutdown_timeout = Duration::from_secs(5);
        if timeout(shutdown_timeout, pipeline.cache().close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "cache did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!(target: "lifecycle", "comment scanner stopped");
        Ok(())
    }
}

async fn open_cache(paths: &ResolvedPaths) -> Arc<dyn ScoreCache> {
    match db::init_pool(&paths.db_path).await {
        Ok(pool) => {
            tracing::info!(target: "db", path = %paths.db_path.display(), "score cache ready");
            Arc::new(SqliteScoreCache::new(pool))
        }
        Err(err) => {
            tracing::error!(
                target: "db",
                error = %err,
                path = %paths.db_path.display(),
                "score cache unavailable; every comment will be classified on sight"
            );
            Arc::new(NullScoreCache)
        }
    }
}
