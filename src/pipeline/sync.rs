// src/pipeline/sync.rs

//! Sync orchestration: every kind in a fixed order, then asset upkeep.

use std::time::{Duration, Instant};

use crate::error::{AppError, Result};
use crate::models::{
    About, Author, Category, ContentKind, Hero, Post, Project, Service, SocialLink, Testimonial,
    WorkExperience,
};
use crate::pipeline::context::SyncContext;
use crate::pipeline::fetch::{KindOutcome, sync_kind};
use crate::pipeline::images::SweepReport;
use crate::utils::log as report;

/// What a run should cover.
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    /// Ignore checkpoints and refetch everything
    pub force: bool,
    /// Restrict the run to these kinds; empty means all
    pub only: Vec<ContentKind>,
}

impl SyncRequest {
    /// Kinds to visit, in sync order.
    pub fn kinds(&self) -> Vec<ContentKind> {
        ContentKind::SYNC_ORDER
            .into_iter()
            .filter(|k| self.only.is_empty() || self.only.contains(k))
            .collect()
    }

    fn is_full(&self) -> bool {
        self.kinds().len() == ContentKind::SYNC_ORDER.len()
    }
}

/// Result of one kind's step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub kind: ContentKind,
    pub outcome: Option<KindOutcome>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl StepResult {
    pub fn success(&self) -> bool {
        self.error.is_none() && self.outcome.as_ref().is_some_and(|o| o.failed == 0)
    }
}

/// Everything a run did.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub steps: Vec<StepResult>,
    pub uploads: usize,
    pub sweep: Option<SweepReport>,
    pub asset_error: Option<String>,
}

impl SyncSummary {
    pub fn succeeded(&self) -> bool {
        self.asset_error.is_none() && self.steps.iter().all(StepResult::success)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.success())
    }

    /// Emit the end-of-run report.
    pub fn log(&self) {
        let mut items: Vec<(&str, String)> = self
            .steps
            .iter()
            .map(|step| {
                let line = match (&step.outcome, &step.error) {
                    (_, Some(e)) => format!("FAILED ({})", e),
                    (Some(o), None) if o.unconfigured => "not configured".to_string(),
                    (Some(o), None) => format!(
                        "{} fetched, {} updated, {} unchanged, {} failed ({:.1}s)",
                        o.fetched,
                        o.updated,
                        o.skipped,
                        o.failed,
                        step.duration.as_secs_f64()
                    ),
                    (None, None) => "skipped".to_string(),
                };
                (step.kind.as_str(), line)
            })
            .collect();
        items.push(("uploads", self.uploads.to_string()));
        if let Some(sweep) = &self.sweep {
            items.push((
                "sweep",
                format!(
                    "{} manifest entries pruned, {} local files deleted",
                    sweep.pruned_entries, sweep.deleted_files
                ),
            ));
        }
        if let Some(e) = &self.asset_error {
            items.push(("assets", format!("FAILED ({})", e)));
        }
        report::summary(
            if self.succeeded() {
                "Sync complete"
            } else {
                "Sync finished with errors"
            },
            &items,
        );
    }
}

async fn sync_one(ctx: &mut SyncContext, kind: ContentKind, force: bool) -> Result<KindOutcome> {
    match kind {
        ContentKind::Post => sync_kind::<Post>(ctx, force).await,
        ContentKind::Project => sync_kind::<Project>(ctx, force).await,
        ContentKind::Service => sync_kind::<Service>(ctx, force).await,
        ContentKind::Testimonial => sync_kind::<Testimonial>(ctx, force).await,
        ContentKind::Hero => sync_kind::<Hero>(ctx, force).await,
        ContentKind::Author => sync_kind::<Author>(ctx, force).await,
        ContentKind::About => sync_kind::<About>(ctx, force).await,
        ContentKind::Category => sync_kind::<Category>(ctx, force).await,
        ContentKind::SocialLink => sync_kind::<SocialLink>(ctx, force).await,
        ContentKind::WorkExperience => sync_kind::<WorkExperience>(ctx, force).await,
    }
}

/// Run every requested kind, then save the manifest and sweep assets.
///
/// A failing kind is recorded and the run moves on. The sweep only runs
/// after a full, clean pass.
pub async fn run_sync(ctx: &mut SyncContext, request: &SyncRequest) -> SyncSummary {
    report::header(if request.force {
        "Content sync (forced)"
    } else {
        "Content sync"
    });

    let kinds = request.kinds();
    let total = kinds.len() + 1;
    let mut summary = SyncSummary::default();

    for (i, kind) in kinds.into_iter().enumerate() {
        report::step(i + 1, total, &format!("Syncing {}", kind));
        let started = Instant::now();
        let result = sync_one(ctx, kind, request.force).await;
        if let Err(e) = &result {
            log::error!("{} sync failed: {}", kind, e);
        }
        summary.steps.push(StepResult {
            kind,
            error: result.as_ref().err().map(ToString::to_string),
            outcome: result.ok(),
            duration: started.elapsed(),
        });
    }

    report::step(total, total, "Assets");
    summary.uploads = ctx.images.uploads();
    let clean = request.is_full() && summary.steps.iter().all(StepResult::success);
    if clean {
        match ctx.images.sweep(ctx.local_assets.as_ref()).await {
            Ok(sweep) => summary.sweep = Some(sweep),
            Err(e) => {
                log::error!("Asset sweep failed: {}", e);
                summary.asset_error = Some(e.to_string());
            }
        }
    } else {
        log::info!("Skipping asset sweep after a partial or failed run");
    }
    if let Err(e) = ctx.images.save_manifest().await {
        log::error!("Saving asset manifest failed: {}", e);
        summary.asset_error.get_or_insert(e.to_string());
    }

    summary
}

/// Prune the manifest and delete local copies that exist remotely.
pub async fn sweep_assets(ctx: &mut SyncContext) -> Result<SweepReport> {
    let report = ctx.images.sweep(ctx.local_assets.as_ref()).await?;
    ctx.images.save_manifest().await?;
    Ok(report)
}

/// Outcome of copying local assets into the remote store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub failed: usize,
}

/// Copy every local asset into the configured remote store.
pub async fn migrate_assets(ctx: &SyncContext) -> Result<MigrationReport> {
    let local = ctx.local_assets.as_ref().ok_or_else(|| {
        AppError::config("migration needs storage mode s3; assets are already local")
    })?;
    let remote = ctx.images.store();

    let mut report = MigrationReport::default();
    for asset in local.list().await? {
        match local.migrate(&asset.filename, remote).await {
            Ok(Some(url)) => {
                report::sub_item(&format!("{} -> {}", asset.filename, url));
                report.migrated += 1;
            }
            Ok(None) => log::warn!("{} vanished before upload", asset.filename),
            Err(e) => {
                log::warn!("Migrating {} failed: {}", asset.filename, e);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::{Block, BlockKind, Page, RichText};
    use crate::pipeline::test_support::{FakeSource, TestEnv, png_bytes};
    use serde_json::json;

    fn project_page() -> Page {
        serde_json::from_value(json!({
            "id": "p1",
            "created_time": "2024-01-01T00:00:00.000Z",
            "last_edited_time": "2024-05-02T10:00:00.000Z",
            "properties": {
                "title": { "type": "title", "title": [{ "plain_text": "Demo" }] }
            }
        }))
        .unwrap()
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .with_pages("projects-db", vec![project_page()])
            .with_blocks(
                "p1",
                vec![
                    Block::new("b1", BlockKind::Paragraph(vec![RichText::plain("Hello")])),
                    Block::new(
                        "b2",
                        BlockKind::Image {
                            url: "https://example.com/a.png".into(),
                            caption: Vec::new(),
                        },
                    ),
                ],
            )
    }

    fn snapshot_files(env: &TestEnv) -> Vec<(String, Vec<u8>)> {
        let mut files = Vec::new();
        for dir in [env.data_dir(), env.pages_dir()] {
            let mut stack = vec![dir];
            while let Some(dir) = stack.pop() {
                for entry in std::fs::read_dir(&dir).unwrap() {
                    let path = entry.unwrap().path();
                    if path.is_dir() {
                        stack.push(path);
                    } else {
                        files.push((path.display().to_string(), std::fs::read(&path).unwrap()));
                    }
                }
            }
        }
        files.sort();
        files
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let env = TestEnv::new();
        let image = png_bytes(5, 5);

        let mut ctx = env
            .context(source())
            .with_image("https://example.com/a.png", image.clone())
            .build()
            .await;
        let first = run_sync(&mut ctx, &SyncRequest::default()).await;
        assert!(first.succeeded(), "{:?}", first);
        assert_eq!(first.uploads, 1);
        assert!(first.sweep.is_some());
        let before = snapshot_files(&env);
        assert!(before.iter().any(|(p, _)| p.ends_with("projects/demo.mdx")));

        let builder = env
            .context(source())
            .with_image("https://example.com/a.png", image);
        let downloader = builder.downloader();
        let mut ctx = builder.build().await;
        let second = run_sync(&mut ctx, &SyncRequest::default()).await;
        assert!(second.succeeded());
        assert_eq!(second.uploads, 0);
        assert_eq!(downloader.calls(), 0);
        assert_eq!(snapshot_files(&env), before);
    }

    #[tokio::test]
    async fn failing_kind_does_not_stop_the_run() {
        let env = TestEnv::new();
        let mut ctx = env
            .context(source().failing("services-db"))
            .with_collection(ContentKind::Service, "services-db")
            .build()
            .await;

        let summary = run_sync(&mut ctx, &SyncRequest::default()).await;
        assert!(!summary.succeeded());
        let failed: Vec<_> = summary.failed_steps().map(|s| s.kind).collect();
        assert_eq!(failed, vec![ContentKind::Service]);
        assert!(summary.sweep.is_none());
        assert!(env.pages_dir().join("projects/demo.mdx").exists());
    }

    #[tokio::test]
    async fn only_restricts_kinds_in_sync_order() {
        let request = SyncRequest {
            force: false,
            only: vec![ContentKind::Post, ContentKind::Service],
        };
        assert_eq!(request.kinds(), vec![ContentKind::Service, ContentKind::Post]);
        assert!(!request.is_full());

        let env = TestEnv::new();
        let mut ctx = env.context(source()).build().await;
        let summary = run_sync(&mut ctx, &request).await;
        assert_eq!(summary.steps.len(), 2);
        assert!(summary.sweep.is_none());
        assert!(!env.pages_dir().join("projects/demo.mdx").exists());
    }

    #[tokio::test]
    async fn migration_requires_remote_mode() {
        let env = TestEnv::new();
        let ctx = env.context(FakeSource::new()).build().await;
        assert!(matches!(
            migrate_assets(&ctx).await,
            Err(AppError::Config(_))
        ));
    }
}
