//! Generic collection fetcher.
//!
//! One code path serves every content kind: query the collection (filtered
//! by the last collection checkpoint unless forced), gate each page on its
//! item checkpoint, decode it through the kind's schema, fetch and convert
//! its body, route images, then persist records, view and documents.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::markup::convert;
use crate::models::{AssetCategory, ContentKind, SocialLink};
use crate::notion::{Block, BlockKind, Page, PageDecoder, QueryFilter, fetch_block_tree};
use crate::pipeline::context::SyncContext;
use crate::pipeline::kinds::active_social_links;
use crate::pipeline::schema::{ContentSchema, ViewContext};

/// Counts for one kind's pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindOutcome {
    /// Pages returned by the query
    pub fetched: usize,
    /// Pages decoded and stored this run
    pub updated: usize,
    /// Pages whose checkpoint was current
    pub skipped: usize,
    /// Pages that failed and were left for the next run
    pub failed: usize,
    /// Snapshot files and documents rewritten
    pub files_written: usize,
    /// No collection id configured
    pub unconfigured: bool,
}

/// Sync one content kind end to end.
pub async fn sync_kind<T: ContentSchema>(ctx: &mut SyncContext, force: bool) -> Result<KindOutcome> {
    let kind = T::KIND;
    if !ctx.source.is_configured() {
        log::warn!("Content source is not configured, skipping {}", kind);
        return Ok(KindOutcome {
            unconfigured: true,
            ..KindOutcome::default()
        });
    }
    let Some(collection_id) = ctx.config.collections.get(kind).map(str::to_string) else {
        log::warn!("No collection id configured for {}, skipping", kind);
        return Ok(KindOutcome {
            unconfigured: true,
            ..KindOutcome::default()
        });
    };

    let last_sync = ctx.checkpoints.collection_last_sync(kind).map(str::to_string);
    let force = force || last_sync.is_none();
    let mut query = T::query(&collection_id, &ctx.config.sync);
    if let (false, Some(since)) = (force, last_sync) {
        log::debug!("Fetching {} edited since {}", kind, since);
        query = query.filter(QueryFilter::EditedSince(since));
    }

    let pages = ctx.source.query(&query).await?;
    let mut outcome = KindOutcome {
        fetched: pages.len(),
        ..KindOutcome::default()
    };
    log::info!("{}: {} page(s) returned", kind, pages.len());

    let mut records: BTreeMap<String, _> = ctx
        .snapshots
        .load_records::<T>(kind)
        .await?
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();

    for page in pages.iter().filter(|p| !p.archived) {
        let stale = ctx
            .checkpoints
            .needs_sync(kind, &page.id, Some(&page.last_edited_time), force);
        if !stale && records.contains_key(&page.id) {
            log::debug!("{} {} is up to date", kind, page.id);
            outcome.skipped += 1;
            continue;
        }

        match process_page::<T>(ctx, page).await {
            Ok(payload) => {
                records.insert(
                    page.id.clone(),
                    crate::models::SyncRecord::new(&page.id, kind, &page.last_edited_time, payload),
                );
                ctx.checkpoints
                    .record_item_sync(kind, &page.id, &page.last_edited_time)
                    .await?;
                outcome.updated += 1;
            }
            Err(e) => {
                log::warn!("{} {} failed: {}", kind, page.id, e);
                if e.is_rate_limited() {
                    log::warn!("Rate limited by the content source");
                }
                outcome.failed += 1;
            }
        }
    }

    let records: Vec<_> = records.into_values().collect();
    if ctx.snapshots.save_records(kind, &records).await? {
        outcome.files_written += 1;
    }

    let context = view_context(ctx).await?;
    if let Some(view) = T::view(&records, &context) {
        if ctx.snapshots.write_view(kind, &view).await? {
            outcome.files_written += 1;
        }
    }
    for document in T::documents(&records) {
        if ctx.snapshots.write_document(&document).await? {
            outcome.files_written += 1;
        }
    }

    if outcome.failed == 0 {
        ctx.checkpoints
            .record_collection_sync(kind, ctx.started_at)
            .await?;
    } else {
        log::warn!(
            "{}: {} item(s) failed, collection checkpoint not advanced",
            kind,
            outcome.failed
        );
    }

    log::info!(
        "{}: {} updated, {} unchanged, {} failed",
        kind,
        outcome.updated,
        outcome.skipped,
        outcome.failed
    );
    Ok(outcome)
}

async fn view_context(ctx: &SyncContext) -> Result<ViewContext> {
    let links = ctx
        .snapshots
        .load_records::<SocialLink>(ContentKind::SocialLink)
        .await?;
    Ok(ViewContext {
        social_links: active_social_links(&links),
    })
}

/// Decode one page, fetch its body and route its images.
async fn process_page<T: ContentSchema>(ctx: &mut SyncContext, page: &Page) -> Result<T> {
    let category = T::KIND.asset_category();
    let mut decoder = PageDecoder::new(page);
    let mut payload = T::decode(&mut decoder);
    for (field, reason) in decoder.defaulted() {
        log::debug!("{} {}: field '{}' defaulted ({:?})", T::KIND, page.id, field, reason);
    }

    if T::HAS_BODY {
        let mut blocks = fetch_block_tree(ctx.source.as_ref(), &page.id).await?;
        enrich_blocks(ctx, &mut blocks, category).await;
        let markup = convert(&blocks);
        payload.attach_body(&blocks, markup);
    }

    for slot in payload.image_slots() {
        if let Some(stored) = ctx
            .images
            .process_image_url(slot.url, category, slot.is_cover)
            .await
        {
            *slot.url = stored;
        }
    }

    Ok(payload)
}

/// Store inline images and attach bookmark previews, depth first.
async fn enrich_blocks(ctx: &mut SyncContext, blocks: &mut [Block], category: AssetCategory) {
    let mut stack: Vec<&mut Block> = blocks.iter_mut().rev().collect();
    while let Some(block) = stack.pop() {
        match &mut block.kind {
            BlockKind::Image { url, .. } => {
                if let Some(stored) = ctx.images.process_image_url(url, category, false).await {
                    *url = stored;
                }
            }
            BlockKind::Bookmark { url, preview, .. } => {
                if let Some(fetcher) = &ctx.previews {
                    *preview = fetcher.fetch(url).await;
                }
            }
            _ => {}
        }
        stack.extend(block.children.iter_mut().rev());
    }
}
