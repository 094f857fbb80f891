//! Schema implementations for every content kind.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use unicode_segmentation::UnicodeSegmentation;

use crate::markup::text::bullet_lines;
use crate::models::{
    About, Author, Category, ContentKind, CtaButton, EmailContact, Hero, ImageRef, Post, Project,
    Service, SocialLink, SyncOptions, SyncRecord, Testimonial, WorkExperience,
};
use crate::notion::block::plain_text;
use crate::notion::{Block, BlockKind, CollectionQuery, PageDecoder, QueryFilter, QuerySort};
use crate::pipeline::hierarchy::{build_tree, validate};
use crate::pipeline::schema::{
    ContentSchema, ImageSlot, ViewContext, WithId, mdx_document, most_recent,
};
use crate::storage::Document;
use crate::utils::url::slugify;

const WORDS_PER_MINUTE: usize = 200;

/// `"N min read"` for a body of text, at least one minute.
pub fn reading_time(text: &str) -> String {
    let words = text.unicode_words().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{} min read", minutes)
}

/// Plain text of a whole block tree.
fn body_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn to_value<T: serde::Serialize>(value: T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            log::error!("Could not serialize view: {}", e);
            None
        }
    }
}

fn slug_or_title(decoder: &mut PageDecoder<'_>, title: &str) -> String {
    decoder
        .text_opt("slug")
        .map(|s| slugify(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(title))
}

fn opt_slot<'a>(
    value: &'a mut Option<String>,
    slot: fn(&'a mut String) -> ImageSlot<'a>,
) -> Option<ImageSlot<'a>> {
    value.as_mut().filter(|v| !v.is_empty()).map(slot)
}

// --- Posts ---

impl ContentSchema for Post {
    const KIND: ContentKind = ContentKind::Post;
    const HAS_BODY: bool = true;

    fn query(collection_id: &str, options: &SyncOptions) -> CollectionQuery {
        let query = CollectionQuery::new(collection_id);
        if options.published_only {
            query.filter(QueryFilter::published())
        } else {
            query
        }
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        let page = d.page();
        let title = d.text("title", "Untitled Post");
        Post {
            slug: slug_or_title(d, &title),
            description: d.text_opt("description").unwrap_or_default(),
            tags: d.multi_select("tags"),
            cover: page.cover_url(),
            status: d.select("status", "draft"),
            publish_date: d.date_start("publish_date"),
            created_time: page.created_time.clone(),
            last_edited_time: page.last_edited_time.clone(),
            reading_time: reading_time(""),
            content: String::new(),
            title,
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        opt_slot(&mut self.cover, ImageSlot::cover).into_iter().collect()
    }

    fn attach_body(&mut self, blocks: &[Block], markup: String) {
        self.reading_time = reading_time(&body_text(blocks));
        self.content = markup;
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut posts: Vec<&SyncRecord<Post>> = records.iter().collect();
        posts.sort_by(|a, b| {
            let date = |r: &SyncRecord<Post>| {
                r.payload
                    .publish_date
                    .clone()
                    .unwrap_or_else(|| r.payload.created_time.clone())
            };
            date(b).cmp(&date(a)).then(a.id.cmp(&b.id))
        });
        // The body lives in the MDX documents.
        let summaries: Vec<Value> = posts
            .into_iter()
            .filter_map(|r| {
                let mut value = to_value(WithId::from(r))?;
                if let Some(obj) = value.as_object_mut() {
                    obj.remove("content");
                }
                Some(value)
            })
            .collect();
        Some(Value::Array(summaries))
    }

    fn documents(records: &[SyncRecord<Self>]) -> Vec<Document> {
        records
            .iter()
            .filter(|r| !r.payload.content.trim().is_empty())
            .map(|r| {
                let p = &r.payload;
                let header = [
                    ("layout", json!("../../layouts/PostLayout.astro")),
                    ("id", json!(r.id)),
                    ("slug", json!(p.slug)),
                    ("title", json!(p.title)),
                    ("cover", json!(p.cover.clone().unwrap_or_default())),
                    ("tags", json!(p.tags)),
                    ("created_time", json!(p.created_time)),
                    ("last_edited_time", json!(p.last_edited_time)),
                    ("status", json!(p.status)),
                    (
                        "publish_date",
                        p.publish_date.as_ref().map_or(json!(false), |d| json!(d)),
                    ),
                    ("description", json!(p.description)),
                    ("reading_time", json!(p.reading_time)),
                ];
                Document::new(
                    format!("posts/{}.mdx", p.slug),
                    mdx_document(&header, &p.content),
                )
            })
            .collect()
    }
}

// --- Projects ---

impl ContentSchema for Project {
    const KIND: ContentKind = ContentKind::Project;
    const HAS_BODY: bool = true;

    fn query(collection_id: &str, _: &SyncOptions) -> CollectionQuery {
        CollectionQuery::new(collection_id).sort(QuerySort::ascending("order"))
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        let page = d.page();
        let title = d.text("title", "Untitled Project");
        Project {
            slug: slug_or_title(d, &title),
            description: d.text_opt("description").unwrap_or_default(),
            tags: d.multi_select("tags"),
            cover_image: page.cover_url().or_else(|| d.file_url("coverImage")),
            url: d.text_opt("url"),
            featured: d.checkbox("featured", false),
            order: d.number("order", 0),
            created_time: page.created_time.clone(),
            last_edited_time: page.last_edited_time.clone(),
            content: String::new(),
            title,
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        opt_slot(&mut self.cover_image, ImageSlot::cover).into_iter().collect()
    }

    fn attach_body(&mut self, _blocks: &[Block], markup: String) {
        self.content = markup;
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut projects: Vec<&SyncRecord<Project>> = records.iter().collect();
        projects.sort_by(|a, b| {
            (a.payload.order, &a.payload.title, &a.id).cmp(&(b.payload.order, &b.payload.title, &b.id))
        });
        to_value(projects.into_iter().map(WithId::from).collect::<Vec<_>>())
    }

    fn documents(records: &[SyncRecord<Self>]) -> Vec<Document> {
        records
            .iter()
            .filter(|r| !r.payload.content.trim().is_empty())
            .map(|r| {
                let p = &r.payload;
                let header = [
                    ("layout", json!("../../layouts/ProjectLayout.astro")),
                    ("id", json!(r.id)),
                    ("slug", json!(p.slug)),
                    ("title", json!(p.title)),
                    ("cover", json!(p.cover_image.clone().unwrap_or_default())),
                    ("tags", json!(p.tags)),
                    ("created_time", json!(p.created_time)),
                    ("last_edited_time", json!(p.last_edited_time)),
                    ("url", json!(p.url.clone().unwrap_or_default())),
                    ("featured", json!(p.featured)),
                    ("order", json!(p.order)),
                    ("status", json!("published")),
                    ("publish_date", json!(p.created_time)),
                    ("description", json!(p.description)),
                ];
                Document::new(
                    format!("projects/{}.mdx", p.slug),
                    mdx_document(&header, &p.content),
                )
            })
            .collect()
    }
}

// --- Services ---

impl ContentSchema for Service {
    const KIND: ContentKind = ContentKind::Service;

    fn query(collection_id: &str, _: &SyncOptions) -> CollectionQuery {
        CollectionQuery::new(collection_id).sort(QuerySort::ascending("order"))
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        Service {
            category: d.select("category", "Uncategorized"),
            category_icon: d.text_opt("categoryIcon").unwrap_or_default(),
            title: d.text("title", "Untitled Service"),
            description: d.text_opt("description").unwrap_or_default(),
            icon: d.text_opt("icon").unwrap_or_default(),
            url: d.text_opt("url"),
            order: d.number("order", 0),
        }
    }

    /// `[{ name, icon, items: [...] }]`, categories in order of their
    /// lowest-ordered item.
    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut services: Vec<&SyncRecord<Service>> = records.iter().collect();
        services.sort_by(|a, b| {
            (a.payload.order, &a.payload.title, &a.id).cmp(&(b.payload.order, &b.payload.title, &b.id))
        });

        let mut groups: Vec<(String, String, Vec<Value>)> = Vec::new();
        for record in services {
            let s = &record.payload;
            let item = json!({
                "title": s.title,
                "description": s.description,
                "icon": s.icon,
                "url": s.url.clone().unwrap_or_default(),
                "order": s.order,
            });
            match groups.iter_mut().find(|(name, _, _)| *name == s.category) {
                Some((_, icon, items)) => {
                    if icon.is_empty() {
                        icon.clone_from(&s.category_icon);
                    }
                    items.push(item);
                }
                None => groups.push((s.category.clone(), s.category_icon.clone(), vec![item])),
            }
        }

        Some(Value::Array(
            groups
                .into_iter()
                .map(|(name, icon, items)| json!({ "name": name, "icon": icon, "items": items }))
                .collect(),
        ))
    }
}

// --- Testimonials ---

impl ContentSchema for Testimonial {
    const KIND: ContentKind = ContentKind::Testimonial;

    fn query(collection_id: &str, _: &SyncOptions) -> CollectionQuery {
        CollectionQuery::new(collection_id).sort(QuerySort::ascending("order"))
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        Testimonial {
            name: d.text("name", "Anonymous"),
            title: d.text_any(&["position", "title"], ""),
            company: d.text_any(&["company", "organization"], ""),
            quote: d.text("quote", ""),
            avatar: d.file_url("avatar"),
            featured: d.checkbox("featured", false),
            order: d.number("order", 0),
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        opt_slot(&mut self.avatar, ImageSlot::new).into_iter().collect()
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut items: Vec<&SyncRecord<Testimonial>> = records.iter().collect();
        items.sort_by(|a, b| (a.payload.order, &a.id).cmp(&(b.payload.order, &b.id)));
        to_value(items.into_iter().map(WithId::from).collect::<Vec<_>>())
    }
}

// --- Hero ---

impl ContentSchema for Hero {
    const KIND: ContentKind = ContentKind::Hero;
    const HAS_BODY: bool = true;

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        Hero {
            title: d.text("title", ""),
            subtitle: d.text_opt("subtitle").unwrap_or_default(),
            description: d.text_opt("introParagraph").unwrap_or_default(),
            cta_button: CtaButton {
                text: d.text("ctaTitle", "Learn More"),
                url: d.text("ctaLink", "#"),
                target: "_blank".into(),
            },
            secondary_cta_button: CtaButton {
                text: d.text_opt("CTA Secondary Title").unwrap_or_default(),
                url: d.text_opt("secondaryCtaLink").unwrap_or_else(|| "#".into()),
                target: "_self".into(),
            },
            profile_image: ImageRef {
                src: d
                    .text_opt("imageUrl")
                    .or_else(|| d.file_url("imageUrl"))
                    .unwrap_or_default(),
                alt: d.text_opt("imageAlt").unwrap_or_else(|| "Hero Image".into()),
            },
            content: String::new(),
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        if self.profile_image.src.is_empty() {
            Vec::new()
        } else {
            vec![ImageSlot::new(&mut self.profile_image.src)]
        }
    }

    fn attach_body(&mut self, _blocks: &[Block], markup: String) {
        self.content = markup;
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        most_recent(records).and_then(|r| to_value(&r.payload))
    }
}

// --- Author ---

impl ContentSchema for Author {
    const KIND: ContentKind = ContentKind::Author;

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        Author {
            name: d.text_any(&["name", "Name", "title"], ""),
            bio: d
                .text_opt("bio")
                .or_else(|| d.text_opt("Bio"))
                .unwrap_or_default(),
            avatar: d.file_url("avatar").or_else(|| d.file_url("Avatar")),
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        opt_slot(&mut self.avatar, ImageSlot::new).into_iter().collect()
    }

    /// A one-element list, as the site expects.
    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        most_recent(records).and_then(|r| to_value([&r.payload]))
    }
}

// --- About ---

impl ContentSchema for About {
    const KIND: ContentKind = ContentKind::About;
    const HAS_BODY: bool = true;

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        let address = d.text_opt("email").unwrap_or_default();
        About {
            title: d.text("title", "About me"),
            paragraphs: Vec::new(),
            profile_image: ImageRef {
                src: d.file_url("profileImage").unwrap_or_default(),
                alt: d
                    .text_opt("profileImageAlt")
                    .unwrap_or_else(|| "Profile Image".into()),
            },
            social_links: Vec::new(),
            email: EmailContact {
                label: d.text_opt("emailLabel").unwrap_or_else(|| address.clone()),
                address,
            },
            content: String::new(),
        }
    }

    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        if self.profile_image.src.is_empty() {
            Vec::new()
        } else {
            vec![ImageSlot::new(&mut self.profile_image.src)]
        }
    }

    fn attach_body(&mut self, blocks: &[Block], markup: String) {
        self.paragraphs = blocks
            .iter()
            .filter_map(|b| match &b.kind {
                BlockKind::Paragraph(text) => Some(plain_text(text).trim().to_string()),
                _ => None,
            })
            .filter(|p| !p.is_empty())
            .collect();
        self.content = markup;
    }

    fn view(records: &[SyncRecord<Self>], context: &ViewContext) -> Option<Value> {
        let record = most_recent(records)?;
        let mut about = record.payload.clone();
        about.social_links = context.social_links.clone();
        to_value(&about)
    }
}

// --- Categories ---

impl ContentSchema for Category {
    const KIND: ContentKind = ContentKind::Category;

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        Category {
            name: d.text("Name", "Unnamed Category"),
            icon: d.text_opt("Icon").unwrap_or_default(),
            intro: d.text_opt("Intro").unwrap_or_default(),
            footnotes: d.text_opt("Footnotes").unwrap_or_default(),
            display_order: d.number("displayOrder", 0),
            parent: d.relation_first("ParentCategory"),
            is_top_level: d.checkbox("IsTopLevel", false),
        }
    }

    /// `{ hierarchy, flat }` after cycle and orphan repair.
    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut categories: BTreeMap<String, Category> = records
            .iter()
            .map(|r| (r.id.clone(), r.payload.clone()))
            .collect();
        let report = validate(&mut categories);
        if !report.is_clean() {
            log::warn!(
                "Category hierarchy repaired: {} cycle(s) broken, {} orphan(s) promoted",
                report.cycles_broken.len(),
                report.orphans_promoted.len()
            );
        }

        let hierarchy = build_tree(&categories);
        let mut flat: Vec<(&String, &Category)> = categories.iter().collect();
        flat.sort_by(|(a_id, a), (b_id, b)| {
            (a.display_order, &a.name, a_id).cmp(&(b.display_order, &b.name, b_id))
        });
        let flat: Vec<WithId<'_, Category>> = flat
            .into_iter()
            .map(|(id, item)| WithId { id, item })
            .collect();

        Some(json!({
            "hierarchy": to_value(&hierarchy)?,
            "flat": to_value(&flat)?,
        }))
    }
}

// --- Social links ---

impl ContentSchema for SocialLink {
    const KIND: ContentKind = ContentKind::SocialLink;

    fn query(collection_id: &str, _: &SyncOptions) -> CollectionQuery {
        CollectionQuery::new(collection_id)
            .filter(QueryFilter::active())
            .sort(QuerySort::ascending("order"))
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        SocialLink {
            name: d.text("name", "Untitled Link"),
            url: d.text("url", "#"),
            icon: d.text_opt("icon").unwrap_or_default(),
            icon_type: d.select("iconType", "custom"),
            order: d.number("order", 0),
            active: d.checkbox("active", true),
        }
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        to_value(active_social_links(records))
    }
}

/// Active links ordered for display.
pub fn active_social_links(records: &[SyncRecord<SocialLink>]) -> Vec<SocialLink> {
    let mut links: Vec<&SyncRecord<SocialLink>> =
        records.iter().filter(|r| r.payload.active).collect();
    links.sort_by(|a, b| (a.payload.order, &a.payload.name, &a.id).cmp(&(b.payload.order, &b.payload.name, &b.id)));
    links.into_iter().map(|r| r.payload.clone()).collect()
}

// --- Work experience ---

impl ContentSchema for WorkExperience {
    const KIND: ContentKind = ContentKind::WorkExperience;
    const HAS_BODY: bool = true;

    fn query(collection_id: &str, _: &SyncOptions) -> CollectionQuery {
        CollectionQuery::new(collection_id)
            .filter(QueryFilter::active())
            .sort(QuerySort::descending("startDate"))
    }

    fn decode(d: &mut PageDecoder<'_>) -> Self {
        let start_date = d.date_start("startDate");
        let end_date = d.date_start("endDate").unwrap_or_else(|| "Present".into());
        let short = d.text_opt("Description").unwrap_or_default();
        WorkExperience {
            title: d.text("Position", "Untitled Position"),
            company: d.text("Company", ""),
            location: d.text_opt("Location").unwrap_or_default(),
            period: format!("{} - {}", start_date.clone().unwrap_or_default(), end_date),
            start_date,
            end_date,
            employment_type: d.select("employmentType", ""),
            skills: d.multi_select("keySkills").into_iter().map(|t| t.name).collect(),
            description: if short.trim().is_empty() { Vec::new() } else { vec![short] },
        }
    }

    /// Bullet lines from the body replace the short description.
    fn attach_body(&mut self, blocks: &[Block], _markup: String) {
        let bullets: Vec<String> = blocks
            .iter()
            .flat_map(|b| match &b.kind {
                BlockKind::Paragraph(text) if plain_text(text).contains('•') => {
                    bullet_lines(&plain_text(text))
                }
                BlockKind::BulletedListItem(text) => bullet_lines(&plain_text(text)),
                _ => Vec::new(),
            })
            .collect();
        if !bullets.is_empty() {
            self.description = bullets;
        }
    }

    fn view(records: &[SyncRecord<Self>], _: &ViewContext) -> Option<Value> {
        let mut jobs: Vec<&SyncRecord<WorkExperience>> = records.iter().collect();
        jobs.sort_by(|a, b| {
            b.payload
                .start_date
                .cmp(&a.payload.start_date)
                .then(a.id.cmp(&b.id))
        });
        to_value(jobs.into_iter().map(WithId::from).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::{DefaultReason, Page, RichText};

    fn page(properties: Value) -> Page {
        serde_json::from_value(json!({
            "id": "page-1",
            "created_time": "2024-01-01T00:00:00.000Z",
            "last_edited_time": "2024-05-02T10:00:00.000Z",
            "properties": properties
        }))
        .unwrap()
    }

    fn title(text: &str) -> Value {
        json!({ "type": "title", "title": [{ "plain_text": text }] })
    }

    fn rich(text: &str) -> Value {
        json!({ "type": "rich_text", "rich_text": [{ "plain_text": text }] })
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(""), "1 min read");
        assert_eq!(reading_time(&"word ".repeat(200)), "1 min read");
        assert_eq!(reading_time(&"word ".repeat(201)), "2 min read");
    }

    #[test]
    fn project_defaults_when_fields_are_missing() {
        let page = page(json!({ "order": { "type": "number", "number": "x" } }));
        let mut d = PageDecoder::new(&page);
        let project = Project::decode(&mut d);

        assert_eq!(project.title, "Untitled Project");
        assert_eq!(project.slug, "untitled-project");
        assert_eq!(project.order, 0);
        assert!(!project.featured);
        assert!(d.defaulted().contains(&("order".to_string(), DefaultReason::WrongType)));
        assert!(d.defaulted().contains(&("title".to_string(), DefaultReason::Missing)));
    }

    #[test]
    fn project_document_has_header_and_body() {
        let page = page(json!({
            "title": title("Demo \"One\""),
            "slug": rich("demo"),
            "featured": { "type": "checkbox", "checkbox": true },
            "order": { "type": "number", "number": 2 }
        }));
        let mut project = Project::decode(&mut PageDecoder::new(&page));
        project.attach_body(&[], "<p>Hello</p>".into());
        let record = SyncRecord::new("page-1", ContentKind::Project, &page.last_edited_time, project);

        let docs = Project::documents(std::slice::from_ref(&record));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, std::path::PathBuf::from("projects/demo.mdx"));
        let text = &docs[0].contents;
        assert!(text.starts_with("---\nlayout: \"../../layouts/ProjectLayout.astro\"\nid: \"page-1\"\n"));
        assert!(text.contains("title: \"Demo \\\"One\\\"\"\n"));
        assert!(text.contains("featured: true\norder: 2\n"));
        assert!(text.ends_with("import Image from '../../components/Image.astro';\n\n<p>Hello</p>\n"));
    }

    #[test]
    fn slugs_from_the_source_stay_inside_the_pages_tree() {
        let page = page(json!({
            "title": title("Escape"),
            "slug": rich("../../Escaped Slug")
        }));
        let post = Post::decode(&mut PageDecoder::new(&page));
        assert_eq!(post.slug, "escaped-slug");

        let page = page_with_slug("/../");
        let project = Project::decode(&mut PageDecoder::new(&page));
        assert_eq!(project.slug, "fallback-title");
    }

    fn page_with_slug(slug: &str) -> Page {
        page(json!({ "title": title("Fallback Title"), "slug": rich(slug) }))
    }

    #[test]
    fn author_accepts_capitalised_properties() {
        let page = page(json!({
            "Name": title("Grace"),
            "Bio": rich("Compiler pioneer"),
            "Avatar": { "type": "files", "files": [
                { "type": "file", "file": { "url": "https://files.example/grace.png" } }
            ]}
        }));
        let author = Author::decode(&mut PageDecoder::new(&page));
        assert_eq!(author.name, "Grace");
        assert_eq!(author.bio, "Compiler pioneer");
        assert_eq!(author.avatar.as_deref(), Some("https://files.example/grace.png"));
    }

    #[test]
    fn covers_and_avatars_get_their_own_slot_kind() {
        let page = page(json!({
            "title": title("Demo"),
            "coverImage": { "type": "files", "files": [
                { "type": "external", "external": { "url": "https://files.example/cover.png" } }
            ]}
        }));
        let mut project = Project::decode(&mut PageDecoder::new(&page));
        let slots = project.image_slots();
        assert_eq!(slots.len(), 1);
        assert!(slots[0].is_cover);
        assert_eq!(slots[0].url.as_str(), "https://files.example/cover.png");

        let mut author = Author::decode(&mut PageDecoder::new(&page));
        assert!(author.image_slots().is_empty());
        author.avatar = Some("https://files.example/grace.png".into());
        let slots = author.image_slots();
        assert_eq!(slots.len(), 1);
        assert!(!slots[0].is_cover);
    }

    #[test]
    fn testimonial_falls_back_across_property_names() {
        let page = page(json!({
            "name": rich("Ada"),
            "organization": rich("Analytical Engines"),
            "quote": title("Great work")
        }));
        let t = Testimonial::decode(&mut PageDecoder::new(&page));
        assert_eq!(t.name, "Ada");
        assert_eq!(t.company, "Analytical Engines");
        assert_eq!(t.title, "");
        assert_eq!(t.quote, "Great work");
    }

    #[test]
    fn services_group_by_category() {
        let service = |category: &str, title: &str, order: i64| Service {
            category: category.into(),
            category_icon: format!("{}-icon", category),
            title: title.into(),
            description: String::new(),
            icon: String::new(),
            url: None,
            order,
        };
        let records = vec![
            SyncRecord::new("1", ContentKind::Service, "t", service("Build", "Apps", 2)),
            SyncRecord::new("2", ContentKind::Service, "t", service("Advise", "Audits", 1)),
            SyncRecord::new("3", ContentKind::Service, "t", service("Build", "Sites", 0)),
        ];
        let view = Service::view(&records, &ViewContext::default()).unwrap();
        assert_eq!(view[0]["name"], "Build");
        assert_eq!(view[0]["icon"], "Build-icon");
        assert_eq!(view[0]["items"][0]["title"], "Sites");
        assert_eq!(view[0]["items"][1]["title"], "Apps");
        assert_eq!(view[1]["name"], "Advise");
    }

    #[test]
    fn work_experience_bullets_from_body() {
        let page = page(json!({
            "Position": rich("Engineer"),
            "Company": title("Acme"),
            "startDate": { "type": "date", "date": { "start": "2021-03-01" } },
            "Description": rich("Built things")
        }));
        let mut job = WorkExperience::decode(&mut PageDecoder::new(&page));
        assert_eq!(job.period, "2021-03-01 - Present");
        assert_eq!(job.description, vec!["Built things".to_string()]);

        let blocks = vec![
            Block::new("b1", BlockKind::Paragraph(vec![RichText::plain("• Led team\n• Shipped v2")])),
            Block::new("b2", BlockKind::Paragraph(vec![RichText::plain("Plain prose")])),
        ];
        job.attach_body(&blocks, String::new());
        assert_eq!(job.description, vec!["Led team".to_string(), "Shipped v2".to_string()]);
    }

    #[test]
    fn about_collects_paragraphs_and_social_links() {
        let page = page(json!({
            "title": title("Hi"),
            "email": { "type": "email", "email": "me@example.com" }
        }));
        let mut about = About::decode(&mut PageDecoder::new(&page));
        assert_eq!(about.email.label, "me@example.com");
        about.attach_body(
            &[
                Block::new("p1", BlockKind::Paragraph(vec![RichText::plain("First.")])),
                Block::new("p2", BlockKind::Paragraph(Vec::new())),
                Block::new("h", BlockKind::Heading { level: 2, text: vec![RichText::plain("Skip")] }),
            ],
            "<p>First.</p>".into(),
        );
        assert_eq!(about.paragraphs, vec!["First.".to_string()]);

        let context = ViewContext {
            social_links: vec![SocialLink {
                name: "GitHub".into(),
                url: "https://github.com/x".into(),
                icon: String::new(),
                icon_type: "custom".into(),
                order: 0,
                active: true,
            }],
        };
        let record = SyncRecord::new("page-1", ContentKind::About, "t", about);
        let view = About::view(&[record], &context).unwrap();
        assert_eq!(view["socialLinks"][0]["name"], "GitHub");
        assert_eq!(view["profileImage"]["alt"], "Profile Image");
    }

    #[test]
    fn categories_view_has_hierarchy_and_flat() {
        let cat = |name: &str, parent: Option<&str>| Category {
            name: name.into(),
            icon: String::new(),
            intro: String::new(),
            footnotes: String::new(),
            display_order: 0,
            parent: parent.map(str::to_string),
            is_top_level: parent.is_none(),
        };
        let records = vec![
            SyncRecord::new("a", ContentKind::Category, "t", cat("A", Some("b"))),
            SyncRecord::new("b", ContentKind::Category, "t", cat("B", Some("a"))),
        ];
        let view = Category::view(&records, &ViewContext::default()).unwrap();
        assert_eq!(view["flat"].as_array().unwrap().len(), 2);
        assert_eq!(view["hierarchy"].as_array().unwrap().len(), 1);
        assert_eq!(view["hierarchy"][0]["children"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn inactive_social_links_are_hidden() {
        let link = |name: &str, order: i64, active: bool| SocialLink {
            name: name.into(),
            url: "#".into(),
            icon: String::new(),
            icon_type: "custom".into(),
            order,
            active,
        };
        let records = vec![
            SyncRecord::new("1", ContentKind::SocialLink, "t", link("B", 2, true)),
            SyncRecord::new("2", ContentKind::SocialLink, "t", link("Hidden", 0, false)),
            SyncRecord::new("3", ContentKind::SocialLink, "t", link("A", 1, true)),
        ];
        let names: Vec<_> = active_social_links(&records).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
