use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use gray_matter::{engine::YAML, Matter};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::ContentError;
use crate::models::{FrontMatter, Post, PostField};

/// Read-only access to the blog's posts.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every post, newest first, with only `fields` populated.
    async fn all_posts(&self, fields: &[PostField]) -> Result<Vec<Post>, ContentError>;

    /// The post stored under `slug`, or `None` when there is no such post.
    async fn post_by_slug(
        &self,
        slug: &str,
        fields: &[PostField],
    ) -> Result<Option<Post>, ContentError>;
}

pub type SharedContentStore = Arc<dyn ContentStore>;

/// Posts stored as `<slug>.md` files with YAML front matter.
pub struct FileContentStore {
    posts_dir: PathBuf,
}

impl FileContentStore {
    pub fn new(posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
        }
    }

    async fn read_post(
        &self,
        path: &Path,
        slug: &str,
        fields: &[PostField],
    ) -> Result<Post, ContentError> {
        let file_content = fs::read_to_string(path).await.map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_post(path, slug, &file_content, fields)
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    async fn all_posts(&self, fields: &[PostField]) -> Result<Vec<Post>, ContentError> {
        let io_error = |source| ContentError::Io {
            path: self.posts_dir.clone(),
            source,
        };

        let mut posts = Vec::new();
        let mut entries = fs::read_dir(&self.posts_dir).await.map_err(io_error)?;

        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "md") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!("Skipping post with non UTF-8 file name: {}", path.display());
                continue;
            };
            if !is_safe_slug(slug) {
                continue;
            }
            match self.read_post(&path, slug, &PostField::ALL).await {
                Ok(post) => posts.push(post),
                Err(e @ ContentError::FrontMatter { .. }) => {
                    warn!("Skipping post {}: {}", slug, e);
                }
                Err(e) => return Err(e),
            }
        }

        // Newest first. Dates compare as strings, so ISO 8601 sorts correctly.
        // Sorting happens before projection since `date` may not be requested.
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        for post in &mut posts {
            project(post, fields);
        }
        debug!("Loaded {} posts from {}", posts.len(), self.posts_dir.display());
        Ok(posts)
    }

    async fn post_by_slug(
        &self,
        slug: &str,
        fields: &[PostField],
    ) -> Result<Option<Post>, ContentError> {
        if !is_safe_slug(slug) {
            debug!("Rejecting unsafe slug {:?}", slug);
            return Ok(None);
        }

        let path = self.posts_dir.join(format!("{}.md", slug));
        match self.read_post(&path, slug, fields).await {
            Ok(post) => Ok(Some(post)),
            Err(ContentError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// Slugs become file names, so anything that could leave the posts directory
// never matches.
fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.starts_with('.') && !slug.contains(['/', '\\', '\0'])
}

fn parse_post(
    path: &Path,
    slug: &str,
    file_content: &str,
    fields: &[PostField],
) -> Result<Post, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed = matter
        .parse::<FrontMatter>(file_content)
        .map_err(|e| ContentError::FrontMatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let front_matter = parsed.data.unwrap_or_default();

    let mut post = Post {
        title: front_matter.title,
        excerpt: front_matter.excerpt,
        date: front_matter.date,
        slug: Some(slug.to_string()),
        author: front_matter.author,
        content: Some(parsed.content),
        og_image: front_matter.og_image,
        cover_image: front_matter.cover_image,
    };
    project(&mut post, fields);
    Ok(post)
}

fn project(post: &mut Post, fields: &[PostField]) {
    let keep = |field| fields.contains(&field);
    if !keep(PostField::Title) {
        post.title = None;
    }
    if !keep(PostField::Excerpt) {
        post.excerpt = None;
    }
    if !keep(PostField::Date) {
        post.date = None;
    }
    if !keep(PostField::Slug) {
        post.slug = None;
    }
    if !keep(PostField::Author) {
        post.author = None;
    }
    if !keep(PostField::Content) {
        post.content = None;
    }
    if !keep(PostField::OgImage) {
        post.og_image = None;
    }
    if !keep(PostField::CoverImage) {
        post.cover_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "---
title: Hello World
excerpt: The first post.
date: '2020-03-16T05:35:07.322Z'
author:
  name: Tim Neutkens
  picture: /static/authors/tim.jpeg
coverImage: /static/hello/cover.jpg
ogImage:
  url: /static/hello/cover.jpg
  width: 1200
---
Welcome to **the blog**.
";

    const DYNAMIC: &str = "---
title: Dynamic Routing
date: '2020-03-18T05:35:07.322Z'
---
Routes are generated per slug.
";

    fn store_with(posts: &[(&str, &str)]) -> (tempfile::TempDir, FileContentStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in posts {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let store = FileContentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn lists_one_post_per_markdown_file_newest_first() {
        let (_dir, store) = store_with(&[
            ("hello-world.md", HELLO),
            ("dynamic-routing.md", DYNAMIC),
            ("notes.txt", "not a post"),
            (".#hello-world.md", "editor lock file"),
        ]);

        let posts = store.all_posts(&PostField::ALL).await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_deref().unwrap()).collect();
        assert_eq!(slugs, ["dynamic-routing", "hello-world"]);
    }

    #[tokio::test]
    async fn numeric_and_boolean_front_matter_become_strings() {
        let (_dir, store) = store_with(&[(
            "year.md",
            "---\ntitle: 1984\nexcerpt: true\ndate: 2020\ncoverImage: 42\n---\nBig Brother.\n",
        )]);

        let post = store
            .post_by_slug("year", &PostField::ALL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.title.as_deref(), Some("1984"));
        assert_eq!(post.excerpt.as_deref(), Some("true"));
        assert_eq!(post.date.as_deref(), Some("2020"));
        assert_eq!(post.cover_image.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn unparseable_post_is_skipped_in_listing() {
        let (_dir, store) = store_with(&[
            ("hello-world.md", HELLO),
            ("year.md", "---\ntitle: 1984\n---\nStill listed.\n"),
            ("broken.md", "---\nauthor: just a name\n---\nBody.\n"),
        ]);

        let posts = store.all_posts(&PostField::ALL).await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_deref().unwrap()).collect();
        assert_eq!(slugs, ["hello-world", "year"]);

        let err = store.post_by_slug("broken", &PostField::ALL).await.unwrap_err();
        assert!(matches!(err, ContentError::FrontMatter { .. }));
    }

    #[tokio::test]
    async fn empty_directory_has_no_posts() {
        let (_dir, store) = store_with(&[]);
        assert!(store.all_posts(&PostField::ALL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let store = FileContentStore::new("/definitely/not/here");
        let err = store.all_posts(&PostField::ALL).await.unwrap_err();
        assert!(matches!(err, ContentError::Io { .. }));
    }

    #[tokio::test]
    async fn post_by_slug_reads_front_matter_and_body() {
        let (_dir, store) = store_with(&[("hello-world.md", HELLO)]);

        let post = store
            .post_by_slug("hello-world", &PostField::ALL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.slug.as_deref(), Some("hello-world"));
        assert_eq!(post.title.as_deref(), Some("Hello World"));
        assert_eq!(post.date.as_deref(), Some("2020-03-16T05:35:07.322Z"));
        assert_eq!(post.author.unwrap().name.as_deref(), Some("Tim Neutkens"));
        assert_eq!(post.og_image.unwrap().width.as_deref(), Some("1200"));
        assert!(post.content.unwrap().contains("Welcome to **the blog**."));
    }

    #[tokio::test]
    async fn projection_leaves_unrequested_fields_empty() {
        let (_dir, store) = store_with(&[("hello-world.md", HELLO)]);

        let post = store
            .post_by_slug("hello-world", &[PostField::Title, PostField::Slug])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.title.as_deref(), Some("Hello World"));
        assert!(post.content.is_none());
        assert!(post.author.is_none());
        assert!(post.cover_image.is_none());
    }

    #[tokio::test]
    async fn unknown_and_unsafe_slugs_are_not_found() {
        let (dir, store) = store_with(&[("hello-world.md", HELLO)]);
        std::fs::write(dir.path().join(".hidden.md"), HELLO).unwrap();

        for slug in ["missing", "", "../hello-world", ".hidden", "a/b", "foo\"bar"] {
            let post = store.post_by_slug(slug, &PostField::ALL).await.unwrap();
            assert!(post.is_none(), "slug {:?} should not resolve", slug);
        }
    }

    #[tokio::test]
    async fn post_without_front_matter_is_all_body() {
        let (_dir, store) = store_with(&[("plain.md", "Just text.\n")]);

        let post = store
            .post_by_slug("plain", &PostField::ALL)
            .await
            .unwrap()
            .unwrap();
        assert!(post.title.is_none());
        assert_eq!(post.content.as_deref().map(str::trim), Some("Just text."));
    }
}
