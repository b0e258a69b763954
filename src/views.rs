//! Server-side HTML for the index and post pages.

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate};
use htmlescape::{encode_attribute, encode_minimal};

use crate::models::{Author, Post};

const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

/// Fills the layout template and, in development, injects the reload script.
pub fn render_with_layout(
    layout: &str,
    title: &str,
    head: &str,
    content: &str,
    is_development: bool,
) -> String {
    let title = encode_minimal(title);
    let mut page = fill_placeholders(
        layout,
        &[("{{ title }}", title.as_str()), ("{{ head }}", head), ("{{ content }}", content)],
    );

    if is_development {
        page = page.replace("</body>", &format!("{}</body>", HOT_RELOAD_SCRIPT));
    }

    page
}

// One pass over the template, so substituted text is never searched again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Index page body: intro, the hero post, then the remaining posts.
pub fn index_content(posts: &[Post]) -> String {
    let mut html = intro();
    if let Some((hero, more)) = posts.split_first() {
        html.push_str(&hero_post(hero));
        if !more.is_empty() {
            html.push_str(&more_stories(more));
        }
    }
    html
}

/// Single post body. `post.content` must already be HTML.
pub fn post_content(post: &Post) -> String {
    let mut html = String::from("<article class=\"post\">");
    html.push_str("<h1 class=\"post-title\">");
    html.push_str(&text(&post.title));
    html.push_str("</h1>");
    if let Some(author) = &post.author {
        html.push_str(&avatar(author));
    }
    if let Some(src) = &post.cover_image {
        html.push_str(&cover_image(&post.title, src, None));
    }
    if let Some(date) = &post.date {
        html.push_str(&format!("<div class=\"post-date\">{}</div>", date_view(date)));
    }
    html.push_str("<div class=\"post-body\">");
    html.push_str(post.content.as_deref().unwrap_or_default());
    html.push_str("</div></article>");
    html
}

/// `<head>` additions for a post page.
pub fn post_head(post: &Post) -> String {
    post.og_image
        .as_ref()
        .and_then(|image| image.url.as_deref())
        .map(|url| format!("<meta property=\"og:image\" content=\"{}\">", encode_attribute(url)))
        .unwrap_or_default()
}

pub fn not_found_content(template: &str, slug: &str) -> String {
    template.replace("{{slug}}", &encode_minimal(slug))
}

/// Standalone page for failures where no template is at hand.
pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!DOCTYPE html><html><head><title>{code}: {reason}</title></head>\
         <body><h1>{code}</h1><p>{reason}</p></body></html>",
        code = status.as_u16(),
    )
}

/// `Month D, YYYY` for RFC 3339 timestamps and plain dates, anything else verbatim.
pub fn format_date(raw: &str) -> String {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.format("%B %-d, %Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%B %-d, %Y").to_string();
    }
    raw.to_string()
}

fn intro() -> String {
    "<section class=\"intro\"><h1>Blog.</h1>\
     <h4>A statically generated blog example using Rust and GraphQL.</h4></section>"
        .to_string()
}

fn hero_post(post: &Post) -> String {
    let href = post_href(post);
    let mut html = String::from("<section class=\"hero-post\">");
    if let Some(src) = &post.cover_image {
        html.push_str(&cover_image(&post.title, src, href.as_deref()));
    }
    html.push_str(&format!("<h3>{}</h3>", link(&post.title, href.as_deref())));
    if let Some(date) = &post.date {
        html.push_str(&format!("<div class=\"post-date\">{}</div>", date_view(date)));
    }
    html.push_str(&format!("<p class=\"excerpt\">{}</p>", text(&post.excerpt)));
    if let Some(author) = &post.author {
        html.push_str(&avatar(author));
    }
    html.push_str("</section>");
    html
}

fn more_stories(posts: &[Post]) -> String {
    let mut html = String::from("<section class=\"more-stories\"><h2>More Stories</h2><div class=\"grid\">");
    for post in posts {
        html.push_str(&post_preview(post));
    }
    html.push_str("</div></section>");
    html
}

fn post_preview(post: &Post) -> String {
    let href = post_href(post);
    let mut html = String::from("<div class=\"post-preview\">");
    if let Some(src) = &post.cover_image {
        html.push_str(&cover_image(&post.title, src, href.as_deref()));
    }
    html.push_str(&format!("<h3>{}</h3>", link(&post.title, href.as_deref())));
    if let Some(date) = &post.date {
        html.push_str(&format!("<div class=\"post-date\">{}</div>", date_view(date)));
    }
    html.push_str(&format!("<p class=\"excerpt\">{}</p>", text(&post.excerpt)));
    if let Some(author) = &post.author {
        html.push_str(&avatar(author));
    }
    html.push_str("</div>");
    html
}

fn avatar(author: &Author) -> String {
    let name = text(&author.name);
    match &author.picture {
        Some(picture) => format!(
            "<div class=\"avatar\"><img src=\"{}\" alt=\"{}\"><span>{}</span></div>",
            encode_attribute(picture),
            encode_attribute(author.name.as_deref().unwrap_or_default()),
            name
        ),
        None => format!("<div class=\"avatar\"><span>{}</span></div>", name),
    }
}

fn cover_image(title: &Option<String>, src: &str, href: Option<&str>) -> String {
    let alt = format!("Cover Image for {}", title.as_deref().unwrap_or_default());
    let img = format!(
        "<img src=\"{}\" alt=\"{}\">",
        encode_attribute(src),
        encode_attribute(&alt)
    );
    match href {
        Some(href) => format!(
            "<div class=\"cover-image\"><a href=\"{}\" aria-label=\"{}\">{}</a></div>",
            encode_attribute(href),
            encode_attribute(title.as_deref().unwrap_or_default()),
            img
        ),
        None => format!("<div class=\"cover-image\">{}</div>", img),
    }
}

fn date_view(raw: &str) -> String {
    format!(
        "<time datetime=\"{}\">{}</time>",
        encode_attribute(raw),
        encode_minimal(&format_date(raw))
    )
}

fn link(title: &Option<String>, href: Option<&str>) -> String {
    match href {
        Some(href) => format!("<a href=\"{}\">{}</a>", encode_attribute(href), text(title)),
        None => text(title),
    }
}

fn post_href(post: &Post) -> Option<String> {
    post.slug.as_ref().map(|slug| format!("/posts/{}", slug))
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(encode_minimal).unwrap_or_default()
}
