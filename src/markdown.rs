use pulldown_cmark::{html, CowStr, Event, Options, Parser};

fn markdown_options() -> Options {
    Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_MATH
}

/// Renders post markdown to HTML. Math spans go through KaTeX.
pub fn render_markdown_to_html(markdown: &str) -> String {
    let normalized = normalize_latex_delimiters(markdown);
    let events = Parser::new_ext(&normalized, markdown_options()).map(|event| match event {
        Event::InlineMath(math) => math_event(&math, false),
        Event::DisplayMath(math) => math_event(&math, true),
        other => other,
    });

    let mut html_out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_out, events);
    html_out
}

fn math_event(source: &str, display_mode: bool) -> Event<'static> {
    Event::Html(CowStr::Boxed(render_math(source, display_mode).into_boxed_str()))
}

// pulldown-cmark only knows `$` delimiters; rewrite `\(..\)` and `\[..\]`.
fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('\\') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match latex_math_span(tail) {
            Some((math, display_mode, consumed)) => {
                let fence = if display_mode || math.contains('\n') { "$$" } else { "$" };
                out.push_str(fence);
                out.push_str(math);
                out.push_str(fence);
                rest = &tail[consumed..];
            }
            None => {
                out.push('\\');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Returns the math body, whether it is display math, and the bytes consumed.
fn latex_math_span(tail: &str) -> Option<(&str, bool, usize)> {
    let (close, display_mode) = if tail.starts_with("\\(") {
        ("\\)", false)
    } else if tail.starts_with("\\[") {
        ("\\]", true)
    } else {
        return None;
    };

    let body = &tail[2..];
    let end = body.find(close)?;
    Some((&body[..end], display_mode, 2 + end + close.len()))
}

fn render_math(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    opts.build()
        .ok()
        .and_then(|opts| katex::render_with_opts(source, opts).ok())
        .unwrap_or_else(|| unrendered_math(source, display_mode))
}

fn unrendered_math(source: &str, display_mode: bool) -> String {
    let class_name = if display_mode { "math math-display" } else { "math math-inline" };
    format!(
        "<span class=\"{}\">{}</span>",
        class_name,
        htmlescape::encode_minimal(source)
    )
}
