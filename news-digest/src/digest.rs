//! HTML newspaper built from the selected posts.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::types::Post;

const HEAD: &str = r#"<html>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width" />
<head>
  <meta name="viewport" content="width=device-width, initial-scale=1.0">

  <meta name="apple-mobile-web-app-capable" content="yes" />
<style>
</style>
<title>THE DAILY NEWS</title>
</head>
<body>

"#;

const TAIL: &str = "
</body>
</html>
";

pub fn render_digest(posts: &[Post]) -> String {
    let articles = posts.iter().map(render_post).collect::<Vec<_>>().join("\n");
    format!("{}{}{}", HEAD, articles, TAIL)
}

fn render_post(post: &Post) -> String {
    format!(
        r#"
    <article>
        <h1><a href="{link}">{title}</a></h1>
        <p><small>By {author} for <i>{blog}</i>, on {date} at {time}.</small></p>
         {body}
    </article>
"#,
        link = encode_double_quoted_attribute(&post.link),
        title = encode_text(&post.title),
        author = encode_text(&post.author),
        blog = encode_text(&post.blog),
        date = nice_date(post.time),
        time = nice_time(post.time),
        body = post.body,
    )
}

/// `5 March 2024`
pub fn nice_date(time: DateTime<Utc>) -> String {
    let formatted = time.format("%d %B %Y").to_string();
    strip_leading_zero(formatted)
}

/// `9:05&thinsp;pm`
pub fn nice_time(time: DateTime<Utc>) -> String {
    let formatted = time.format("%I:%M&thinsp;%p").to_string();
    strip_leading_zero(formatted).to_lowercase()
}

fn strip_leading_zero(text: String) -> String {
    match text.strip_prefix('0') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
