use crate::models::{PostRecord, TrackerView};
use serde_json::Number;

const CAPTION_PREVIEW_CHARS: usize = 100;

pub fn render_index(view: &TrackerView) -> String {
    let body = if view.setup_visible {
        render_setup(view)
    } else {
        format!(
            "{}{}{}",
            render_stats(view),
            render_history(view),
            render_posts(view)
        )
    };
    let auto_refresh = if view.setup_visible {
        ""
    } else {
        r#"<meta http-equiv="refresh" content="60" />"#
    };

    INDEX_HTML
        .replace("{{AUTO_REFRESH}}", auto_refresh)
        .replace("{{BODY}}", &body)
        .replace("{{INTERVAL_MINUTES}}", &(view.poll_interval_secs / 60).to_string())
}

fn render_setup(view: &TrackerView) -> String {
    let value = view.backend_url.as_deref().map(escape_html).unwrap_or_default();
    let error = view
        .request
        .error_message()
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();

    format!(
        r#"<section class="card">
      <h2>Setup</h2>
      <form method="post" action="/setup">
        <input type="text" name="backend_url" value="{value}"
          placeholder="Enter your backend URL (e.g., https://your-app.onrender.com)" />
        <button type="submit">Start Tracking</button>
      </form>
      {error}
    </section>"#
    )
}

fn render_stats(view: &TrackerView) -> String {
    let loading = view.request.is_loading();
    let content = if loading && view.stats.is_placeholder() {
        "<p>Loading...</p>".to_string()
    } else if let Some(message) = view.request.error_message() {
        format!(r#"<p class="error">{}</p>"#, escape_html(message))
    } else {
        let stats = &view.stats;
        format!(
            r#"<p><strong>Posts:</strong> {}</p>
      <p><strong>Followers:</strong> {}</p>
      <p><strong>Following:</strong> {}</p>
      <p><strong>Last checked:</strong> {}</p>"#,
            escape_html(&stats.posts.to_string()),
            escape_html(&stats.followers.to_string()),
            escape_html(&stats.following.to_string()),
            escape_html(&stats.last_checked),
        )
    };
    let (refresh_label, disabled) = if loading {
        ("Checking...", " disabled")
    } else {
        ("Refresh Now", "")
    };

    format!(
        r#"<section class="card">
      <h2>Current Stats</h2>
      {content}
      <div class="actions">
        <form method="post" action="/refresh"><button type="submit"{disabled}>{refresh_label}</button></form>
        <form method="post" action="/reconfigure"><button class="secondary" type="submit">Change Backend URL</button></form>
      </div>
    </section>"#
    )
}

fn render_history(view: &TrackerView) -> String {
    let content = if view.history.is_empty() {
        "<p>No changes detected yet</p>".to_string()
    } else {
        let items: String = view
            .history
            .iter()
            .map(|entry| format!("<li>{}</li>", escape_html(&entry.text())))
            .collect();
        format!("<ul>{items}</ul>")
    };

    format!(
        r#"<section class="card">
      <h2>Change History</h2>
      {content}
    </section>"#
    )
}

fn render_posts(view: &TrackerView) -> String {
    if view.stats.recent_posts.is_empty() {
        return String::new();
    }
    let cards: String = view.stats.recent_posts.iter().map(render_post).collect();

    format!(
        r#"<section class="card">
      <h2>Recent Posts</h2>
      <div class="posts">{cards}</div>
    </section>"#
    )
}

fn render_post(post: &PostRecord) -> String {
    let caption = post
        .caption
        .as_deref()
        .filter(|caption| !caption.is_empty())
        .map(|caption| {
            format!(
                r#"<p class="caption">{}</p>"#,
                escape_html(&caption_preview(caption))
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="post" data-id="{id}">
        <img src="{image}" alt="Post image" />
        <div class="post-info">
          <div class="post-stats"><span>&#10084;&#65039; {likes}</span><span>&#128172; {comments}</span></div>
          {caption}
          <p class="post-date">{date}</p>
        </div>
      </div>"#,
        id = escape_html(&post.id.to_string()),
        image = escape_html(&post.image_url),
        likes = group_thousands(&post.likes),
        comments = group_thousands(&post.comments),
        date = escape_html(post_date(&post.timestamp)),
    )
}

pub fn caption_preview(caption: &str) -> String {
    if caption.chars().count() > CAPTION_PREVIEW_CHARS {
        let head: String = caption.chars().take(CAPTION_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        caption.to_string()
    }
}

/// Formats whole, non-negative counts with thousands separators; other numbers
/// are shown as sent.
pub fn group_thousands(value: &Number) -> String {
    if let Some(whole) = value.as_u64() {
        return group_digits(whole);
    }
    match value.as_f64() {
        Some(float) if float >= 0.0 && float.fract() == 0.0 && float < u64::MAX as f64 => {
            group_digits(float as u64)
        }
        _ => value.to_string(),
    }
}

fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Date part of an ISO-8601 timestamp; anything else is shown as-is.
fn post_date(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  {{AUTO_REFRESH}}
  <title>Account Tracker</title>
  <style>
    :root {
      --bg: #121212;
      --card: #1e1e1e;
      --raised: #2a2a2a;
      --ink: #e0e0e0;
      --muted: #888;
      --accent: #bb86fc;
      --error: #ff6b6b;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    }

    .app {
      max-width: 500px;
      margin: 0 auto;
      padding: 20px;
    }

    h1 {
      text-align: center;
      color: var(--accent);
      margin-bottom: 32px;
    }

    h2 {
      color: var(--accent);
      font-size: 1.3rem;
      margin: 0 0 16px;
    }

    .card {
      background: var(--card);
      padding: 20px;
      border-radius: 12px;
      margin-bottom: 24px;
    }

    input {
      width: 100%;
      padding: 12px;
      margin-bottom: 16px;
      background: var(--raised);
      border: 1px solid #444;
      border-radius: 8px;
      color: var(--ink);
      font-size: 1rem;
    }

    .actions {
      display: flex;
      gap: 8px;
      margin-top: 16px;
    }

    button {
      padding: 10px 20px;
      background: var(--accent);
      color: black;
      border: none;
      border-radius: 8px;
      cursor: pointer;
      font-size: 1rem;
      font-weight: 600;
    }

    button:disabled {
      opacity: 0.6;
      cursor: default;
    }

    button.secondary {
      background: #444;
      color: var(--ink);
    }

    ul {
      list-style: none;
      padding: 0;
      margin: 0;
    }

    li {
      padding: 12px 0;
      border-bottom: 1px solid #333;
    }

    .error {
      color: var(--error);
    }

    .posts {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(150px, 1fr));
      gap: 16px;
    }

    .post {
      background: var(--raised);
      border-radius: 8px;
      overflow: hidden;
    }

    .post img {
      width: 100%;
      height: 150px;
      object-fit: cover;
    }

    .post-info {
      padding: 12px;
    }

    .post-stats {
      display: flex;
      justify-content: space-between;
      font-size: 0.85rem;
    }

    .caption {
      font-size: 0.8rem;
      color: #ccc;
      line-height: 1.4;
    }

    .post-date {
      font-size: 0.75rem;
      color: var(--muted);
    }

    footer {
      text-align: center;
      margin-top: 40px;
      font-size: 0.9rem;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Account Tracker</h1>
    {{BODY}}
    <footer>
      <p>Personal tracker &bull; Updates every {{INTERVAL_MINUTES}} min</p>
    </footer>
  </main>
</body>
</html>
"#;
