use crate::api::AppState;
use crate::error::Result;
use crate::models::{ItemKind, PlayableItem};
use crate::services::list_playable_items;
use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::sync::Arc;

// Page template, script and stylesheet for the browser UI
#[derive(RustEmbed)]
#[folder = "static"]
pub struct Assets;

const TEMPLATE: &str = "index.html";

const FOLDER_ICON: &str = r#"<svg class="icon" viewBox="0 0 24 24" aria-hidden="true"><path d="M3 6a2 2 0 0 1 2-2h4l2 2h8a2 2 0 0 1 2 2v9a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2z"/></svg>"#;

/// `GET /`: scan the library and render one button per playable item.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let root = state.library_root.clone();
    let items = tokio::task::spawn_blocking(move || list_playable_items(&root)).await?;
    tracing::debug!("Listing {} playable items", items.len());

    Ok(Html(render_index(&state.title, &items)?))
}

pub fn render_index(title: &str, items: &[PlayableItem]) -> std::result::Result<String, anyhow::Error> {
    let template = Assets::get(TEMPLATE).context("Page template missing from embedded assets")?;
    let template = std::str::from_utf8(&template.data).context("Page template is not UTF-8")?;

    let buttons = if items.is_empty() {
        r#"<p class="empty">No sounds yet. Upload an MP3 to get started.</p>"#.to_string()
    } else {
        items.iter().map(render_item).collect::<Vec<_>>().join("\n")
    };

    Ok(fill_placeholders(template, &escape_html(title), &buttons))
}

// One pass, so placeholder text inside a title or a sound name stays literal.
fn fill_placeholders(template: &str, title: &str, sounds: &str) -> String {
    let mut page = String::with_capacity(template.len() + sounds.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        page.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{{title}}") {
            page.push_str(title);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{{sounds}}") {
            page.push_str(sounds);
            rest = after;
        } else {
            page.push_str("{{");
            rest = &tail[2..];
        }
    }
    page.push_str(rest);
    page
}

fn render_item(item: &PlayableItem) -> String {
    let name = escape_html(&item.name);
    match item.kind {
        ItemKind::File => {
            let label = escape_html(display_label(&item.name));
            format!(r#"<button class="sound" data-sound="{name}">{label}</button>"#)
        }
        ItemKind::Folder => format!(
            r#"<button class="sound folder" data-sound="{name}">{FOLDER_ICON}{name}</button>"#
        ),
    }
}

fn display_label(name: &str) -> &str {
    let cut = name.len().saturating_sub(4);
    match name.get(cut..) {
        Some(ext) if cut > 0 && ext.eq_ignore_ascii_case(".mp3") => &name[..cut],
        _ => name,
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Fallback route: serve embedded static assets.
pub async fn serve_frontend(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    // The template is only ever served rendered.
    if path == TEMPLATE {
        return not_found();
    }

    match Assets::get(path) {
        Some(content) => serve_asset(path, content.data.into_owned()),
        None => not_found(),
    }
}

fn serve_asset(path: &str, data: Vec<u8>) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (
                header::CACHE_CONTROL,
                "public, max-age=0, must-revalidate".to_string(),
            ),
        ],
        data,
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}
