//! Rendered views of stored schemas.
//!
//! DESIGN
//! ======
//! Each request renders with a fresh `FormRenderer`, so every field shows
//! its placeholder and no value state leaks between requests. The HTML page
//! is a static snapshot of the view tree; every piece of user text is
//! escaped before it is written.

use std::fmt::Write as _;

use axum::extract::{Path, State};
use axum::response::{Html, Json};
use serde::Serialize;
use time::OffsetDateTime;
use uischema::{FormRenderer, NamedUi, ViewNode, ViewTree};

use super::checked_name;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::StorageError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub ui_name: String,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    pub view: ViewTree,
}

async fn load(state: &AppState, raw_name: &str) -> Result<NamedUi, ApiError> {
    let name = checked_name(raw_name)?;
    let ui = state.store.get(name).await?;
    ui.ok_or_else(|| StorageError::NotFound(name.to_owned()).into())
}

/// `GET /api/v1/ui/{ui_name}/view`: the rendered view tree as JSON.
pub async fn view_ui(
    State(state): State<AppState>,
    Path(ui_name): Path<String>,
) -> Result<Json<ViewResponse>, ApiError> {
    let ui = load(&state, &ui_name).await?;
    let view = FormRenderer::new().render(&ui.schema);
    Ok(Json(ViewResponse { ui_name: ui.name, created_at: ui.created_at, view }))
}

/// `GET /ui/{ui_name}`: the rendered view as an HTML page.
pub async fn ui_page(State(state): State<AppState>, Path(ui_name): Path<String>) -> Result<Html<String>, ApiError> {
    let ui = load(&state, &ui_name).await?;
    let view = FormRenderer::new().render(&ui.schema);
    Ok(Html(render_page(&ui.name, &view)))
}

// =============================================================================
// HTML
// =============================================================================

/// Full HTML document for one rendered UI.
#[must_use]
pub fn render_page(name: &str, view: &ViewTree) -> String {
    let title = escape_html(name);
    let mut body = String::new();
    for node in &view.nodes {
        write_node(node, &mut body);
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body>\n<form class=\"ui\" data-ui-name=\"{title}\" onsubmit=\"return false\">\n{body}</form>\n</body>\n</html>\n"
    )
}

fn write_node(node: &ViewNode, out: &mut String) {
    match node {
        ViewNode::Container { header, children } => {
            out.push_str("<fieldset>\n");
            if let Some(header) = header {
                let _ = writeln!(out, "<legend>{}</legend>", escape_html(header));
            }
            for child in children {
                write_node(child, out);
            }
            out.push_str("</fieldset>\n");
        }
        ViewNode::TextField { name, label, placeholder, value } => {
            let name = escape_html(name);
            let _ = writeln!(
                out,
                "<label>{}<input type=\"text\" name=\"{name}\" placeholder=\"{}\" value=\"{}\"></label>",
                escape_html(label),
                escape_html(placeholder),
                escape_html(value),
            );
        }
        ViewNode::Button { label } => {
            let _ = writeln!(out, "<button type=\"button\">{}</button>", escape_html(label));
        }
    }
}

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
