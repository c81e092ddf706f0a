//! Tree renderer: turns a validated schema into a nested view tree.
//!
//! DESIGN
//! ======
//! Rendering is a pure function of the schema plus the renderer-local
//! `FormState`. One view node is produced per element, in document order,
//! with nesting preserved exactly. The schema is never mutated, so rendering
//! the same schema twice against fresh state yields identical trees.
//!
//! Text inputs sharing a `name` share one slot in `FormState`; the last
//! keystroke written to that name is what every such field displays.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::element::{Element, UiSchema};

// =============================================================================
// VIEW TREE
// =============================================================================

/// One displayed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum ViewNode {
    /// Visually nested boundary; header first, then children.
    Container {
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<String>,
        children: Vec<ViewNode>,
    },
    /// Controlled text field bound to `FormState[name]`.
    TextField { name: String, label: String, placeholder: String, value: String },
    /// Button whose activation is log-only.
    Button { label: String },
}

/// Rendered top-level nodes of one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViewTree {
    pub nodes: Vec<ViewNode>,
}

impl ViewTree {
    /// Indented plain-text outline, two spaces per nesting level.
    #[must_use]
    pub fn outline(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write_outline(node, 0, f)?;
        }
        Ok(())
    }
}

fn write_outline(node: &ViewNode, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match node {
        ViewNode::Container { header, children } => {
            writeln!(f, "{indent}[{}]", header.as_deref().unwrap_or_default())?;
            for child in children {
                write_outline(child, depth + 1, f)?;
            }
            Ok(())
        }
        ViewNode::TextField { label, placeholder, value, .. } if value.is_empty() => {
            writeln!(f, "{indent}{label}: ({placeholder})")
        }
        ViewNode::TextField { label, value, .. } => writeln!(f, "{indent}{label}: {value}"),
        ViewNode::Button { label } => writeln!(f, "{indent}<{label}>"),
    }
}

// =============================================================================
// FORM STATE
// =============================================================================

/// Current field values keyed by input name. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `name`, or `""` if nothing was entered.
    #[must_use]
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_owned(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

// =============================================================================
// RENDERER
// =============================================================================

/// Renders schemas against its own [`FormState`].
#[derive(Debug, Default)]
pub struct FormRenderer {
    state: FormState,
}

impl FormRenderer {
    /// Renderer with empty form state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the view tree for `schema` using the current field values.
    #[must_use]
    pub fn render(&self, schema: &UiSchema) -> ViewTree {
        let nodes: Vec<ViewNode> = schema.elements().iter().map(|el| self.render_element(el)).collect();
        debug!(top_level = nodes.len(), total = schema.node_count(), "rendered schema");
        ViewTree { nodes }
    }

    fn render_element(&self, element: &Element) -> ViewNode {
        match element {
            Element::Container { header, .. } => self.render_container(header.as_deref(), element.children()),
            Element::TextInput { name, placeholder } => self.render_text_input(name, placeholder.as_deref()),
            Element::Button { label } => ViewNode::Button { label: label.clone() },
        }
    }

    fn render_container(&self, header: Option<&str>, children: &[Element]) -> ViewNode {
        ViewNode::Container {
            header: header.map(str::to_owned),
            children: children.iter().map(|child| self.render_element(child)).collect(),
        }
    }

    fn render_text_input(&self, name: &str, placeholder: Option<&str>) -> ViewNode {
        ViewNode::TextField {
            name: name.to_owned(),
            label: label_from_name(name),
            placeholder: placeholder.map_or_else(|| format!("Enter {name}"), str::to_owned),
            value: self.state.get(name).to_owned(),
        }
    }

    /// Keystroke path: replace the value of field `name` immediately.
    pub fn input(&mut self, name: &str, value: impl Into<String>) {
        self.state.set(name, value);
    }

    /// Current value of field `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.state.get(name)
    }

    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Button activation. There is no submit handler at this layer, so this
    /// only logs the collected values.
    pub fn activate(&self, label: &str) {
        let fields: Vec<(&str, &str)> = self.state.iter().collect();
        info!(button = label, ?fields, "button activated");
    }

    /// Button activation with a caller-supplied submit handler.
    pub fn activate_with<F: FnOnce(&FormState)>(&self, label: &str, on_submit: F) {
        self.activate(label);
        on_submit(&self.state);
    }

    /// Drop all entered values.
    pub fn reset(&mut self) {
        self.state.clear();
    }
}

/// Display label for an input name: a space before every ASCII uppercase
/// letter, then outer whitespace trimmed (`firstName` -> `first Name`).
#[must_use]
pub fn label_from_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            label.push(' ');
        }
        label.push(ch);
    }
    label.trim().to_owned()
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
