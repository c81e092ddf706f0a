//! Schema model: the recursive element tree and named UI records.
//!
//! DESIGN
//! ======
//! `Element` is a closed sum type with an explicit `type` discriminant on the
//! wire. It only implements `Serialize`: the sole way to obtain a tree is the
//! validator, and `UiSchema`'s `Deserialize` impl routes through it, so any
//! typed read of persisted JSON re-checks the schema.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

// =============================================================================
// ELEMENT
// =============================================================================

/// Wire discriminant of an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Container,
    TextInput,
    Button,
}

impl ElementKind {
    /// All kinds in wire order.
    pub const ALL: [Self; 3] = [Self::Container, Self::TextInput, Self::Button];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Container => "div",
            Self::TextInput => "input",
            Self::Button => "button",
        }
    }

    /// Parse a wire tag. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

/// One node of a UI schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Element {
    /// Nested container with an optional header line.
    #[serde(rename = "div")]
    Container {
        #[serde(skip_serializing_if = "Option::is_none")]
        header: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        children: Option<Vec<Element>>,
    },

    /// Single-line text field. `name` is both the form key and the label source.
    #[serde(rename = "input")]
    TextInput {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },

    /// Push button with a visible label.
    #[serde(rename = "button")]
    Button { label: String },
}

impl Element {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Container { .. } => ElementKind::Container,
            Self::TextInput { .. } => ElementKind::TextInput,
            Self::Button { .. } => ElementKind::Button,
        }
    }

    /// Children of a container; empty for leaves and for absent `children`.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        match self {
            Self::Container { children: Some(children), .. } => children,
            _ => &[],
        }
    }

    /// Depth-first pre-order visit of this element and its descendants.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

// =============================================================================
// UI SCHEMA
// =============================================================================

/// Validated, non-empty ordered sequence of top-level elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UiSchema(Vec<Element>);

impl UiSchema {
    /// Wrap elements that already passed validation.
    pub(crate) fn from_validated(elements: Vec<Element>) -> Self {
        debug_assert!(!elements.is_empty());
        Self(elements)
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    #[must_use]
    pub fn into_elements(self) -> Vec<Element> {
        self.0
    }

    /// Number of top-level elements. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total element count across all nesting levels.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for element in &self.0 {
            element.visit(&mut |_| count += 1);
        }
        count
    }

    /// Text input names in document order, duplicates included.
    #[must_use]
    pub fn input_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for element in &self.0 {
            element.visit(&mut |el| {
                if let Element::TextInput { name, .. } = el {
                    names.push(name.as_str());
                }
            });
        }
        names
    }

    /// Input names used by more than one text input. Such inputs share one
    /// slot in the collected form values.
    #[must_use]
    pub fn duplicate_input_names(&self) -> BTreeSet<&str> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for name in self.input_names() {
            *seen.entry(name).or_default() += 1;
        }
        seen.into_iter().filter(|(_, n)| *n > 1).map(|(name, _)| name).collect()
    }
}

impl<'de> Deserialize<'de> for UiSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        crate::validate::validate(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NAMED UI
// =============================================================================

/// A persisted schema together with its name and creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedUi {
    pub name: String,
    pub schema: UiSchema,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

#[cfg(test)]
#[path = "element_test.rs"]
mod tests;
