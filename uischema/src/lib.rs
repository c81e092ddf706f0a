//! Shared UI schema model, validator, and view-tree renderer.
//!
//! This crate owns the recursive element tree used by both the `uiforge`
//! server and `uiforge-cli`. Both submission paths call the same
//! [`validate`] and [`validate_name`] functions, so the advisory client-side
//! check and the authoritative server-side check accept exactly the same
//! inputs.

pub mod element;
pub mod render;
pub mod validate;

pub use element::{Element, ElementKind, NamedUi, UiSchema};
pub use render::{FormRenderer, FormState, ViewNode, ViewTree, label_from_name};
pub use validate::{MAX_NAME_LEN, ValidationError, validate, validate_name, validate_save_request};
