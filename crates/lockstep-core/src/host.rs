//! Capabilities the host environment supplies to the harness.
//!
//! The harness never touches a document directly. Fixture isolation, element lookup and
//! event simulation all go through these traits, and exactly one implementation is chosen
//! when the [`Harness`](crate::Harness) is constructed.

use serde::{Deserialize, Serialize};

/// Handle to an element owned by the host document.
///
/// Two handles are equal when they point at the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub node: usize,
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ElementRef {
    pub fn new(node: usize, tag_name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            node,
            tag_name: tag_name.into(),
            id,
        }
    }

    /// `tag#id` form used in assertion messages.
    pub fn label(&self) -> String {
        let mut label = self.tag_name.to_ascii_lowercase();
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            label.push('#');
            label.push_str(id);
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("element not found: #{id}")]
    ElementNotFound { id: String },

    #[error("unsupported selector: {selector}")]
    UnsupportedSelector { selector: String },

    #[error("markup parse error: {message}")]
    Parse { message: String },

    #[error("event dispatch failed: {message}")]
    Dispatch { message: String },
}

/// Read and write access to the host document.
pub trait Document {
    /// Serialized children of the element with the given id.
    fn inner_html(&self, id: &str) -> Result<String, HostError>;

    /// Replace the children of the element with the given id.
    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), HostError>;

    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    /// Elements matching `selector`, in document order.
    fn select(&self, selector: &str) -> Result<Vec<ElementRef>, HostError>;

    fn text_content(&self, element: &ElementRef) -> Option<String>;
}

/// Simulated user interaction.
pub trait EventDispatch {
    fn dispatch_event(&mut self, element: &ElementRef, event_type: &str) -> Result<(), HostError>;
}

/// Everything the harness needs from its environment.
pub trait Host: Document + EventDispatch {}

impl<T: Document + EventDispatch> Host for T {}
