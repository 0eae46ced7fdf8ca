use crate::dom::{Dom, NodeId};
use lockstep_core::{Document, ElementRef, EventDispatch, HostError};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Event as seen by a listener.
#[derive(Debug)]
pub struct Event {
    pub event_type: String,
    pub target: ElementRef,
    /// Element whose listener is running; changes as the event bubbles.
    pub current_target: ElementRef,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// Listeners on ancestors of `current_target` will not run.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// One call to `dispatch_event`, kept in order for later inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub target: String,
    pub event_type: String,
    /// Listeners that ran.
    pub handled: usize,
}

/// Host document held in memory.
///
/// Listeners are keyed by element id rather than node, so they survive the fixture being
/// rewritten between tests as long as the id comes back.
#[derive(Default)]
pub struct MemoryDocument {
    dom: Dom,
    listeners: HashMap<(String, String), Vec<Listener>>,
    dispatched: Vec<DispatchRecord>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.dom.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("dispatched", &self.dispatched.len())
            .finish()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `html` as the document body.
    pub fn from_html(html: &str) -> Result<Self, HostError> {
        let mut doc = Self::new();
        let root = doc.dom.root;
        doc.dom.set_inner_html(root, html)?;
        Ok(doc)
    }

    /// Serialized markup of the whole document.
    pub fn html(&self) -> String {
        self.dom.dump_node(self.dom.root)
    }

    pub fn on<F>(&mut self, id: &str, event_type: &str, listener: F)
    where
        F: Fn(&Event) + 'static,
    {
        self.listeners
            .entry((id.to_string(), event_type.to_string()))
            .or_default()
            .push(Rc::new(listener));
    }

    pub fn dispatched(&self) -> &[DispatchRecord] {
        &self.dispatched
    }

    pub fn attribute(&self, element: &ElementRef, name: &str) -> Option<String> {
        self.dom
            .element(NodeId(element.node))
            .and_then(|e| e.attr(name))
            .map(str::to_string)
    }

    fn element_ref(&self, node: NodeId) -> Option<ElementRef> {
        let element = self.dom.element(node)?;
        let id = element
            .attr("id")
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Some(ElementRef::new(node.index(), element.tag_name.clone(), id))
    }

    fn require(&self, id: &str) -> Result<NodeId, HostError> {
        self.dom
            .by_id(id)
            .ok_or_else(|| HostError::ElementNotFound { id: id.to_string() })
    }

    /// Ancestor chain from `node` up to the outermost element.
    fn propagation_path(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.dom.element(current).is_some() {
                path.push(current);
            }
            cursor = self.dom.parent(current);
        }
        path
    }
}

impl Document for MemoryDocument {
    fn inner_html(&self, id: &str) -> Result<String, HostError> {
        self.dom.inner_html(self.require(id)?)
    }

    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), HostError> {
        let node = self.require(id)?;
        self.dom.set_inner_html(node, html)?;
        debug!(container = id, bytes = html.len(), "inner html replaced");
        Ok(())
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.element_ref(self.dom.by_id(id)?)
    }

    fn select(&self, selector: &str) -> Result<Vec<ElementRef>, HostError> {
        Ok(self
            .dom
            .query_selector_all(selector)?
            .into_iter()
            .filter_map(|node| self.element_ref(node))
            .collect())
    }

    fn text_content(&self, element: &ElementRef) -> Option<String> {
        let node = NodeId(element.node);
        self.dom.element(node)?;
        Some(self.dom.text_content(node))
    }
}

impl EventDispatch for MemoryDocument {
    /// Runs listeners on the target, then on each ancestor, until one stops propagation.
    fn dispatch_event(&mut self, element: &ElementRef, event_type: &str) -> Result<(), HostError> {
        let node = NodeId(element.node);
        if self.dom.element(node).is_none() || !self.dom.is_connected(node) {
            return Err(HostError::Dispatch {
                message: format!("{} is not attached to the document", element.label()),
            });
        }
        let target = self.element_ref(node).ok_or_else(|| HostError::Dispatch {
            message: format!("{} is not an element", element.label()),
        })?;

        let mut event = Event {
            event_type: event_type.to_string(),
            current_target: target.clone(),
            target,
            propagation_stopped: Cell::new(false),
        };
        let mut handled = 0usize;
        for current in self.propagation_path(node) {
            let Some(current_ref) = self.element_ref(current) else {
                continue;
            };
            let Some(id) = current_ref.id.clone() else {
                continue;
            };
            let Some(listeners) = self.listeners.get(&(id, event_type.to_string())) else {
                continue;
            };
            event.current_target = current_ref;
            for listener in listeners {
                listener(&event);
                handled += 1;
            }
            if event.propagation_stopped.get() {
                break;
            }
        }

        debug!(target = %event.target.label(), event_type, handled, "event dispatched");
        self.dispatched.push(DispatchRecord {
            target: event.target.label(),
            event_type: event_type.to_string(),
            handled,
        });
        Ok(())
    }
}
