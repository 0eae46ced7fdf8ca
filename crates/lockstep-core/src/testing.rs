//! In-crate host stub: flat containers keyed by id, no markup parsing.

use crate::host::{Document, ElementRef, EventDispatch, HostError};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub(crate) struct StubHost {
    containers: Vec<(String, String)>,
    /// Shared so tests can inspect dispatches after the host moved into a harness.
    pub(crate) events: Rc<RefCell<Vec<(String, String)>>>,
}

impl StubHost {
    pub(crate) fn with_container(id: &str, html: &str) -> Self {
        Self {
            containers: vec![(id.to_string(), html.to_string())],
            events: Rc::default(),
        }
    }

    pub(crate) fn add_container(mut self, id: &str, html: &str) -> Self {
        self.containers.push((id.to_string(), html.to_string()));
        self
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.containers.iter().position(|(cid, _)| cid == id)
    }
}

impl Document for StubHost {
    fn inner_html(&self, id: &str) -> Result<String, HostError> {
        self.position(id)
            .map(|i| self.containers[i].1.clone())
            .ok_or_else(|| HostError::ElementNotFound { id: id.to_string() })
    }

    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), HostError> {
        let i = self
            .position(id)
            .ok_or_else(|| HostError::ElementNotFound { id: id.to_string() })?;
        self.containers[i].1 = html.to_string();
        Ok(())
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.position(id)
            .map(|i| ElementRef::new(i, "div", Some(id.to_string())))
    }

    fn select(&self, selector: &str) -> Result<Vec<ElementRef>, HostError> {
        let id = selector
            .strip_prefix('#')
            .ok_or_else(|| HostError::UnsupportedSelector {
                selector: selector.to_string(),
            })?;
        Ok(self.element_by_id(id).into_iter().collect())
    }

    fn text_content(&self, element: &ElementRef) -> Option<String> {
        self.containers.get(element.node).map(|(_, html)| html.clone())
    }
}

impl EventDispatch for StubHost {
    fn dispatch_event(&mut self, element: &ElementRef, event_type: &str) -> Result<(), HostError> {
        self.events
            .borrow_mut()
            .push((element.label(), event_type.to_string()));
        Ok(())
    }
}
