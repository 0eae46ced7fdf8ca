#![allow(dead_code)]

use lockstep_core::{Document, ElementRef, EventDispatch, HostError};
use std::cell::RefCell;
use std::rc::Rc;

/// Flat host: every element is a `div` container with literal inner html.
#[derive(Default)]
pub struct FlatHost {
    elements: Vec<(String, String)>,
    pub events: Rc<RefCell<Vec<String>>>,
}

impl FlatHost {
    pub fn new(ids: &[(&str, &str)]) -> Self {
        Self {
            elements: ids
                .iter()
                .map(|(id, html)| ((*id).to_string(), (*html).to_string()))
                .collect(),
            events: Rc::default(),
        }
    }

    fn find(&self, id: &str) -> Result<usize, HostError> {
        self.elements
            .iter()
            .position(|(eid, _)| eid == id)
            .ok_or_else(|| HostError::ElementNotFound { id: id.to_string() })
    }
}

impl Document for FlatHost {
    fn inner_html(&self, id: &str) -> Result<String, HostError> {
        Ok(self.elements[self.find(id)?].1.clone())
    }

    fn set_inner_html(&mut self, id: &str, html: &str) -> Result<(), HostError> {
        let i = self.find(id)?;
        self.elements[i].1 = html.to_string();
        Ok(())
    }

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        let i = self.find(id).ok()?;
        Some(ElementRef::new(i, "DIV", Some(id.to_string())))
    }

    fn select(&self, selector: &str) -> Result<Vec<ElementRef>, HostError> {
        if selector == "div" {
            return Ok(self
                .elements
                .iter()
                .enumerate()
                .map(|(i, (id, _))| ElementRef::new(i, "DIV", Some(id.clone())))
                .collect());
        }
        match selector.strip_prefix('#') {
            Some(id) => Ok(self.element_by_id(id).into_iter().collect()),
            None => Err(HostError::UnsupportedSelector {
                selector: selector.to_string(),
            }),
        }
    }

    fn text_content(&self, element: &ElementRef) -> Option<String> {
        self.elements.get(element.node).map(|(_, html)| html.clone())
    }
}

impl EventDispatch for FlatHost {
    fn dispatch_event(&mut self, element: &ElementRef, event_type: &str) -> Result<(), HostError> {
        self.events
            .borrow_mut()
            .push(format!("{}:{}", element.label(), event_type));
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
