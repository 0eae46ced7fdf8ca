use crate::host::{Document, HostError};
use tracing::debug;

/// Keeps the baseline content of the fixture container and puts it back after each test.
#[derive(Debug, Clone)]
pub struct FixtureManager {
    container_id: String,
    snapshot: Option<String>,
}

impl FixtureManager {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            snapshot: None,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn snapshot_html(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Capture the container's current content. Called once, when the run starts.
    pub fn snapshot<D: Document + ?Sized>(&mut self, doc: &D) -> Result<(), HostError> {
        let html = doc.inner_html(&self.container_id)?;
        debug!(container = %self.container_id, bytes = html.len(), "fixture snapshot taken");
        self.snapshot = Some(html);
        Ok(())
    }

    /// Overwrite the container with the snapshot. Without a snapshot this is a no-op.
    pub fn restore<D: Document + ?Sized>(&self, doc: &mut D) -> Result<(), HostError> {
        let Some(html) = self.snapshot.as_deref() else {
            return Ok(());
        };
        doc.set_inner_html(&self.container_id, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubHost;

    #[test]
    fn restore_discards_mutations() {
        let mut host = StubHost::with_container("main", "<p>base</p>");
        let mut fixture = FixtureManager::new("main");
        fixture.snapshot(&host).unwrap();

        host.set_inner_html("main", "<p>changed</p>").unwrap();
        fixture.restore(&mut host).unwrap();
        assert_eq!(host.inner_html("main").unwrap(), "<p>base</p>");
    }

    #[test]
    fn restore_is_idempotent() {
        let mut host = StubHost::with_container("main", "<b>x</b>");
        let mut fixture = FixtureManager::new("main");
        fixture.snapshot(&host).unwrap();

        fixture.restore(&mut host).unwrap();
        let once = host.inner_html("main").unwrap();
        fixture.restore(&mut host).unwrap();
        assert_eq!(host.inner_html("main").unwrap(), once);
    }

    #[test]
    fn restore_without_snapshot_leaves_content() {
        let mut host = StubHost::with_container("main", "<i>keep</i>");
        let fixture = FixtureManager::new("main");
        fixture.restore(&mut host).unwrap();
        assert_eq!(host.inner_html("main").unwrap(), "<i>keep</i>");
    }

    #[test]
    fn snapshot_of_missing_container_fails() {
        let host = StubHost::default();
        let mut fixture = FixtureManager::new("main");
        let err = fixture.snapshot(&host).unwrap_err();
        assert_eq!(
            err,
            HostError::ElementNotFound {
                id: "main".to_string()
            }
        );
        assert!(fixture.snapshot_html().is_none());
    }
}
