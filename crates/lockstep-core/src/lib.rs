//! Sequential test harness: tests run one after another through a synchronization queue,
//! may suspend it for asynchronous work, and leave the fixture container the way they found it.

pub mod assert;
pub mod compare;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod harness;
pub mod host;
pub mod queue;
pub mod report;
pub mod runner;
pub mod timers;
pub mod url;

#[cfg(test)]
mod testing;

pub use assert::AssertionResult;
pub use compare::{EqualityMode, Value};
pub use config::{load_config, parse_config, HarnessConfig, ReportConfig};
pub use errors::HarnessError;
pub use harness::Harness;
pub use host::{Document, ElementRef, EventDispatch, Host, HostError};
pub use queue::SuspensionToken;
pub use report::{ReportSink, RunReport, RunStatus, RunSummary, TestRecord};
pub use runner::{TestBody, TestCase};
pub use timers::{PendingTimer, TimerId};
pub use url::url;
