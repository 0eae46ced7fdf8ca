//! Assertion collection and the assertion helpers test bodies call.

use crate::compare::{self, Value};
use crate::harness::Harness;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub passed: bool,
    pub message: String,
}

/// Results of the test that is currently running.
#[derive(Debug, Default)]
pub struct AssertionCollector {
    results: Vec<AssertionResult>,
}

impl AssertionCollector {
    pub fn record(&mut self, passed: bool, message: impl Into<String>) {
        self.results.push(AssertionResult {
            passed,
            message: message.into(),
        });
    }

    pub fn reset(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[AssertionResult] {
        &self.results
    }

    /// Hand the results over, leaving the collector empty.
    pub fn take(&mut self) -> Vec<AssertionResult> {
        std::mem::take(&mut self.results)
    }
}

const INDENT: &str = "\n    ";

fn default_message(message: &str, passed: bool) -> String {
    if !message.is_empty() {
        message.to_string()
    } else if passed {
        "okay".to_string()
    } else {
        "failed".to_string()
    }
}

impl Harness {
    /// Assertions recorded so far by the running test.
    pub fn assertions(&self) -> &[AssertionResult] {
        self.assertions.results()
    }

    pub fn ok(&mut self, condition: bool, message: impl Into<String>) {
        self.assertions.record(condition, message);
    }

    /// `actual == expected` under the configured equality mode. An empty message
    /// defaults to "okay" / "failed"; failures list both values.
    pub fn equals(&mut self, actual: impl Into<Value>, expected: impl Into<Value>, message: &str) {
        let (actual, expected) = (actual.into(), expected.into());
        let passed = compare::values_equal(&actual, &expected, self.config.equality);
        let message = default_message(message, passed);
        let message = if passed {
            message
        } else {
            format!("{message}{INDENT}expected: {expected}{INDENT}actual: {actual}")
        };
        self.assertions.record(passed, message);
    }

    pub fn not_equals(&mut self, actual: impl Into<Value>, expected: impl Into<Value>, message: &str) {
        let (actual, expected) = (actual.into(), expected.into());
        let passed = !compare::values_equal(&actual, &expected, self.config.equality);
        let message = default_message(message, passed);
        let message = if passed {
            message
        } else {
            format!("{message}{INDENT}both arguments are: {expected}")
        };
        self.assertions.record(passed, message);
    }

    /// Element-wise sequence comparison; failures show both sequences serialized.
    pub fn assert_sequence(
        &mut self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        message: &str,
    ) {
        let (actual, expected) = (actual.into(), expected.into());
        let passed = compare::sequence_equals(&actual, &expected, self.config.equality);
        let message = if passed {
            message.to_string()
        } else {
            format!(
                "{message}{INDENT}expected: {}{INDENT}result: {}",
                compare::serialize_sequence(&expected),
                compare::serialize_sequence(&actual)
            )
        };
        self.assertions.record(passed, message);
    }

    /// Shallow structural equivalence of two object-like values.
    pub fn assert_equivalent(
        &mut self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        message: &str,
    ) {
        let (actual, expected) = (actual.into(), expected.into());
        let passed = compare::structurally_equivalent(&actual, &expected, self.config.equality);
        self.assertions.record(passed, message);
    }

    /// `selector` must match exactly the elements with `ids`, in order.
    pub fn element_found(&mut self, selector: &str, ids: &[&str], message: &str) {
        let message = format!("{message} ({selector})");
        match self.host.select(selector) {
            Ok(found) => {
                let expected = self.q(ids);
                self.assert_sequence(Value::seq(found), expected, &message);
            }
            Err(e) => self
                .assertions
                .record(false, format!("{message}{INDENT}selector failed: {e}")),
        }
    }
}
