//! Explicit test registry.
//!
//! Cases are registered by hand as `(suite, case, callback, options)` and
//! run in registration order. A panicking case is caught and reported as a
//! failure instead of aborting the run.

use std::panic::{self, AssertUnwindSafe};

/// Result type returned by every case; the error is the failure detail.
pub type CaseResult = Result<(), String>;

type CaseFn = Box<dyn Fn() -> CaseResult>;

/// Per-case switches
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseOptions {
    /// Never run this case
    pub skip: bool,
    /// When any case is focused, only focused cases run
    pub focus: bool,
}

impl CaseOptions {
    pub fn skip() -> Self {
        Self {
            skip: true,
            focus: false,
        }
    }

    pub fn focus() -> Self {
        Self {
            skip: false,
            focus: true,
        }
    }
}

struct TestCase {
    suite: &'static str,
    name: &'static str,
    run: CaseFn,
    options: CaseOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

pub struct TestResult {
    pub suite: &'static str,
    pub name: &'static str,
    pub outcome: Outcome,
    pub detail: String,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Outcome of one registry run
pub struct Report {
    pub results: Vec<TestResult>,
}

impl Report {
    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }
}

#[derive(Default)]
pub struct TestRegistry {
    cases: Vec<TestCase>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        suite: &'static str,
        name: &'static str,
        callback: F,
        options: CaseOptions,
    ) -> &mut Self
    where
        F: Fn() -> CaseResult + 'static,
    {
        self.cases.push(TestCase {
            suite,
            name,
            run: Box::new(callback),
            options,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Run every case whose `suite::name` contains `filter`.
    /// Filtered-out cases are left out of the report entirely.
    pub fn run(&self, filter: Option<&str>) -> Report {
        let selected: Vec<&TestCase> = self
            .cases
            .iter()
            .filter(|case| match filter {
                Some(f) => format!("{}::{}", case.suite, case.name).contains(f),
                None => true,
            })
            .collect();
        let focused = selected.iter().any(|case| case.options.focus);

        let results = selected
            .into_iter()
            .map(|case| {
                if case.options.skip || (focused && !case.options.focus) {
                    return TestResult {
                        suite: case.suite,
                        name: case.name,
                        outcome: Outcome::Skipped,
                        detail: "skipped".into(),
                    };
                }
                let caught = panic::catch_unwind(AssertUnwindSafe(|| (case.run)()));
                let (outcome, detail) = match caught {
                    Ok(Ok(())) => (Outcome::Passed, "ok".to_string()),
                    Ok(Err(detail)) => (Outcome::Failed, detail),
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        (Outcome::Failed, format!("panicked: {}", message))
                    }
                };
                TestResult {
                    suite: case.suite,
                    name: case.name,
                    outcome,
                    detail,
                }
            })
            .collect();

        Report { results }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

/// Fail with `detail` unless `condition` holds
pub fn check(condition: bool, detail: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(detail.into())
    }
}
