use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use crate::data::ValidationResult;
use crate::effects::SourceResolver;
use crate::error::{Error, Result};

const NO_OCCURRENCE: &str = "<no occurrence>";

/// The links that remained broken after a validation run.
#[derive(Debug, Clone)]
pub struct ValidationErrorStream {
    results: Vec<ValidationResult>,
    resolver: Arc<dyn SourceResolver>,
}

impl ValidationErrorStream {
    pub fn new(results: Vec<ValidationResult>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self { results, resolver }
    }

    /// Drops the results matching `ignorable`.
    #[must_use]
    pub fn ignore(mut self, ignorable: impl Fn(&ValidationResult) -> bool) -> Self {
        self.results.retain(|result| !ignorable(result));
        self
    }

    /// Logs every remaining result.
    #[must_use]
    pub fn log(self) -> Self {
        for result in &self.results {
            tracing::info!("Validation error: {result}");
        }
        self
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Renders the results grouped by the file they occur in.
    ///
    /// ```text
    ///  - <source location>
    ///      - <link>
    ///          - <message>
    /// ```
    ///
    /// A result occurring in several files is listed under each of them.
    /// Results without occurrences come last. Empty when there are no results.
    pub fn report(&self) -> String {
        let mut by_file: BTreeMap<&PathBuf, Vec<&ValidationResult>> = BTreeMap::new();
        let mut orphans = Vec::new();
        for result in &self.results {
            let occurrences = result.link().occurrences();
            if occurrences.is_empty() {
                orphans.push(result);
            }
            for path in occurrences {
                by_file.entry(path).or_default().push(result);
            }
        }

        let mut report = String::new();
        for (path, results) in by_file {
            for result in results {
                let location = self.resolver.find_source(result.link(), path);
                push_entry(&mut report, &location.to_string(), result);
            }
        }
        for result in orphans {
            push_entry(&mut report, NO_OCCURRENCE, result);
        }
        report
    }

    /// Succeeds when no broken link remains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] carrying the [`report`](Self::report).
    pub fn assert_valid(self) -> Result<()> {
        let report = self.report();
        if report.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid(report))
        }
    }
}

fn push_entry(report: &mut String, location: &str, result: &ValidationResult) {
    let _ = write!(
        report,
        "\n - {location}\n     - {}\n         - {}",
        result.link().short_display(),
        result.message().unwrap_or_default()
    );
}
