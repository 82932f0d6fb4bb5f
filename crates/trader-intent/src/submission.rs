//! Batch generation of `uid;type;request` submissions

use crate::dataset::{DELIMITER, Question};
use crate::error::{IntentError, Result};
use crate::parser::ParsedRequest;
use crate::resolver::IntentResolver;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use tracing::{info, warn};
use trader_core::{Example, HttpMethod};
use trader_llm::calculate_cost;

/// One output line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: HttpMethod,
    pub request: String,
}

/// Result of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionReport {
    pub rows: Vec<SubmissionRow>,
    /// Dollar cost of all completion calls
    pub total_cost: f64,
    /// Questions answered with the fallback request
    pub failures: usize,
}

impl SubmissionReport {
    /// Row count per method
    pub fn type_counts(&self) -> BTreeMap<HttpMethod, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn average_cost(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.total_cost / self.rows.len() as f64
        }
    }

    /// Write the rows as `;`-separated CSV, creating parent directories
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IntentError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| IntentError::io(path, e))?;
        let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_writer(file);
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|e| IntentError::io(path, e))?;

        info!("Wrote {} submission rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Runs [`IntentResolver::suggest_request`] over a question set
#[derive(Debug)]
pub struct Submission<'a> {
    resolver: &'a IntentResolver,
    examples: Vec<Example>,
}

impl<'a> Submission<'a> {
    pub fn new(resolver: &'a IntentResolver, examples: Vec<Example>) -> Self {
        Self { resolver, examples }
    }

    /// Resolve every question in order
    ///
    /// A failed model call costs nothing and yields `GET /v1/assets`.
    pub async fn generate(&self, questions: &[Question]) -> SubmissionReport {
        let model = &self.resolver.config().model;
        let mut report = SubmissionReport::default();

        for (index, question) in questions.iter().enumerate() {
            let request = match self
                .resolver
                .suggest_request(&question.question, &self.examples)
                .await
            {
                Ok((request, usage)) => {
                    report.total_cost += calculate_cost(&usage, model);
                    request
                }
                Err(e) => {
                    warn!("Question {} failed, using fallback request: {}", question.uid, e);
                    report.failures += 1;
                    ParsedRequest::default()
                }
            };

            report.rows.push(SubmissionRow {
                uid: question.uid.clone(),
                kind: request.method,
                request: request.path,
            });

            if (index + 1) % 10 == 0 {
                info!(
                    "Processed {}/{} questions, cost so far ${:.4}",
                    index + 1,
                    questions.len(),
                    report.total_cost
                );
            }
        }

        report
    }
}
