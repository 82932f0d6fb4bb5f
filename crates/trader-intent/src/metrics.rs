//! Accuracy of predicted requests against labeled ground truth
//!
//! A prediction counts as correct when both its method and its normalized
//! request match. Normalization drops a leading HTTP verb and replaces the
//! account id after `/accounts/` with `<some_id>`, so predictions are not
//! penalised for guessing a different account.

use crate::dataset::{DELIMITER, read_records};
use crate::error::{IntentError, Result};
use csv::WriterBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

static LEADING_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s+").expect("verb pattern is valid")
});

static ACCOUNT_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/accounts/[^/]+/").expect("account pattern is valid"));

/// Methods always present in [`MetricsReport::per_method`]
const TRACKED_METHODS: [&str; 3] = ["GET", "POST", "DELETE"];

/// `type` and `request` of one labeled or predicted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub request: String,
}

#[derive(Debug, Deserialize)]
struct LabeledRow {
    uid: String,
    #[serde(rename = "type")]
    kind: String,
    request: String,
}

/// Normalize a request for comparison
pub fn normalize_request(request: &str, method: Option<&str>) -> String {
    let mut request = request.trim();
    if let Some(method) = method {
        if request.len() >= method.len()
            && request.is_char_boundary(method.len())
            && request[..method.len()].eq_ignore_ascii_case(method)
        {
            request = request[method.len()..].trim_start();
        }
    }

    let request = LEADING_VERB.replace(request, "");
    ACCOUNT_SEGMENT
        .replace_all(request.trim_start(), "/accounts/<some_id>/")
        .into_owned()
}

/// Load a `uid;type;request` file keyed by uid
pub fn load_labeled(path: impl AsRef<Path>) -> Result<BTreeMap<String, LabeledRequest>> {
    let rows: Vec<LabeledRow> = read_records(path.as_ref())?;
    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.uid,
                LabeledRequest {
                    kind: row.kind,
                    request: row.request,
                },
            )
        })
        .collect())
}

/// Confusion counts and derived scores for one method
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MethodStats {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl MethodStats {
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// No prediction for this uid
    Missing,
    /// Prediction differs in method or request
    Mismatch,
}

/// One failed prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationError {
    pub uid: String,
    #[serde(rename = "error_type")]
    pub kind: ErrorKind,
    pub true_type: String,
    pub pred_type: Option<String>,
    pub true_request: String,
    pub pred_request: Option<String>,
    pub true_request_norm: Option<String>,
    pub pred_request_norm: Option<String>,
    #[serde(serialize_with = "yes_no")]
    pub type_match: Option<bool>,
    #[serde(serialize_with = "yes_no")]
    pub request_match: Option<bool>,
}

fn yes_no<S: serde::Serializer>(value: &Option<bool>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "",
    })
}

/// Outcome of comparing predictions with ground truth
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    pub total: usize,
    pub correct: usize,
    pub correct_type: usize,
    pub correct_request: usize,
    pub per_method: BTreeMap<String, MethodStats>,
    pub errors: Vec<EvaluationError>,
}

impl MetricsReport {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    pub fn type_accuracy(&self) -> f64 {
        ratio(self.correct_type, self.total)
    }

    pub fn request_accuracy(&self) -> f64 {
        ratio(self.correct_request, self.total)
    }

    /// Write every error as `;`-separated CSV, creating parent directories
    pub fn write_errors_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IntentError::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| IntentError::io(path, e))?;
        let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_writer(file);
        for error in &self.errors {
            writer.serialize(error)?;
        }
        writer.flush().map_err(|e| IntentError::io(path, e))?;

        info!("Wrote {} evaluation errors to {}", self.errors.len(), path.display());
        Ok(())
    }

    fn stats(&mut self, method: &str) -> &mut MethodStats {
        self.per_method.entry(method.to_string()).or_default()
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Compare predictions with ground truth, uid by uid
///
/// Predictions for uids absent from the ground truth are ignored.
pub fn evaluate(
    predicted: &BTreeMap<String, LabeledRequest>,
    truth: &BTreeMap<String, LabeledRequest>,
) -> MetricsReport {
    let mut report = MetricsReport {
        total: truth.len(),
        per_method: TRACKED_METHODS
            .iter()
            .map(|m| ((*m).to_string(), MethodStats::default()))
            .collect(),
        ..MetricsReport::default()
    };

    for (uid, expected) in truth {
        let Some(actual) = predicted.get(uid) else {
            report.stats(&expected.kind).false_negatives += 1;
            report.errors.push(EvaluationError {
                uid: uid.clone(),
                kind: ErrorKind::Missing,
                true_type: expected.kind.clone(),
                pred_type: None,
                true_request: expected.request.clone(),
                pred_request: None,
                true_request_norm: None,
                pred_request_norm: None,
                type_match: None,
                request_match: None,
            });
            continue;
        };

        let true_norm = normalize_request(&expected.request, Some(&expected.kind));
        let pred_norm = normalize_request(&actual.request, Some(&actual.kind));
        let type_match = expected.kind == actual.kind;
        let request_match = true_norm == pred_norm;

        report.correct_type += usize::from(type_match);
        report.correct_request += usize::from(request_match);

        if type_match && request_match {
            report.correct += 1;
            report.stats(&expected.kind).true_positives += 1;
            continue;
        }

        if !type_match {
            report.stats(&expected.kind).false_negatives += 1;
            report.stats(&actual.kind).false_positives += 1;
        }
        report.errors.push(EvaluationError {
            uid: uid.clone(),
            kind: ErrorKind::Mismatch,
            true_type: expected.kind.clone(),
            pred_type: Some(actual.kind.clone()),
            true_request: expected.request.clone(),
            pred_request: Some(actual.request.clone()),
            true_request_norm: Some(true_norm),
            pred_request_norm: Some(pred_norm),
            type_match: Some(type_match),
            request_match: Some(request_match),
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn labeled(rows: &[(&str, &str, &str)]) -> BTreeMap<String, LabeledRequest> {
        rows.iter()
            .map(|(uid, kind, request)| {
                (
                    (*uid).to_string(),
                    LabeledRequest {
                        kind: (*kind).to_string(),
                        request: (*request).to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_normalize_strips_verb_and_account() {
        assert_eq!(
            normalize_request("GET /v1/accounts/A123/orders", None),
            "/v1/accounts/<some_id>/orders"
        );
        assert_eq!(
            normalize_request("delete /v1/accounts/1/orders/5", Some("DELETE")),
            "/v1/accounts/<some_id>/orders/5"
        );
        assert_eq!(normalize_request("OPTIONS /v1/assets", None), "/v1/assets");
        assert_eq!(normalize_request("/v1/exchanges", Some("GET")), "/v1/exchanges");
    }

    #[test]
    fn test_normalize_keeps_account_without_trailing_segment() {
        assert_eq!(normalize_request("/v1/accounts/A1", None), "/v1/accounts/A1");
    }

    #[test]
    fn test_evaluate_perfect() {
        let truth = labeled(&[
            ("1", "GET", "/v1/accounts/A1/orders"),
            ("2", "POST", "/v1/sessions"),
        ]);
        let predicted = labeled(&[
            ("1", "GET", "/v1/accounts/OTHER/orders"),
            ("2", "POST", "POST /v1/sessions"),
        ]);

        let report = evaluate(&predicted, &truth);
        assert_eq!(report.correct, 2);
        assert_eq!(report.accuracy(), 1.0);
        assert!(report.errors.is_empty());
        assert_eq!(report.per_method["GET"].true_positives, 1);
        assert_eq!(report.per_method["DELETE"], MethodStats::default());
    }

    #[test]
    fn test_evaluate_mismatch_and_missing() {
        let truth = labeled(&[
            ("1", "GET", "/v1/exchanges"),
            ("2", "DELETE", "/v1/accounts/A1/orders/5"),
            ("3", "GET", "/v1/assets"),
            ("4", "POST", "/v1/sessions"),
        ]);
        let predicted = labeled(&[
            ("1", "GET", "/v1/exchanges"),
            ("2", "GET", "/v1/accounts/A1/orders/5"),
            ("3", "GET", "/v1/assets/SBER@MISX"),
        ]);

        let report = evaluate(&predicted, &truth);
        assert_eq!(report.total, 4);
        assert_eq!(report.correct, 1);
        assert_eq!(report.correct_type, 2);
        assert_eq!(report.correct_request, 2);
        assert_eq!(report.accuracy(), 0.25);
        assert_eq!(report.type_accuracy(), 0.5);

        let get = report.per_method["GET"];
        assert_eq!((get.true_positives, get.false_positives, get.false_negatives), (1, 1, 0));
        assert_eq!(get.precision(), 0.5);
        assert_eq!(get.recall(), 1.0);
        assert!((get.f1() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.per_method["DELETE"].false_negatives, 1);
        assert_eq!(report.per_method["POST"].false_negatives, 1);

        assert_eq!(report.errors.len(), 3);
        let kinds: Vec<(&str, ErrorKind)> = report
            .errors
            .iter()
            .map(|e| (e.uid.as_str(), e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("2", ErrorKind::Mismatch),
                ("3", ErrorKind::Mismatch),
                ("4", ErrorKind::Missing),
            ]
        );
        assert_eq!(report.errors[1].type_match, Some(true));
        assert_eq!(report.errors[1].request_match, Some(false));
    }

    #[test]
    fn test_empty_truth() {
        let report = evaluate(&BTreeMap::new(), &BTreeMap::new());
        assert_eq!(report.accuracy(), 0.0);
        assert_eq!(MethodStats::default().f1(), 0.0);
    }

    #[test]
    fn test_load_labeled_and_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        let truth_path = dir.path().join("train.csv");
        let mut file = File::create(&truth_path).unwrap();
        file.write_all("uid;question;type;request\n1;Биржи;GET;/v1/exchanges\n2;Сессия;POST;/v1/sessions\n".as_bytes())
            .unwrap();

        let truth = load_labeled(&truth_path).unwrap();
        assert_eq!(truth["2"].kind, "POST");

        let predicted = labeled(&[("1", "GET", "/v1/assets")]);
        let report = evaluate(&predicted, &truth);
        let errors_path = dir.path().join("errors.csv");
        report.write_errors_csv(&errors_path).unwrap();

        let text = fs::read_to_string(&errors_path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "uid;error_type;true_type;pred_type;true_request;pred_request;\
                 true_request_norm;pred_request_norm;type_match;request_match"
            )
        );
        assert_eq!(
            lines.next(),
            Some("1;mismatch;GET;GET;/v1/exchanges;/v1/assets;/v1/exchanges;/v1/assets;yes;no")
        );
        assert_eq!(lines.next(), Some("2;missing;POST;;/v1/sessions;;;;;"));
    }
}
