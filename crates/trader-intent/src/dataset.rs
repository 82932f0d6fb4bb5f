//! Semicolon-separated datasets
//!
//! - training examples: `question;type;request` (extra columns such as
//!   `uid` are ignored)
//! - test questions: `uid;question`

use crate::error::{IntentError, Result};
use csv::{ReaderBuilder, Trim};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::debug;
use trader_core::{Example, HttpMethod};

pub(crate) const DELIMITER: u8 = b';';

/// Number of examples reserved for mutating verbs in a balanced selection
const POST_SLOTS: usize = 2;
const DELETE_SLOTS: usize = 1;

/// One unlabeled test question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub uid: String,
    pub question: String,
}

pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| IntentError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(Trim::All)
        .from_reader(file);

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Load labeled few-shot examples
pub fn load_examples(path: impl AsRef<Path>) -> Result<Vec<Example>> {
    read_records(path.as_ref())
}

/// Load unlabeled test questions
pub fn load_questions(path: impl AsRef<Path>) -> Result<Vec<Question>> {
    read_records(path.as_ref())
}

/// Random few-shot selection balanced across verbs
///
/// Takes up to `n - 3` GET, up to 2 POST and up to 1 DELETE example, then
/// truncates to `n`.
pub fn select_balanced<R: Rng + ?Sized>(examples: &[Example], n: usize, rng: &mut R) -> Vec<Example> {
    let pick = |method: HttpMethod, amount: usize, rng: &mut R| -> Vec<Example> {
        let pool: Vec<&Example> = examples.iter().filter(|e| e.is_method(method)).collect();
        pool.choose_multiple(rng, amount)
            .map(|e| (*e).clone())
            .collect()
    };

    let mut selected = pick(HttpMethod::Get, n.saturating_sub(POST_SLOTS + DELETE_SLOTS), rng);
    selected.extend(pick(HttpMethod::Post, POST_SLOTS, rng));
    selected.extend(pick(HttpMethod::Delete, DELETE_SLOTS, rng));
    selected.truncate(n);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn pool() -> Vec<Example> {
        let mut examples = Vec::new();
        for i in 0..10 {
            examples.push(Example::new(format!("get {i}"), "GET", "/v1/exchanges"));
        }
        for i in 0..4 {
            examples.push(Example::new(format!("post {i}"), "POST", "/v1/sessions"));
        }
        for i in 0..3 {
            examples.push(Example::new(
                format!("delete {i}"),
                "DELETE",
                "/v1/accounts/{account_id}/orders/1",
            ));
        }
        examples
    }

    fn count(examples: &[Example], method: HttpMethod) -> usize {
        examples.iter().filter(|e| e.is_method(method)).count()
    }

    #[test]
    fn test_load_examples() {
        let file = write_csv(
            "uid;question;type;request\n\
             1;Какие биржи доступны?;GET;/v1/exchanges\n\
             2;Отмени заявку 5; DELETE ;/v1/accounts/{account_id}/orders/5\n",
        );

        let examples = load_examples(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(
            examples[0],
            Example::new("Какие биржи доступны?", "GET", "/v1/exchanges")
        );
        assert_eq!(examples[1].kind, "DELETE");
    }

    #[test]
    fn test_load_questions() {
        let file = write_csv("uid;question\nq1;Цена Сбербанка?\nq2;Мой портфель\n");

        let questions = load_questions(file.path()).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].uid, "q2");
        assert_eq!(questions[1].question, "Мой портфель");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_examples("/definitely/not/here.csv");
        assert!(matches!(result, Err(IntentError::Io { .. })));
    }

    #[test]
    fn test_missing_column_is_csv_error() {
        let file = write_csv("question;type\nБиржи;GET\n");
        assert!(matches!(load_examples(file.path()), Err(IntentError::Csv(_))));
    }

    #[test]
    fn test_select_balanced_mix() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_balanced(&pool(), 8, &mut rng);

        assert_eq!(selected.len(), 8);
        assert_eq!(count(&selected, HttpMethod::Get), 5);
        assert_eq!(count(&selected, HttpMethod::Post), 2);
        assert_eq!(count(&selected, HttpMethod::Delete), 1);
    }

    #[test]
    fn test_select_balanced_small_n_truncates() {
        let mut rng = StdRng::seed_from_u64(1);
        let selected = select_balanced(&pool(), 2, &mut rng);

        assert_eq!(selected.len(), 2);
        assert_eq!(count(&selected, HttpMethod::Post), 2);
    }

    #[test]
    fn test_select_balanced_short_pool() {
        let examples = vec![
            Example::new("a", "GET", "/v1/exchanges"),
            Example::new("b", "POST", "/v1/sessions"),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let selected = select_balanced(&examples, 10, &mut rng);

        assert_eq!(selected.len(), 2);
    }
}
