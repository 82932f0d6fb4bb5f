//! Submission scoring

use crate::cli::MetricsArgs;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use trader_intent::metrics::{ErrorKind, EvaluationError};
use trader_intent::{MetricsReport, evaluate, load_labeled};

pub fn run(args: &MetricsArgs) -> Result<()> {
    println!("Predicted:    {}", args.pred.display());
    println!("Ground truth: {}", args.truth.display());

    let predicted = load_labeled(&args.pred)
        .with_context(|| format!("failed to read {}", args.pred.display()))?;
    let truth = load_labeled(&args.truth)
        .with_context(|| format!("failed to read {}", args.truth.display()))?;

    let report = evaluate(&predicted, &truth);
    print_summary(&report);
    println!("{}", method_table(&report));

    if args.show_errors > 0 && !report.errors.is_empty() {
        println!("\nПримеры ошибок (первые {}):", args.show_errors);
        for (index, error) in report.errors.iter().take(args.show_errors).enumerate() {
            print_error(index + 1, error);
        }
    }

    if let Some(path) = &args.save_errors {
        if !report.errors.is_empty() {
            report.write_errors_csv(path)?;
            println!("\nОшибки сохранены в: {}", path.display());
        }
    }

    println!("\n{}", verdict(report.accuracy()));
    Ok(())
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn print_summary(report: &MetricsReport) {
    println!(
        "\nAccuracy = {}/{} = {:.4} ({})",
        report.correct,
        report.total,
        report.accuracy(),
        percent(report.accuracy())
    );
    println!("Всего запросов:       {}", report.total);
    println!("Правильный type:      {} ({})", report.correct_type, percent(report.type_accuracy()));
    println!(
        "Правильный request:   {} ({})",
        report.correct_request,
        percent(report.request_accuracy())
    );
    println!("Ошибок:               {}", report.errors.len());
}

fn method_table(report: &MetricsReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Type", "TP", "FP", "FN", "Precision", "Recall", "F1"]);
    for (method, stats) in &report.per_method {
        table.add_row(vec![
            Cell::new(method),
            Cell::new(stats.true_positives),
            Cell::new(stats.false_positives),
            Cell::new(stats.false_negatives),
            Cell::new(format!("{:.4}", stats.precision())),
            Cell::new(format!("{:.4}", stats.recall())),
            Cell::new(format!("{:.4}", stats.f1())),
        ]);
    }
    table
}

fn print_error(number: usize, error: &EvaluationError) {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(format!("#{number} uid {}", error.uid)),
        Cell::new("Expected"),
        Cell::new("Predicted"),
    ]);

    match error.kind {
        ErrorKind::Missing => {
            table.add_row(vec![
                Cell::new("missing"),
                Cell::new(format!("{} {}", error.true_type, error.true_request)),
                Cell::new("-").fg(Color::Red),
            ]);
        }
        ErrorKind::Mismatch => {
            table.add_row(vec![
                Cell::new("type"),
                Cell::new(&error.true_type),
                marked(error.pred_type.as_deref(), error.type_match),
            ]);
            table.add_row(vec![
                Cell::new("request"),
                Cell::new(&error.true_request),
                marked(error.pred_request.as_deref(), error.request_match),
            ]);
            table.add_row(vec![
                Cell::new("normalized"),
                Cell::new(error.true_request_norm.as_deref().unwrap_or("")),
                Cell::new(error.pred_request_norm.as_deref().unwrap_or("")),
            ]);
        }
    }
    println!("{table}");
}

fn marked(value: Option<&str>, matched: Option<bool>) -> Cell {
    let cell = Cell::new(value.unwrap_or(""));
    if matched == Some(true) {
        cell.fg(Color::Green)
    } else {
        cell.fg(Color::Red)
    }
}

fn verdict(accuracy: f64) -> &'static str {
    if accuracy >= 1.0 {
        "ИДЕАЛЬНО! Все запросы совпали с эталоном!"
    } else if accuracy >= 0.9 {
        "ОТЛИЧНО! Очень высокая точность!"
    } else if accuracy >= 0.7 {
        "ХОРОШО! Приличная точность, но есть куда расти."
    } else if accuracy >= 0.5 {
        "СРЕДНЕ. Нужно улучшать промпт и few-shot примеры."
    } else {
        "ПЛОХО. Требуется серьезная доработка."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_thresholds() {
        assert!(verdict(1.0).starts_with("ИДЕАЛЬНО"));
        assert!(verdict(0.95).starts_with("ОТЛИЧНО"));
        assert!(verdict(0.7).starts_with("ХОРОШО"));
        assert!(verdict(0.5).starts_with("СРЕДНЕ"));
        assert!(verdict(0.1).starts_with("ПЛОХО"));
    }

    #[test]
    fn test_method_table_lists_tracked_methods() {
        let rendered = method_table(&MetricsReport::default()).to_string();
        assert!(rendered.contains("Precision"));

        let report = evaluate(&Default::default(), &Default::default());
        let rendered = method_table(&report).to_string();
        for method in ["GET", "POST", "DELETE"] {
            assert!(rendered.contains(method));
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.25), "25.00%");
    }
}
