//! Batch submission generation

use crate::cli::SubmitArgs;
use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;
use trader_intent::{Submission, load_examples, load_questions, select_balanced};
use trader_utils::Settings;

pub async fn run(settings: &Settings, args: SubmitArgs) -> Result<()> {
    let resolver = super::resolver(settings)?;

    let all = load_examples(&args.train_file)
        .with_context(|| format!("failed to load examples from {}", args.train_file.display()))?;
    let examples = select_balanced(&all, args.num_examples, &mut rand::thread_rng());
    println!("Загружено {} примеров для few-shot learning", examples.len());
    println!("Используется модель: {}", resolver.config().model);

    let questions = load_questions(&args.test_file)
        .with_context(|| format!("failed to load questions from {}", args.test_file.display()))?;
    println!("Найдено {} вопросов для обработки", questions.len());

    let report = Submission::new(&resolver, examples).generate(&questions).await;
    report.write_csv(&args.output_file)?;
    info!("Submission written to {}", args.output_file.display());

    println!("Готово! Создано {} записей в {}", report.rows.len(), args.output_file.display());
    println!("Общая стоимость генерации: ${:.4}", report.total_cost);
    println!("Средняя стоимость на запрос: ${:.6}", report.average_cost());
    if report.failures > 0 {
        println!("Ошибок генерации: {}", report.failures);
    }

    let mut table = Table::new();
    table.set_header(vec!["Type", "Count"]);
    for (method, count) in report.type_counts() {
        table.add_row(vec![method.to_string(), count.to_string()]);
    }
    println!("{table}");

    Ok(())
}
