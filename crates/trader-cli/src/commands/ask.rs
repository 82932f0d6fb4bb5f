//! Interactive question answering

use crate::cli::AskArgs;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use trader_core::{Example, HttpMethod, TradingIntent};
use trader_gateway::{GatewayClient, GatewayConfig};
use trader_intent::{AutoApprove, Confirm, Dispatcher, IntentResolver};
use trader_utils::Settings;

const EXIT_WORDS: &[&str] = &["exit", "quit", "выход"];

/// Asks on the terminal before a mutating call goes out
struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, method: HttpMethod, path: &str) -> bool {
        print!("[БЕЗОПАСНОСТЬ] Подтвердите {method} {path} (да/нет): ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "да" | "д" | "yes" | "y")
}

pub async fn run(settings: &Settings, args: AskArgs) -> Result<()> {
    let resolver = super::resolver(settings)?;
    let client = GatewayClient::new(GatewayConfig::from_settings(settings)?)?;
    let dispatcher = Dispatcher::new(Arc::new(client));

    let examples = match &args.train_file {
        Some(path) => {
            let all = trader_intent::load_examples(path)
                .with_context(|| format!("failed to load examples from {}", path.display()))?;
            trader_intent::select_balanced(&all, args.num_examples, &mut rand::thread_rng())
        }
        None => Vec::new(),
    };
    info!("Using {} few-shot examples", examples.len());

    let confirm: &dyn Confirm = if args.yes { &AutoApprove } else { &ConsoleConfirm };
    let session = Session {
        resolver: &resolver,
        dispatcher: &dispatcher,
        examples: &examples,
        confirm,
        dry_run: args.dry_run,
    };

    if let Some(question) = &args.question {
        return session.answer(question).await;
    }

    println!("Задайте вопрос (exit для выхода).");
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }

        session.answer(question).await?;
    }

    Ok(())
}

struct Session<'a> {
    resolver: &'a IntentResolver,
    dispatcher: &'a Dispatcher,
    examples: &'a [Example],
    confirm: &'a dyn Confirm,
    dry_run: bool,
}

impl Session<'_> {
    async fn answer(&self, question: &str) -> Result<()> {
        let intent = self.resolver.resolve(question, self.examples).await;
        print_intent(&intent)?;

        if self.dry_run {
            return Ok(());
        }

        let response = self
            .dispatcher
            .dispatch(&intent, self.confirm)
            .await
            .into_response();
        println!("{response}");
        Ok(())
    }
}

fn print_intent(intent: &TradingIntent) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(intent)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("да\n"));
        assert!(is_affirmative(" Yes "));
        assert!(is_affirmative("Д"));
        assert!(!is_affirmative("нет"));
        assert!(!is_affirmative(""));
    }
}
