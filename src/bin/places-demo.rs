//! Runs three example requests against the live providers.
//!
//! Run with: OPENAI_API_KEY=... GOOGLE_PLACES_API_KEY=... cargo run --bin places-demo

use places_chat::{Client, Error, DEFAULT_LOCATION};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const EXAMPLES: [(&str, &str); 3] = [
    ("Example 1: Find coffee shops", "Find me the best coffee shops nearby"),
    (
        "Example 2: Find pizza places",
        "I want to eat pizza. Show me some good pizza places within 2km",
    ),
    ("Example 3: Regular chat", "What's the capital of India?"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine, the variables may come from the shell.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("{}", "=".repeat(60));
    println!("Chat function calling with Google Places");
    println!("{}", "=".repeat(60));

    let client = match Client::from_env() {
        Ok(client) => client,
        Err(Error::MissingApiKey(provider)) => {
            eprintln!("Error: API key for {provider} not found!");
            println!("Set your OpenAI API key:");
            println!("   export OPENAI_API_KEY='your-api-key-here'");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let orchestrator = client.orchestrator();
    for (title, request) in EXAMPLES {
        println!("\n\n{title}");
        println!("{}", "-".repeat(60));
        println!("User: {request}");
        println!("Location: {DEFAULT_LOCATION}");

        match orchestrator
            .run_with_cancel(request, DEFAULT_LOCATION, &cancel)
            .await
        {
            Ok(outcome) => {
                println!(
                    "\nAssistant: {}",
                    outcome.answer.as_deref().unwrap_or("(no content)")
                );
                println!(
                    "Rounds: {}, tool calls: {}, tokens: {} in / {} out",
                    outcome.rounds,
                    outcome.tool_calls,
                    outcome.usage.input_tokens,
                    outcome.usage.output_tokens
                );
            }
            Err(e) => {
                eprintln!("\nConversation error: {e}");
                break;
            }
        }

        println!("\n{}\n", "=".repeat(60));
    }

    Ok(())
}
