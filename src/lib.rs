//! Chat completion function calling wired to a places search provider.
//!
//! The model gets a `googlePlaces` tool. When it asks for it, the orchestrator
//! runs the search, feeds the results back and asks once more.
//!
//! # Example
//! ```no_run
//! use places_chat::{Client, DEFAULT_LOCATION};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), places_chat::Error> {
//!     let client = Client::from_env()?;
//!     let outcome = client
//!         .run("Find me the best coffee shops nearby", DEFAULT_LOCATION)
//!         .await?;
//!
//!     println!("{}", outcome.answer.unwrap_or_default());
//!     println!("Tokens: {} in, {} out", outcome.usage.input_tokens, outcome.usage.output_tokens);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod tools;
pub mod types;

pub use client::{Client, ClientBuilder, ClientConfig};
pub use error::Error;
pub use orchestrator::{Orchestrator, RunOutcome, DEFAULT_LOCATION};
pub use providers::{ChatProvider, PlacesProvider};
pub use tools::{GooglePlacesTool, ToolHandler, ToolRegistry};
pub use types::*;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
