//! Startup configuration and wiring of providers, tools and orchestrator.

use crate::error::Error;
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::providers::google_places::GooglePlacesProvider;
use crate::providers::openai::{OpenAIProvider, DEFAULT_MODEL};
use crate::providers::{http_client, ChatProvider, PlacesProvider, RequestConfig};
use crate::tools::{GooglePlacesTool, ToolRegistry};
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Provider name for the chat completions API.
pub const OPENAI: &str = "openai";
/// Provider name for the places search API.
pub const GOOGLE_PLACES: &str = "google_places";

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Per-request timeout for both providers.
    pub timeout: Duration,
    /// Chat model identifier.
    pub model: String,
    /// Chat request options.
    pub request: RequestConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            model: DEFAULT_MODEL.to_string(),
            request: RequestConfig::default(),
        }
    }
}

/// Builder for Client.
pub struct ClientBuilder {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
            config: ClientConfig::default(),
        }
    }

    /// Add an API key for a provider.
    pub fn api_key(mut self, provider: &str, key: impl Into<String>) -> Self {
        self.api_keys.insert(provider.to_string(), key.into());
        self
    }

    /// Set a custom base URL for a provider (useful for testing with mock servers).
    pub fn base_url(mut self, provider: &str, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider.to_string(), url.into());
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the chat model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set maximum tokens per chat round.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.request.max_tokens = Some(tokens);
        self
    }

    /// Set sampling temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.request.temperature = Some(temp);
        self
    }

    /// Load settings from environment variables.
    pub fn from_env(self) -> Self {
        self.from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through `lookup`; the first non-empty variable of each group wins.
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|v| !v.trim().is_empty())
        };

        let key_mappings = [
            (OPENAI, &["OPENAI_API_KEY", "apiKey"][..]),
            (GOOGLE_PLACES, &["GOOGLE_PLACES_API_KEY", "googleApiKey"][..]),
        ];
        for (provider, names) in key_mappings {
            if let Some(key) = first(names) {
                self.api_keys.insert(provider.to_string(), key);
            }
        }

        let url_mappings = [
            (OPENAI, "OPENAI_BASE_URL"),
            (GOOGLE_PLACES, "GOOGLE_PLACES_BASE_URL"),
        ];
        for (provider, name) in url_mappings {
            if let Some(url) = first(&[name][..]) {
                self.base_urls.insert(provider.to_string(), url);
            }
        }

        if let Some(model) = first(&["OPENAI_MODEL"][..]) {
            self.config.model = model;
        }

        self
    }

    /// Build the client. Fails when no chat API key is configured.
    pub fn build(self) -> Result<Client, Error> {
        let chat_key = self
            .api_keys
            .get(OPENAI)
            .ok_or_else(|| Error::MissingApiKey(OPENAI.to_string()))?;

        let http = http_client(self.config.timeout)?;

        let mut chat = OpenAIProvider::new(http.clone(), chat_key.as_str())
            .with_model(self.config.model.as_str())
            .with_config(self.config.request.clone());
        if let Some(url) = self.base_urls.get(OPENAI) {
            chat = chat.with_base_url(url.as_str());
        }

        let places = match self.api_keys.get(GOOGLE_PLACES) {
            Some(key) => {
                let mut places = GooglePlacesProvider::new(http, key.as_str());
                if let Some(url) = self.base_urls.get(GOOGLE_PLACES) {
                    places = places.with_base_url(url.as_str());
                }
                Some(Arc::new(places) as Arc<dyn PlacesProvider>)
            }
            None => {
                warn!("no places API key configured, googlePlaces tool disabled");
                None
            }
        };

        Ok(Client {
            chat: Arc::new(chat),
            places,
            config: self.config,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configured providers, ready to hand out orchestrators.
#[derive(Clone)]
pub struct Client {
    chat: Arc<dyn ChatProvider>,
    places: Option<Arc<dyn PlacesProvider>>,
    config: ClientConfig,
}

impl Client {
    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        ClientBuilder::new().from_env().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn chat(&self) -> Arc<dyn ChatProvider> {
        self.chat.clone()
    }

    pub fn places(&self) -> Option<Arc<dyn PlacesProvider>> {
        self.places.clone()
    }

    /// Tools available with the configured providers.
    pub fn tools(&self) -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        if let Some(places) = &self.places {
            tools.register(Arc::new(GooglePlacesTool::new(places.clone())));
        }
        tools
    }

    /// An orchestrator over this client's providers.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.chat.clone(), self.tools())
    }

    /// Run one request end to end.
    pub async fn run(&self, user_message: &str, location: &str) -> Result<RunOutcome, Error> {
        self.orchestrator().run(user_message, location).await
    }
}
