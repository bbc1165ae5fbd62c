//! Tool registry and the handlers the model can invoke.

use crate::error::Error;
use crate::providers::PlacesProvider;
use crate::types::{places_to_payload, LatLng, Tool, ToolCall};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Name the places tool is exposed under.
pub const GOOGLE_PLACES_TOOL: &str = "googlePlaces";

/// Search radius used when the model omits one.
pub const DEFAULT_RADIUS_METERS: u32 = 1000;

/// A callable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> Tool;

    /// Execute with decoded arguments; the object already carries every required key.
    async fn call(&self, arguments: Value) -> Result<String, Error>;
}

/// Name -> handler mapping used to dispatch tool calls.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its definition's name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        let name = handler.definition().function.name;
        info!(tool = %name, "registering tool");
        self.handlers.insert(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Schemas of every registered tool, ordered by name.
    pub fn definitions(&self) -> Vec<Tool> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Execute one tool call.
    ///
    /// Returns `Ok(None)` without calling anything when the name is not registered.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Option<String>, Error> {
        let name = call.function.name.as_str();
        let Some(handler) = self.handlers.get(name) else {
            warn!(tool = %name, id = %call.id, "model requested unknown tool");
            return Ok(None);
        };

        let arguments: Value = call
            .function
            .parse_arguments()
            .map_err(|e| Error::argument_decode(name, e.to_string()))?;
        let Some(object) = arguments.as_object() else {
            return Err(Error::argument_decode(name, "arguments are not a JSON object"));
        };
        let definition = handler.definition();
        if let Some(missing) = definition
            .required_keys()
            .into_iter()
            .find(|key| !object.contains_key(*key))
        {
            return Err(Error::argument_decode(
                name,
                format!("missing required key `{missing}`"),
            ));
        }

        info!(tool = %name, id = %call.id, arguments = %call.function.arguments, "executing tool");
        handler.call(arguments).await.map(Some)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Exposes a [`PlacesProvider`] to the model as `googlePlaces`.
pub struct GooglePlacesTool {
    places: Arc<dyn PlacesProvider>,
}

#[derive(Debug, Deserialize)]
struct PlacesArgs {
    query: String,
    location: String,
    radius: Option<f64>,
}

impl GooglePlacesTool {
    pub fn new(places: Arc<dyn PlacesProvider>) -> Self {
        Self { places }
    }
}

/// Models send JSON numbers, so accept fractional meters and round.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn radius_meters(radius: Option<f64>) -> Result<u32, String> {
    match radius {
        None => Ok(DEFAULT_RADIUS_METERS),
        Some(r) if (0.5..=f64::from(u32::MAX)).contains(&r) => Ok(r.round() as u32),
        Some(r) => Err(format!("radius {r} is not a positive number of meters")),
    }
}

#[async_trait]
impl ToolHandler for GooglePlacesTool {
    fn definition(&self) -> Tool {
        Tool::function(
            GOOGLE_PLACES_TOOL,
            "Search for places using Google Places API. Useful for finding restaurants, cafes, shops, tourist spots, etc.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query (e.g., 'coffee shop', 'pizza restaurant')"
                    },
                    "location": {
                        "type": "string",
                        "description": "The latitude,longitude coordinates (e.g., '37.7749,-122.4194')"
                    },
                    "radius": {
                        "type": "number",
                        "description": "Search radius in meters (default: 1000)",
                        "default": DEFAULT_RADIUS_METERS
                    }
                },
                "required": ["query", "location"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<String, Error> {
        let args: PlacesArgs = serde_json::from_value(arguments)
            .map_err(|e| Error::argument_decode(GOOGLE_PLACES_TOOL, e.to_string()))?;
        if args.query.trim().is_empty() {
            return Err(Error::argument_decode(GOOGLE_PLACES_TOOL, "query is empty"));
        }
        args.location
            .parse::<LatLng>()
            .map_err(|e| Error::argument_decode(GOOGLE_PLACES_TOOL, e.to_string()))?;
        let radius = radius_meters(args.radius)
            .map_err(|msg| Error::argument_decode(GOOGLE_PLACES_TOOL, msg))?;

        let places = self.places.search(&args.query, &args.location, radius).await?;
        info!(count = places.len(), "places tool returned");
        places_to_payload(&places)
    }
}
