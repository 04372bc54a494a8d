//! Wire types shared by the agent and the UI: commands and the structured
//! agent response envelope.

pub mod mapper;

pub use mapper::{describe, map_name, parse_many, parse_one, transform_for, transform_parameters};

use crate::scene::VehicleConfiguration;
use serde_json::Value;

pub const DEFAULT_CLIENT_ID: &str = "default";

/// Canonical command kinds the orchestrator knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    ChangeModel,
    ChangeColor,
    ChangeRoughness,
    ChangeLift,
    ChangeWheels,
    ChangeRimColor,
    ChangeTires,
    ChangeAddon,
    RemoveAddon,
    ToggleSpare,
    ResetVehicle,
    SaveVehicle,
}

impl CommandType {
    pub const ALL: [CommandType; 12] = [
        CommandType::ChangeModel,
        CommandType::ChangeColor,
        CommandType::ChangeRoughness,
        CommandType::ChangeLift,
        CommandType::ChangeWheels,
        CommandType::ChangeRimColor,
        CommandType::ChangeTires,
        CommandType::ChangeAddon,
        CommandType::RemoveAddon,
        CommandType::ToggleSpare,
        CommandType::ResetVehicle,
        CommandType::SaveVehicle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::ChangeModel => "change_model",
            CommandType::ChangeColor => "change_color",
            CommandType::ChangeRoughness => "change_roughness",
            CommandType::ChangeLift => "change_lift",
            CommandType::ChangeWheels => "change_wheels",
            CommandType::ChangeRimColor => "change_rim_color",
            CommandType::ChangeTires => "change_tires",
            CommandType::ChangeAddon => "change_addon",
            CommandType::RemoveAddon => "remove_addon",
            CommandType::ToggleSpare => "toggle_spare",
            CommandType::ResetVehicle => "reset_vehicle",
            CommandType::SaveVehicle => "save_vehicle",
        }
    }

    /// Exact canonical name only; synonyms go through [`map_name`].
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command as it travels on the wire. `command_type` stays a string so an
/// envelope carrying a kind this build does not know still deserializes; the
/// orchestrator skips it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Command {
    pub command_type: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call_id: Option<String>,
}

impl Command {
    pub fn new(kind: CommandType, parameters: Value, description: impl Into<String>) -> Self {
        Self {
            command_type: kind.as_str().to_string(),
            parameters,
            description: description.into(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            function_call_id: None,
        }
    }

    pub fn kind(&self) -> Option<CommandType> {
        CommandType::from_canonical(&self.command_type)
    }
}

/// Structured agent response: incremental updates plus an optional
/// authoritative end state.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub vehicle_updates: Vec<Command>,
    #[serde(default)]
    pub final_vehicle_state: Option<VehicleConfiguration>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentResponse {
    /// Pulls the `structured` field out of one streamed chunk, if present
    /// and well formed.
    pub fn from_chunk(chunk: &Value) -> Option<Self> {
        let structured = chunk.get("structured")?;
        if structured.is_null() {
            return None;
        }
        match serde_json::from_value(structured.clone()) {
            Ok(response) => Some(response),
            Err(err) => {
                log::warn!("Ignoring malformed structured response: {}", err);
                None
            }
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}
