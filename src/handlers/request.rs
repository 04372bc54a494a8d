//! The command registry: every write path (direct façade batch operations
//! and agent commands) decodes into one [`VehicleRequest`], which
//! `SceneHandlers::execute` applies through a single dispatch.

use super::HandlerError;
use crate::commands::CommandType;
use serde_json::Value;

/// Partial wheel update; only `Some` fields are validated and written.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct WheelConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim_color_secondary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim_diameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rim_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tire: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tire_diameter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheel_offset: Option<f64>,
}

impl WheelConfiguration {
    pub fn is_empty(&self) -> bool {
        *self == WheelConfiguration::default()
    }

    /// Accepts façade keys (`rim`, `tire`) and agent keys (`rim_id`, `tire_id`).
    pub fn from_params(params: &Value) -> Result<Self, HandlerError> {
        if !params.is_object() {
            return Err(HandlerError::structural(
                "wheel configuration must be an object",
            ));
        }
        Ok(Self {
            rim: string_field(params, &["rim", "rim_id"])?,
            rim_color: string_field(params, &["rim_color"])?,
            rim_color_secondary: string_field(params, &["rim_color_secondary"])?,
            rim_diameter: number_field(params, &["rim_diameter"])?,
            rim_width: number_field(params, &["rim_width"])?,
            tire: string_field(params, &["tire", "tire_id"])?,
            tire_diameter: number_field(params, &["tire_diameter"])?,
            wheel_offset: number_field(params, &["wheel_offset"])?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleRequest {
    SetBody(String),
    SetColor(String),
    SetRoughness(f64),
    SetLift(f64),
    SetRim(String),
    SetRimColor(String),
    SetRimSecondaryColor(String),
    SetRimDiameter(f64),
    SetRimWidth(f64),
    SetTire(String),
    SetTireDiameter(f64),
    SetWheelOffset(f64),
    SetWheelConfiguration(WheelConfiguration),
    SetAddon { slot: String, value: String },
    RemoveAddon(String),
    SetSpare(bool),
    /// Flips whatever the spare currently is.
    ToggleSpare,
    Reset,
    ResetComplete,
    Save(String),
    LoadSaved(String),
    DeleteSaved(String),
    RenameSaved { id: String, name: String },
    Import(Value),
}

/// Façade mutation names accepted by `applyBatchUpdates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetVehicleBody,
    SetVehicleColor,
    SetVehicleRoughness,
    SetVehicleLift,
    SetRim,
    SetRimColor,
    SetRimSecondaryColor,
    SetRimDiameter,
    SetRimWidth,
    SetTire,
    SetTireDiameter,
    SetWheelOffset,
    SetWheelConfiguration,
    SetVehicleAddon,
    RemoveVehicleAddon,
    SetSpareTire,
    ResetVehicle,
    ResetVehicleComplete,
    SaveVehicle,
    LoadSavedVehicle,
    DeleteSavedVehicle,
    RenameSavedVehicle,
    ImportVehicleConfiguration,
}

const OPERATION_NAMES: &[(&str, Operation)] = &[
    ("setVehicleBody", Operation::SetVehicleBody),
    ("setVehicleColor", Operation::SetVehicleColor),
    ("setVehicleRoughness", Operation::SetVehicleRoughness),
    ("setVehicleLift", Operation::SetVehicleLift),
    ("setRim", Operation::SetRim),
    ("setRimColor", Operation::SetRimColor),
    ("setRimSecondaryColor", Operation::SetRimSecondaryColor),
    ("setRimDiameter", Operation::SetRimDiameter),
    ("setRimWidth", Operation::SetRimWidth),
    ("setTire", Operation::SetTire),
    ("setTireDiameter", Operation::SetTireDiameter),
    ("setWheelOffset", Operation::SetWheelOffset),
    ("setWheelConfiguration", Operation::SetWheelConfiguration),
    ("setVehicleAddon", Operation::SetVehicleAddon),
    ("removeVehicleAddon", Operation::RemoveVehicleAddon),
    ("setSpareTire", Operation::SetSpareTire),
    ("resetVehicle", Operation::ResetVehicle),
    ("resetVehicleComplete", Operation::ResetVehicleComplete),
    ("saveVehicle", Operation::SaveVehicle),
    ("loadSavedVehicle", Operation::LoadSavedVehicle),
    ("deleteSavedVehicle", Operation::DeleteSavedVehicle),
    ("renameSavedVehicle", Operation::RenameSavedVehicle),
    ("importVehicleConfiguration", Operation::ImportVehicleConfiguration),
];

impl Operation {
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATION_NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, operation)| *operation)
    }

    pub fn name(&self) -> &'static str {
        OPERATION_NAMES
            .iter()
            .find(|(_, operation)| operation == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        OPERATION_NAMES.iter().map(|(name, _)| *name)
    }

    /// Scalar operations accept the bare value or an object wrapping it.
    pub fn decode(&self, params: &Value) -> Result<VehicleRequest, HandlerError> {
        let request = match self {
            Operation::SetVehicleBody => {
                VehicleRequest::SetBody(scalar_string(params, &["model_id", "body", "modelId"])?)
            }
            Operation::SetVehicleColor => {
                VehicleRequest::SetColor(scalar_string(params, &["color"])?)
            }
            Operation::SetVehicleRoughness => {
                VehicleRequest::SetRoughness(scalar_number(params, &["roughness"])?)
            }
            Operation::SetVehicleLift => {
                VehicleRequest::SetLift(scalar_number(params, &["lift", "lift_height"])?)
            }
            Operation::SetRim => VehicleRequest::SetRim(scalar_string(params, &["rim", "rim_id"])?),
            Operation::SetRimColor => {
                VehicleRequest::SetRimColor(scalar_string(params, &["rim_color", "color"])?)
            }
            Operation::SetRimSecondaryColor => VehicleRequest::SetRimSecondaryColor(
                scalar_string(params, &["rim_color_secondary", "color"])?,
            ),
            Operation::SetRimDiameter => VehicleRequest::SetRimDiameter(
                scalar_number(params, &["rim_diameter", "diameter"])?,
            ),
            Operation::SetRimWidth => {
                VehicleRequest::SetRimWidth(scalar_number(params, &["rim_width", "width"])?)
            }
            Operation::SetTire => {
                VehicleRequest::SetTire(scalar_string(params, &["tire", "tire_id"])?)
            }
            Operation::SetTireDiameter => VehicleRequest::SetTireDiameter(scalar_number(
                params,
                &["tire_diameter", "diameter"],
            )?),
            Operation::SetWheelOffset => {
                VehicleRequest::SetWheelOffset(scalar_number(params, &["wheel_offset", "offset"])?)
            }
            Operation::SetWheelConfiguration => {
                VehicleRequest::SetWheelConfiguration(WheelConfiguration::from_params(params)?)
            }
            Operation::SetVehicleAddon => VehicleRequest::SetAddon {
                slot: required_string(params, &["slot", "addon_type"])?,
                value: required_string(params, &["value", "option"])?,
            },
            Operation::RemoveVehicleAddon => {
                VehicleRequest::RemoveAddon(scalar_string(params, &["slot", "addon_type"])?)
            }
            Operation::SetSpareTire => {
                VehicleRequest::SetSpare(scalar_bool(params, &["enabled", "spare"])?)
            }
            Operation::ResetVehicle => VehicleRequest::Reset,
            Operation::ResetVehicleComplete => VehicleRequest::ResetComplete,
            Operation::SaveVehicle => VehicleRequest::Save(scalar_string(params, &["name"])?),
            Operation::LoadSavedVehicle => {
                VehicleRequest::LoadSaved(scalar_string(params, &["id"])?)
            }
            Operation::DeleteSavedVehicle => {
                VehicleRequest::DeleteSaved(scalar_string(params, &["id"])?)
            }
            Operation::RenameSavedVehicle => VehicleRequest::RenameSaved {
                id: required_string(params, &["id"])?,
                name: required_string(params, &["name"])?,
            },
            Operation::ImportVehicleConfiguration => {
                let data = match params.get("data") {
                    Some(data) => data.clone(),
                    None => params.clone(),
                };
                VehicleRequest::Import(data)
            }
        };
        Ok(request)
    }
}

/// Decodes the (already mapper-normalized) parameters of an agent command.
pub fn decode_command(kind: CommandType, params: &Value) -> Result<VehicleRequest, HandlerError> {
    let request = match kind {
        CommandType::ChangeModel => {
            VehicleRequest::SetBody(required_string(params, &["model_id"]).map_err(|_| {
                HandlerError::structural("change_model requires a model_id")
            })?)
        }
        CommandType::ChangeColor => VehicleRequest::SetColor(required_string(params, &["color"])?),
        CommandType::ChangeRoughness => {
            VehicleRequest::SetRoughness(required_number(params, &["roughness"])?)
        }
        CommandType::ChangeLift => {
            VehicleRequest::SetLift(required_number(params, &["lift_height"])?)
        }
        CommandType::ChangeWheels | CommandType::ChangeRimColor | CommandType::ChangeTires => {
            let wheels = WheelConfiguration::from_params(params)?;
            if wheels.is_empty() {
                return Err(HandlerError::structural(format!(
                    "{} carries no wheel fields",
                    kind
                )));
            }
            VehicleRequest::SetWheelConfiguration(wheels)
        }
        CommandType::ChangeAddon => VehicleRequest::SetAddon {
            slot: required_string(params, &["slot"])?,
            value: required_string(params, &["value"])?,
        },
        CommandType::RemoveAddon => {
            VehicleRequest::RemoveAddon(required_string(params, &["slot"])?)
        }
        CommandType::ToggleSpare => match bool_field(params, &["enabled"])? {
            Some(enabled) => VehicleRequest::SetSpare(enabled),
            None => VehicleRequest::ToggleSpare,
        },
        CommandType::ResetVehicle => {
            if bool_field(params, &["complete"])?.unwrap_or(false) {
                VehicleRequest::ResetComplete
            } else {
                VehicleRequest::Reset
            }
        }
        CommandType::SaveVehicle => VehicleRequest::Save(required_string(params, &["name"])?),
    };
    Ok(request)
}

fn field<'a>(params: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| params.get(*key))
        .find(|value| !value.is_null())
}

fn scalar<'a>(params: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    if params.is_object() {
        field(params, keys)
    } else if params.is_null() {
        None
    } else {
        Some(params)
    }
}

fn as_string(value: &Value, name: &str) -> Result<String, HandlerError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(HandlerError::invalid(format!(
            "{} must be a string (got {})",
            name, other
        ))),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings ("35").
fn as_number(value: &Value, name: &str) -> Result<f64, HandlerError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        HandlerError::invalid(format!("{} must be a number (got {})", name, value))
    })
}

fn as_bool(value: &Value, name: &str) -> Result<bool, HandlerError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(HandlerError::invalid(format!(
            "{} must be a boolean (got {})",
            name, other
        ))),
    }
}

fn missing(keys: &[&str]) -> HandlerError {
    let key = keys.first().copied().unwrap_or("value");
    HandlerError::structural(format!("missing parameter '{}'", key))
}

fn string_field(params: &Value, keys: &[&str]) -> Result<Option<String>, HandlerError> {
    field(params, keys).map(|value| as_string(value, keys[0])).transpose()
}

fn number_field(params: &Value, keys: &[&str]) -> Result<Option<f64>, HandlerError> {
    field(params, keys).map(|value| as_number(value, keys[0])).transpose()
}

fn bool_field(params: &Value, keys: &[&str]) -> Result<Option<bool>, HandlerError> {
    field(params, keys).map(|value| as_bool(value, keys[0])).transpose()
}

fn required_string(params: &Value, keys: &[&str]) -> Result<String, HandlerError> {
    string_field(params, keys)?.ok_or_else(|| missing(keys))
}

fn required_number(params: &Value, keys: &[&str]) -> Result<f64, HandlerError> {
    number_field(params, keys)?.ok_or_else(|| missing(keys))
}

fn scalar_string(params: &Value, keys: &[&str]) -> Result<String, HandlerError> {
    let value = scalar(params, keys).ok_or_else(|| missing(keys))?;
    as_string(value, keys[0])
}

fn scalar_number(params: &Value, keys: &[&str]) -> Result<f64, HandlerError> {
    let value = scalar(params, keys).ok_or_else(|| missing(keys))?;
    as_number(value, keys[0])
}

fn scalar_bool(params: &Value, keys: &[&str]) -> Result<bool, HandlerError> {
    let value = scalar(params, keys).ok_or_else(|| missing(keys))?;
    as_bool(value, keys[0])
}
