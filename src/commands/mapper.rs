//! Command Mapper: turns agent function calls (free-form name + argument bag)
//! into canonical [`Command`]s. Stateless; nothing here touches vehicle state.

use super::{Command, CommandType, DEFAULT_CLIENT_ID};
use serde_json::{Map, Value};

/// Synonyms agents use for each canonical command, canonical name included.
const NAME_ALIASES: &[(&str, CommandType)] = &[
    ("change_model", CommandType::ChangeModel),
    ("change_vehicle_model", CommandType::ChangeModel),
    ("set_vehicle_model", CommandType::ChangeModel),
    ("switch_vehicle", CommandType::ChangeModel),
    ("change_vehicle", CommandType::ChangeModel),
    ("set_vehicle_body", CommandType::ChangeModel),
    ("set_body", CommandType::ChangeModel),
    ("change_color", CommandType::ChangeColor),
    ("set_color", CommandType::ChangeColor),
    ("change_paint", CommandType::ChangeColor),
    ("set_vehicle_color", CommandType::ChangeColor),
    ("change_vehicle_color", CommandType::ChangeColor),
    ("paint_vehicle", CommandType::ChangeColor),
    ("change_roughness", CommandType::ChangeRoughness),
    ("set_roughness", CommandType::ChangeRoughness),
    ("set_vehicle_roughness", CommandType::ChangeRoughness),
    ("change_finish", CommandType::ChangeRoughness),
    ("set_paint_finish", CommandType::ChangeRoughness),
    ("change_lift", CommandType::ChangeLift),
    ("set_lift", CommandType::ChangeLift),
    ("set_lift_height", CommandType::ChangeLift),
    ("set_vehicle_lift", CommandType::ChangeLift),
    ("adjust_lift", CommandType::ChangeLift),
    ("lift_vehicle", CommandType::ChangeLift),
    ("change_wheels", CommandType::ChangeWheels),
    ("set_wheels", CommandType::ChangeWheels),
    ("update_wheels", CommandType::ChangeWheels),
    ("change_rims", CommandType::ChangeWheels),
    ("set_rim", CommandType::ChangeWheels),
    ("set_wheel_configuration", CommandType::ChangeWheels),
    ("change_rim_color", CommandType::ChangeRimColor),
    ("set_rim_color", CommandType::ChangeRimColor),
    ("change_wheel_color", CommandType::ChangeRimColor),
    ("change_tires", CommandType::ChangeTires),
    ("set_tires", CommandType::ChangeTires),
    ("set_tire", CommandType::ChangeTires),
    ("change_tire", CommandType::ChangeTires),
    ("change_addon", CommandType::ChangeAddon),
    ("add_addon", CommandType::ChangeAddon),
    ("set_addon", CommandType::ChangeAddon),
    ("set_vehicle_addon", CommandType::ChangeAddon),
    ("install_addon", CommandType::ChangeAddon),
    ("add_accessory", CommandType::ChangeAddon),
    ("remove_addon", CommandType::RemoveAddon),
    ("uninstall_addon", CommandType::RemoveAddon),
    ("remove_accessory", CommandType::RemoveAddon),
    ("remove_vehicle_addon", CommandType::RemoveAddon),
    ("toggle_spare", CommandType::ToggleSpare),
    ("set_spare_tire", CommandType::ToggleSpare),
    ("toggle_spare_tire", CommandType::ToggleSpare),
    ("reset_vehicle", CommandType::ResetVehicle),
    ("reset_configuration", CommandType::ResetVehicle),
    ("reset_build", CommandType::ResetVehicle),
    ("save_vehicle", CommandType::SaveVehicle),
    ("save_configuration", CommandType::SaveVehicle),
    ("save_build", CommandType::SaveVehicle),
];

/// Resolves a function name to its canonical command. Case, surrounding
/// whitespace and `-`/space separators are ignored.
pub fn map_name(name: &str) -> Option<CommandType> {
    let normalized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    NAME_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, kind)| *kind)
}

/// Re-keys a raw argument bag into the parameter shape of `command_type`.
/// Anything that is not a canonical command name passes through untouched.
pub fn transform_parameters(command_type: &str, raw: &Value) -> Value {
    match CommandType::from_canonical(command_type) {
        Some(kind) => transform_for(kind, raw),
        None => raw.clone(),
    }
}

/// Re-keys a raw argument bag for an already resolved command kind.
pub fn transform_for(kind: CommandType, raw: &Value) -> Value {
    let mut out = Map::new();
    match kind {
        CommandType::ChangeModel => {
            copy_first(
                raw,
                &mut out,
                "model_id",
                &["model_id", "model", "vehicle_model", "body", "vehicle", "vehicle_id"],
            );
        }
        CommandType::ChangeColor => {
            copy_first(raw, &mut out, "color", &["color", "hex", "paint_color", "colour", "paint"]);
        }
        CommandType::ChangeRoughness => {
            copy_first(raw, &mut out, "roughness", &["roughness", "finish_roughness", "value"]);
        }
        CommandType::ChangeLift => {
            let lift = first_of(raw, &["lift_height", "lift", "height", "inches"])
                .cloned()
                .unwrap_or(Value::from(0));
            out.insert("lift_height".to_string(), lift);
        }
        CommandType::ChangeWheels => {
            copy_first(
                raw,
                &mut out,
                "rim_id",
                &["rim_id", "rim", "wheel", "wheel_model", "wheel_id"],
            );
            copy_first(
                raw,
                &mut out,
                "rim_diameter",
                &["rim_diameter", "diameter", "wheel_diameter", "size"],
            );
            copy_first(raw, &mut out, "rim_width", &["rim_width", "width", "wheel_width"]);
            copy_first(raw, &mut out, "rim_color", &["rim_color", "wheel_color", "color"]);
            copy_first(raw, &mut out, "tire_id", &["tire_id", "tire"]);
            copy_first(raw, &mut out, "tire_diameter", &["tire_diameter", "tire_size"]);
            copy_first(raw, &mut out, "wheel_offset", &["wheel_offset", "offset"]);
        }
        CommandType::ChangeRimColor => {
            copy_first(raw, &mut out, "rim_color", &["rim_color", "color", "wheel_color"]);
            copy_first(
                raw,
                &mut out,
                "rim_color_secondary",
                &["rim_color_secondary", "secondary_color", "accent_color"],
            );
        }
        CommandType::ChangeTires => {
            copy_first(raw, &mut out, "tire_id", &["tire_id", "tire", "tire_model", "model"]);
            copy_first(
                raw,
                &mut out,
                "tire_diameter",
                &["tire_diameter", "diameter", "size", "tire_size"],
            );
        }
        CommandType::ChangeAddon => {
            copy_first(
                raw,
                &mut out,
                "slot",
                &["slot", "addon_type", "addon_slot", "category", "type"],
            );
            copy_first(
                raw,
                &mut out,
                "value",
                &["value", "option", "addon_id", "addon", "selection"],
            );
        }
        CommandType::RemoveAddon => {
            copy_first(
                raw,
                &mut out,
                "slot",
                &["slot", "addon_type", "addon_slot", "category", "type"],
            );
        }
        CommandType::ToggleSpare => {
            copy_first(raw, &mut out, "enabled", &["enabled", "spare", "show_spare", "visible"]);
        }
        CommandType::ResetVehicle => {
            let complete = first_of(raw, &["complete", "full", "factory"])
                .cloned()
                .unwrap_or(Value::Bool(false));
            out.insert("complete".to_string(), complete);
        }
        CommandType::SaveVehicle => {
            copy_first(raw, &mut out, "name", &["name", "vehicle_name", "build_name", "title"]);
        }
    }
    Value::Object(out)
}

/// Human-readable description of a call; fills in placeholders for
/// anything missing and never fails.
pub fn describe(name: &str, args: &Value) -> String {
    let Some(kind) = map_name(name) else {
        return format!("Execute {}", name.trim());
    };
    let params = transform_for(kind, args);
    let field = |key: &str, fallback: &str| {
        params
            .get(key)
            .map(display_value)
            .unwrap_or_else(|| fallback.to_string())
    };
    match kind {
        CommandType::ChangeModel => {
            format!("Change vehicle model to {}", field("model_id", "new model"))
        }
        CommandType::ChangeColor => format!("Change paint color to {}", field("color", "custom")),
        CommandType::ChangeRoughness => {
            format!("Set paint roughness to {}", field("roughness", "custom"))
        }
        CommandType::ChangeLift => {
            format!("Set lift height to {} inches", field("lift_height", "0"))
        }
        CommandType::ChangeWheels => match params.get("rim_diameter") {
            Some(diameter) => format!(
                "Change wheels to {} ({}\")",
                field("rim_id", "custom"),
                display_value(diameter)
            ),
            None => format!("Change wheels to {}", field("rim_id", "custom")),
        },
        CommandType::ChangeRimColor => {
            format!("Change rim color to {}", field("rim_color", "custom"))
        }
        CommandType::ChangeTires => match params.get("tire_diameter") {
            Some(diameter) => format!(
                "Change tires to {} ({}\")",
                field("tire_id", "custom"),
                display_value(diameter)
            ),
            None => format!("Change tires to {}", field("tire_id", "custom")),
        },
        CommandType::ChangeAddon => {
            format!("Set {} to {}", field("slot", "addon"), field("value", "custom"))
        }
        CommandType::RemoveAddon => format!("Remove {}", field("slot", "addon")),
        CommandType::ToggleSpare => match params.get("enabled").and_then(Value::as_bool) {
            Some(true) => "Show spare tire".to_string(),
            Some(false) => "Hide spare tire".to_string(),
            None => "Toggle spare tire".to_string(),
        },
        CommandType::ResetVehicle => {
            if params.get("complete").and_then(Value::as_bool).unwrap_or(false) {
                "Reset vehicle to factory defaults".to_string()
            } else {
                "Reset vehicle to defaults".to_string()
            }
        }
        CommandType::SaveVehicle => format!("Save vehicle as \"{}\"", field("name", "custom")),
    }
}

/// Parses a single function call object (`{name, args|arguments, id?}`).
/// A missing name or an unknown function yields `None`; both are logged.
pub fn parse_one(call: &Value) -> Option<Command> {
    let name = call
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let Some(name) = name else {
        log::warn!("Function call without a name skipped");
        return None;
    };
    let Some(kind) = map_name(name) else {
        log::warn!("Unknown function '{}' skipped", name);
        return None;
    };
    let args = call_arguments(call);
    let client_id = call
        .get("client_id")
        .or_else(|| args.get("client_id"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CLIENT_ID)
        .to_string();
    let function_call_id = call
        .get("id")
        .or_else(|| call.get("call_id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    log::debug!("Mapped function '{}' to {}", name, kind);
    Some(Command {
        command_type: kind.as_str().to_string(),
        parameters: transform_for(kind, &args),
        description: describe(name, &args),
        client_id,
        function_call_id,
    })
}

/// Collects every function call in a streamed event payload. Calls may sit
/// at the top level, under `content.parts[]` or under a bare `parts[]`; all
/// three are scanned and unparseable calls are dropped.
pub fn parse_many(payload: &Value) -> Vec<Command> {
    let mut calls: Vec<&Value> = Vec::new();
    if let Some(call) = function_call_of(payload) {
        calls.push(call);
    }
    let part_lists = [
        payload.get("content").and_then(|content| content.get("parts")),
        payload.get("parts"),
    ];
    for parts in part_lists.into_iter().flatten() {
        let Some(parts) = parts.as_array() else {
            continue;
        };
        calls.extend(parts.iter().filter_map(function_call_of));
    }
    calls.into_iter().filter_map(parse_one).collect()
}

fn function_call_of(value: &Value) -> Option<&Value> {
    value
        .get("function_call")
        .or_else(|| value.get("functionCall"))
        .filter(|call| call.is_object())
}

/// Arguments arrive either as an object or as a JSON-encoded string.
fn call_arguments(call: &Value) -> Value {
    match call.get("args").or_else(|| call.get("arguments")) {
        Some(Value::String(encoded)) => serde_json::from_str(encoded).unwrap_or_else(|err| {
            log::warn!("Function arguments are not valid JSON: {}", err);
            Value::Object(Map::new())
        }),
        Some(args @ Value::Object(_)) => args.clone(),
        _ => Value::Object(Map::new()),
    }
}

fn first_of<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

fn copy_first(raw: &Value, out: &mut Map<String, Value>, target: &str, keys: &[&str]) {
    if let Some(value) = first_of(raw, keys) {
        out.insert(target.to_string(), value.clone());
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
