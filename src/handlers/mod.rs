//! Scene handler façade: the only authorized path for reading or writing the
//! vehicle configuration and the saved-vehicle collection.

pub mod error;
pub mod request;

pub use error::{HandlerError, Hint};
pub use request::{decode_command, Operation, VehicleRequest, WheelConfiguration};

use crate::catalog::Catalog;
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::orchestrator::{self, BatchReport, BatchUpdate};
use crate::scene::{SavedVehicleStore, SceneStore, VehicleConfiguration};
use crate::validation::{
    is_hex_color, is_known_id, is_rim_color, FieldRange, LIFT_RANGE, RIM_DIAMETER_RANGE,
    RIM_WIDTH_RANGE, ROUGHNESS_RANGE, TIRE_DIAMETER_RANGE,
};
use serde_json::{json, Map, Value};
use std::rc::Rc;

pub const DEFAULT_NOTIFICATION_MS: u64 = 3000;

/// Uniform result envelope returned by every façade operation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HandlerResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Context-specific extras such as `availableModels`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HandlerResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            extra: Map::new(),
        }
    }

    pub fn failure(err: &HandlerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            extra: err.hint_fields(),
        }
    }
}

impl From<Result<Value, HandlerError>> for HandlerResult {
    fn from(result: Result<Value, HandlerError>) -> Self {
        match result {
            Ok(data) => HandlerResult::ok(data),
            Err(err) => HandlerResult::failure(&err),
        }
    }
}

/// Read-only multi-field check; plausibility problems are warnings, not errors.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ConfigurationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Accumulates every field failure of one request so the caller sees all of
/// them at once.
#[derive(Default)]
struct Problems {
    messages: Vec<String>,
    hints: Vec<Hint>,
}

impl Problems {
    fn check(&mut self, outcome: Result<(), HandlerError>) {
        let Err(err) = outcome else {
            return;
        };
        for hint in err.hints() {
            if !self.hints.iter().any(|known| known.key == hint.key) {
                self.hints.push(hint.clone());
            }
        }
        match err {
            HandlerError::Validation { messages, .. } => self.messages.extend(messages),
            other => self.messages.push(other.to_string()),
        }
    }

    fn into_result(self) -> Result<(), HandlerError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::Validation {
                messages: self.messages,
                hints: self.hints,
            })
        }
    }
}

/// Clones share the same stores and notifier.
#[derive(Clone)]
pub struct SceneHandlers {
    store: SceneStore,
    saved: SavedVehicleStore,
    notifier: Rc<dyn Notifier>,
    notification_duration_ms: u64,
}

impl SceneHandlers {
    pub fn new(store: SceneStore, saved: SavedVehicleStore, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            store,
            saved,
            notifier,
            notification_duration_ms: DEFAULT_NOTIFICATION_MS,
        }
    }

    pub fn with_notification_duration(mut self, duration_ms: u64) -> Self {
        self.notification_duration_ms = duration_ms;
        self
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn saved(&self) -> &SavedVehicleStore {
        &self.saved
    }

    fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) {
        self.notifier.notify(Notification {
            message: message.into(),
            kind,
            duration_ms: self.notification_duration_ms,
        });
    }

    // ---- queries -------------------------------------------------------

    pub fn get_vehicle_configuration(&self) -> HandlerResult {
        to_data(&self.store.vehicle())
    }

    pub fn get_available_models(&self) -> HandlerResult {
        let models: Map<String, Value> = self
            .catalog()
            .vehicles
            .iter()
            .map(|(id, model)| {
                (
                    id.clone(),
                    json!({"name": model.name, "make": model.make}),
                )
            })
            .collect();
        HandlerResult::ok(Value::Object(models))
    }

    pub fn get_available_rims(&self) -> HandlerResult {
        to_data(&self.catalog().wheels.rims)
    }

    pub fn get_available_tires(&self) -> HandlerResult {
        to_data(&self.catalog().wheels.tires)
    }

    /// Addon slots and options of the current body.
    pub fn get_available_addons(&self) -> HandlerResult {
        let body = self.store.vehicle().body;
        match self.catalog().vehicle(&body) {
            Some(model) => to_data(&model.addons),
            None => HandlerResult::failure(&self.unknown_body(&body)),
        }
    }

    pub fn get_vehicle_info(&self) -> HandlerResult {
        let body = self.store.vehicle().body;
        match self.catalog().vehicle(&body) {
            Some(model) => HandlerResult::ok(json!({
                "id": body,
                "name": model.name,
                "make": model.make,
                "wheelbase": model.wheelbase,
            })),
            None => HandlerResult::failure(&self.unknown_body(&body)),
        }
    }

    pub fn get_saved_vehicles(&self) -> HandlerResult {
        let saved = self.saved.get();
        let vehicles: Vec<_> = saved.vehicles.values().collect();
        HandlerResult::ok(json!({
            "vehicles": vehicles,
            "current": saved.current,
        }))
    }

    pub fn export_vehicle_configuration(&self) -> HandlerResult {
        self.get_vehicle_configuration()
    }

    pub fn validate_configuration(&self, config: &VehicleConfiguration) -> ConfigurationReport {
        let mut problems = Problems::default();
        let catalog = self.catalog();
        problems.check(self.check_body(&config.body));
        problems.check(check_hex("color", &config.color));
        problems.check(check_range(ROUGHNESS_RANGE, config.roughness));
        problems.check(check_range(LIFT_RANGE, config.lift));
        problems.check(self.check_rim(&config.rim));
        problems.check(check_rim_color("rim_color", &config.rim_color));
        problems.check(check_rim_color(
            "rim_color_secondary",
            &config.rim_color_secondary,
        ));
        problems.check(check_range(RIM_DIAMETER_RANGE, config.rim_diameter));
        problems.check(check_range(RIM_WIDTH_RANGE, config.rim_width));
        problems.check(self.check_tire(&config.tire));
        problems.check(check_range(TIRE_DIAMETER_RANGE, config.tire_diameter));
        problems.check(check_offset(config.wheel_offset));
        if catalog.vehicle(&config.body).is_some() {
            for (slot, value) in &config.addons {
                problems.check(self.check_addon(&config.body, slot, value));
            }
        }

        let mut warnings = Vec::new();
        if config.tire_diameter <= config.rim_diameter {
            warnings.push(format!(
                "tire_diameter {} is not larger than rim_diameter {}",
                config.tire_diameter, config.rim_diameter
            ));
        }
        ConfigurationReport {
            valid: problems.messages.is_empty(),
            errors: problems.messages,
            warnings,
        }
    }

    // ---- mutations -----------------------------------------------------

    pub fn set_vehicle_body(&self, model_id: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetBody(model_id.to_string()))
    }

    pub fn set_vehicle_color(&self, color: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetColor(color.to_string()))
    }

    pub fn set_vehicle_roughness(&self, roughness: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetRoughness(roughness))
    }

    pub fn set_vehicle_lift(&self, lift: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetLift(lift))
    }

    pub fn set_rim(&self, rim: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetRim(rim.to_string()))
    }

    pub fn set_rim_color(&self, color: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetRimColor(color.to_string()))
    }

    pub fn set_rim_secondary_color(&self, color: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetRimSecondaryColor(color.to_string()))
    }

    pub fn set_rim_diameter(&self, diameter: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetRimDiameter(diameter))
    }

    pub fn set_rim_width(&self, width: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetRimWidth(width))
    }

    pub fn set_tire(&self, tire: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetTire(tire.to_string()))
    }

    pub fn set_tire_diameter(&self, diameter: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetTireDiameter(diameter))
    }

    pub fn set_wheel_offset(&self, offset: f64) -> HandlerResult {
        self.execute(&VehicleRequest::SetWheelOffset(offset))
    }

    pub fn set_wheel_configuration(&self, wheels: &WheelConfiguration) -> HandlerResult {
        self.execute(&VehicleRequest::SetWheelConfiguration(wheels.clone()))
    }

    pub fn set_vehicle_addon(&self, slot: &str, value: &str) -> HandlerResult {
        self.execute(&VehicleRequest::SetAddon {
            slot: slot.to_string(),
            value: value.to_string(),
        })
    }

    pub fn remove_vehicle_addon(&self, slot: &str) -> HandlerResult {
        self.execute(&VehicleRequest::RemoveAddon(slot.to_string()))
    }

    pub fn set_spare_tire(&self, enabled: bool) -> HandlerResult {
        self.execute(&VehicleRequest::SetSpare(enabled))
    }

    pub fn reset_vehicle(&self) -> HandlerResult {
        self.execute(&VehicleRequest::Reset)
    }

    pub fn reset_vehicle_complete(&self) -> HandlerResult {
        self.execute(&VehicleRequest::ResetComplete)
    }

    pub fn save_vehicle(&self, name: &str) -> HandlerResult {
        self.execute(&VehicleRequest::Save(name.to_string()))
    }

    pub fn load_saved_vehicle(&self, id: &str) -> HandlerResult {
        self.execute(&VehicleRequest::LoadSaved(id.to_string()))
    }

    pub fn delete_saved_vehicle(&self, id: &str) -> HandlerResult {
        self.execute(&VehicleRequest::DeleteSaved(id.to_string()))
    }

    pub fn rename_saved_vehicle(&self, id: &str, name: &str) -> HandlerResult {
        self.execute(&VehicleRequest::RenameSaved {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    pub fn import_vehicle_configuration(&self, data: &Value) -> HandlerResult {
        self.execute(&VehicleRequest::Import(data.clone()))
    }

    pub fn apply_batch_updates(&self, updates: &[BatchUpdate]) -> BatchReport {
        orchestrator::apply_batch_updates(self, updates)
    }

    /// Runs a façade operation by name, as the batch path does.
    pub fn dispatch(&self, operation: &str, params: &Value) -> HandlerResult {
        let request = Operation::from_name(operation)
            .ok_or_else(|| HandlerError::UnsupportedOperation(operation.to_string()))
            .and_then(|op| op.decode(params));
        match request {
            Ok(request) => self.execute(&request),
            Err(err) => self.reject(err),
        }
    }

    /// Single dispatch for every write: validate, write, notify.
    pub fn execute(&self, request: &VehicleRequest) -> HandlerResult {
        match self.apply(request) {
            Ok((data, message)) => {
                log::debug!("{}", message);
                self.notify(message, NotificationKind::Success);
                HandlerResult::ok(data)
            }
            Err(err) => self.reject(err),
        }
    }

    pub(crate) fn reject(&self, err: HandlerError) -> HandlerResult {
        log::warn!("Rejected vehicle update: {}", err);
        let kind = match err {
            HandlerError::Validation { .. } | HandlerError::NotFound { .. } => {
                NotificationKind::Warning
            }
            HandlerError::UnsupportedOperation(_) | HandlerError::Structural(_) => {
                NotificationKind::Error
            }
        };
        self.notify(err.to_string(), kind);
        HandlerResult::failure(&err)
    }

    fn apply(&self, request: &VehicleRequest) -> Result<(Value, String), HandlerError> {
        match request {
            VehicleRequest::SetBody(id) => {
                self.check_body(id)?;
                let vehicle = self.store.update_vehicle(|v| v.body = id.clone());
                let name = self
                    .catalog()
                    .vehicle(id)
                    .map(|model| model.name.clone())
                    .unwrap_or_else(|| id.clone());
                Ok((
                    json!({"body": vehicle.body, "addons": vehicle.addons}),
                    format!("Vehicle changed to {}", name),
                ))
            }
            VehicleRequest::SetColor(color) => {
                check_hex("color", color)?;
                self.store.update_vehicle(|v| v.color = color.clone());
                Ok((json!({"color": color}), format!("Paint set to {}", color)))
            }
            VehicleRequest::SetRoughness(roughness) => {
                check_range(ROUGHNESS_RANGE, *roughness)?;
                self.store.update_vehicle(|v| v.roughness = *roughness);
                Ok((
                    json!({"roughness": roughness}),
                    format!("Roughness set to {}", roughness),
                ))
            }
            VehicleRequest::SetLift(lift) => {
                check_range(LIFT_RANGE, *lift)?;
                self.store.update_vehicle(|v| v.lift = *lift);
                Ok((json!({"lift": lift}), format!("Lift set to {} inches", lift)))
            }
            VehicleRequest::SetRim(rim) => {
                self.check_rim(rim)?;
                self.store.update_vehicle(|v| v.rim = rim.clone());
                Ok((json!({"rim": rim}), format!("Rims changed to {}", rim)))
            }
            VehicleRequest::SetRimColor(color) => {
                check_rim_color("rim_color", color)?;
                self.store.update_vehicle(|v| v.rim_color = color.clone());
                Ok((
                    json!({"rim_color": color}),
                    format!("Rim color set to {}", color),
                ))
            }
            VehicleRequest::SetRimSecondaryColor(color) => {
                check_rim_color("rim_color_secondary", color)?;
                self.store
                    .update_vehicle(|v| v.rim_color_secondary = color.clone());
                Ok((
                    json!({"rim_color_secondary": color}),
                    format!("Rim accent color set to {}", color),
                ))
            }
            VehicleRequest::SetRimDiameter(diameter) => {
                check_range(RIM_DIAMETER_RANGE, *diameter)?;
                self.store.update_vehicle(|v| v.rim_diameter = *diameter);
                Ok((
                    json!({"rim_diameter": diameter}),
                    format!("Rim diameter set to {}\"", diameter),
                ))
            }
            VehicleRequest::SetRimWidth(width) => {
                check_range(RIM_WIDTH_RANGE, *width)?;
                self.store.update_vehicle(|v| v.rim_width = *width);
                Ok((
                    json!({"rim_width": width}),
                    format!("Rim width set to {}\"", width),
                ))
            }
            VehicleRequest::SetTire(tire) => {
                self.check_tire(tire)?;
                self.store.update_vehicle(|v| v.tire = tire.clone());
                Ok((json!({"tire": tire}), format!("Tires changed to {}", tire)))
            }
            VehicleRequest::SetTireDiameter(diameter) => {
                check_range(TIRE_DIAMETER_RANGE, *diameter)?;
                self.store.update_vehicle(|v| v.tire_diameter = *diameter);
                Ok((
                    json!({"tire_diameter": diameter}),
                    format!("Tire diameter set to {}\"", diameter),
                ))
            }
            VehicleRequest::SetWheelOffset(offset) => {
                check_offset(*offset)?;
                self.store.update_vehicle(|v| v.wheel_offset = *offset);
                Ok((
                    json!({"wheel_offset": offset}),
                    format!("Wheel offset set to {}", offset),
                ))
            }
            VehicleRequest::SetWheelConfiguration(wheels) => self.apply_wheels(wheels),
            VehicleRequest::SetAddon { slot, value } => {
                let body = self.store.vehicle().body;
                self.check_addon(&body, slot, value)?;
                self.store.update_vehicle(|v| {
                    v.addons.insert(slot.clone(), value.clone());
                });
                let label = self
                    .catalog()
                    .addon_slot(&body, slot)
                    .and_then(|entry| entry.options.get(value))
                    .map(|option| option.name.clone())
                    .unwrap_or_else(|| value.clone());
                Ok((
                    json!({"slot": slot, "value": value}),
                    format!("Installed {} ({})", label, slot),
                ))
            }
            VehicleRequest::RemoveAddon(slot) => {
                let body = self.store.vehicle().body;
                self.check_slot(&body, slot)?;
                let mut removed = None;
                self.store.update_vehicle(|v| removed = v.addons.remove(slot));
                Ok((
                    json!({"slot": slot, "removed": removed}),
                    format!("Removed {} addon", slot),
                ))
            }
            VehicleRequest::SetSpare(enabled) => {
                self.store.update_vehicle(|v| v.spare = *enabled);
                Ok(spare_echo(*enabled))
            }
            VehicleRequest::ToggleSpare => {
                let updated = self.store.update_vehicle(|v| v.spare = !v.spare);
                Ok(spare_echo(updated.spare))
            }
            VehicleRequest::Reset => {
                let body = self.store.vehicle().body;
                let defaults = self.catalog().defaults_for_body(&body);
                self.store.replace_vehicle(defaults.clone());
                Ok((to_value(&defaults)?, "Vehicle reset to defaults".to_string()))
            }
            VehicleRequest::ResetComplete => {
                let catalog = self.catalog();
                let defaults = catalog.defaults_for_body(&catalog.defaults.body);
                self.store.replace_vehicle(defaults.clone());
                Ok((
                    to_value(&defaults)?,
                    "Vehicle reset to factory defaults".to_string(),
                ))
            }
            VehicleRequest::Save(name) => {
                let name = check_name(name)?;
                let vehicle = self.store.vehicle();
                let saved = self.saved.set(|saved| saved.insert(name, vehicle));
                Ok((to_value(&saved)?, format!("Saved \"{}\"", saved.name)))
            }
            VehicleRequest::LoadSaved(id) => {
                let snapshot = self.saved.set(|saved| {
                    let config = saved.vehicles.get(id).map(|entry| entry.config.clone());
                    if config.is_some() {
                        saved.current = Some(id.clone());
                    }
                    config
                });
                let config = snapshot.ok_or_else(|| self.unknown_saved(id))?;
                self.store.replace_vehicle(config.clone());
                Ok((to_value(&config)?, format!("Loaded build {}", id)))
            }
            VehicleRequest::DeleteSaved(id) => {
                let removed = self.saved.set(|saved| {
                    let removed = saved.vehicles.remove(id);
                    if removed.is_some() && saved.current.as_deref() == Some(id.as_str()) {
                        saved.current = None;
                    }
                    removed
                });
                let removed = removed.ok_or_else(|| self.unknown_saved(id))?;
                Ok((
                    json!({"id": id}),
                    format!("Deleted \"{}\"", removed.name),
                ))
            }
            VehicleRequest::RenameSaved { id, name } => {
                let name = check_name(name)?;
                let renamed = self.saved.set(|saved| {
                    saved.vehicles.get_mut(id).map(|entry| {
                        entry.name = name.to_string();
                        entry.clone()
                    })
                });
                let renamed = renamed.ok_or_else(|| self.unknown_saved(id))?;
                Ok((to_value(&renamed)?, format!("Renamed build to \"{}\"", name)))
            }
            VehicleRequest::Import(data) => {
                let config: VehicleConfiguration = serde_json::from_value(data.clone())
                    .map_err(|err| {
                        HandlerError::structural(format!("invalid vehicle configuration: {}", err))
                    })?;
                let report = self.validate_configuration(&config);
                if !report.valid {
                    return Err(HandlerError::Validation {
                        messages: report.errors,
                        hints: Vec::new(),
                    });
                }
                self.store.replace_vehicle(config.clone());
                Ok((to_value(&config)?, "Configuration imported".to_string()))
            }
        }
    }

    /// All-or-nothing: every present field is checked before any is written.
    fn apply_wheels(&self, wheels: &WheelConfiguration) -> Result<(Value, String), HandlerError> {
        if wheels.is_empty() {
            return Err(HandlerError::invalid("no wheel fields provided"));
        }
        let mut problems = Problems::default();
        if let Some(rim) = &wheels.rim {
            problems.check(self.check_rim(rim));
        }
        if let Some(color) = &wheels.rim_color {
            problems.check(check_rim_color("rim_color", color));
        }
        if let Some(color) = &wheels.rim_color_secondary {
            problems.check(check_rim_color("rim_color_secondary", color));
        }
        if let Some(diameter) = wheels.rim_diameter {
            problems.check(check_range(RIM_DIAMETER_RANGE, diameter));
        }
        if let Some(width) = wheels.rim_width {
            problems.check(check_range(RIM_WIDTH_RANGE, width));
        }
        if let Some(tire) = &wheels.tire {
            problems.check(self.check_tire(tire));
        }
        if let Some(diameter) = wheels.tire_diameter {
            problems.check(check_range(TIRE_DIAMETER_RANGE, diameter));
        }
        if let Some(offset) = wheels.wheel_offset {
            problems.check(check_offset(offset));
        }
        problems.into_result()?;

        self.store.update_vehicle(|v| {
            if let Some(rim) = &wheels.rim {
                v.rim = rim.clone();
            }
            if let Some(color) = &wheels.rim_color {
                v.rim_color = color.clone();
            }
            if let Some(color) = &wheels.rim_color_secondary {
                v.rim_color_secondary = color.clone();
            }
            if let Some(diameter) = wheels.rim_diameter {
                v.rim_diameter = diameter;
            }
            if let Some(width) = wheels.rim_width {
                v.rim_width = width;
            }
            if let Some(tire) = &wheels.tire {
                v.tire = tire.clone();
            }
            if let Some(diameter) = wheels.tire_diameter {
                v.tire_diameter = diameter;
            }
            if let Some(offset) = wheels.wheel_offset {
                v.wheel_offset = offset;
            }
        });
        Ok((to_value(wheels)?, "Wheel configuration updated".to_string()))
    }

    fn unknown_body(&self, id: &str) -> HandlerError {
        HandlerError::not_found("vehicle model", id)
            .with_hint("availableModels", self.catalog().model_ids())
    }

    fn unknown_saved(&self, id: &str) -> HandlerError {
        HandlerError::not_found("saved vehicle", id)
            .with_hint("availableIds", self.saved.get().ids())
    }

    fn check_body(&self, id: &str) -> Result<(), HandlerError> {
        if is_known_id(id, &self.catalog().vehicles) {
            Ok(())
        } else {
            Err(HandlerError::invalid(format!("unknown vehicle model '{}'", id))
                .with_hint("availableModels", self.catalog().model_ids()))
        }
    }

    fn check_rim(&self, id: &str) -> Result<(), HandlerError> {
        if is_known_id(id, &self.catalog().wheels.rims) {
            Ok(())
        } else {
            Err(HandlerError::invalid(format!("unknown rim '{}'", id))
                .with_hint("availableRims", self.catalog().rim_ids()))
        }
    }

    fn check_tire(&self, id: &str) -> Result<(), HandlerError> {
        if is_known_id(id, &self.catalog().wheels.tires) {
            Ok(())
        } else {
            Err(HandlerError::invalid(format!("unknown tire '{}'", id))
                .with_hint("availableTires", self.catalog().tire_ids()))
        }
    }

    fn check_slot(&self, body: &str, slot: &str) -> Result<(), HandlerError> {
        if self.catalog().addon_slot(body, slot).is_some() {
            Ok(())
        } else {
            Err(HandlerError::invalid(format!(
                "addon slot '{}' is not available on {}",
                slot, body
            ))
            .with_hint("availableSlots", self.catalog().slot_names(body)))
        }
    }

    fn check_addon(&self, body: &str, slot: &str, value: &str) -> Result<(), HandlerError> {
        self.check_slot(body, slot)?;
        if self.catalog().is_addon_option(body, slot, value) {
            return Ok(());
        }
        let options = self
            .catalog()
            .addon_slot(body, slot)
            .map(|entry| entry.options.keys().cloned().collect())
            .unwrap_or_default();
        Err(HandlerError::invalid(format!(
            "'{}' is not an option for addon slot '{}'",
            value, slot
        ))
        .with_hint("availableOptions", options))
    }
}

fn check_range(range: FieldRange, value: f64) -> Result<(), HandlerError> {
    range.check(value).map(|_| ()).map_err(HandlerError::invalid)
}

fn check_hex(field: &str, value: &str) -> Result<(), HandlerError> {
    if is_hex_color(value) {
        Ok(())
    } else {
        Err(HandlerError::invalid(format!(
            "{} must be a hex color like #RRGGBB (got '{}')",
            field, value
        )))
    }
}

fn check_rim_color(field: &str, value: &str) -> Result<(), HandlerError> {
    if is_rim_color(value) {
        Ok(())
    } else {
        Err(HandlerError::invalid(format!(
            "{} must be a hex color or 'silver' (got '{}')",
            field, value
        )))
    }
}

fn check_offset(offset: f64) -> Result<(), HandlerError> {
    if offset.is_finite() {
        Ok(())
    } else {
        Err(HandlerError::invalid("wheel_offset must be a finite number"))
    }
}

fn check_name(name: &str) -> Result<&str, HandlerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(HandlerError::invalid("name must not be empty"))
    } else {
        Ok(trimmed)
    }
}

fn spare_echo(enabled: bool) -> (Value, String) {
    let message = if enabled {
        "Spare tire mounted"
    } else {
        "Spare tire removed"
    };
    (json!({"spare": enabled}), message.to_string())
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, HandlerError> {
    serde_json::to_value(value)
        .map_err(|err| HandlerError::structural(format!("unserializable result: {}", err)))
}

fn to_data<T: serde::Serialize>(value: &T) -> HandlerResult {
    to_value(value).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;

    fn handlers() -> (SceneHandlers, Rc<RecordingNotifier>) {
        let catalog = Rc::new(Catalog::builtin().unwrap());
        let notifier = Rc::new(RecordingNotifier::new());
        let handlers = SceneHandlers::new(
            SceneStore::new(catalog),
            SavedVehicleStore::new(),
            notifier.clone(),
        );
        (handlers, notifier)
    }

    #[test]
    fn lift_boundaries_are_inclusive() {
        let (handlers, _) = handlers();
        assert!(handlers.set_vehicle_lift(0.0).success);
        assert!(handlers.set_vehicle_lift(6.0).success);
        let before = handlers.store().vehicle();
        assert!(!handlers.set_vehicle_lift(-0.0001).success);
        assert!(!handlers.set_vehicle_lift(6.0001).success);
        assert_eq!(handlers.store().vehicle(), before);
    }

    #[test]
    fn setters_are_idempotent() {
        let (handlers, _) = handlers();
        handlers.set_vehicle_color("#FFD700");
        let once = handlers.store().vehicle();
        handlers.set_vehicle_color("#FFD700");
        assert_eq!(handlers.store().vehicle(), once);
    }

    #[test]
    fn unknown_body_returns_available_models() {
        let (handlers, notifier) = handlers();
        let result = handlers.set_vehicle_body("delorean");
        assert!(!result.success);
        let models = result.extra["availableModels"].as_array().unwrap();
        assert!(models.iter().any(|id| id == "jeep_jku"));
        assert_eq!(handlers.store().vehicle().body, "toyota_4runner");
        assert_eq!(notifier.take()[0].kind, NotificationKind::Warning);
    }

    #[test]
    fn success_notifies_and_echoes_written_fields() {
        let (handlers, notifier) = handlers();
        let result = handlers.set_vehicle_lift(4.0);
        assert_eq!(result.data, Some(json!({"lift": 4.0})));
        let received = notifier.take();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, NotificationKind::Success);
        assert_eq!(received[0].duration_ms, DEFAULT_NOTIFICATION_MS);
    }

    #[test]
    fn rim_color_accepts_silver_but_paint_does_not() {
        let (handlers, _) = handlers();
        assert!(handlers.set_rim_color("silver").success);
        assert!(handlers.set_rim_secondary_color("#101010").success);
        assert!(!handlers.set_vehicle_color("silver").success);
    }

    #[test]
    fn wheel_configuration_is_all_or_nothing() {
        let (handlers, _) = handlers();
        let before = handlers.store().vehicle();
        let result = handlers.set_wheel_configuration(&WheelConfiguration {
            rim: Some("bad".to_string()),
            tire_diameter: Some(33.0),
            ..WheelConfiguration::default()
        });
        assert!(!result.success);
        assert!(result.extra.contains_key("availableRims"));
        assert_eq!(handlers.store().vehicle().tire_diameter, before.tire_diameter);
    }

    #[test]
    fn wheel_configuration_collects_every_error() {
        let (handlers, _) = handlers();
        let result = handlers.set_wheel_configuration(&WheelConfiguration {
            rim: Some("bad".to_string()),
            tire: Some("worse".to_string()),
            rim_diameter: Some(30.0),
            ..WheelConfiguration::default()
        });
        let error = result.error.unwrap();
        assert_eq!(error.split("; ").count(), 3);
        assert!(result.extra.contains_key("availableRims"));
        assert!(result.extra.contains_key("availableTires"));
        assert!(!handlers.set_wheel_configuration(&WheelConfiguration::default()).success);
    }

    #[test]
    fn addon_must_exist_on_current_body() {
        let (handlers, _) = handlers();
        let result = handlers.set_vehicle_addon("flares", "stock");
        assert!(!result.success);
        assert!(result.extra.contains_key("availableSlots"));

        let result = handlers.set_vehicle_addon("rack", "gobi_stealth");
        assert!(!result.success);
        assert!(result.extra.contains_key("availableOptions"));

        assert!(handlers.set_vehicle_addon("rack", "prinsu_full").success);
        assert_eq!(
            handlers.store().vehicle().addons.get("rack").map(String::as_str),
            Some("prinsu_full")
        );
    }

    #[test]
    fn body_change_resets_addons_through_the_facade() {
        let (handlers, _) = handlers();
        handlers.set_vehicle_addon("rack", "prinsu_full");
        let result = handlers.set_vehicle_body("jeep_jku");
        assert!(result.success);
        let vehicle = handlers.store().vehicle();
        assert_eq!(vehicle.addons.get("rack").map(String::as_str), Some("none"));
        assert!(handlers.set_vehicle_addon("rack", "gobi_stealth").success);
    }

    #[test]
    fn remove_addon_drops_the_key() {
        let (handlers, _) = handlers();
        let result = handlers.remove_vehicle_addon("rack");
        assert!(result.success);
        assert!(!handlers.store().vehicle().addons.contains_key("rack"));
        assert!(handlers.remove_vehicle_addon("rack").success);
        assert!(!handlers.remove_vehicle_addon("flares").success);
    }

    #[test]
    fn reset_keeps_body_and_complete_reset_does_not() {
        let (handlers, _) = handlers();
        handlers.set_vehicle_body("jeep_jku");
        handlers.set_vehicle_lift(5.0);
        handlers.reset_vehicle();
        let vehicle = handlers.store().vehicle();
        assert_eq!(vehicle.body, "jeep_jku");
        assert_eq!(vehicle.lift, 0.0);
        assert_eq!(vehicle.addons.get("flares").map(String::as_str), Some("stock"));

        handlers.reset_vehicle_complete();
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(handlers.store().vehicle(), catalog.defaults);
    }

    #[test]
    fn save_load_rename_delete() {
        let (handlers, _) = handlers();
        assert!(!handlers.save_vehicle("   ").success);

        handlers.set_vehicle_color("#123456");
        let saved = handlers.save_vehicle("  Desert rig ").data.unwrap();
        let id = saved["id"].as_str().unwrap().to_string();
        assert_eq!(saved["name"], "Desert rig");

        handlers.set_vehicle_color("#FFFFFF");
        assert!(handlers.load_saved_vehicle(&id).success);
        assert_eq!(handlers.store().vehicle().color, "#123456");
        assert_eq!(handlers.saved().get().current.as_deref(), Some(id.as_str()));

        assert!(handlers.rename_saved_vehicle(&id, "Mall crawler").success);
        assert_eq!(handlers.saved().get().vehicles[&id].name, "Mall crawler");

        let missing = handlers.load_saved_vehicle("build-0-0");
        assert!(!missing.success);
        assert_eq!(missing.extra["availableIds"], json!([id.clone()]));

        assert!(handlers.delete_saved_vehicle(&id).success);
        assert!(handlers.saved().get().current.is_none());
        assert!(!handlers.delete_saved_vehicle(&id).success);
    }

    #[test]
    fn validate_configuration_warns_on_implausible_tires() {
        let (handlers, _) = handlers();
        let mut config = handlers.store().vehicle();
        config.rim_diameter = 20.0;
        config.tire_diameter = 28.0;
        let report = handlers.validate_configuration(&config);
        assert!(report.valid);
        assert!(report.warnings.is_empty());

        config.tire_diameter = 20.0;
        let report = handlers.validate_configuration(&config);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["tire_diameter must be between 28 and 40 (got 20)".to_string()]
        );
        assert_eq!(
            report.warnings,
            vec!["tire_diameter 20 is not larger than rim_diameter 20".to_string()]
        );

        config.color = "red".to_string();
        config.addons.insert("flares".to_string(), "stock".to_string());
        let report = handlers.validate_configuration(&config);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn toggle_spare_flips_current_value() {
        let (handlers, _) = handlers();
        let start = handlers.store().vehicle().spare;
        let toggled = handlers.execute(&VehicleRequest::ToggleSpare);
        assert!(toggled.success);
        assert_eq!(toggled.data.unwrap()["spare"], json!(!start));
        assert_eq!(handlers.store().vehicle().spare, !start);
        handlers.execute(&VehicleRequest::ToggleSpare);
        assert_eq!(handlers.store().vehicle().spare, start);
    }

    #[test]
    fn export_import_round_trip() {
        let (handlers, _) = handlers();
        handlers.set_vehicle_body("jeep_jku");
        handlers.set_wheel_offset(-12.0);
        let before = handlers.store().vehicle();
        let exported = handlers.export_vehicle_configuration().data.unwrap();
        assert!(handlers.import_vehicle_configuration(&exported).success);
        assert_eq!(handlers.store().vehicle(), before);
    }

    #[test]
    fn import_rejects_invalid_configuration() {
        let (handlers, _) = handlers();
        let before = handlers.store().vehicle();
        let mut exported = handlers.export_vehicle_configuration().data.unwrap();
        exported["lift"] = json!(9);
        assert!(!handlers.import_vehicle_configuration(&exported).success);
        assert!(!handlers.import_vehicle_configuration(&json!({"body": 1})).success);
        assert_eq!(handlers.store().vehicle(), before);
    }

    #[test]
    fn wheel_offset_must_be_finite() {
        let (handlers, _) = handlers();
        assert!(handlers.set_wheel_offset(-44.0).success);
        assert!(!handlers.set_wheel_offset(f64::INFINITY).success);
        assert!(!handlers.set_wheel_offset(f64::NAN).success);
    }

    #[test]
    fn dispatch_reports_unknown_operations() {
        let (handlers, notifier) = handlers();
        let result = handlers.dispatch("launchRockets", &json!({}));
        assert_eq!(result.error.as_deref(), Some("unsupported operation 'launchRockets'"));
        assert_eq!(notifier.take()[0].kind, NotificationKind::Error);
        assert!(handlers.dispatch("setVehicleLift", &json!(3)).success);
    }

    #[test]
    fn queries_describe_current_body() {
        let (handlers, _) = handlers();
        let info = handlers.get_vehicle_info().data.unwrap();
        assert_eq!(info["id"], "toyota_4runner");
        let addons = handlers.get_available_addons().data.unwrap();
        assert!(addons.get("rack").is_some());
        assert!(handlers.get_available_models().data.unwrap().get("ford_bronco").is_some());
        assert!(handlers.get_available_rims().data.unwrap().get("method_305").is_some());
        assert!(handlers.get_available_tires().data.unwrap().get("bfg_ko2").is_some());
        let saved = handlers.get_saved_vehicles().data.unwrap();
        assert_eq!(saved["vehicles"], json!([]));
    }

    #[test]
    fn failure_envelope_serializes_hints_flat() {
        let (handlers, _) = handlers();
        let json = serde_json::to_value(handlers.set_rim("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert!(json["availableRims"].is_array());
    }
}
