//! Batch/update orchestrator: applies lists of façade operations or agent
//! commands through [`SceneHandlers`], strictly in order and without
//! short-circuiting.

use crate::commands::{map_name, parse_many, transform_for, AgentResponse, Command};
use crate::handlers::{decode_command, HandlerResult, SceneHandlers};
use crate::notify::NotificationKind;
use crate::scene::VehicleConfiguration;
use serde_json::Value;
use std::borrow::Cow;

/// One item of a direct batch: a façade operation name plus its parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchUpdate {
    pub operation: String,
    #[serde(default)]
    pub params: Value,
}

impl BatchUpdate {
    pub fn new(operation: impl Into<String>, params: Value) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BatchItemResult {
    pub operation: String,
    pub result: HandlerResult,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub success: bool,
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BatchItemResult>,
}

/// Every item is attempted regardless of earlier failures.
pub fn apply_batch_updates(handlers: &SceneHandlers, updates: &[BatchUpdate]) -> BatchReport {
    let results: Vec<BatchItemResult> = updates
        .iter()
        .map(|update| BatchItemResult {
            operation: update.operation.clone(),
            result: handlers.dispatch(&update.operation, &update.params),
        })
        .collect();
    let success_count = results.iter().filter(|item| item.result.success).count();
    let failure_count = results.len() - success_count;
    log::info!(
        "Batch applied {}/{} updates",
        success_count,
        results.len()
    );
    BatchReport {
        success: failure_count == 0,
        total: results.len(),
        success_count,
        failure_count,
        results,
    }
}

/// Tally of one agent update sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct UpdateSummary {
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Applies structured agent responses to the scene.
#[derive(Clone)]
pub struct Orchestrator {
    handlers: SceneHandlers,
}

impl Orchestrator {
    pub fn new(handlers: SceneHandlers) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &SceneHandlers {
        &self.handlers
    }

    /// Runs one agent command through the shared request registry. Command
    /// types outside the canonical set are resolved through the alias table,
    /// and their parameters re-keyed the way the mapper would have;
    /// `None` means the command was skipped.
    pub fn apply_command(&self, command: &Command) -> Option<HandlerResult> {
        let (kind, parameters) = match command.kind() {
            Some(kind) => (kind, Cow::Borrowed(&command.parameters)),
            None => match map_name(&command.command_type) {
                Some(kind) => (kind, Cow::Owned(transform_for(kind, &command.parameters))),
                None => {
                    log::warn!(
                        "Skipping unknown command type '{}'",
                        command.command_type
                    );
                    return None;
                }
            },
        };
        log::debug!(
            "Applying {} from client {}: {}",
            kind,
            command.client_id,
            command.description
        );
        let result = match decode_command(kind, &parameters) {
            Ok(request) => self.handlers.execute(&request),
            Err(err) => self.handlers.reject(err),
        };
        Some(result)
    }

    /// Sequential apply; later commands observe the writes of earlier ones.
    pub fn apply_vehicle_updates(&self, commands: &[Command]) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        for command in commands {
            match self.apply_command(command) {
                Some(result) if result.success => summary.applied += 1,
                Some(_) => summary.failed += 1,
                None => summary.skipped += 1,
            }
        }
        log::info!(
            "Applied {}/{} vehicle updates ({} skipped)",
            summary.applied,
            commands.len(),
            summary.skipped
        );
        summary
    }

    /// Returns whether the response fully applied: no command failed, or a
    /// final state superseded the failures.
    pub fn process_agent_response(&self, response: &AgentResponse) -> bool {
        if let Some(error) = &response.error {
            log::warn!("Agent reported an error: {}", error);
            self.handlers
                .notify(format!("Assistant error: {}", error), NotificationKind::Error);
            return false;
        }

        if response.vehicle_updates.is_empty() {
            return match &response.final_vehicle_state {
                Some(final_state) => self.apply_final_state(final_state),
                None => true,
            };
        }

        let summary = self.apply_vehicle_updates(&response.vehicle_updates);
        if summary.failed == 0 {
            return true;
        }
        match &response.final_vehicle_state {
            Some(final_state) => {
                log::info!(
                    "{} updates failed, reconciling with final vehicle state",
                    summary.failed
                );
                self.apply_final_state(final_state)
            }
            None => false,
        }
    }

    /// Handles one streamed chunk: the `structured` envelope when present,
    /// otherwise any function calls the chunk carries. `None` when the chunk
    /// held nothing to apply.
    pub fn process_stream_chunk(&self, chunk: &Value) -> Option<bool> {
        if let Some(response) = AgentResponse::from_chunk(chunk) {
            return Some(self.process_agent_response(&response));
        }
        let commands = parse_many(chunk);
        if commands.is_empty() {
            return None;
        }
        let summary = self.apply_vehicle_updates(&commands);
        Some(summary.failed == 0)
    }

    /// Authoritative overwrite, accepted only if the snapshot validates.
    fn apply_final_state(&self, final_state: &VehicleConfiguration) -> bool {
        let report = self.handlers.validate_configuration(final_state);
        if !report.valid {
            let message = format!(
                "Final vehicle state rejected: {}",
                report.errors.join("; ")
            );
            log::warn!("{}", message);
            self.handlers.notify(message, NotificationKind::Error);
            return false;
        }
        self.handlers.store().replace_vehicle(final_state.clone());
        self.handlers
            .notify("Vehicle updated", NotificationKind::Success);
        true
    }
}
