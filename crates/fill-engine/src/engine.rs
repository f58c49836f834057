//! Fill orchestration
//!
//! Every document-changing operation follows the same shape: one read
//! round-trip, a snapshot of what was read pushed onto the undo stack, one
//! batched write round-trip, then cache invalidation. The snapshot is always
//! taken before anything is written, so undo restores what was actually there.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Control, ControlKey, Dataset, FieldType, Schema};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{Action, FillError, HostError};
use crate::formatter::ValueFormatter;
use crate::host::{HostDocument, StyleSpec, WriteBatch};
use crate::mapper::{map_schema, MappingReport};
use crate::scanner::{group_by_field, interpret_controls, ControlMap, ScanCache, ScanOutcome};
use crate::store::DatasetStore;
use crate::undo::{Snapshot, SnapshotKind, UndoStack, UndoSummary};
use crate::validator::{is_visible, DatasetValidator, SchemaValidator, ValidationReport};

/// Message returned by [`FillEngine::undo`] when the stack is empty
pub const NOTHING_TO_UNDO: &str = "Nothing to undo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOptions {
    /// Validate the dataset and refuse to write anything if it has blocking errors
    pub validate_first: bool,
    /// Mark controls that end up without a value
    pub highlight_unfilled: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            validate_first: true,
            highlight_unfilled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    /// Every queued write landed
    Filled,
    /// Some writes were rejected by the host
    Partial,
    /// Validation found blocking errors; the document was not touched
    ValidationFailed,
    /// No control had a value to write
    NothingToFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoValue,
    NotInSchema,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledControl {
    pub control_id: String,
    /// Dataset path the value came from (`tenant`, `parties.0.name`)
    pub field_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedControl {
    pub control_id: String,
    pub field_id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlError {
    pub control_id: String,
    pub field_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub status: FillStatus,
    pub filled: Vec<FilledControl>,
    pub skipped: Vec<SkippedControl>,
    pub errors: Vec<ControlError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    /// Controls captured in the undo snapshot for this fill
    pub snapshot_size: usize,
}

impl FillResult {
    fn validation_failed(report: ValidationReport) -> Self {
        Self {
            status: FillStatus::ValidationFailed,
            filled: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            validation: Some(report),
            snapshot_size: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, FillStatus::Filled | FillStatus::NothingToFill)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResult {
    pub success: bool,
    pub message: String,
    pub restored: usize,
    pub errors: Vec<ControlError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UndoResult {
    fn nothing_to_undo() -> Self {
        Self {
            success: false,
            message: NOTHING_TO_UNDO.to_string(),
            restored: 0,
            errors: Vec::new(),
            description: None,
        }
    }
}

struct PlannedWrite {
    control_id: String,
    field_id: String,
    text: String,
    style: Option<StyleSpec>,
}

#[derive(Default)]
struct FillPlan {
    writes: Vec<PlannedWrite>,
    skipped: Vec<SkippedControl>,
    highlights: Vec<String>,
}

impl FillPlan {
    fn skip(&mut self, control: &Control, reason: SkipReason, highlight: bool) {
        if highlight && reason == SkipReason::NoValue {
            self.highlights.push(control.id.clone());
        }
        self.skipped.push(SkippedControl {
            control_id: control.id.clone(),
            field_id: control.key.dataset_path(),
            reason,
        });
    }
}

/// Scans, validates and fills one host document, with undo
pub struct FillEngine<H: HostDocument> {
    host: H,
    config: EngineConfig,
    cache: ScanCache,
    undo_stack: UndoStack,
    formatter: ValueFormatter,
    validator: Box<dyn DatasetValidator>,
}

impl<H: HostDocument> FillEngine<H> {
    pub fn new(host: H, config: EngineConfig) -> Self {
        Self {
            cache: ScanCache::new(config.scan_ttl),
            undo_stack: UndoStack::new(config.max_undo_depth),
            formatter: ValueFormatter::from_config(&config),
            validator: Box::new(SchemaValidator::new()),
            host,
            config,
        }
    }

    /// Replace the built-in schema validator
    pub fn with_validator(mut self, validator: impl DatasetValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_host(self) -> H {
        self.host
    }

    // ---- scanning ----

    /// List the document's controls, from the cache when it is fresh.
    ///
    /// A host failure is logged and reported as [`ScanOutcome::Failed`].
    pub async fn scan_content_controls(&mut self, force_refresh: bool) -> ScanOutcome {
        if !force_refresh {
            if let Some(controls) = self.cache.fresh() {
                tracing::debug!(controls = controls.len(), "Scan served from cache");
                return ScanOutcome::Cached(controls);
            }
        }
        match self.read_fresh().await {
            Ok(controls) => ScanOutcome::Fresh(controls),
            Err(e) => {
                tracing::warn!(error = %e, "Document scan failed");
                ScanOutcome::Failed(e)
            }
        }
    }

    /// Controls grouped by field id, derived from the cached scan
    pub async fn build_map(&mut self, force_refresh: bool) -> Result<Arc<ControlMap>, HostError> {
        if !force_refresh {
            if let Some(map) = self.cache.field_map() {
                return Ok(map);
            }
        }
        let controls = self.read_fresh().await?;
        Ok(self
            .cache
            .field_map()
            .unwrap_or_else(|| Arc::new(group_by_field(&controls))))
    }

    async fn read_fresh(&mut self) -> Result<Arc<[Control]>, HostError> {
        let raw = self.host.read_controls().await?;
        let controls = interpret_controls(&raw, &self.config.unfilled_markers);
        tracing::debug!(raw = raw.len(), controls = controls.len(), "Document scanned");
        Ok(self.cache.store(controls))
    }

    async fn read_for(&mut self, action: Action) -> Result<Arc<[Control]>, FillError> {
        self.read_fresh().await.map_err(|e| {
            tracing::warn!(?action, error = %e, "Document read failed");
            FillError::host(action, e)
        })
    }

    // ---- mapping and validation ----

    pub async fn map_controls_to_schema(&mut self, schema: &Schema) -> MappingReport {
        match self.build_map(false).await {
            Ok(map) => map_schema(schema, &map),
            Err(e) => {
                tracing::warn!(error = %e, "Mapping without a document scan");
                let mut report = map_schema(schema, &ControlMap::new());
                report
                    .warnings
                    .insert(0, format!("The document could not be scanned: {}", e));
                report
            }
        }
    }

    pub fn validate_dataset(&self, schema: &Schema, dataset: &Dataset) -> ValidationReport {
        self.validator.validate_dataset(schema, dataset)
    }

    // ---- filling ----

    /// Fill every control that has a value in the dataset
    pub async fn fill_template(
        &mut self,
        schema: &Schema,
        dataset: &Dataset,
        options: FillOptions,
    ) -> Result<FillResult, FillError> {
        let validation = if options.validate_first {
            let report = self.validate_dataset(schema, dataset);
            if !report.is_valid {
                tracing::info!(errors = report.errors.len(), "Fill blocked by validation");
                return Ok(FillResult::validation_failed(report));
            }
            Some(report)
        } else {
            None
        };

        let controls = self.read_for(Action::Fill).await?;
        let snapshot = Snapshot::capture(controls.iter());
        let snapshot_size = snapshot.len();
        let description = format!("Fill {}", schema.name.as_deref().unwrap_or("template"));
        self.undo_stack.push(snapshot, description, SnapshotKind::Fill);

        let mut plan = FillPlan::default();
        for control in controls.iter() {
            self.plan_control(&mut plan, schema, dataset, control, true, options.highlight_unfilled);
        }

        let mut result = self.execute(plan, snapshot_size).await?;
        result.validation = validation;
        tracing::info!(
            status = ?result.status,
            filled = result.filled.len(),
            skipped = result.skipped.len(),
            errors = result.errors.len(),
            "Template filled"
        );
        Ok(result)
    }

    /// Fill the controls of one field, for live edits
    pub async fn fill_single_field(
        &mut self,
        field_id: &str,
        value: &Value,
        schema: &Schema,
    ) -> Result<FillResult, FillError> {
        let field = schema
            .field(field_id)
            .ok_or_else(|| FillError::UnknownField(field_id.to_string()))?;
        let description = format!("Fill {}", field.display_name());

        let controls = self.read_for(Action::Fill).await?;
        let scoped: Vec<&Control> = controls.iter().filter(|c| c.field_id() == field_id).collect();
        if scoped.is_empty() {
            tracing::warn!(field = %field_id, "No controls found for field");
            return Ok(FillResult {
                status: FillStatus::NothingToFill,
                filled: Vec::new(),
                skipped: Vec::new(),
                errors: Vec::new(),
                validation: None,
                snapshot_size: 0,
            });
        }

        let snapshot = Snapshot::capture(scoped.iter().copied());
        let snapshot_size = snapshot.len();
        self.undo_stack.push(snapshot, description, SnapshotKind::SingleField);

        // the edit is about this field alone, so other values don't gate it
        let dataset = Dataset::new().with_value(field_id, value.clone());
        let mut plan = FillPlan::default();
        for control in scoped {
            self.plan_control(&mut plan, schema, &dataset, control, false, false);
        }

        let result = self.execute(plan, snapshot_size).await?;
        tracing::info!(field = %field_id, filled = result.filled.len(), "Field filled");
        Ok(result)
    }

    /// Fill `field_index_sub` controls for every item of a repeating field
    pub async fn fill_repeating_section(
        &mut self,
        schema: &Schema,
        dataset: &Dataset,
        field_id: &str,
    ) -> Result<FillResult, FillError> {
        let field = schema
            .field(field_id)
            .ok_or_else(|| FillError::UnknownField(field_id.to_string()))?;
        if field.field_type != FieldType::Repeating {
            return Err(FillError::NotRepeating(field_id.to_string()));
        }
        let items = match dataset.resolve(field_id) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        let controls = self.read_for(Action::Fill).await?;
        let snapshot = Snapshot::capture(controls.iter());
        let snapshot_size = snapshot.len();
        self.undo_stack.push(
            snapshot,
            format!("Fill {}", field.display_name()),
            SnapshotKind::RepeatingSection,
        );

        let mut plan = FillPlan::default();
        let section: Vec<&Control> = controls
            .iter()
            .filter(|c| c.field_id() == field_id && c.key.is_indexed())
            .collect();
        for index in 0..items.len() {
            for sub in &field.sub_fields {
                let tag = ControlKey::indexed(field_id, index, sub.id.clone());
                let targets: Vec<&&Control> = section.iter().filter(|c| c.key == tag).collect();
                if targets.is_empty() {
                    tracing::debug!(tag = %tag, "No control for repeating item");
                }
                for control in targets {
                    self.plan_control(&mut plan, schema, dataset, control, true, false);
                }
            }
        }

        let result = self.execute(plan, snapshot_size).await?;
        tracing::info!(
            field = %field_id,
            items = items.len(),
            filled = result.filled.len(),
            "Repeating section filled"
        );
        Ok(result)
    }

    /// Load a dataset from a store and fill it
    pub async fn fill_from_store(
        &mut self,
        store: &dyn DatasetStore,
        schema: &Schema,
        dataset_id: &str,
        options: FillOptions,
    ) -> Result<FillResult, FillError> {
        let dataset = store
            .get(dataset_id)
            .await?
            .ok_or_else(|| FillError::DatasetNotFound(dataset_id.to_string()))?;
        self.fill_template(schema, &dataset, options).await
    }

    fn plan_control(
        &self,
        plan: &mut FillPlan,
        schema: &Schema,
        dataset: &Dataset,
        control: &Control,
        check_visibility: bool,
        highlight_unfilled: bool,
    ) {
        let Some(field) = schema.field_for_key(&control.key) else {
            tracing::debug!(control_id = %control.id, key = %control.key, "Control has no schema field");
            plan.skip(control, SkipReason::NotInSchema, false);
            return;
        };
        if check_visibility && !is_visible(control.field_id(), schema, dataset) {
            plan.skip(control, SkipReason::Hidden, false);
            return;
        }
        let Some(value) = dataset.resolve_non_empty(&control.key) else {
            plan.skip(control, SkipReason::NoValue, highlight_unfilled);
            return;
        };

        plan.writes.push(PlannedWrite {
            control_id: control.id.clone(),
            field_id: control.key.dataset_path(),
            text: self.formatter.render(field, value),
            style: StyleSpec::from_field_style(&field.style),
        });
    }

    /// Commit a plan in one round-trip and sort the outcome per control
    async fn execute(&mut self, plan: FillPlan, snapshot_size: usize) -> Result<FillResult, FillError> {
        let FillPlan {
            writes,
            skipped,
            highlights,
        } = plan;

        let mut batch = WriteBatch::new();
        let mut op_indices = Vec::with_capacity(writes.len());
        for write in &writes {
            let text_op = batch.len();
            batch.write_text(write.control_id.clone(), write.text.clone());
            let style_op = write.style.clone().map(|style| {
                let index = batch.len();
                batch.set_style(write.control_id.clone(), style);
                index
            });
            op_indices.push((text_op, style_op));
        }
        let mut highlight_ops = Vec::with_capacity(highlights.len());
        for control_id in highlights {
            highlight_ops.push(batch.len());
            batch.highlight(control_id);
        }

        let mut result = FillResult {
            status: FillStatus::NothingToFill,
            filled: Vec::new(),
            skipped,
            errors: Vec::new(),
            validation: None,
            snapshot_size,
        };
        if batch.is_empty() {
            return Ok(result);
        }

        let committed = self.host.commit(batch).await;
        self.cache.invalidate();
        let outcome = committed.map_err(|e| {
            tracing::warn!(error = %e, "Fill commit failed");
            FillError::host(Action::Fill, e)
        })?;

        // a missing highlight is cosmetic and doesn't change the fill status
        for failure in highlight_ops.into_iter().filter_map(|i| outcome.failure_for(i)) {
            tracing::debug!(control_id = %failure.control_id, error = %failure.error, "Highlight not applied");
        }

        for (write, (text_op, style_op)) in writes.into_iter().zip(op_indices) {
            if let Some(failure) = outcome.failure_for(text_op) {
                tracing::warn!(control_id = %write.control_id, error = %failure.error, "Control rejected write");
                result.errors.push(ControlError {
                    control_id: write.control_id,
                    field_id: write.field_id,
                    message: failure.error.to_string(),
                });
                continue;
            }
            if let Some(failure) = style_op.and_then(|i| outcome.failure_for(i)) {
                tracing::warn!(control_id = %write.control_id, error = %failure.error, "Control rejected style");
                result.errors.push(ControlError {
                    control_id: write.control_id.clone(),
                    field_id: write.field_id.clone(),
                    message: format!("Text was written but the style was not applied: {}", failure.error),
                });
            }
            result.filled.push(FilledControl {
                control_id: write.control_id,
                field_id: write.field_id,
                text: write.text,
            });
        }

        result.status = if !result.errors.is_empty() {
            FillStatus::Partial
        } else if result.filled.is_empty() {
            FillStatus::NothingToFill
        } else {
            FillStatus::Filled
        };
        Ok(result)
    }

    // ---- undo ----

    /// Restore the document to the most recent snapshot
    pub async fn undo(&mut self) -> Result<UndoResult, FillError> {
        let Some(entry) = self.undo_stack.pop() else {
            return Ok(UndoResult::nothing_to_undo());
        };

        let mut batch = WriteBatch::new();
        for (control_id, text) in entry.snapshot.iter() {
            batch.write_text(control_id, text);
        }
        let attempted = batch.len();

        let committed = if batch.is_empty() {
            Ok(Default::default())
        } else {
            let committed = self.host.commit(batch).await;
            self.cache.invalidate();
            committed
        };

        let outcome = match committed {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, description = %entry.description, "Undo failed, keeping history");
                self.undo_stack.push_entry(entry);
                return Err(FillError::host(Action::Undo, e));
            }
        };

        let errors: Vec<ControlError> = outcome
            .failures
            .iter()
            .map(|f| ControlError {
                control_id: f.control_id.clone(),
                field_id: String::new(),
                message: f.error.to_string(),
            })
            .collect();
        let restored = attempted - errors.len();
        let message = if errors.is_empty() {
            format!("Undid \"{}\" ({} fields restored)", entry.description, restored)
        } else {
            format!(
                "Undid \"{}\" but {} of {} fields could not be restored",
                entry.description,
                errors.len(),
                attempted
            )
        };
        tracing::info!(restored, failed = errors.len(), description = %entry.description, "Undo applied");

        Ok(UndoResult {
            success: errors.is_empty(),
            message,
            restored,
            errors,
            description: Some(entry.description),
        })
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.depth()
    }

    /// Undo entries, newest first
    pub fn undo_history(&self) -> Vec<UndoSummary> {
        self.undo_stack.history()
    }

    pub fn clear_undo_history(&mut self) {
        self.undo_stack.clear();
    }

    /// Snapshot the current document without writing anything. Returns the
    /// number of controls captured.
    pub async fn create_checkpoint(&mut self, description: &str) -> Result<usize, FillError> {
        let controls = self.read_for(Action::Checkpoint).await?;
        let snapshot = Snapshot::capture(controls.iter());
        let size = snapshot.len();
        self.undo_stack.push(snapshot, description, SnapshotKind::Checkpoint);
        tracing::info!(controls = size, description, "Checkpoint created");
        Ok(size)
    }
}
