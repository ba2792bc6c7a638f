//! # Designer Session
//!
//! One open template and everything around it: the drag controller, the
//! bound record, the canvas mode and, when attached, the background code
//! regenerator. All edits go through the session, so pointer moves and
//! property edits have a single writer.
//!
//! ```text
//! pointer ──→ DragController ──MoveProposal──┐
//! property panel ──FieldPatch────────────────┼──→ Template ──→ Renderer ──→ Scene
//! catalogue ──StoredTemplate──→ load ────────┘        │
//!                                                     └──→ CodeRegenerator (design mode)
//! ```
//!
//! ## Example
//!
//! ```
//! use etiqueta::render::CanvasMode;
//! use etiqueta::session::DesignerSession;
//! use etiqueta::template::FieldType;
//!
//! let mut session = DesignerSession::default();
//! let id = session.add_field(FieldType::Barcode).unwrap();
//! let copy = session.duplicate_field(&id).unwrap();
//! assert_eq!(session.field(&copy).unwrap().label(), "Barcode (copy)");
//!
//! session.set_mode(CanvasMode::Preview);
//! assert_eq!(session.render().nodes.len(), 2);
//! assert!(session.validate().is_ok());
//! ```

mod validate;

pub use validate::{NO_ENABLED_FIELD, validate};

use tokio::runtime::Handle;

use crate::binding::ShipmentRecord;
use crate::codes::CodeRegenerator;
use crate::config::DesignerConfig;
use crate::error::{FieldError, SaveError, ValidationError};
use crate::interaction::{DragController, PointerDown};
use crate::render::{
    CanvasMode, CanvasTransform, CodeSource, InlineCodes, Point, RenderInput, Renderer, Scene,
    code_requests,
};
use crate::store::{StoredTemplate, TemplateStore};
use crate::template::{
    CanvasSize, FieldPatch, FieldType, LabelSize, Orientation, Position, Template, TemplateField,
};

/// Suffix appended to the label of a duplicated field.
pub const COPY_SUFFIX: &str = " (copy)";

fn new_field_id() -> String {
    format!("field_{}", uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Default)]
pub struct DesignerSession {
    template: Template,
    /// Store id once the template has been saved or loaded.
    stored_id: Option<String>,
    record: Option<ShipmentRecord>,
    config: DesignerConfig,
    controller: DragController,
    regenerator: Option<CodeRegenerator>,
}

impl DesignerSession {
    pub fn new(config: DesignerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Open an unsaved template.
    pub fn with_template(template: Template, config: DesignerConfig) -> Self {
        Self {
            template,
            config,
            ..Default::default()
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn fields(&self) -> &[TemplateField] {
        self.template.fields()
    }

    pub fn field(&self, id: &str) -> Option<&TemplateField> {
        self.template.field(id)
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.template.canvas_size()
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn stored_id(&self) -> Option<&str> {
        self.stored_id.as_deref()
    }

    pub fn record(&self) -> Option<&ShipmentRecord> {
        self.record.as_ref()
    }

    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    pub fn selected(&self) -> Option<&str> {
        self.controller.selected()
    }

    pub fn mode(&self) -> CanvasMode {
        self.controller.mode()
    }

    // ========================================================================
    // FIELD EDITING
    // ========================================================================

    /// Append a field of `field_type` with its defaults. Returns the new id.
    pub fn add_field(&mut self, field_type: FieldType) -> Result<String, FieldError> {
        let id = new_field_id();
        self.template
            .push_field(TemplateField::with_defaults(id.clone(), field_type))?;
        tracing::debug!(field_id = %id, field_type = %field_type, "field added");
        self.refresh_codes();
        Ok(id)
    }

    /// Merge `patch` into the field. A rejected patch changes nothing.
    pub fn update_field(&mut self, id: &str, patch: &FieldPatch) -> Result<&TemplateField, FieldError> {
        let index = self
            .template
            .position_of(id)
            .ok_or_else(|| FieldError::NotFound(id.to_string()))?;
        let next = self.template.fields()[index].update(patch)?;
        self.template.replace_field(index, next);
        tracing::debug!(field_id = id, "field updated");
        self.refresh_codes();
        Ok(&self.template.fields()[index])
    }

    pub fn remove_field(&mut self, id: &str) -> Result<TemplateField, FieldError> {
        let removed = self
            .template
            .remove_field(id)
            .ok_or_else(|| FieldError::NotFound(id.to_string()))?;
        self.controller.forget(id);
        tracing::debug!(field_id = id, "field removed");
        self.refresh_codes();
        Ok(removed)
    }

    /// Copy a field right after the original, offset on both axes.
    /// Returns the new id.
    pub fn duplicate_field(&mut self, id: &str) -> Result<String, FieldError> {
        let index = self
            .template
            .position_of(id)
            .ok_or_else(|| FieldError::NotFound(id.to_string()))?;
        let original = &self.template.fields()[index];
        let Position { x, y } = original.position();
        let offset = self.config.duplicate_offset;
        let new_id = new_field_id();
        let copy = original
            .clone_with_id(new_id.clone())
            .with_label(format!("{}{}", original.label(), COPY_SUFFIX))
            .with_position(x + offset, y + offset);

        self.template.insert_field(index + 1, copy)?;
        tracing::debug!(field_id = id, copy_id = %new_id, "field duplicated");
        self.refresh_codes();
        Ok(new_id)
    }

    /// Rename and resize the template. Fields keep their geometry.
    pub fn set_template_meta(
        &mut self,
        name: impl Into<String>,
        label_size: LabelSize,
        orientation: Orientation,
    ) {
        self.template.name = name.into();
        self.template.label_size = label_size;
        self.template.orientation = orientation;
        tracing::debug!(
            template = %self.template.name,
            label_size = %label_size,
            ?orientation,
            "template metadata changed"
        );
    }

    // ========================================================================
    // SELECTION, DATA AND MODE
    // ========================================================================

    /// Select a field by id, or clear with `None`. Ignored in preview.
    pub fn select(&mut self, id: Option<&str>) -> Result<(), FieldError> {
        if let Some(id) = id
            && self.template.field(id).is_none()
        {
            return Err(FieldError::NotFound(id.to_string()));
        }
        self.controller.select(id.map(str::to_string));
        Ok(())
    }

    /// Bind a record to resolve against, or `None` for sample values.
    pub fn bind_record(&mut self, record: Option<ShipmentRecord>) {
        self.record = record;
        self.refresh_codes();
    }

    /// Switch mode. Any background regeneration is cancelled.
    pub fn set_mode(&mut self, mode: CanvasMode) {
        if let Some(regenerator) = &mut self.regenerator {
            regenerator.cancel_all();
        }
        self.controller.set_mode(mode);
        self.refresh_codes();
    }

    pub fn toggle_preview(&mut self) -> CanvasMode {
        let next = match self.mode() {
            CanvasMode::Design => CanvasMode::Preview,
            CanvasMode::Preview => CanvasMode::Design,
        };
        self.set_mode(next);
        next
    }

    // ========================================================================
    // RENDERING AND POINTER
    // ========================================================================

    pub fn render_input(&self) -> RenderInput<'_> {
        RenderInput {
            fields: self.template.fields(),
            canvas: self.canvas_size(),
            record: self.record.as_ref(),
            selected: self.controller.selected(),
            mode: self.mode(),
            config: &self.config,
        }
    }

    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::fit(self.canvas_size(), self.config.viewport)
    }

    /// Build the current scene.
    ///
    /// Preview always encodes inline so it matches print. Design mode reads
    /// the regenerator's slots when one is attached.
    pub fn render(&self) -> Scene {
        let input = self.render_input();
        let codes: &dyn CodeSource = match (&self.regenerator, input.mode) {
            (Some(regenerator), CanvasMode::Design) => regenerator.slots(),
            _ => &InlineCodes,
        };
        Renderer::new(codes).render(&input)
    }

    pub fn pointer_down(&mut self, viewport_point: Point) -> PointerDown {
        let transform = self.transform();
        self.controller
            .pointer_down(viewport_point, self.template.fields(), transform)
    }

    /// Move the dragged field, if any. Returns its new position.
    pub fn pointer_move(&mut self, viewport_point: Point) -> Option<Position> {
        let proposal = self.controller.pointer_move(
            viewport_point,
            self.template.fields(),
            self.canvas_size(),
            self.transform(),
        )?;
        let Position { x, y } = proposal.position;
        let index = self.template.position_of(&proposal.field_id)?;
        let moved = match self.template.fields()[index].update(&FieldPatch::position(x, y)) {
            Ok(moved) => moved,
            Err(e) => {
                tracing::warn!(field_id = %proposal.field_id, error = %e, "move rejected");
                return None;
            }
        };
        self.template.replace_field(index, moved);
        Some(proposal.position)
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.template)
    }

    /// Start over with an empty, unsaved template.
    pub fn new_template(
        &mut self,
        name: impl Into<String>,
        label_size: LabelSize,
        orientation: Orientation,
    ) {
        self.replace_template(Template::new(name, label_size, orientation), None);
    }

    /// Replace the whole template with a stored one.
    pub fn load(&mut self, stored: StoredTemplate) {
        tracing::info!(
            id = %stored.id,
            template = %stored.template.name,
            fields = stored.template.fields().len(),
            "template loaded"
        );
        self.replace_template(stored.template, Some(stored.id));
    }

    fn replace_template(&mut self, template: Template, stored_id: Option<String>) {
        if let Some(regenerator) = &mut self.regenerator {
            regenerator.cancel_all();
        }
        self.controller.reset();
        self.template = template;
        self.stored_id = stored_id;
        self.refresh_codes();
    }

    /// Validate, then create or update the template in `store`.
    pub async fn save(&mut self, store: &dyn TemplateStore) -> Result<StoredTemplate, SaveError> {
        self.validate()?;
        let stored = match &self.stored_id {
            Some(id) => store.update_template(id, &self.template).await?,
            None => store.create_template(&self.template).await?,
        };
        tracing::info!(id = %stored.id, template = %stored.template.name, "template saved");
        self.stored_id = Some(stored.id.clone());
        Ok(stored)
    }

    // ========================================================================
    // BACKGROUND CODE GENERATION
    // ========================================================================

    /// Generate codes in the background on `runtime` from now on.
    pub fn attach_regenerator(&mut self, runtime: Handle) {
        if let Some(mut previous) = self.regenerator.take() {
            previous.cancel_all();
        }
        self.regenerator = Some(CodeRegenerator::new(runtime));
        self.refresh_codes();
    }

    /// Stop background generation and fall back to inline encoding.
    pub fn detach_regenerator(&mut self) {
        if let Some(mut regenerator) = self.regenerator.take() {
            regenerator.cancel_all();
        }
    }

    pub fn regenerator(&self) -> Option<&CodeRegenerator> {
        self.regenerator.as_ref()
    }

    /// Trigger generation for every code field whose request changed.
    /// Returns how many were triggered.
    pub fn refresh_codes(&mut self) -> usize {
        if self.mode() != CanvasMode::Design || self.regenerator.is_none() {
            return 0;
        }
        let requests = code_requests(&self.render_input());
        self.regenerator
            .as_mut()
            .map_or(0, |regenerator| regenerator.sync(&requests))
    }

    /// Apply finished generations. Returns how many landed.
    pub fn poll_codes(&mut self) -> usize {
        self.regenerator.as_mut().map_or(0, CodeRegenerator::poll)
    }

    /// Wait for every pending generation to land.
    pub async fn settle_codes(&mut self) {
        if let Some(regenerator) = &mut self.regenerator {
            regenerator.settle().await;
        }
    }
}
