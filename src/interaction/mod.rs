//! # Drag and Selection
//!
//! Interprets pointer events against the rendered canvas. Pointer positions
//! arrive in viewport px and go through the scene's [`CanvasTransform`]
//! inverse before any hit-test or move, so the controller agrees with what
//! was drawn at any scale.
//!
//! The controller never edits fields. A drag yields a [`MoveProposal`] that
//! the session applies as a position patch.
//!
//! ## Clamping
//!
//! Every proposed position satisfies, per axis:
//!
//! ```text
//! 0 ≤ x ≤ canvas.width  − size.width
//! 0 ≤ y ≤ canvas.height − size.height
//! ```
//!
//! When a field is larger than the canvas on an axis, that axis is pinned to 0.

mod state;

pub use state::DragState;

use crate::render::{CanvasMode, CanvasTransform, Point};
use crate::template::{CanvasSize, Position, Size, TemplateField};

/// New position for the dragged field.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveProposal {
    pub field_id: String,
    pub position: Position,
}

/// Result of a pointer press.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerDown {
    /// A field was grabbed and selected.
    Grabbed(String),
    /// Empty canvas: selection cleared.
    Cleared,
    /// Preview mode, nothing happens.
    Ignored,
}

/// Clamp one axis into `[0, extent − size]`, or 0 if the field is larger.
#[inline]
fn clamp_axis(value: f32, size: f32, extent: f32) -> f32 {
    let max = (extent - size).max(0.0);
    value.clamp(0.0, max)
}

/// Keep a field of `size` fully inside `canvas` where possible.
pub fn clamp_position(candidate: Point, size: Size, canvas: CanvasSize) -> Position {
    Position::new(
        clamp_axis(candidate.x, size.width, canvas.width),
        clamp_axis(candidate.y, size.height, canvas.height),
    )
}

/// Topmost enabled field containing the canvas point.
pub fn hit_test(fields: &[TemplateField], point: Point) -> Option<&TemplateField> {
    fields
        .iter()
        .rev()
        .filter(|f| f.enabled())
        .find(|f| f.contains(point.x, point.y))
}

/// Drag and selection state for one canvas.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
    selected: Option<String>,
    mode: CanvasMode,
}

impl DragController {
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    /// Select a field (or nothing). Ignored in preview.
    pub fn select(&mut self, field_id: Option<String>) {
        if self.mode == CanvasMode::Design {
            self.selected = field_id;
        }
    }

    /// Switch mode. Preview drops any drag and selection.
    pub fn set_mode(&mut self, mode: CanvasMode) {
        self.mode = mode;
        if mode == CanvasMode::Preview {
            self.state = DragState::Idle;
            self.selected = None;
        }
    }

    /// Drop selection and drag state that refer to a removed field.
    pub fn forget(&mut self, field_id: &str) {
        if self.selected.as_deref() == Some(field_id) {
            self.selected = None;
        }
        if self.state.dragged_field() == Some(field_id) {
            self.state = DragState::Idle;
        }
    }

    /// Forget everything, e.g. after loading another template.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
        self.selected = None;
    }

    pub fn pointer_down(
        &mut self,
        viewport_point: Point,
        fields: &[TemplateField],
        transform: CanvasTransform,
    ) -> PointerDown {
        if self.mode == CanvasMode::Preview {
            return PointerDown::Ignored;
        }

        let point = transform.to_canvas(viewport_point);
        match hit_test(fields, point) {
            Some(field) => {
                let origin = field.position();
                let grab_offset = Point::new(point.x - origin.x, point.y - origin.y);
                tracing::debug!(field_id = field.id(), "drag start");
                self.state = DragState::Dragging {
                    field_id: field.id().to_string(),
                    grab_offset,
                };
                self.selected = Some(field.id().to_string());
                PointerDown::Grabbed(field.id().to_string())
            }
            None => {
                self.state = DragState::Idle;
                self.selected = None;
                PointerDown::Cleared
            }
        }
    }

    /// Propose a clamped position for the dragged field, if dragging.
    pub fn pointer_move(
        &self,
        viewport_point: Point,
        fields: &[TemplateField],
        canvas: CanvasSize,
        transform: CanvasTransform,
    ) -> Option<MoveProposal> {
        let DragState::Dragging {
            field_id,
            grab_offset,
        } = &self.state
        else {
            return None;
        };
        let field = fields.iter().find(|f| f.id() == field_id.as_str())?;

        let point = transform.to_canvas(viewport_point);
        let candidate = Point::new(point.x - grab_offset.x, point.y - grab_offset.y);
        Some(MoveProposal {
            field_id: field_id.clone(),
            position: clamp_position(candidate, field.size(), canvas),
        })
    }

    pub fn pointer_up(&mut self) {
        if let Some(id) = self.state.dragged_field() {
            tracing::debug!(field_id = id, "drag end");
        }
        self.state = DragState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FieldType;

    const CANVAS: CanvasSize = CanvasSize::new(384.0, 576.0);
    const UNIT: CanvasTransform = CanvasTransform { scale: 1.0 };

    fn fields() -> Vec<TemplateField> {
        vec![
            TemplateField::with_defaults("below", FieldType::Rectangle).with_position(0.0, 0.0),
            TemplateField::with_defaults("above", FieldType::QrCode).with_position(50.0, 50.0),
            TemplateField::with_defaults("hidden", FieldType::Text)
                .with_position(50.0, 50.0)
                .with_enabled(false),
        ]
    }

    #[test]
    fn test_hit_test_picks_topmost_enabled() {
        let fields = fields();
        assert_eq!(hit_test(&fields, Point::new(60.0, 60.0)).map(|f| f.id()), Some("above"));
        assert_eq!(hit_test(&fields, Point::new(10.0, 10.0)).map(|f| f.id()), Some("below"));
        assert_eq!(hit_test(&fields, Point::new(300.0, 500.0)).map(|f| f.id()), None);
    }

    #[test]
    fn test_grab_then_move() {
        let fields = fields();
        let mut ctl = DragController::default();
        let down = ctl.pointer_down(Point::new(60.0, 70.0), &fields, UNIT);
        assert_eq!(down, PointerDown::Grabbed("above".into()));
        assert_eq!(ctl.selected(), Some("above"));
        assert_eq!(ctl.state().grab_offset(), Some(Point::new(10.0, 20.0)));

        let proposal = ctl
            .pointer_move(Point::new(110.0, 120.0), &fields, CANVAS, UNIT)
            .unwrap();
        assert_eq!(proposal.position, Position::new(100.0, 100.0));

        ctl.pointer_up();
        assert!(!ctl.state().is_dragging());
        assert_eq!(ctl.pointer_move(Point::new(0.0, 0.0), &fields, CANVAS, UNIT), None);
        assert_eq!(ctl.selected(), Some("above"));
    }

    #[test]
    fn test_empty_canvas_clears_selection() {
        let fields = fields();
        let mut ctl = DragController::default();
        ctl.select(Some("below".into()));
        let down = ctl.pointer_down(Point::new(300.0, 500.0), &fields, UNIT);
        assert_eq!(down, PointerDown::Cleared);
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn test_hit_test_through_inverse_scale() {
        let fields = fields();
        let half = CanvasTransform { scale: 0.5 };
        let mut ctl = DragController::default();
        // Viewport (30, 30) is canvas (60, 60): inside "above".
        assert_eq!(
            ctl.pointer_down(Point::new(30.0, 30.0), &fields, half),
            PointerDown::Grabbed("above".into())
        );
        // Viewport (40, 40) is canvas (80, 80), 20 px further on each axis.
        let proposal = ctl.pointer_move(Point::new(40.0, 40.0), &fields, CANVAS, half).unwrap();
        assert_eq!(proposal.position, Position::new(70.0, 70.0));
    }

    #[test]
    fn test_moves_are_clamped() {
        let fields = fields();
        let mut ctl = DragController::default();
        ctl.pointer_down(Point::new(60.0, 60.0), &fields, UNIT);

        let far = ctl.pointer_move(Point::new(5000.0, 9000.0), &fields, CANVAS, UNIT).unwrap();
        assert_eq!(far.position, Position::new(284.0, 476.0));

        let negative = ctl.pointer_move(Point::new(-400.0, -1.0), &fields, CANVAS, UNIT).unwrap();
        assert_eq!(negative.position, Position::new(0.0, 0.0));
    }

    #[test]
    fn test_clamp_holds_for_a_sweep_of_pointers() {
        let size = Size::new(100.0, 100.0);
        for i in -20..=20 {
            for j in -20..=20 {
                let p = clamp_position(Point::new(i as f32 * 37.3, j as f32 * 53.9), size, CANVAS);
                assert!(p.x >= 0.0 && p.x <= CANVAS.width - size.width, "x = {}", p.x);
                assert!(p.y >= 0.0 && p.y <= CANVAS.height - size.height, "y = {}", p.y);
            }
        }
    }

    #[test]
    fn test_oversized_field_pins_to_origin() {
        let p = clamp_position(Point::new(50.0, 50.0), Size::new(500.0, 10.0), CANVAS);
        assert_eq!(p, Position::new(0.0, 50.0));
    }

    #[test]
    fn test_preview_is_inert() {
        let fields = fields();
        let mut ctl = DragController::default();
        ctl.pointer_down(Point::new(60.0, 60.0), &fields, UNIT);
        ctl.set_mode(CanvasMode::Preview);
        assert_eq!(ctl.selected(), None);
        assert!(!ctl.state().is_dragging());
        assert_eq!(
            ctl.pointer_down(Point::new(60.0, 60.0), &fields, UNIT),
            PointerDown::Ignored
        );
        ctl.select(Some("above".into()));
        assert_eq!(ctl.selected(), None);
    }

    #[test]
    fn test_forget_removed_field() {
        let fields = fields();
        let mut ctl = DragController::default();
        ctl.pointer_down(Point::new(60.0, 60.0), &fields, UNIT);
        ctl.forget("above");
        assert_eq!(ctl.selected(), None);
        assert!(!ctl.state().is_dragging());
    }
}
