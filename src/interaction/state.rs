//! Drag state machine.
//!
//! ```text
//! Idle ──pointer down on a field──→ Dragging { field_id, grab_offset }
//! Dragging ──pointer up / leave──→ Idle
//! Dragging ──field removed / preview──→ Idle
//! ```
//!
//! Only one field can be dragged at a time; the state makes anything else
//! unrepresentable.

use crate::render::Point;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,

    Dragging {
        field_id: String,
        /// Pointer minus field origin at grab time, in canvas px.
        grab_offset: Point,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// Id of the field being dragged, if any.
    pub fn dragged_field(&self) -> Option<&str> {
        match self {
            Self::Dragging { field_id, .. } => Some(field_id.as_str()),
            Self::Idle => None,
        }
    }

    pub fn grab_offset(&self) -> Option<Point> {
        match self {
            Self::Dragging { grab_offset, .. } => Some(*grab_offset),
            Self::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries() {
        let idle = DragState::default();
        assert!(!idle.is_dragging());
        assert_eq!(idle.dragged_field(), None);

        let dragging = DragState::Dragging {
            field_id: "sender".into(),
            grab_offset: Point::new(3.0, 4.0),
        };
        assert!(dragging.is_dragging());
        assert_eq!(dragging.dragged_field(), Some("sender"));
        assert_eq!(dragging.grab_offset(), Some(Point::new(3.0, 4.0)));
    }
}
