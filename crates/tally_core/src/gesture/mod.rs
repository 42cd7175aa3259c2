//! Drag-to-reorder gesture logic.
//!
//! # Responsibility
//! - Provide a pure reorder function over the display list.
//! - Track pointer-driven drag state through an explicit machine instead of
//!   view-layer timing tricks.
//!
//! # Invariants
//! - Reordering only permutes non-archived goals; archived goals keep their
//!   relative order at the tail.
//! - A press only becomes a drag after the pointer travels the activation
//!   threshold, so taps stay taps.

use crate::model::goal::{Goal, GoalId};

/// Pointer travel (in display pixels) required before a press becomes a drag.
pub const DRAG_ACTIVATION_THRESHOLD: f32 = 5.0;

/// Moves the goal `from_id` to the display position of `to_id`.
///
/// Operates on the non-archived portion of the list; archived goals are
/// re-appended unchanged. Unknown ids or a self-move return the input order.
pub fn reorder_goals(goals: &[Goal], from_id: &str, to_id: &str) -> Vec<Goal> {
    if from_id == to_id {
        return goals.to_vec();
    }

    let mut active: Vec<Goal> = goals.iter().filter(|g| g.is_active()).cloned().collect();
    let from = active.iter().position(|g| g.id == from_id);
    let to = active.iter().position(|g| g.id == to_id);

    let (Some(from), Some(to)) = (from, to) else {
        return goals.to_vec();
    };

    let moved = active.remove(from);
    active.insert(to, moved);
    active.extend(goals.iter().filter(|g| !g.is_active()).cloned());
    active
}

/// Gesture lifecycle for one drag interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down but has not travelled the activation threshold.
    Pressing,
    /// Threshold crossed; hover targets are being tracked.
    Dragging,
    /// Drag completed with a reorder request; waiting for the caller to
    /// apply it and acknowledge.
    Settling,
}

/// Completed drag, ready to feed `reorder_goals`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest {
    pub from_id: GoalId,
    pub to_id: GoalId,
}

/// Explicit pointer-event state machine:
/// `Idle -> Pressing -> Dragging -> Settling -> Idle`.
#[derive(Debug, Default)]
pub struct DragMachine {
    phase: DragPhase,
    pressed_id: Option<GoalId>,
    origin: (f32, f32),
    over_id: Option<GoalId>,
}

impl DragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// Pointer landed on a goal row.
    pub fn pointer_down(&mut self, goal_id: &str, x: f32, y: f32) {
        if self.phase != DragPhase::Idle {
            return;
        }
        self.phase = DragPhase::Pressing;
        self.pressed_id = Some(goal_id.to_string());
        self.origin = (x, y);
        self.over_id = None;
    }

    /// Pointer moved; promotes a press to a drag past the threshold.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.phase != DragPhase::Pressing {
            return;
        }
        let travelled = (x - self.origin.0).hypot(y - self.origin.1);
        if travelled > DRAG_ACTIVATION_THRESHOLD {
            self.phase = DragPhase::Dragging;
        }
    }

    /// Pointer is hovering another goal row while dragging.
    pub fn drag_over(&mut self, goal_id: &str) {
        if self.phase == DragPhase::Dragging {
            self.over_id = Some(goal_id.to_string());
        }
    }

    /// Pointer released. Returns the reorder to apply, if the gesture
    /// completed over a different goal; otherwise resets to `Idle`.
    pub fn pointer_up(&mut self) -> Option<ReorderRequest> {
        let completed = match (self.phase, &self.pressed_id, &self.over_id) {
            (DragPhase::Dragging, Some(from), Some(to)) if from != to => {
                Some(ReorderRequest {
                    from_id: from.clone(),
                    to_id: to.clone(),
                })
            }
            _ => None,
        };

        if completed.is_some() {
            self.phase = DragPhase::Settling;
        } else {
            self.reset();
        }
        completed
    }

    /// Caller applied (or abandoned) the reorder; the machine may idle.
    pub fn settled(&mut self) {
        if self.phase == DragPhase::Settling {
            self.reset();
        }
    }

    /// Abandons the gesture from any phase.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Whether a tap handler should ignore the next click. True from the
    /// moment a drag activates until it settles.
    pub fn is_click_suppressed(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging | DragPhase::Settling)
    }

    fn reset(&mut self) {
        self.phase = DragPhase::Idle;
        self.pressed_id = None;
        self.over_id = None;
        self.origin = (0.0, 0.0);
    }
}
