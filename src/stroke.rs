//! Stroke segments — the unit of replication.
//!
//! DESIGN
//! ======
//! A segment is one straight line between two points in the unit square,
//! so replay is geometrically faithful on any canvas size. Pixel conversion
//! belongs to the client. An eraser stroke is an ordinary segment drawn in
//! the canvas background color.
//!
//! `StrokeInput` is what a client sends; `StrokeSegment::new` stamps the
//! owner and a server id and is the only way a payload becomes a segment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::frame::ErrorCode;

/// Longest color token accepted, in bytes.
pub const MAX_COLOR_LEN: usize = 64;

// =============================================================================
// TYPES
// =============================================================================

/// Client-supplied draw payload. Carries no owner; the server stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeInput {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: String,
    pub width: f64,
}

/// An accepted segment as stored in history and broadcast to participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeSegment {
    /// Server-assigned identity, used for incremental undo broadcast.
    pub id: Uuid,
    pub owner_id: Uuid,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrokeError {
    #[error("malformed stroke payload: {0}")]
    Malformed(String),
    #[error("coordinate {field} = {value} is outside the unit square")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("stroke width must be a positive number, got {0}")]
    Width(f64),
    #[error("stroke color must be 1..={} bytes", MAX_COLOR_LEN)]
    Color,
}

impl ErrorCode for StrokeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_STROKE_MALFORMED",
            Self::OutOfRange { .. } => "E_STROKE_OUT_OF_RANGE",
            Self::Width(_) => "E_STROKE_WIDTH",
            Self::Color => "E_STROKE_COLOR",
        }
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl StrokeInput {
    /// Parse a draw payload from loosely-typed frame data.
    ///
    /// # Errors
    ///
    /// Returns `StrokeError::Malformed` if a field is missing or mistyped.
    pub fn from_value(value: serde_json::Value) -> Result<Self, StrokeError> {
        serde_json::from_value(value).map_err(|e| StrokeError::Malformed(e.to_string()))
    }

    /// Check geometry, width and color.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), StrokeError> {
        for (field, value) in [("x0", self.x0), ("y0", self.y0), ("x1", self.x1), ("y1", self.y1)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(StrokeError::OutOfRange { field, value });
            }
        }
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(StrokeError::Width(self.width));
        }
        if self.color.is_empty() || self.color.len() > MAX_COLOR_LEN {
            return Err(StrokeError::Color);
        }
        Ok(())
    }
}

impl StrokeSegment {
    /// Validate `input` and stamp it with its owner and a fresh id.
    ///
    /// # Errors
    ///
    /// Returns a `StrokeError` if the input fails validation; nothing is
    /// constructed in that case.
    pub fn new(owner_id: Uuid, input: StrokeInput) -> Result<Self, StrokeError> {
        input.validate()?;
        let StrokeInput { x0, y0, x1, y1, color, width } = input;
        Ok(Self { id: Uuid::new_v4(), owner_id, x0, y0, x1, y1, color, width })
    }
}

#[cfg(test)]
#[path = "stroke_test.rs"]
mod tests;
