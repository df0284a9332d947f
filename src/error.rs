// src/error.rs
//! Error types for the node builder.
//!
//! Only problems with the caller's input surface here. Broken internal
//! invariants (a partner with mismatched endpoints, a seg pointing at a
//! vertex that does not exist) are bugs and assert instead.

use thiserror::Error;

/// Why a linedef was refused during seg construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Both endpoints land on the same vertex.
    ZeroLength,
    /// The linedef names a vertex that is not in the level.
    BadVertex(usize),
    /// The vertex does not fit into 16.16 fixed point.
    VertexOutOfRange(usize),
    /// The vertex lies more than 32767 map units from another vertex on one
    /// axis, so the delta between them would not fit into 16.16.
    SpanTooWide(usize),
    /// Neither side is present.
    NoSides,
    /// A side names a sidedef that is not in the level.
    BadSidedef(usize),
    /// A sidedef names a sector that is not in the level.
    BadSector(usize),
    /// Front and back use the same sidedef, so the partner pair would be degenerate.
    SharedSidedef,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::ZeroLength => write!(f, "line has zero length"),
            MalformedReason::BadVertex(v) => write!(f, "vertex {} does not exist", v),
            MalformedReason::VertexOutOfRange(v) => {
                write!(f, "vertex {} is outside the fixed-point range", v)
            }
            MalformedReason::SpanTooWide(v) => {
                write!(f, "vertex {} is too far from the rest of the level", v)
            }
            MalformedReason::NoSides => write!(f, "line has no sides"),
            MalformedReason::BadSidedef(s) => write!(f, "sidedef {} does not exist", s),
            MalformedReason::BadSector(s) => write!(f, "sector {} does not exist", s),
            MalformedReason::SharedSidedef => {
                write!(f, "both sides reference the same sidedef")
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("Malformed geometry on line {line}: {reason}")]
    MalformedGeometry { line: usize, reason: MalformedReason },

    #[error("Level has no lines to build nodes from")]
    EmptyLevel,

    #[error("Invalid build options: {0}")]
    InvalidOptions(String),
}
