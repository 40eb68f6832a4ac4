//! `jpeg2png-rs`: recovers a TV-regularized spatial image consistent with a
//! JPEG's stored DCT coefficients, converting directly to PNG rather than
//! showing the blocking and ringing artifacts a naive IDCT would.
//!
//! The pipeline, in order: [`jpeg_input`] reads the quantized coefficients,
//! [`plane`] produces each plane's initial spatial estimate (C3),
//! [`solver`] (backed by [`projector`], [`transform`] and [`layout`]) refines
//! that estimate by projected subgradient descent (C4-C6), [`color`]
//! upsamples chroma and converts to RGB (C7), and [`png_output`] writes the
//! result. [`orchestrator`] drives all of this (C8).

pub mod color;
pub mod consts;
pub mod error;
pub mod jpeg_input;
pub mod layout;
pub mod orchestrator;
pub mod plane;
pub mod png_output;
pub mod projector;
pub mod solver;
pub mod transform;

pub use error::{Error, Result};
