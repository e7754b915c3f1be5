//! The export pipeline, one module per stage:
//!
//! 1. [`source`] — load and identify the input document
//! 2. [`resolve`] / [`preprocess`] — inline image references as data URIs
//! 3. [`segment`] — detect page/slide structure from the markup
//! 4. [`surface`] — manage the render surface the captures run on
//! 5. [`capture`] — rasterize or vectorize each segment in order
//! 6. [`assemble`] — package the snapshots into the final artifact
//!
//! Stages 1–3 and 6 are pure with respect to the backend; only [`surface`]
//! and [`capture`] touch the embedder-provided collaborators.

pub mod assemble;
pub mod capture;
pub mod preprocess;
pub mod resolve;
pub mod segment;
pub mod source;
pub mod surface;
