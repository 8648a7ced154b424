//! Topology and geometry analysis for cadview meshes.
//!
//! - [`weld_vertices`] merges the duplicated corners STL files carry
//! - [`MeshAdjacency`] answers edge questions: boundary, manifold, winding
//! - [`analyze`] produces a [`MeshAnalysis`] report with volume, area,
//!   Euler number, genus, convexity and fill ratio
//!
//! # Example
//!
//! ```
//! use cad_analysis::{AnalysisParams, analyze_with_params};
//! use cad_types::unit_cube;
//!
//! let report = analyze_with_params(&unit_cube(), &AnalysisParams::for_cad()).unwrap();
//! assert!(report.is_watertight);
//! assert_eq!(report.fill_ratio.map(f64::round), Some(100.0));
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod adjacency;
mod analysis;
mod error;
mod params;
mod weld;

pub use adjacency::MeshAdjacency;
pub use analysis::{MeshAnalysis, analyze, analyze_with_params};
pub use error::{AnalysisError, AnalysisResult};
pub use params::AnalysisParams;
pub use weld::{remove_unreferenced_vertices, weld_vertices};
