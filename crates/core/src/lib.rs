//! # Polynest Core
//!
//! Dimension-agnostic building blocks of the polynest irregular nesting engine.
//!
//! This crate holds the pieces that do not depend on polygon clipping: the
//! error type, the run configuration, the genetic algorithm that searches
//! part orderings and rotations, the placement result and its fitness, the
//! rigid transform used to place parts, and robust orientation predicates.
//!
//! ## Core Components
//!
//! - **Configuration**: [`Config`] with `with_*` builders and lenient [`Config::merge`]
//! - **GA framework**: [`GeneticAlgorithm`], [`Individual`], [`Evaluation`]
//! - **Results**: [`PlacementResult`], [`PartPlacement`], [`Fitness`]
//! - **Transform types**: [`Transform2D`], [`Bounds`]
//!
//! ## Configuration
//!
//! ```rust
//! use polynest_core::Config;
//!
//! let config = Config::new()
//!     .with_spacing(2.0)
//!     .with_rotations(8)
//!     .with_population_size(20)
//!     .with_seed(7);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.rotation_angles().len(), 8);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod ga;
pub mod geometry;
pub mod result;
pub mod robust;
pub mod transform;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ga::{Evaluation, GeneticAlgorithm, Individual};
pub use geometry::{almost_equal, Point, PolygonId, CONTAINER_ID};
pub use result::{Fitness, PartPlacement, PlacementResult, SheetPlacement};
pub use transform::{Bounds, Transform2D};
