//! # polynest 2D
//!
//! Irregular 2D nesting: parts with holes are packed into a container
//! outline, spilling onto further container instances (sheets) when one is
//! full.
//!
//! ## Pipeline
//!
//! - [`tree`]: input loops become a containment tree with breadth-first ids
//! - [`clipper`]: offset, union, difference and cleanup primitives
//! - [`nfp`]: inside and outside no-fit polygons
//! - [`nfp_cache`]: memoized NFPs filled in parallel batches
//! - [`placement`]: greedy placement of one ordered, rotated part sequence
//! - [`nester`]: the run loop driving the genetic algorithm of `polynest-core`
//!
//! ## Quick Start
//!
//! ```rust
//! use polynest_d2::{Config, Nester, NestUpdate, PartInput};
//!
//! let config = Config::new().with_rotations(4).with_spacing(1.0).with_seed(1);
//! let mut nester = Nester::new(config);
//! nester.set_container(PartInput::rectangle(0.0, 0.0, 200.0, 100.0).with_source(0));
//! nester.set_parts(vec![
//!     PartInput::rectangle(0.0, 0.0, 60.0, 30.0).with_source(1),
//!     PartInput::from_tuples(&[(100.0, 0.0), (140.0, 0.0), (120.0, 35.0)]).with_source(2),
//! ]);
//!
//! for _ in 0..5 {
//!     if let NestUpdate::Improved { placed_parts, packed_area_ratio, .. } = nester.tick().unwrap() {
//!         println!("{placed_parts} parts placed, {:.1}% packed", packed_area_ratio * 100.0);
//!     }
//! }
//! ```

pub mod clipper;
pub mod nester;
pub mod nfp;
pub mod nfp_cache;
pub mod placement;
pub mod polygon;
pub mod tree;

// Re-exports
pub use clipper::Clipper;
pub use nester::{NestUpdate, Nester, RenderedLoop, RenderedPart, RenderedSheet, RunHandle};
pub use nfp::{Nfp, NfpJob, NfpKey, NfpOptions};
pub use nfp_cache::{BatchReport, NfpCache, NfpWorkers};
pub use placement::{required_keys, Placer};
pub use tree::{PartInput, PolygonNode, PolygonTree, SourceRef};
pub use polynest_core::{
    Bounds, Config, Error, Fitness, PartPlacement, PlacementResult, Point, PolygonId, Result, SheetPlacement,
    Transform2D, CONTAINER_ID,
};
