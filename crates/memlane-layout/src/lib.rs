//! `memlane-layout` – Spatial placement.
//!
//! Pure, I/O-free computation of where memories go: which order they appear
//! in, which page they are on, and where each visible panel sits in the 3-D
//! scene.
//!
//! # Modules
//!
//! - [`era_order`] – [`build_era_ordered`][era_order::build_era_ordered]:
//!   classifies raw feed records and concatenates them era by era, dropping
//!   records whose era is unrecognized.
//! - [`pagination`] – [`Paginator`][pagination::Paginator]: fixed-size pages
//!   over the ordered collection with silent clamping.
//! - [`solver`] – [`LayoutSolver`][solver::LayoutSolver]: deterministic arc
//!   layout, one ring per era, validated against panel overlap.
//! - [`geometry`] – [`Vec3`][geometry::Vec3], [`Yaw`][geometry::Yaw] and
//!   [`ArcPose`][geometry::ArcPose] used to turn arc placements into world
//!   coordinates.

pub mod era_order;
pub mod geometry;
pub mod pagination;
pub mod solver;

pub use era_order::build_era_ordered;
pub use geometry::{ArcPose, Vec3, Yaw};
pub use pagination::{IMMERSIVE_PAGE_SIZE, Paginator, paginate};
pub use solver::{ArcConfig, EraDepth, Layout, LayoutPosition, LayoutSolver};
