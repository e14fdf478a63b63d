//! Arc layout solver.
//!
//! Places every visible memory on an arc around the viewer.  Each era gets
//! its own ring: the ring's radius is the era's depth, with older eras
//! strictly farther away.  Within a ring the era's items are fanned out
//! symmetrically about straight ahead, `STEP` degrees apart:
//!
//! ```text
//! angle(i) = start + i * STEP,   start = -(N - 1) * STEP / 2
//! ```
//!
//! so a ring of one item sits at exactly 0° and adjacent panels are always one
//! `STEP` apart.  At radius `r` that step is a chord of `2 r sin(STEP / 2)`;
//! [`ArcConfig::validate`] checks that this chord, taken on the nearest ring,
//! is wider than a panel.
//!
//! The solver is pure: same items in the same order, bit-identical output.

use std::collections::BTreeMap;
use std::f32::consts::PI;

use memlane_types::{Era, MemlaneError, MemoryItem};
use tracing::{debug, trace};

use crate::geometry::{ArcPose, Vec3, Yaw, chord_length};

/// Angular separation between adjacent panels of the same era.
pub const ARC_STEP_DEG: f32 = 14.0;

/// Rendered panel width in scene units.
pub const PANEL_WIDTH: f32 = 1.0;

/// Peak height of the cosmetic vertical arch.
pub const VERTICAL_AMPLITUDE: f32 = 0.15;

/// Design target for the share of a panel that may be covered by its
/// neighbour.  The default configuration stays at zero overlap.
pub const OVERLAP_TOLERANCE: f32 = 0.2;

// ────────────────────────────────────────────────────────────────────────────
// EraDepth
// ────────────────────────────────────────────────────────────────────────────

/// Mapping from [`Era`] to ring depth (negative `z`, in scene units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraDepth {
    depths: [f32; 4],
}

impl EraDepth {
    /// Build a depth mapping.
    ///
    /// # Errors
    ///
    /// [`MemlaneError::InvalidLayout`] when a depth is not a finite negative
    /// number, or when an older era is not strictly farther than every more
    /// recent one.
    pub fn new(
        childhood: f32,
        young_adult: f32,
        family: f32,
        recent: f32,
    ) -> Result<Self, MemlaneError> {
        let depths = [childhood, young_adult, family, recent];
        if depths.iter().any(|d| !d.is_finite() || *d >= 0.0) {
            return Err(MemlaneError::InvalidLayout(format!(
                "era depths must be finite and negative, got {depths:?}"
            )));
        }
        if !depths.windows(2).all(|w| w[0] < w[1]) {
            return Err(MemlaneError::InvalidLayout(format!(
                "older eras must be strictly farther than recent ones, got {depths:?}"
            )));
        }
        Ok(Self { depths })
    }

    /// Depth of `era`'s ring.
    pub fn depth(&self, era: Era) -> f32 {
        self.depths[era.index()]
    }

    /// Radius of the ring closest to the viewer (the `recent` era).
    pub fn nearest_radius(&self) -> f32 {
        self.depths[Era::Recent.index()].abs()
    }
}

impl Default for EraDepth {
    fn default() -> Self {
        Self {
            depths: [-9.0, -7.5, -6.0, -4.5],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ArcConfig
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for the arc layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcConfig {
    pub step_deg: f32,
    pub panel_width: f32,
    pub vertical_amplitude: f32,
    pub era_depth: EraDepth,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            step_deg: ARC_STEP_DEG,
            panel_width: PANEL_WIDTH,
            vertical_amplitude: VERTICAL_AMPLITUDE,
            era_depth: EraDepth::default(),
        }
    }
}

impl ArcConfig {
    /// Distance between two adjacent panel centres on the nearest ring.
    pub fn adjacent_chord(&self) -> f32 {
        chord_length(self.era_depth.nearest_radius(), self.step_deg)
    }

    /// Fraction of a panel's width covered by its neighbour on the nearest
    /// ring (0.0 when they do not touch).
    pub fn overlap_ratio(&self) -> f32 {
        ((self.panel_width - self.adjacent_chord()) / self.panel_width).max(0.0)
    }

    /// Check the placement invariant: on the nearest ring, adjacent panels
    /// are farther apart than one panel width.
    pub fn validate(&self) -> Result<(), MemlaneError> {
        if !self.step_deg.is_finite() || self.step_deg <= 0.0 || self.step_deg >= 180.0 {
            return Err(MemlaneError::InvalidLayout(format!(
                "arc step must be in (0, 180) degrees, got {}",
                self.step_deg
            )));
        }
        if !self.panel_width.is_finite() || self.panel_width <= 0.0 {
            return Err(MemlaneError::InvalidLayout(format!(
                "panel width must be positive, got {}",
                self.panel_width
            )));
        }
        let chord = self.adjacent_chord();
        if chord <= self.panel_width {
            return Err(MemlaneError::InvalidLayout(format!(
                "adjacent panels overlap: chord {chord:.3} at radius {:.2} does not exceed panel width {:.3} ({:.0}% overlap)",
                self.era_depth.nearest_radius(),
                self.panel_width,
                self.overlap_ratio() * 100.0
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutPosition
// ────────────────────────────────────────────────────────────────────────────

/// Placement of one panel.
///
/// `offset` is expressed in the panel's arc frame (lateral, vertical, depth):
/// lateral is zero, vertical is the cosmetic arch and depth is the era ring.
/// `angle_deg` swings that frame about the viewer's vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPosition {
    pub offset: Vec3,
    pub angle_deg: f32,
}

impl LayoutPosition {
    /// Yaw rotation about the viewer.
    pub fn yaw(&self) -> Yaw {
        Yaw::from_degrees(self.angle_deg)
    }

    /// The panel's pose; it faces the viewer.
    pub fn pose(&self) -> ArcPose {
        ArcPose::new(self.yaw(), self.offset)
    }

    /// Panel centre in world space.
    pub fn world_position(&self) -> Vec3 {
        self.pose().world()
    }
}

/// Item id to position.  Ordered so iteration is deterministic.
pub type Layout = BTreeMap<String, LayoutPosition>;

// ────────────────────────────────────────────────────────────────────────────
// LayoutSolver
// ────────────────────────────────────────────────────────────────────────────

/// Validated arc layout solver.
///
/// # Example
///
/// ```rust
/// use memlane_layout::solver::LayoutSolver;
/// use memlane_types::{Era, MemoryItem};
///
/// let item = MemoryItem {
///     id: "p-1".into(),
///     image_url: None,
///     caption: "First day of school".into(),
///     date_label: "1958".into(),
///     era: Era::Childhood,
/// };
///
/// let layout = LayoutSolver::default().solve(&[item]);
/// assert_eq!(layout["p-1"].angle_deg, 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutSolver {
    config: ArcConfig,
}

impl LayoutSolver {
    /// Create a solver after checking `config` against the placement
    /// invariant.
    pub fn new(config: ArcConfig) -> Result<Self, MemlaneError> {
        config.validate()?;
        debug!(
            step_deg = config.step_deg,
            chord = config.adjacent_chord(),
            overlap = config.overlap_ratio(),
            "layout solver configured"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &ArcConfig {
        &self.config
    }

    /// Compute positions for `items` (era-ordered, one page).
    pub fn solve(&self, items: &[MemoryItem]) -> Layout {
        solve_with(items, &self.config)
    }
}

/// Solve with the default step and arch, using the supplied era depths.
pub fn solve(items: &[MemoryItem], era_depth: &EraDepth) -> Layout {
    let config = ArcConfig {
        era_depth: *era_depth,
        ..ArcConfig::default()
    };
    solve_with(items, &config)
}

fn solve_with(items: &[MemoryItem], config: &ArcConfig) -> Layout {
    let mut groups: [Vec<&MemoryItem>; 4] = Default::default();
    for item in items {
        groups[item.era.index()].push(item);
    }

    let mut layout = Layout::new();
    for era in Era::ALL {
        let group = &groups[era.index()];
        if group.is_empty() {
            continue;
        }
        let n = group.len() as f32;
        let centre = (n - 1.0) / 2.0;
        let depth = config.era_depth.depth(era);

        for (i, item) in group.iter().enumerate() {
            let i = i as f32;
            // (i - centre) * STEP == start + i * STEP, and is exactly mirrored
            // about zero because `centre` is a multiple of one half.
            let angle_deg = (i - centre) * config.step_deg;
            let vertical = config.vertical_amplitude * (PI * (i + 0.5) / n).sin();
            let position = LayoutPosition {
                offset: Vec3::new(0.0, vertical, depth),
                angle_deg,
            };
            if layout.insert(item.id.clone(), position).is_some() {
                debug!(id = %item.id, "duplicate item id in layout pass; keeping the later one");
            }
        }
        trace!(%era, count = group.len(), depth, "era ring solved");
    }
    layout
}
