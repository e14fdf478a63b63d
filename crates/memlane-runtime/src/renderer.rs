//! Scene rendering strategies and the view model the host draws.
//!
//! The composer hands a [`SceneRenderer`] the visible page (items, solved
//! positions, interaction states) and gets back a [`SceneFrame`].  The
//! renderer is picked once from the session's [`RenderMode`] and never
//! swapped:
//!
//! - [`ImmersiveRenderer`] places tiles at their solved world position.
//! - [`FlatRenderer`] lays tiles out in a grid in page order.

use memlane_kernel::RenderMode;
use memlane_layout::LayoutPosition;
use memlane_types::{Era, InteractionState, MemoryItem};

/// Display length limit for captions, in characters.
pub const CAPTION_DISPLAY_CHARS: usize = 200;

/// Default column count of the flat grid.
pub const DEFAULT_GRID_COLUMNS: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// View model
// ─────────────────────────────────────────────────────────────────────────────

/// What the host draws right now.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneView {
    /// The feed has not answered yet.
    Loading,
    /// The feed failed; the host should offer a retry action.
    Error { message: String, can_retry: bool },
    /// The feed answered with no displayable memories.
    Empty,
    Scene(SceneFrame),
}

impl SceneView {
    pub fn frame(&self) -> Option<&SceneFrame> {
        match self {
            SceneView::Scene(frame) => Some(frame),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub mode: RenderMode,
    pub paginator: PaginatorView,
    pub tiles: Vec<Tile>,
}

impl SceneFrame {
    pub fn tile(&self, id: &str) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }
}

/// Paginator controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorView {
    pub page_index: usize,
    pub page_count: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub total_items: usize,
}

impl PaginatorView {
    /// One-based label, e.g. `"Page 2 of 3"`.
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page_index + 1, self.page_count.max(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    Url(String),
    /// No image reference: draw a broken-image frame with the caption.
    BrokenPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// World-space panel centre and yaw (immersive).
    Spatial { x: f32, y: f32, z: f32, yaw_deg: f32 },
    /// Grid cell (flat).
    Grid { row: usize, column: usize },
}

/// One visible memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: String,
    /// Caption shortened for display.
    pub caption: String,
    pub date_label: String,
    pub era: Era,
    pub era_label: &'static str,
    pub image: TileImage,
    pub placement: Placement,
    pub state: InteractionState,
    pub dwell_progress: f32,
}

/// Input to a render pass: one visible item with its solved position and
/// live interaction state.
#[derive(Debug, Clone, Copy)]
pub struct VisibleItem<'a> {
    pub item: &'a MemoryItem,
    pub position: LayoutPosition,
    pub state: InteractionState,
    pub dwell_progress: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// SceneRenderer
// ─────────────────────────────────────────────────────────────────────────────

/// A presentation strategy.
pub trait SceneRenderer: Send + Sync {
    fn mode(&self) -> RenderMode;

    /// Where the `slot`-th visible item goes.
    fn place(&self, slot: usize, position: &LayoutPosition) -> Placement;

    /// Build a frame for the visible page, in page order.
    fn render(&self, paginator: PaginatorView, visible: &[VisibleItem<'_>]) -> SceneFrame {
        let tiles = visible
            .iter()
            .enumerate()
            .map(|(slot, v)| Tile {
                id: v.item.id.clone(),
                caption: summarize_caption(&v.item.caption, CAPTION_DISPLAY_CHARS),
                date_label: v.item.date_label.clone(),
                era: v.item.era,
                era_label: v.item.era.label(),
                image: match &v.item.image_url {
                    Some(url) => TileImage::Url(url.clone()),
                    None => TileImage::BrokenPlaceholder,
                },
                placement: self.place(slot, &v.position),
                state: v.state,
                dwell_progress: v.dwell_progress,
            })
            .collect();
        SceneFrame {
            mode: self.mode(),
            paginator,
            tiles,
        }
    }
}

/// Tiles at their solved 3-D position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmersiveRenderer;

impl SceneRenderer for ImmersiveRenderer {
    fn mode(&self) -> RenderMode {
        RenderMode::Immersive
    }

    fn place(&self, _slot: usize, position: &LayoutPosition) -> Placement {
        let world = position.world_position();
        Placement::Spatial {
            x: world.x,
            y: world.y,
            z: world.z,
            yaw_deg: position.angle_deg,
        }
    }
}

/// Tiles in a fixed-width grid.
#[derive(Debug, Clone, Copy)]
pub struct FlatRenderer {
    columns: usize,
}

impl FlatRenderer {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: columns.max(1),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl Default for FlatRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS)
    }
}

impl SceneRenderer for FlatRenderer {
    fn mode(&self) -> RenderMode {
        RenderMode::Flat
    }

    fn place(&self, slot: usize, _position: &LayoutPosition) -> Placement {
        Placement::Grid {
            row: slot / self.columns,
            column: slot % self.columns,
        }
    }
}

/// The renderer for `mode`.
pub fn renderer_for(mode: RenderMode, grid_columns: usize) -> Box<dyn SceneRenderer> {
    match mode {
        RenderMode::Immersive => Box::new(ImmersiveRenderer),
        RenderMode::Flat => Box::new(FlatRenderer::new(grid_columns)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Captions
// ─────────────────────────────────────────────────────────────────────────────

/// Collapse whitespace and shorten `caption` to at most `max_chars`
/// characters, cutting at a word boundary and appending `...`.
///
/// If not even the first word fits, only `...` is returned.
pub fn summarize_caption(caption: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";
    let words: Vec<&str> = caption.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let budget = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out = String::new();
    let mut used = 0;
    for word in words {
        let len = word.chars().count();
        let needed = if out.is_empty() { len } else { len + 1 };
        if used + needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use memlane_layout::Vec3;

    fn item(id: &str, image: Option<&str>, caption: &str) -> MemoryItem {
        MemoryItem {
            id: id.to_string(),
            image_url: image.map(str::to_string),
            caption: caption.to_string(),
            date_label: "1990".to_string(),
            era: Era::Recent,
        }
    }

    fn pager() -> PaginatorView {
        PaginatorView {
            page_index: 0,
            page_count: 1,
            has_previous: false,
            has_next: false,
            total_items: 5,
        }
    }

    fn position(angle_deg: f32) -> LayoutPosition {
        LayoutPosition {
            offset: Vec3::new(0.0, 0.1, -4.5),
            angle_deg,
        }
    }

    #[test]
    fn short_caption_is_untouched() {
        assert_eq!(summarize_caption("Beach  day\n1975", 200), "Beach day 1975");
    }

    #[test]
    fn long_caption_is_cut_at_word_boundary() {
        let caption = "word ".repeat(100);
        let short = summarize_caption(&caption, 200);
        assert!(short.chars().count() <= 200);
        assert!(short.ends_with("word..."));
        assert!(!short.contains("wor..."));
    }

    #[test]
    fn unbreakable_caption_collapses_to_ellipsis() {
        assert_eq!(summarize_caption(&"x".repeat(50), 10), "...");
    }

    #[test]
    fn immersive_places_at_world_position() {
        let items = [item("a", Some("u"), "c")];
        let visible = [VisibleItem {
            item: &items[0],
            position: position(90.0),
            state: InteractionState::Idle,
            dwell_progress: 0.0,
        }];
        let frame = ImmersiveRenderer.render(pager(), &visible);
        match frame.tiles[0].placement {
            Placement::Spatial { x, z, yaw_deg, .. } => {
                assert!((x + 4.5).abs() < 1e-4, "x = {x}");
                assert!(z.abs() < 1e-4, "z = {z}");
                assert_eq!(yaw_deg, 90.0);
            }
            ref other => panic!("unexpected placement {other:?}"),
        }
        assert_eq!(frame.mode, RenderMode::Immersive);
    }

    #[test]
    fn flat_lays_out_a_grid_in_page_order() {
        let items: Vec<MemoryItem> = (0..6).map(|i| item(&format!("m{i}"), None, "")).collect();
        let visible: Vec<VisibleItem<'_>> = items
            .iter()
            .map(|it| VisibleItem {
                item: it,
                position: position(0.0),
                state: InteractionState::Idle,
                dwell_progress: 0.0,
            })
            .collect();
        let frame = FlatRenderer::default().render(pager(), &visible);
        assert_eq!(frame.tiles[3].placement, Placement::Grid { row: 0, column: 3 });
        assert_eq!(frame.tiles[5].placement, Placement::Grid { row: 1, column: 1 });
        assert_eq!(frame.mode, RenderMode::Flat);
    }

    #[test]
    fn missing_image_gets_placeholder() {
        let items = [item("a", None, "Lost photo")];
        let visible = [VisibleItem {
            item: &items[0],
            position: position(0.0),
            state: InteractionState::Expanded,
            dwell_progress: 1.0,
        }];
        let frame = FlatRenderer::new(0).render(pager(), &visible);
        let tile = frame.tile("a").unwrap();
        assert_eq!(tile.image, TileImage::BrokenPlaceholder);
        assert_eq!(tile.caption, "Lost photo");
        assert_eq!(tile.era_label, "Recent Memories");
        assert_eq!(tile.state, InteractionState::Expanded);
    }

    #[test]
    fn paginator_label_is_one_based() {
        let mut view = pager();
        view.page_index = 1;
        view.page_count = 3;
        assert_eq!(view.label(), "Page 2 of 3");
    }

    #[test]
    fn renderer_for_matches_mode() {
        assert_eq!(renderer_for(RenderMode::Flat, 4).mode(), RenderMode::Flat);
        assert_eq!(renderer_for(RenderMode::Immersive, 4).mode(), RenderMode::Immersive);
    }
}
