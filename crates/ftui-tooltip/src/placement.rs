#![forbid(unsafe_code)]

//! Anchor-relative placement for the tooltip overlay.
//!
//! A [`PlacementRequest`] describes where the overlay wants to go: a
//! [`Placement`] keyword, an [`Anchor`] (the trigger's bounding box or the
//! pointer), the overlay [`Size`], pixel offsets and an optional viewport.
//! A [`Positioner`] turns that into a concrete origin.
//!
//! [`AnchoredPositioner`] is the stock implementation:
//!
//! - Sides (`top`, `bottom`, `left`, `right`) are centered on the anchor's
//!   cross axis.
//! - Corners (`top-left`, ...) sit diagonally off the anchor's corner.
//! - Offsets are added after placement.
//! - With a viewport, placement flips to the opposite side when the primary
//!   side overflows and the opposite side overflows less, then the cross
//!   axis is clamped into the viewport.

use core::fmt;
use core::str::FromStr;

use crate::geometry::{Point, Rect, Size};

/// Where to place the overlay relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum Placement {
    /// Above the anchor, horizontally centered.
    #[default]
    Top,
    /// Below the anchor, horizontally centered.
    Bottom,
    /// Left of the anchor, vertically centered.
    Left,
    /// Right of the anchor, vertically centered.
    Right,
    /// Diagonally above-left of the anchor's top-left corner.
    TopLeft,
    /// Diagonally above-right of the anchor's top-right corner.
    TopRight,
    /// Diagonally below-left of the anchor's bottom-left corner.
    BottomLeft,
    /// Diagonally below-right of the anchor's bottom-right corner.
    BottomRight,
}

impl Placement {
    /// Every placement, in keyword order.
    pub const ALL: [Self; 8] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Canonical keyword, as accepted by `data-tooltip-position`.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    /// CSS class applied to the overlay while this placement is active.
    #[must_use]
    pub fn class_name(self) -> String {
        format!("tooltip-{}", self.keyword())
    }

    /// Return the opposite placement along the primary axis.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::TopLeft => Self::BottomLeft,
            Self::TopRight => Self::BottomRight,
            Self::BottomLeft => Self::TopLeft,
            Self::BottomRight => Self::TopRight,
        }
    }

    /// Whether the primary axis is vertical.
    ///
    /// Corners flip vertically, so they count as vertical.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        !matches!(self, Self::Left | Self::Right)
    }

    fn origin_for(self, anchor: Rect, size: Size) -> Point {
        let centered_x = anchor.center_x().saturating_sub(size.width / 2);
        let centered_y = anchor.center_y().saturating_sub(size.height / 2);
        let above = anchor.y.saturating_sub(size.height);
        let before = anchor.x.saturating_sub(size.width);
        match self {
            Self::Top => Point::new(centered_x, above),
            Self::Bottom => Point::new(centered_x, anchor.bottom()),
            Self::Left => Point::new(before, centered_y),
            Self::Right => Point::new(anchor.right(), centered_y),
            Self::TopLeft => Point::new(before, above),
            Self::TopRight => Point::new(anchor.right(), above),
            Self::BottomLeft => Point::new(before, anchor.bottom()),
            Self::BottomRight => Point::new(anchor.right(), anchor.bottom()),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error returned when a placement keyword is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlacementError(pub String);

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown placement keyword: {:?}", self.0)
    }
}

impl std::error::Error for ParsePlacementError {}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "top" | "above" => Ok(Self::Top),
            "bottom" | "below" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "top-left" => Ok(Self::TopLeft),
            "top-right" => Ok(Self::TopRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-right" => Ok(Self::BottomRight),
            _ => Err(ParsePlacementError(s.to_string())),
        }
    }
}

/// What the overlay is positioned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The trigger node's bounding box (fixed mode).
    Element(Rect),
    /// The current pointer coordinates (follow mode).
    Pointer(Point),
}

impl Anchor {
    /// The anchor as a rectangle; pointers become zero-sized rects.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        match *self {
            Self::Element(rect) => rect,
            Self::Pointer(point) => Rect::at_point(point),
        }
    }
}

/// Input to a [`Positioner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest {
    pub anchor: Anchor,
    pub placement: Placement,
    /// Overlay size as measured by the host.
    pub size: Size,
    /// Pixel adjustment added after placement (`x_offset`, `y_offset`).
    pub offset: Point,
    /// Visible document area. `None` disables flipping and clamping.
    pub viewport: Option<Rect>,
    pub auto_flip: bool,
}

impl PlacementRequest {
    /// Create a request with no offset and no viewport.
    #[must_use]
    pub fn new(anchor: Anchor, placement: Placement, size: Size) -> Self {
        Self {
            anchor,
            placement,
            size,
            offset: Point::default(),
            viewport: None,
            auto_flip: true,
        }
    }

    /// Set the pixel offset.
    #[must_use]
    pub fn offset(mut self, x: i32, y: i32) -> Self {
        self.offset = Point::new(x, y);
        self
    }

    /// Set the viewport used for flipping and clamping.
    #[must_use]
    pub fn viewport(mut self, viewport: Rect) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Enable or disable auto-flip.
    #[must_use]
    pub fn auto_flip(mut self, flip: bool) -> Self {
        self.auto_flip = flip;
        self
    }

    fn rect_for(&self, placement: Placement) -> Rect {
        let offset = self.offset_for(placement);
        let origin = placement
            .origin_for(self.anchor.rect(), self.size)
            .offset(offset.x, offset.y);
        Rect::with_origin(origin, self.size)
    }

    /// Offsets mirror along the primary axis when the placement was flipped,
    /// so a gap stays a gap on the opposite side.
    fn offset_for(&self, placement: Placement) -> Point {
        if placement == self.placement {
            return self.offset;
        }
        if placement.is_vertical() {
            Point::new(self.offset.x, self.offset.y.saturating_neg())
        } else {
            Point::new(self.offset.x.saturating_neg(), self.offset.y)
        }
    }
}

/// Result of a placement computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    /// Top-left corner of the overlay.
    pub origin: Point,
    /// Placement actually used (differs from the request after a flip).
    pub placement: Placement,
}

/// Computes the overlay origin for a request.
pub trait Positioner {
    fn place(&self, request: &PlacementRequest) -> Placed;
}

/// Default positioner: anchor-relative placement with auto-flip.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchoredPositioner;

impl Positioner for AnchoredPositioner {
    fn place(&self, request: &PlacementRequest) -> Placed {
        let primary = request.placement;
        let Some(viewport) = request.viewport else {
            return Placed {
                origin: request.rect_for(primary).origin(),
                placement: primary,
            };
        };

        let placement = if request.auto_flip {
            resolve_placement(request, viewport)
        } else {
            primary
        };
        let rect = request.rect_for(placement);
        let origin = if placement.is_vertical() {
            Point::new(clamp_axis(rect.x, rect.width, viewport.x, viewport.right()), rect.y)
        } else {
            Point::new(rect.x, clamp_axis(rect.y, rect.height, viewport.y, viewport.bottom()))
        };
        Placed { origin, placement }
    }
}

/// Resolve placement with flip logic.
fn resolve_placement(request: &PlacementRequest, viewport: Rect) -> Placement {
    let primary = request.placement;
    let primary_overflow = overflow(request.rect_for(primary), viewport, primary.is_vertical());
    if primary_overflow == 0 {
        return primary;
    }

    let flipped = primary.flip();
    let flipped_overflow = overflow(request.rect_for(flipped), viewport, flipped.is_vertical());
    if flipped_overflow < primary_overflow {
        flipped
    } else {
        primary
    }
}

/// Pixels of `rect` outside `viewport` along one axis.
fn overflow(rect: Rect, viewport: Rect, vertical: bool) -> i32 {
    let (start, end, vp_start, vp_end) = if vertical {
        (rect.y, rect.bottom(), viewport.y, viewport.bottom())
    } else {
        (rect.x, rect.right(), viewport.x, viewport.right())
    };
    vp_start.saturating_sub(start).max(0) + end.saturating_sub(vp_end).max(0)
}

/// Clamp a span so it doesn't overflow `[lo, hi)`; oversized spans pin to `lo`.
fn clamp_axis(start: i32, len: i32, lo: i32, hi: i32) -> i32 {
    let max_start = hi.saturating_sub(len).max(lo);
    start.clamp(lo, max_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0, 0, 800, 600)
    }

    fn place(request: PlacementRequest) -> Placed {
        AnchoredPositioner.place(&request)
    }

    #[test]
    fn top_is_centered_above() {
        let anchor = Anchor::Element(Rect::new(100, 100, 40, 20));
        let placed = place(PlacementRequest::new(anchor, Placement::Top, Size::new(60, 30)));
        assert_eq!(placed.origin, Point::new(90, 70));
        assert_eq!(placed.placement, Placement::Top);
    }

    #[test]
    fn bottom_sits_under_anchor() {
        let anchor = Anchor::Element(Rect::new(100, 100, 40, 20));
        let placed = place(PlacementRequest::new(anchor, Placement::Bottom, Size::new(60, 30)));
        assert_eq!(placed.origin, Point::new(90, 120));
    }

    #[test]
    fn left_and_right_center_vertically() {
        let anchor = Anchor::Element(Rect::new(100, 100, 40, 20));
        let size = Size::new(50, 10);
        let left = place(PlacementRequest::new(anchor, Placement::Left, size));
        assert_eq!(left.origin, Point::new(50, 105));
        let right = place(PlacementRequest::new(anchor, Placement::Right, size));
        assert_eq!(right.origin, Point::new(140, 105));
    }

    #[test]
    fn corners_are_diagonal() {
        let anchor = Anchor::Element(Rect::new(100, 100, 40, 20));
        let size = Size::new(10, 10);
        assert_eq!(
            place(PlacementRequest::new(anchor, Placement::TopLeft, size)).origin,
            Point::new(90, 90)
        );
        assert_eq!(
            place(PlacementRequest::new(anchor, Placement::BottomRight, size)).origin,
            Point::new(140, 120)
        );
    }

    #[test]
    fn offsets_are_added_after_placement() {
        let anchor = Anchor::Pointer(Point::new(200, 150));
        let placed = place(
            PlacementRequest::new(anchor, Placement::BottomRight, Size::new(80, 20)).offset(12, 16),
        );
        assert_eq!(placed.origin, Point::new(212, 166));
    }

    #[test]
    fn auto_flip_top_to_bottom() {
        // Anchor near the top edge: no room above.
        let anchor = Anchor::Element(Rect::new(100, 5, 40, 20));
        let placed = place(
            PlacementRequest::new(anchor, Placement::Top, Size::new(60, 30)).viewport(viewport()),
        );
        assert_eq!(placed.placement, Placement::Bottom);
        assert_eq!(placed.origin.y, 25);
    }

    #[test]
    fn flip_mirrors_primary_offset() {
        let anchor = Anchor::Element(Rect::new(100, 5, 40, 20));
        let placed = place(
            PlacementRequest::new(anchor, Placement::Top, Size::new(60, 30))
                .offset(0, -8)
                .viewport(viewport()),
        );
        assert_eq!(placed.placement, Placement::Bottom);
        assert_eq!(placed.origin.y, 33);
    }

    #[test]
    fn auto_flip_disabled_keeps_primary() {
        let anchor = Anchor::Element(Rect::new(100, 5, 40, 20));
        let placed = place(
            PlacementRequest::new(anchor, Placement::Top, Size::new(60, 30))
                .viewport(viewport())
                .auto_flip(false),
        );
        assert_eq!(placed.placement, Placement::Top);
    }

    #[test]
    fn cross_axis_is_clamped_into_viewport() {
        let anchor = Anchor::Element(Rect::new(780, 300, 10, 10));
        let placed = place(
            PlacementRequest::new(anchor, Placement::Bottom, Size::new(100, 20))
                .viewport(viewport()),
        );
        assert_eq!(placed.origin.x, 700);
    }

    #[test]
    fn keywords_round_trip_through_from_str() {
        for placement in Placement::ALL {
            assert_eq!(placement.keyword().parse::<Placement>(), Ok(placement));
        }
        assert_eq!("BOTTOM_LEFT".parse::<Placement>(), Ok(Placement::BottomLeft));
        assert_eq!("above".parse::<Placement>(), Ok(Placement::Top));
        assert!("middle".parse::<Placement>().is_err());
    }

    #[test]
    fn placement_flip_roundtrip() {
        for placement in Placement::ALL {
            assert_eq!(placement.flip().flip(), placement);
        }
        assert_eq!(Placement::TopRight.flip(), Placement::BottomRight);
    }

    #[test]
    fn class_name_uses_keyword() {
        assert_eq!(Placement::BottomLeft.class_name(), "tooltip-bottom-left");
    }
}
