//! Label placement next to a detected face.
//!
//! The label is anchored just above the face box, flips below it when it
//! would leave the top of the frame, is kept within the face box
//! horizontally, and is never allowed to start above the face's top edge.
//! A final pass pulls the background box back inside the frame so nothing
//! is drawn off-canvas.

use crate::types::BoundingBox;

/// Gap between the text and its background box, and between the box and the face.
pub const LABEL_PADDING: i32 = 5;

/// Where to draw a label: text baseline origin plus background box corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    /// Bottom-left of the text (baseline origin).
    pub origin: (i32, i32),
    pub top_left: (i32, i32),
    pub bottom_right: (i32, i32),
}

impl LabelPlacement {
    fn around(origin: (i32, i32), text_size: (i32, i32)) -> Self {
        let (tx, ty) = origin;
        let (tw, th) = text_size;
        Self {
            origin,
            top_left: (tx - LABEL_PADDING, ty - th - LABEL_PADDING),
            bottom_right: (tx + tw + LABEL_PADDING, ty + LABEL_PADDING),
        }
    }

    pub fn box_width(&self) -> i32 {
        self.bottom_right.0 - self.top_left.0
    }

    pub fn box_height(&self) -> i32 {
        self.bottom_right.1 - self.top_left.1
    }
}

/// Place a label of `text_size` (width, height) for `face` inside a frame
/// of `frame_size` (width, height).
pub fn place_label(face: &BoundingBox, text_size: (u32, u32), frame_size: (u32, u32)) -> LabelPlacement {
    let tw = text_size.0 as i32;
    let th = text_size.1 as i32;
    let (x, y, w, h) = (face.x, face.y, face.width, face.height);

    let mut tx = x + LABEL_PADDING;
    let mut ty = y - LABEL_PADDING;

    if ty - th - LABEL_PADDING < 0 {
        ty = y + h + th + LABEL_PADDING;
    }
    if tx + tw + LABEL_PADDING > x + w {
        tx = x + w - tw - LABEL_PADDING;
    }
    // Evaluated after the flip. A label left above the face is tucked
    // inside the top of the box instead.
    if ty - th - LABEL_PADDING < y {
        ty = y + th + LABEL_PADDING;
    }

    contain(LabelPlacement::around((tx, ty), (tw, th)), frame_size)
}

/// Translate the placement into the frame, then clip what still overhangs.
fn contain(mut p: LabelPlacement, frame_size: (u32, u32)) -> LabelPlacement {
    let fw = frame_size.0 as i32;
    let fh = frame_size.1 as i32;

    let dx = shift_into(p.top_left.0, p.bottom_right.0, fw);
    let dy = shift_into(p.top_left.1, p.bottom_right.1, fh);
    p.origin = (p.origin.0 + dx, p.origin.1 + dy);
    p.top_left = (p.top_left.0 + dx, p.top_left.1 + dy);
    p.bottom_right = (p.bottom_right.0 + dx, p.bottom_right.1 + dy);

    p.top_left = (p.top_left.0.clamp(0, fw), p.top_left.1.clamp(0, fh));
    p.bottom_right = (p.bottom_right.0.clamp(0, fw), p.bottom_right.1.clamp(0, fh));
    p
}

/// Offset that moves `[lo, hi]` inside `[0, limit]`, favouring the low edge
/// when the span is wider than the limit.
fn shift_into(lo: i32, hi: i32, limit: i32) -> i32 {
    if lo < 0 {
        -lo
    } else if hi > limit {
        (limit - hi).max(-lo)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: (u32, u32) = (640, 480);

    fn within(p: &LabelPlacement, (fw, fh): (u32, u32)) -> bool {
        let (fw, fh) = (fw as i32, fh as i32);
        [p.top_left, p.bottom_right]
            .iter()
            .all(|&(cx, cy)| (0..=fw).contains(&cx) && (0..=fh).contains(&cy))
    }

    #[test]
    fn test_label_above_face_is_tucked_inside_top() {
        let face = BoundingBox::new(100, 100, 200, 200);
        let p = place_label(&face, (40, 12), FRAME);
        assert_eq!(p.origin, (105, 117));
        assert_eq!(p.top_left, (100, 100));
        assert_eq!(p.bottom_right, (150, 122));
    }

    #[test]
    fn test_flips_below_near_top() {
        let face = BoundingBox::new(100, 10, 50, 50);
        let p = place_label(&face, (40, 12), FRAME);
        assert_eq!(p.origin, (105, 77));
        assert_eq!(p.top_left, (100, 60));
        assert_eq!(p.bottom_right, (150, 82));
    }

    #[test]
    fn test_shifts_left_to_face_right_edge() {
        let face = BoundingBox::new(200, 100, 60, 60);
        let p = place_label(&face, (100, 12), FRAME);
        assert_eq!(p.origin, (155, 117));
        assert_eq!(p.bottom_right.0, face.right());
    }

    #[test]
    fn test_flipped_label_never_starts_above_face() {
        let face = BoundingBox::new(50, 0, 200, 0);
        let p = place_label(&face, (20, 30), FRAME);
        assert_eq!(p.origin, (55, 35));
        assert!(p.top_left.1 >= face.y);
    }

    #[test]
    fn test_wide_label_pulled_back_into_frame() {
        let face = BoundingBox::new(10, 100, 40, 40);
        let p = place_label(&face, (120, 12), FRAME);
        assert_eq!(p.top_left.0, 0);
        assert_eq!(p.box_width(), 130);
        assert_eq!(p.origin.0, 5);
        assert!(within(&p, FRAME));
    }

    #[test]
    fn test_flip_at_bottom_of_short_frame_stays_inside() {
        let frame = (320, 100);
        let face = BoundingBox::new(100, 5, 80, 90);
        let p = place_label(&face, (40, 12), frame);
        assert!(within(&p, frame));
        assert_eq!(p.bottom_right.1, 100);
        assert_eq!(p.box_height(), 22);
    }

    #[test]
    fn test_label_larger_than_frame_is_clipped() {
        let frame = (50, 20);
        let face = BoundingBox::new(0, 0, 50, 20);
        let p = place_label(&face, (200, 40), frame);
        assert!(within(&p, frame));
    }

    #[test]
    fn test_containment_sweep() {
        let frame = (160u32, 120u32);
        for x in (0..160).step_by(13) {
            for y in (0..120).step_by(11) {
                for (w, h) in [(1, 1), (20, 20), (60, 40), (160, 120)] {
                    if x + w > 160 || y + h > 120 {
                        continue;
                    }
                    let face = BoundingBox::new(x, y, w, h);
                    for size in [(0, 0), (8, 8), (40, 12), (150, 30), (400, 200)] {
                        let p = place_label(&face, size, frame);
                        assert!(within(&p, frame), "face {face:?} size {size:?} -> {p:?}");
                    }
                }
            }
        }
    }
}
