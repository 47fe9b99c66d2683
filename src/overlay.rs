//! Mapping landmarks onto the camera preview.
//!
//! The preview fills the view and crops the overflow (center-crop), so
//! normalized landmark coordinates must be scaled by the larger of the two
//! view/source ratios and offset by half the overflow. Front cameras show a
//! mirrored preview while landmarks are reported in sensor space, so x is
//! flipped for them.

use crate::landmark::{Hand, Handedness, Landmark, HAND_SKELETON};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayMapper {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    rendered_w: f32,
    rendered_h: f32,
    view_w: f32,
    mirror_x: bool,
}

impl OverlayMapper {
    pub fn new(image_w: u32, image_h: u32, view_w: f32, view_h: f32, mirror_x: bool) -> Self {
        let src_w = (image_w as f32).max(1.0);
        let src_h = (image_h as f32).max(1.0);
        let scale = (view_w / src_w).max(view_h / src_h);
        let rendered_w = src_w * scale;
        let rendered_h = src_h * scale;
        Self {
            scale,
            offset_x: (view_w - rendered_w) / 2.0,
            offset_y: (view_h - rendered_h) / 2.0,
            rendered_w,
            rendered_h,
            view_w,
            mirror_x,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// View-space position of a normalized landmark.
    pub fn map(&self, p: Landmark) -> (f32, f32) {
        let x = self.offset_x + p.x * self.rendered_w;
        let x = if self.mirror_x { self.view_w - x } else { x };
        (x, self.offset_y + p.y * self.rendered_h)
    }

    pub fn map_hand(&self, hand: &Hand) -> Vec<(f32, f32)> {
        hand.landmarks().iter().map(|p| self.map(*p)).collect()
    }

    /// Line segments for the hand skeleton in view space.
    pub fn skeleton(&self, hand: &Hand) -> Vec<((f32, f32), (f32, f32))> {
        let points = hand.landmarks();
        HAND_SKELETON
            .iter()
            .filter_map(|&(a, b)| Some((self.map(*points.get(a)?), self.map(*points.get(b)?))))
            .collect()
    }
}

/// Short tag drawn next to the wrist.
pub fn handedness_tag(handedness: Handedness) -> &'static str {
    match handedness {
        Handedness::Left => "Left",
        Handedness::Right => "Right",
        Handedness::Unknown => "Hand",
    }
}
