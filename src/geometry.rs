// src/geometry.rs - Letterbox/pillarbox geometry for "fit inside, keep aspect"
use eframe::egui;

/// The sub-region of a container actually covered by a video image rendered
/// with "scale to fit, preserve aspect ratio, center". Offsets are relative
/// to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRect {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
}

impl RenderRect {
    pub const ZERO: RenderRect = RenderRect {
        offset_x: 0.0,
        offset_y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Places the rect inside a container whose top-left corner is `origin`.
    pub fn to_screen(&self, origin: egui::Pos2) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(origin.x + self.offset_x, origin.y + self.offset_y),
            egui::vec2(self.width, self.height),
        )
    }
}

/// Computes the rendered rectangle for a media image of intrinsic size
/// `media_w x media_h` fitted into a `container_w x container_h` area.
///
/// A relatively wider image fills the container width and is letterboxed
/// (bars top/bottom); otherwise it fills the height and is pillarboxed
/// (bars left/right). While the intrinsic size is still unknown the rect
/// fills the whole container. A zero-area container yields a zero rect;
/// callers treat that as a draw no-op.
///
/// Derived state; recompute on every draw, never cache across resizes.
pub fn fit_rect(media_w: f32, media_h: f32, container_w: f32, container_h: f32) -> RenderRect {
    if container_w <= 0.0 || container_h <= 0.0 {
        return RenderRect::ZERO;
    }
    if media_w <= 0.0 || media_h <= 0.0 {
        return RenderRect {
            offset_x: 0.0,
            offset_y: 0.0,
            width: container_w,
            height: container_h,
        };
    }

    let media_aspect = media_w / media_h;
    let container_aspect = container_w / container_h;

    if media_aspect > container_aspect {
        // Letterbox: width fills, bars top and bottom
        let height = container_w / media_aspect;
        RenderRect {
            offset_x: 0.0,
            offset_y: (container_h - height) / 2.0,
            width: container_w,
            height,
        }
    } else {
        // Pillarbox: height fills, bars left and right
        let width = container_h * media_aspect;
        RenderRect {
            offset_x: (container_w - width) / 2.0,
            offset_y: 0.0,
            width,
            height: container_h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_media_is_letterboxed() {
        let rect = fit_rect(1920.0, 1080.0, 800.0, 800.0);
        assert_eq!(rect.width, 800.0);
        assert_eq!(rect.height, 450.0);
        assert_eq!(rect.offset_x, 0.0);
        assert_eq!(rect.offset_y, 175.0);
    }

    #[test]
    fn tall_media_is_pillarboxed() {
        let rect = fit_rect(1080.0, 1920.0, 800.0, 800.0);
        assert_eq!(rect.height, 800.0);
        assert_eq!(rect.width, 450.0);
        assert_eq!(rect.offset_x, 175.0);
        assert_eq!(rect.offset_y, 0.0);
    }

    #[test]
    fn matching_aspect_fills_container() {
        let rect = fit_rect(1920.0, 1080.0, 640.0, 360.0);
        assert_eq!(
            rect,
            RenderRect { offset_x: 0.0, offset_y: 0.0, width: 640.0, height: 360.0 }
        );
    }

    #[test]
    fn unknown_media_size_fills_container() {
        let rect = fit_rect(0.0, 0.0, 640.0, 480.0);
        assert_eq!(rect.width, 640.0);
        assert_eq!(rect.height, 480.0);
        assert_eq!(rect.offset_x, 0.0);
        assert_eq!(rect.offset_y, 0.0);
    }

    #[test]
    fn zero_area_container_yields_empty_rect() {
        assert!(fit_rect(1920.0, 1080.0, 0.0, 480.0).is_empty());
        assert!(fit_rect(1920.0, 1080.0, 640.0, 0.0).is_empty());
        assert!(!fit_rect(1920.0, 1080.0, 640.0, 480.0).is_empty());
    }
}
