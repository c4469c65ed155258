///! Element outlining on saved snapshots
use std::path::{Path, PathBuf};

use cdp_adapter::BoundingBox;
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::errors::CaptureError;

/// Outline drawn around the target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineStyle {
    /// Stroke width in pixels, grown inward from the element edge
    pub width: u32,
    pub color: [u8; 4],
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            width: 3,
            color: [255, 0, 0, 255],
        }
    }
}

/// Draws `style` around `region`, clipped to the image.
///
/// Returns `false` when nothing was drawn: the box is degenerate, lies fully
/// outside the image, or the stroke width is zero.
pub fn outline_region(image: &mut RgbaImage, region: &BoundingBox, style: &OutlineStyle) -> bool {
    if !region.is_drawable() || style.width == 0 {
        return false;
    }

    let (img_w, img_h) = (image.width() as f64, image.height() as f64);
    let left = region.x.floor().max(0.0);
    let top = region.y.floor().max(0.0);
    let right = (region.x + region.width).ceil().min(img_w);
    let bottom = (region.y + region.height).ceil().min(img_h);
    if right <= left || bottom <= top {
        return false;
    }

    let (left, top) = (left as i32, top as i32);
    let (width, height) = ((right as i32) - left, (bottom as i32) - top);
    let color = Rgba(style.color);

    for inset in 0..style.width as i32 {
        let w = width - 2 * inset;
        let h = height - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(left + inset, top + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
    true
}

/// Outlines `region` on the PNG at `path` and overwrites it in place.
///
/// Decoding and encoding run on the blocking pool.
pub async fn annotate_file(
    path: &Path,
    region: BoundingBox,
    style: OutlineStyle,
) -> Result<bool, CaptureError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<bool, CaptureError> {
        let mut image = image::open(&path)?.to_rgba8();
        if !outline_region(&mut image, &region, &style) {
            return Ok(false);
        }
        image.save_with_format(&path, ImageFormat::Png)?;
        Ok(true)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn outline_is_drawn_inward_at_the_requested_width() {
        let mut image = blank(40, 40);
        let drawn = outline_region(
            &mut image,
            &BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            &OutlineStyle::default(),
        );
        assert!(drawn);

        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(*image.get_pixel(10, 10), red);
        assert_eq!(*image.get_pixel(12, 15), red);
        assert_eq!(*image.get_pixel(29, 29), red);
        // Inside the stroke and outside the box stay untouched.
        assert_eq!(*image.get_pixel(13, 15), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(9, 10), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn boxes_off_the_image_are_skipped() {
        let mut image = blank(20, 20);
        let style = OutlineStyle::default();
        assert!(!outline_region(
            &mut image,
            &BoundingBox::new(50.0, 50.0, 10.0, 10.0),
            &style
        ));
        assert!(!outline_region(
            &mut image,
            &BoundingBox::new(0.0, 0.0, 0.0, 10.0),
            &style
        ));
        assert!(image.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn partially_visible_boxes_are_clipped() {
        let mut image = blank(20, 20);
        let drawn = outline_region(
            &mut image,
            &BoundingBox::new(-5.0, -5.0, 15.0, 15.0),
            &OutlineStyle {
                width: 1,
                color: [0, 0, 255, 255],
            },
        );
        assert!(drawn);
        assert_eq!(*image.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*image.get_pixel(9, 9), Rgba([0, 0, 255, 255]));
    }
}
