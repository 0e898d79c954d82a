use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Fit `(width, height)` under the `max_width` x `max_height` box.
    ///
    /// A landscape image wider than the box is bound by width; anything else
    /// taller than the box is bound by height. One scale factor is applied to
    /// both sides, rounded to the nearest pixel. Images already inside the box
    /// are returned unchanged.
    pub fn calculate_dimensions(
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    ) -> (u32, u32) {
        let scale = if width > height && width > max_width {
            max_width as f64 / width as f64
        } else if height > max_height {
            max_height as f64 / height as f64
        } else {
            return (width, height);
        };

        (scale_side(width, scale), scale_side(height, scale))
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions in a single pass
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, width, height);

        tracing::debug!(
            from_width = orig_width,
            from_height = orig_height,
            to_width = width,
            to_height = height,
            filter = ?filter,
            "Resizing image"
        );

        img.resize_exact(width, height, filter)
    }
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_landscape_bound_by_width() {
        assert_eq!(
            ImageResize::calculate_dimensions(3000, 2000, 1920, 1440),
            (1920, 1280)
        );
    }

    #[test]
    fn test_portrait_bound_by_height() {
        assert_eq!(
            ImageResize::calculate_dimensions(2000, 3000, 1920, 1440),
            (960, 1440)
        );
    }

    #[test]
    fn test_square_bound_by_height() {
        assert_eq!(
            ImageResize::calculate_dimensions(2000, 2000, 1920, 1440),
            (1440, 1440)
        );
    }

    #[test]
    fn test_landscape_within_width_but_too_tall() {
        // Wider than tall, narrower than the box, taller than the box
        assert_eq!(
            ImageResize::calculate_dimensions(1800, 1600, 1920, 1440),
            (1620, 1440)
        );
    }

    #[test]
    fn test_no_upscaling() {
        assert_eq!(
            ImageResize::calculate_dimensions(800, 600, 1920, 1440),
            (800, 600)
        );
        assert_eq!(
            ImageResize::calculate_dimensions(1920, 1440, 1920, 1440),
            (1920, 1440)
        );
        assert_eq!(ImageResize::calculate_dimensions(1, 1, 1920, 1440), (1, 1));
    }

    #[test]
    fn test_extreme_aspect_ratio_keeps_one_pixel() {
        assert_eq!(
            ImageResize::calculate_dimensions(10000, 2, 1000, 1000),
            (1000, 1)
        );
        assert_eq!(
            ImageResize::calculate_dimensions(3, 9000, 1000, 1000),
            (1, 1000)
        );
    }

    #[test]
    fn test_binding_axis_is_exact_and_ratio_preserved() {
        let bounds = [(1920, 1440), (1024, 768), (500, 500), (300, 900)];
        let sources = [
            (3000, 2000),
            (4032, 3024),
            (2000, 3000),
            (1081, 1079),
            (5000, 1200),
            (640, 4000),
        ];

        for &(max_w, max_h) in &bounds {
            for &(w, h) in &sources {
                let (nw, nh) = ImageResize::calculate_dimensions(w, h, max_w, max_h);

                if w > h && w > max_w {
                    assert_eq!(nw, max_w, "{}x{} in {}x{}", w, h, max_w, max_h);
                } else if h > max_h {
                    assert_eq!(nh, max_h, "{}x{} in {}x{}", w, h, max_w, max_h);
                } else {
                    assert_eq!((nw, nh), (w, h));
                    continue;
                }

                // Rounding moves the derived side by at most one pixel
                let expected_h = nw as f64 * h as f64 / w as f64;
                let expected_w = nh as f64 * w as f64 / h as f64;
                assert!(
                    (nh as f64 - expected_h).abs() <= 1.0 || (nw as f64 - expected_w).abs() <= 1.0,
                    "{}x{} -> {}x{}",
                    w,
                    h,
                    nw,
                    nh
                );
                assert!(nw <= w && nh <= h);
            }
        }
    }

    #[test]
    fn test_select_filter() {
        assert_eq!(
            ImageResize::select_filter(3000, 2000, 1000, 666),
            FilterType::Triangle
        );
        assert_eq!(
            ImageResize::select_filter(3000, 2000, 1920, 1280),
            FilterType::CatmullRom
        );
        assert_eq!(
            ImageResize::select_filter(1000, 1000, 900, 900),
            FilterType::Lanczos3
        );
    }

    #[test]
    fn test_resize_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255])));
        let resized = ImageResize::resize_image(&img, 20, 10);
        assert_eq!(resized.dimensions(), (20, 10));
    }
}
