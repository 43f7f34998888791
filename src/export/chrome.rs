//! Rasterization of the header and footer bands.
//!
//! Each band is drawn once per export and the same raster is stamped on
//! every page. Text lines stay as PDF text on top of the raster.

use crate::raster::fit_within;
use crate::render::Chrome;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::sync::Arc;

pub const CHROME_DPI: f32 = 150.0;

const NAVY: Rgb<u8> = Rgb([0x1e, 0x2b, 0x58]);
const RULE_GRAY: Rgb<u8> = Rgb([0xb4, 0xb4, 0xb4]);
const RULE_THICKNESS_MM: f32 = 0.6;
const LOGO_PADDING_MM: f32 = 2.0;
/// Share of the band width a single logo may take.
const LOGO_MAX_WIDTH_SHARE: f32 = 0.22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Header,
    Footer,
}

/// A rasterized band ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct ChromeRaster {
    pub band: Band,
    pub image: Arc<RgbImage>,
    pub width_mm: f32,
    pub height_mm: f32,
    pub lines: Vec<String>,
    /// Horizontal span, in mm from the band's left edge, left free by the
    /// logos. Text lines are centred within it.
    pub text_span: (f32, f32),
}

fn mm_to_px(mm: f32) -> u32 {
    (mm / 25.4 * CHROME_DPI).round().max(1.0) as u32
}

/// Fit and overlay a logo against one side of the band. Returns the band
/// width it covers, padding included.
fn place_logo(canvas: &mut RgbImage, logo: &RgbImage, box_w_mm: f32, box_h_mm: f32, left: bool) -> f32 {
    let (w_mm, h_mm) = fit_within(logo.width() as f32, logo.height() as f32, box_w_mm, box_h_mm);
    let (w_px, h_px) = (mm_to_px(w_mm), mm_to_px(h_mm));
    let scaled = imageops::resize(logo, w_px, h_px, FilterType::Lanczos3);

    let pad = mm_to_px(LOGO_PADDING_MM) as i64;
    let x = if left {
        pad
    } else {
        canvas.width() as i64 - pad - w_px as i64
    };
    let y = (canvas.height() as i64 - h_px as i64) / 2;
    imageops::overlay(canvas, &scaled, x, y);
    w_mm + 2.0 * LOGO_PADDING_MM
}

fn draw_rule(canvas: &mut RgbImage, at_top: bool, color: Rgb<u8>) {
    let thickness = mm_to_px(RULE_THICKNESS_MM).min(canvas.height());
    let rows = if at_top {
        0..thickness
    } else {
        canvas.height() - thickness..canvas.height()
    };
    for y in rows {
        for x in 0..canvas.width() {
            canvas.put_pixel(x, y, color);
        }
    }
}

pub fn rasterize(chrome: &Chrome, band: Band, width_mm: f32, height_mm: f32) -> ChromeRaster {
    let mut canvas = RgbImage::from_pixel(mm_to_px(width_mm), mm_to_px(height_mm), Rgb([255, 255, 255]));

    let box_w = width_mm * LOGO_MAX_WIDTH_SHARE;
    let box_h = height_mm - 2.0 * LOGO_PADDING_MM;
    let left_used = match &chrome.left_logo {
        Some(logo) => place_logo(&mut canvas, logo, box_w, box_h, true),
        None => 0.0,
    };
    let right_used = match &chrome.right_logo {
        Some(logo) => place_logo(&mut canvas, logo, box_w, box_h, false),
        None => 0.0,
    };

    match band {
        Band::Header => draw_rule(&mut canvas, false, NAVY),
        Band::Footer => draw_rule(&mut canvas, true, RULE_GRAY),
    }

    ChromeRaster {
        band,
        image: Arc::new(canvas),
        width_mm,
        height_mm,
        lines: chrome.lines.clone(),
        text_span: (left_used, width_mm - right_used),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_logo() -> RgbImage {
        RgbImage::from_pixel(600, 100, Rgb([0, 90, 0]))
    }

    fn chrome(logo: Option<RgbImage>) -> Chrome {
        Chrome {
            lines: vec!["ESTADO DO PARANÁ".to_string()],
            left_logo: logo.map(Arc::new),
            right_logo: None,
        }
    }

    #[test]
    fn band_matches_requested_size() {
        let raster = rasterize(&chrome(None), Band::Header, 180.0, 28.0);
        assert_eq!(raster.image.width(), mm_to_px(180.0));
        assert_eq!(raster.image.height(), mm_to_px(28.0));
        assert_eq!(raster.lines, vec!["ESTADO DO PARANÁ".to_string()]);
    }

    #[test]
    fn header_rule_sits_at_bottom() {
        let raster = rasterize(&chrome(None), Band::Header, 100.0, 20.0);
        let (w, h) = raster.image.dimensions();
        assert_eq!(*raster.image.get_pixel(w / 2, h - 1), NAVY);
        assert_eq!(*raster.image.get_pixel(w / 2, 0), Rgb([255, 255, 255]));

        let footer = rasterize(&chrome(None), Band::Footer, 100.0, 20.0);
        assert_eq!(*footer.image.get_pixel(w / 2, 0), RULE_GRAY);
    }

    #[test]
    fn logo_is_drawn_on_the_left() {
        let logo = RgbImage::from_pixel(40, 40, Rgb([200, 0, 0]));
        let raster = rasterize(&chrome(Some(logo)), Band::Footer, 180.0, 16.0);
        let (w, h) = raster.image.dimensions();
        let mid = h / 2;
        let pad = mm_to_px(LOGO_PADDING_MM);
        assert_eq!(raster.image.get_pixel(pad + 5, mid)[1], 0);
        assert_eq!(*raster.image.get_pixel(w - pad - 5, mid), Rgb([255, 255, 255]));
    }

    #[test]
    fn text_span_excludes_logo_boxes() {
        let plain = rasterize(&chrome(None), Band::Footer, 180.0, 16.0);
        assert_eq!(plain.text_span, (0.0, 180.0));

        let footer = Chrome {
            lines: vec!["ESTADO DO PARANÁ".to_string()],
            left_logo: None,
            right_logo: Some(Arc::new(wide_logo())),
        };
        let raster = rasterize(&footer, Band::Footer, 180.0, 16.0);
        let (start, end) = raster.text_span;
        assert_eq!(start, 0.0);
        assert!(end < 180.0 - 30.0, "span ends at {}", end);

        // Nothing of the logo lies inside the span.
        let last_free_px = mm_to_px(end) - 2;
        let mid = raster.image.height() / 2;
        assert_eq!(*raster.image.get_pixel(last_free_px, mid), Rgb([255, 255, 255]));
        assert_eq!(raster.image.get_pixel(mm_to_px(end) + mm_to_px(LOGO_PADDING_MM) + 3, mid)[1], 90);
    }
}
