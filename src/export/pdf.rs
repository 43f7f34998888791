//! Page composition into draw operations and the printpdf writer.

use super::chrome::{rasterize, Band, ChromeRaster};
use super::layout::{
    field_lines, line_height, paginate, photo_cell_width, text_width_mm, wrap_text, PageGeometry,
    BODY_SIZE, CHROME_SIZE, HEADING_SIZE, LABEL_WIDTH, MAP_MAX_HEIGHT,
    PHOTO_GAP, PHOTO_MAX_HEIGHT, PLACEHOLDER_HEIGHT, PT_TO_MM, TITLE_SIZE,
};
use crate::error::AppError;
use crate::raster::fit_within;
use crate::render::{Block, DisplayValue, Document};
use ::image::RgbImage;
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

type Rgb8 = (u8, u8, u8);

const BLACK: Rgb8 = (0, 0, 0);
const NAVY: Rgb8 = (0x1e, 0x2b, 0x58);
const GRAY: Rgb8 = (110, 110, 110);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Header,
    Footer,
    Map,
    Photo,
}

/// A single drawing instruction. `y` values are measured from the top edge.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        text: String,
        size: f32,
        x: f32,
        baseline: f32,
        style: TextStyle,
        color: Rgb8,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: Rgb8,
    },
    Rect {
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        color: Rgb8,
    },
    Image {
        image: Arc<RgbImage>,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        role: ImageRole,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ComposedPage {
    pub ops: Vec<DrawOp>,
}

impl ComposedPage {
    pub fn images(&self, role: ImageRole) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { role: r, .. } if *r == role))
            .count()
    }
}

fn text(text: &str, size: f32, x: f32, baseline: f32, style: TextStyle, color: Rgb8) -> DrawOp {
    DrawOp::Text {
        text: text.to_string(),
        size,
        x,
        baseline,
        style,
        color,
    }
}

fn first_baseline(top: f32, size: f32) -> f32 {
    top + size * PT_TO_MM
}

fn centered_lines(
    ops: &mut Vec<DrawOp>,
    lines: &[String],
    size: f32,
    top: f32,
    center: f32,
    style: TextStyle,
    color: Rgb8,
) {
    for (i, line) in lines.iter().enumerate() {
        let x = center - text_width_mm(line, size) / 2.0;
        let baseline = first_baseline(top, size) + i as f32 * line_height(size);
        ops.push(text(line, size, x, baseline, style, color));
    }
}

fn value_style(value: &DisplayValue) -> (TextStyle, Rgb8) {
    if value.is_missing() {
        (TextStyle::Italic, GRAY)
    } else {
        (TextStyle::Regular, BLACK)
    }
}

fn image_op(image: &Arc<RgbImage>, x: f32, top: f32, max_w: f32, max_h: f32, role: ImageRole) -> DrawOp {
    let (width, height) = fit_within(image.width() as f32, image.height() as f32, max_w, max_h);
    DrawOp::Image {
        image: Arc::clone(image),
        x: x + (max_w - width) / 2.0,
        top,
        width,
        height,
        role,
    }
}

/// Lines of a wrapped block that fall inside `range`, with their index
/// relative to the range start.
fn visible<'a>(
    lines: &'a [String],
    range: Option<(usize, usize)>,
) -> impl Iterator<Item = (usize, &'a String)> + 'a {
    let (start, end) = range.unwrap_or((0, lines.len()));
    lines
        .iter()
        .enumerate()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(move |(i, line)| (i - start, line))
}

/// Draw operations for one body block whose top edge sits at `top`.
/// `lines` limits a field or note to part of its wrapped lines.
pub fn draw_block(
    block: &Block,
    top: f32,
    lines: Option<(usize, usize)>,
    geometry: &PageGeometry,
) -> Vec<DrawOp> {
    let left = geometry.margin_x;
    let content_width = geometry.content_width();
    let center = geometry.width / 2.0;
    let mut ops = Vec::new();

    match block {
        Block::Title(title) => {
            let lines = wrap_text(title, TITLE_SIZE, content_width);
            centered_lines(&mut ops, &lines, TITLE_SIZE, top, center, TextStyle::Bold, NAVY);
        }
        Block::Heading(heading) => {
            let lines = wrap_text(heading, HEADING_SIZE, content_width);
            for (i, line) in lines.iter().enumerate() {
                let baseline = first_baseline(top, HEADING_SIZE) + i as f32 * line_height(HEADING_SIZE);
                ops.push(text(line, HEADING_SIZE, left, baseline, TextStyle::Bold, NAVY));
            }
            let rule_y = top + lines.len() as f32 * line_height(HEADING_SIZE) + 0.5;
            ops.push(DrawOp::Line {
                x1: left,
                y1: rule_y,
                x2: left + content_width,
                y2: rule_y,
                thickness: 0.5,
                color: NAVY,
            });
        }
        Block::Field { label, value } => {
            let step = line_height(BODY_SIZE);
            let baseline = first_baseline(top, BODY_SIZE);
            let (label_lines, value_lines) = field_lines(label, value.text(), geometry);
            for (i, line) in visible(&label_lines, lines) {
                ops.push(text(line, BODY_SIZE, left, baseline + i as f32 * step, TextStyle::Bold, BLACK));
            }
            let (style, color) = value_style(value);
            for (i, line) in visible(&value_lines, lines) {
                ops.push(text(line, BODY_SIZE, left + LABEL_WIDTH, baseline + i as f32 * step, style, color));
            }
        }
        Block::Note(note) => {
            let baseline = first_baseline(top, BODY_SIZE);
            let wrapped = wrap_text(note, BODY_SIZE, content_width);
            for (i, line) in visible(&wrapped, lines) {
                let y = baseline + i as f32 * line_height(BODY_SIZE);
                ops.push(text(line, BODY_SIZE, left, y, TextStyle::Italic, GRAY));
            }
        }
        Block::MapImage(image) => {
            ops.push(image_op(image, left, top, content_width, MAP_MAX_HEIGHT, ImageRole::Map));
        }
        Block::MapPlaceholder { coordinates } => {
            ops.push(DrawOp::Rect {
                x: left,
                top,
                width: content_width,
                height: PLACEHOLDER_HEIGHT,
                color: GRAY,
            });
            let lines = vec![
                "Mapa indisponível".to_string(),
                format!("Coordenadas: {}", coordinates.text()),
            ];
            let block_top = top + PLACEHOLDER_HEIGHT / 2.0 - line_height(BODY_SIZE);
            centered_lines(&mut ops, &lines, BODY_SIZE, block_top, center, TextStyle::Italic, GRAY);
        }
        Block::PhotoRow(photos) => {
            let cell = photo_cell_width(geometry);
            for (i, photo) in photos.iter().enumerate() {
                let x = left + i as f32 * (cell + PHOTO_GAP);
                ops.push(image_op(photo, x, top, cell, PHOTO_MAX_HEIGHT, ImageRole::Photo));
            }
        }
        Block::Signature { name, role, license } => {
            let rule_y = top + 16.0;
            let half = 40.0;
            ops.push(DrawOp::Line {
                x1: center - half,
                y1: rule_y,
                x2: center + half,
                y2: rule_y,
                thickness: 0.4,
                color: BLACK,
            });
            // Unsigned reports keep only the blank rule and the role
            let lines: Vec<String> = name
                .iter()
                .cloned()
                .chain(std::iter::once(role.clone()))
                .chain(license.iter().cloned())
                .collect();
            centered_lines(&mut ops, &lines, BODY_SIZE, rule_y + 1.5, center, TextStyle::Regular, BLACK);
        }
        Block::Spacer(_) => {}
    }

    ops
}

/// Place the header and footer bands, with their text lines, on a page.
pub fn stamp_chrome(
    page: &mut ComposedPage,
    header: &ChromeRaster,
    footer: &ChromeRaster,
    geometry: &PageGeometry,
) {
    for (raster, top, role) in [
        (header, geometry.header_top, ImageRole::Header),
        (footer, geometry.footer_top(), ImageRole::Footer),
    ] {
        page.ops.push(DrawOp::Image {
            image: Arc::clone(&raster.image),
            x: geometry.margin_x,
            top,
            width: raster.width_mm,
            height: raster.height_mm,
            role,
        });

        // Lines are centred between the logos and shrunk when the widest
        // one does not fit there.
        let (span_start, span_end) = raster.text_span;
        let span = (span_end - span_start - 2.0).max(1.0);
        let widest = raster
            .lines
            .iter()
            .map(|line| text_width_mm(line, CHROME_SIZE))
            .fold(0.0, f32::max);
        let size = if widest > span {
            CHROME_SIZE * span / widest
        } else {
            CHROME_SIZE
        };

        let text_height = raster.lines.len() as f32 * line_height(size);
        let text_top = top + (raster.height_mm - text_height) / 2.0;
        let center = geometry.margin_x + (span_start + span_end) / 2.0;
        let (style, color) = match raster.band {
            Band::Header => (TextStyle::Bold, NAVY),
            Band::Footer => (TextStyle::Regular, GRAY),
        };
        centered_lines(&mut page.ops, &raster.lines, size, text_top, center, style, color);
    }
}

/// Paginate the body and stamp the chrome on every resulting page.
pub fn compose_pages(document: &Document, geometry: &PageGeometry) -> Result<Vec<ComposedPage>, AppError> {
    let header = document
        .header
        .as_ref()
        .ok_or(AppError::MissingTemplate("header"))?;
    let footer = document
        .footer
        .as_ref()
        .ok_or(AppError::MissingTemplate("footer"))?;
    if document.body.is_empty() {
        return Err(AppError::MissingTemplate("body"));
    }

    let header = rasterize(header, Band::Header, geometry.content_width(), geometry.header_height);
    let footer = rasterize(footer, Band::Footer, geometry.content_width(), geometry.footer_height);

    let pages = paginate(&document.body, geometry)
        .iter()
        .map(|layout| {
            let mut page = ComposedPage::default();
            for placed in &layout.placed {
                let block = &document.body[placed.section].blocks[placed.block];
                page.ops.extend(draw_block(block, placed.top, placed.lines, geometry));
            }
            stamp_chrome(&mut page, &header, &footer, geometry);
            page
        })
        .collect();

    Ok(pages)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, style: TextStyle) -> &IndirectFontRef {
        match style {
            TextStyle::Regular => &self.regular,
            TextStyle::Bold => &self.bold,
            TextStyle::Italic => &self.italic,
        }
    }
}

fn color((r, g, b): Rgb8) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

fn draw_op(layer: &PdfLayerReference, op: &DrawOp, fonts: &Fonts, page_height: f32) {
    let y = |top: f32| Mm(page_height - top);

    match op {
        DrawOp::Text { text, size, x, baseline, style, color: c } => {
            layer.set_fill_color(color(*c));
            layer.use_text(text.as_str(), *size, Mm(*x), y(*baseline), fonts.get(*style));
        }
        DrawOp::Line { x1, y1, x2, y2, thickness, color: c } => {
            layer.set_outline_color(color(*c));
            layer.set_outline_thickness(*thickness);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), y(*y1)), false),
                    (Point::new(Mm(*x2), y(*y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Rect { x, top, width, height, color: c } => {
            layer.set_outline_color(color(*c));
            layer.set_outline_thickness(0.4);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x), y(*top)), false),
                    (Point::new(Mm(x + width), y(*top)), false),
                    (Point::new(Mm(x + width), y(top + height)), false),
                    (Point::new(Mm(*x), y(top + height)), false),
                ],
                is_closed: true,
            });
        }
        DrawOp::Image { image, x, top, width, .. } => {
            let (width_px, height_px) = image.dimensions();
            let pdf_image = Image::from(ImageXObject {
                width: Px(width_px as usize),
                height: Px(height_px as usize),
                color_space: ColorSpace::Rgb,
                bits_per_component: ColorBits::Bit8,
                interpolate: true,
                image_data: image.as_raw().clone(),
                image_filter: None,
                clipping_bbox: None,
                smask: None,
            });

            // DPI that yields the requested physical width
            let dpi = (width_px as f32) / (width / 25.4);
            let height_mm = height_px as f32 / dpi * 25.4;

            pdf_image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(y(top + height_mm)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }
    }
}

/// Write composed pages to `path` as a vector PDF.
pub fn write_pdf(
    title: &str,
    pages: &[ComposedPage],
    geometry: &PageGeometry,
    path: &Path,
) -> Result<(), AppError> {
    let (doc, page1, layer1) = PdfDocument::new(title, Mm(geometry.width), Mm(geometry.height), "Layer 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::PdfError(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::PdfError(e.to_string()))?,
        italic: doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| AppError::PdfError(e.to_string()))?,
    };

    let mut layers = vec![doc.get_page(page1).get_layer(layer1)];
    for _ in 1..pages.len() {
        let (page, layer) = doc.add_page(Mm(geometry.width), Mm(geometry.height), "Layer 1");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for (page, layer) in pages.iter().zip(&layers) {
        for op in &page.ops {
            draw_op(layer, op, &fonts, geometry.height);
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| AppError::PdfError(e.to_string()))?;

    Ok(())
}
