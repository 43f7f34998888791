//! Page geometry, block measurement and pagination.
//!
//! All measurements are in millimetres from the top edge of the page.

use crate::raster::fit_within;
use crate::render::{Block, Section};

pub const PT_TO_MM: f32 = 0.3528;

pub const TITLE_SIZE: f32 = 13.0;
pub const HEADING_SIZE: f32 = 11.0;
pub const BODY_SIZE: f32 = 9.5;
pub const CHROME_SIZE: f32 = 8.0;

const LINE_SPACING: f32 = 1.35;
/// Width of the bold label column of a field row.
pub const LABEL_WIDTH: f32 = 62.0;
pub const MAP_MAX_HEIGHT: f32 = 105.0;
pub const PHOTO_MAX_HEIGHT: f32 = 70.0;
pub const PHOTO_GAP: f32 = 6.0;
pub const PLACEHOLDER_HEIGHT: f32 = 28.0;
pub const SIGNATURE_HEIGHT: f32 = 34.0;
/// Space below a field or note.
pub const TEXT_PADDING: f32 = 1.5;
const SECTION_GAP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_x: f32,
    pub header_top: f32,
    pub header_height: f32,
    pub footer_bottom: f32,
    pub footer_height: f32,
    /// Space between the chrome and the body.
    pub gap: f32,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin_x: 15.0,
            header_top: 8.0,
            header_height: 28.0,
            footer_bottom: 8.0,
            footer_height: 16.0,
            gap: 5.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_x
    }

    pub fn body_top(&self) -> f32 {
        self.header_top + self.header_height + self.gap
    }

    pub fn body_bottom(&self) -> f32 {
        self.height - self.footer_bottom - self.footer_height - self.gap
    }

    pub fn body_height(&self) -> f32 {
        self.body_bottom() - self.body_top()
    }

    pub fn footer_top(&self) -> f32 {
        self.height - self.footer_bottom - self.footer_height
    }
}

pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

/// Approximate rendered width of `text` in Helvetica.
pub fn text_width_mm(text: &str, size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            ' ' | 'f' | 't' | 'r' | 'I' | '-' | '(' | ')' | '/' => 0.35,
            'm' | 'w' | 'M' | 'W' => 0.85,
            c if c.is_ascii_digit() => 0.56,
            c if c.is_uppercase() => 0.68,
            _ => 0.54,
        })
        .sum();
    em * size * PT_TO_MM
}

/// Greedy word wrap. Words longer than a line are split on characters.
pub fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width_mm(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width_mm(word, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width_mm(&current, size) > max_width {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

pub fn field_value_width(geometry: &PageGeometry) -> f32 {
    geometry.content_width() - LABEL_WIDTH
}

pub fn photo_cell_width(geometry: &PageGeometry) -> f32 {
    (geometry.content_width() - PHOTO_GAP) / 2.0
}

/// Wrapped label and value lines of a field row.
pub fn field_lines(label: &str, value: &str, geometry: &PageGeometry) -> (Vec<String>, Vec<String>) {
    (
        wrap_text(&format!("{}:", label), BODY_SIZE, LABEL_WIDTH - 2.0),
        wrap_text(value, BODY_SIZE, field_value_width(geometry)),
    )
}

/// Line count of blocks that may be split between pages.
pub fn text_lines(block: &Block, geometry: &PageGeometry) -> Option<usize> {
    match block {
        Block::Field { label, value } => {
            let (label_lines, value_lines) = field_lines(label, value.text(), geometry);
            Some(label_lines.len().max(value_lines.len()))
        }
        Block::Note(text) => Some(wrap_text(text, BODY_SIZE, geometry.content_width()).len()),
        _ => None,
    }
}

/// Height a block occupies, including its own trailing space.
pub fn measure(block: &Block, geometry: &PageGeometry) -> f32 {
    match block {
        Block::Title(text) => {
            wrap_text(text, TITLE_SIZE, geometry.content_width()).len() as f32
                * line_height(TITLE_SIZE)
                + 4.0
        }
        Block::Heading(text) => {
            wrap_text(text, HEADING_SIZE, geometry.content_width()).len() as f32
                * line_height(HEADING_SIZE)
                + 3.0
        }
        Block::Field { .. } | Block::Note(_) => {
            text_lines(block, geometry).unwrap_or(1) as f32 * line_height(BODY_SIZE) + TEXT_PADDING
        }
        Block::MapImage(image) => {
            let (_, h) = fit_within(
                image.width() as f32,
                image.height() as f32,
                geometry.content_width(),
                MAP_MAX_HEIGHT,
            );
            h + 3.0
        }
        Block::MapPlaceholder { .. } => PLACEHOLDER_HEIGHT + 3.0,
        Block::PhotoRow(photos) => {
            let cell = photo_cell_width(geometry);
            let tallest = photos
                .iter()
                .map(|p| fit_within(p.width() as f32, p.height() as f32, cell, PHOTO_MAX_HEIGHT).1)
                .fold(0.0, f32::max);
            tallest + PHOTO_GAP / 2.0
        }
        Block::Signature { .. } => SIGNATURE_HEIGHT,
        Block::Spacer(height) => *height,
    }
}

/// Where a body block lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub section: usize,
    pub block: usize,
    pub top: f32,
    pub height: f32,
    /// Half-open range of wrapped lines shown here when a text block is
    /// split between pages. `None` draws the whole block.
    pub lines: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub placed: Vec<Placed>,
}

/// Flow sections into pages. A keep-together section that would straddle a
/// boundary starts on a fresh page; one taller than a whole page is split
/// between blocks like any other section. A field or note taller than a whole
/// page is split between its lines.
pub fn paginate(sections: &[Section], geometry: &PageGeometry) -> Vec<PageLayout> {
    let top = geometry.body_top();
    let bottom = geometry.body_bottom();

    let mut pages = vec![PageLayout::default()];
    let mut cursor = top;

    for (si, section) in sections.iter().enumerate() {
        let heights: Vec<f32> = section.blocks.iter().map(|b| measure(b, geometry)).collect();
        let total: f32 = heights.iter().sum();

        if section.keep_together
            && total <= geometry.body_height()
            && cursor + total > bottom
            && cursor > top
        {
            pages.push(PageLayout::default());
            cursor = top;
        }

        for (bi, (block, height)) in section.blocks.iter().zip(heights).enumerate() {
            if height > geometry.body_height() {
                if let Some(line_count) = text_lines(block, geometry) {
                    place_lines(&mut pages, &mut cursor, geometry, si, bi, line_count);
                    continue;
                }
            }

            if cursor + height > bottom && cursor > top {
                pages.push(PageLayout::default());
                cursor = top;
            }
            if let Some(page) = pages.last_mut() {
                page.placed.push(Placed {
                    section: si,
                    block: bi,
                    top: cursor,
                    height,
                    lines: None,
                });
            }
            cursor += height;
        }

        cursor += SECTION_GAP;
    }

    pages
}

/// Place a text block chunk by chunk, filling the current page before
/// carrying the remaining lines over.
fn place_lines(
    pages: &mut Vec<PageLayout>,
    cursor: &mut f32,
    geometry: &PageGeometry,
    section: usize,
    block: usize,
    line_count: usize,
) {
    let step = line_height(BODY_SIZE);
    let mut start = 0;

    while start < line_count {
        let available = geometry.body_bottom() - *cursor - TEXT_PADDING;
        let mut fit = ((available / step).floor() as usize).min(line_count - start);
        if fit == 0 {
            if *cursor > geometry.body_top() {
                pages.push(PageLayout::default());
                *cursor = geometry.body_top();
                continue;
            }
            fit = 1;
        }

        let end = start + fit;
        let height = fit as f32 * step + TEXT_PADDING;
        if let Some(page) = pages.last_mut() {
            page.placed.push(Placed {
                section,
                block,
                top: *cursor,
                height,
                lines: Some((start, end)),
            });
        }
        *cursor += height;
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DisplayValue, SectionKind};

    fn section(keep_together: bool, fields: usize) -> Section {
        Section {
            kind: SectionKind::Damage,
            keep_together,
            blocks: (0..fields)
                .map(|i| Block::Field {
                    label: format!("Campo {}", i),
                    value: DisplayValue::of("valor"),
                })
                .collect(),
        }
    }

    fn pages_of(pages: &[PageLayout], section: usize) -> Vec<usize> {
        let mut found: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.placed.iter().any(|b| b.section == section))
            .map(|(i, _)| i)
            .collect();
        found.dedup();
        found
    }

    #[test]
    fn wraps_long_text() {
        let text = "Fissuras diagonais nas paredes da sala e da cozinha com destacamento do reboco";
        let lines = wrap_text(text, BODY_SIZE, 40.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width_mm(l, BODY_SIZE) <= 40.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn splits_unbreakable_words() {
        let word = "A".repeat(80);
        let lines = wrap_text(&word, BODY_SIZE, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn blocks_stay_inside_body() {
        let g = PageGeometry::default();
        let sections: Vec<Section> = (0..12).map(|_| section(false, 9)).collect();
        let pages = paginate(&sections, &g);
        assert!(pages.len() > 1);
        for page in &pages {
            for placed in &page.placed {
                assert!(placed.top >= g.body_top());
                assert!(placed.top + placed.height <= g.body_bottom() + 0.001);
            }
        }
    }

    #[test]
    fn keep_together_section_moves_to_next_page() {
        let g = PageGeometry::default();
        let rows = (g.body_height() / measure(&section(false, 1).blocks[0], &g)) as usize;
        let sections = vec![section(false, rows - 3), section(true, 6)];
        let pages = paginate(&sections, &g);
        assert_eq!(pages_of(&pages, 1), vec![1]);
        assert_eq!(pages[1].placed[0].top, g.body_top());
    }

    #[test]
    fn long_field_is_split_between_lines() {
        let g = PageGeometry::default();
        let value = "Fissuras diagonais nas paredes com destacamento do reboco. ".repeat(80);
        let block = Block::Field {
            label: "PAREDES".to_string(),
            value: DisplayValue::of(&value),
        };
        let line_count = text_lines(&block, &g).unwrap();
        let sections = vec![
            section(false, 10),
            Section {
                kind: SectionKind::Damage,
                keep_together: true,
                blocks: vec![block],
            },
        ];

        let pages = paginate(&sections, &g);
        let chunks: Vec<(usize, usize)> = pages
            .iter()
            .flat_map(|p| p.placed.iter())
            .filter(|p| p.section == 1)
            .map(|p| p.lines.unwrap())
            .collect();

        assert!(chunks.len() >= 2);
        assert_eq!(chunks.first().unwrap().0, 0);
        assert_eq!(chunks.last().unwrap().1, line_count);
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        for page in &pages {
            for placed in &page.placed {
                assert!(placed.top + placed.height <= g.body_bottom() + 0.001);
            }
        }
        // The first chunk fills the page the short section started on.
        assert_eq!(pages_of(&pages, 1)[0], 0);
    }

    #[test]
    fn oversized_keep_together_section_is_split() {
        let g = PageGeometry::default();
        let rows = (g.body_height() / measure(&section(false, 1).blocks[0], &g)) as usize;
        let pages = paginate(&[section(true, rows * 2)], &g);
        assert!(pages.len() >= 2);
        assert_eq!(pages_of(&pages, 0).len(), pages.len());
    }
}
