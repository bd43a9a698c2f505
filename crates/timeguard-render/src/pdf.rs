//! Paginated PDF timesheet report.
//!
//! Layout (landscape A4, points):
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ [logo]        Admin Timesheet Report          │  title at top - 35
//! │            Generated on Mon Jan 01 ...        │  subtitle 8pt lower
//! │ ┌──────┬──────┬──────┬─────────────────────┐  │  table top at
//! │ │ Date │ Month│ User │ ...  (header, blue) │  │  top - (margin + 50)
//! │ ├──────┼──────┼──────┼─────────────────────┤  │
//! │ │ ...  │ ...  │ ...  │ ...  (striped rows) │  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Every page repeats the logo, title, subtitle and header row. Fonts are the
//! built-in Helvetica faces, so no font files are embedded.

use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use tracing::{debug, warn};

use timeguard_core::{ColumnMapping, Config, EmployeeGroup, RenderError, Renderer};

use crate::metrics::{encode_win_ansi, wrap, Font};
use crate::table::ReportTable;

const PAGE_WIDTH: f32 = 841.89;
const PAGE_HEIGHT: f32 = 595.28;
/// 10 mm
const MARGIN: f32 = 28.35;
/// Space between the top margin and the table, holding logo and titles
const TITLE_BAND: f32 = 50.0;
const PX_TO_PT: f32 = 0.6;

const HEADER_FILL: [f32; 3] = [68.0 / 255.0, 114.0 / 255.0, 196.0 / 255.0];
const STRIPE_GREY: f32 = 0.95;
const FONT_SIZE: f32 = 3.5;
const HEADER_LEADING: f32 = 4.0;
const BODY_LEADING: f32 = 4.2;
const CELL_PADDING: f32 = 3.0;
const GRID_WIDTH: f32 = 0.5;
const FRAME_WIDTH: f32 = 1.0;
/// Values longer than this many characters are wrapped to the column width
const WRAP_THRESHOLD: usize = 15;

const TITLE_SIZE: f32 = 9.5;
const TITLE_OFFSET: f32 = 35.0;
const SUBTITLE_GAP: f32 = 8.0;
const LOGO_SIZE: (f32, f32) = (120.0, 55.0);
const LOGO_INSET: f32 = 10.0;
const LOGO_OFFSET: f32 = 70.0;

/// PDF report renderer configuration
#[derive(Clone, Debug)]
pub struct PdfRenderer {
    pub title: String,
    /// Candidate logo images; the first existing one is drawn
    pub logo_paths: Vec<PathBuf>,
    /// Fixed timestamp for the subtitle, current local time when unset
    pub generated_at: Option<NaiveDateTime>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Static facts about the renderer, reported by health checks
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RendererInfo {
    pub format: &'static str,
    pub page_width: f32,
    pub page_height: f32,
    pub columns: usize,
    pub table_width: f32,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.report_title.clone(),
            logo_paths: config.logo_paths.clone(),
            generated_at: None,
        }
    }

    /// Set the report title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replace the logo search list
    pub fn logo_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.logo_paths = paths;
        self
    }

    /// Pin the subtitle timestamp
    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn describe(&self) -> RendererInfo {
        RendererInfo {
            format: "pdf",
            page_width: PAGE_WIDTH,
            page_height: PAGE_HEIGHT,
            columns: timeguard_core::schema::REPORT_COLUMN_COUNT,
            table_width: column_widths().iter().sum(),
        }
    }

    /// Derive the report table for one group
    pub fn build_table(&self, group: &EmployeeGroup) -> Result<ReportTable, RenderError> {
        let mapping = ColumnMapping::for_table(&group.rows);
        ReportTable::build(&group.rows, &mapping)
    }

    fn subtitle(&self) -> String {
        let at = self
            .generated_at
            .unwrap_or_else(|| Local::now().naive_local());
        at.format("Generated on %a %b %d %H:%M:%S %Y").to_string()
    }

    fn load_logo(&self) -> Option<Logo> {
        let Some(path) = self.logo_paths.iter().find(|p| p.is_file()) else {
            debug!(candidates = ?self.logo_paths, "no logo found, rendering without");
            return None;
        };
        match image::open(path) {
            Ok(img) => Some(Logo::flatten(&img)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "logo could not be decoded, rendering without");
                None
            }
        }
    }

    fn write_document(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        let layout = Layout::new(table);
        let pages = layout.paginate();
        let logo = self.load_logo();
        let subtitle = self.subtitle();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for font in [Font::Helvetica, Font::HelveticaBold] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource(), id);
        }
        let mut resources = dictionary! { "Font" => fonts };
        if let Some(logo) = &logo {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(logo.width),
                    "Height" => i64::from(logo.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                logo.rgb.clone(),
            ));
            resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
        }
        let resources_id = doc.add_object(resources);

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for rows in &pages {
            let mut ops = Vec::new();
            if logo.is_some() {
                draw_logo(&mut ops);
            }
            self.draw_titles(&mut ops, &subtitle);
            layout.draw_page(&mut ops, rows);

            let content = Content { operations: ops };
            let encoded = content
                .encode()
                .map_err(|e| RenderError::Format(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(&self.title)),
            "Producer" => Object::string_literal("timeguard"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| RenderError::Format(e.to_string()))?;
        Ok(bytes)
    }

    fn draw_titles(&self, ops: &mut Vec<Operation>, subtitle: &str) {
        let title_y = PAGE_HEIGHT - TITLE_OFFSET;
        draw_centered(ops, Font::HelveticaBold, TITLE_SIZE, title_y, &self.title);
        draw_centered(ops, Font::Helvetica, FONT_SIZE, title_y - SUBTITLE_GAP, subtitle);
    }
}

impl Renderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, group: &EmployeeGroup) -> Result<Vec<u8>, RenderError> {
        let table = self.build_table(group)?;
        self.write_document(&table)
    }
}

const LOGO_RESOURCE: &str = "Im1";

/// Logo flattened onto a white background as 8-bit RGB
struct Logo {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Logo {
    fn flatten(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for px in rgba.pixels() {
            let alpha = u16::from(px[3]);
            for channel in &px.0[..3] {
                let blended = (u16::from(*channel) * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }
        Self { width, height, rgb }
    }
}

fn draw_logo(ops: &mut Vec<Operation>) {
    let (w, h) = LOGO_SIZE;
    let x = MARGIN - LOGO_INSET;
    let y = PAGE_HEIGHT - LOGO_OFFSET;
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
    ));
    ops.push(Operation::new("Do", vec![LOGO_RESOURCE.into()]));
    ops.push(Operation::new("Q", vec![]));
}

fn draw_text(ops: &mut Vec<Operation>, font: Font, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn draw_centered(ops: &mut Vec<Operation>, font: Font, size: f32, y: f32, text: &str) {
    let x = (PAGE_WIDTH - font.text_width(text, size)) / 2.0;
    draw_text(ops, font, size, x, y, text);
}

fn fill_rgb(ops: &mut Vec<Operation>, [r, g, b]: [f32; 3]) {
    ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
}

fn rect(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32, operator: &str) {
    ops.push(Operation::new(
        "re",
        vec![x.into(), y.into(), w.into(), h.into()],
    ));
    ops.push(Operation::new(operator, vec![]));
}

fn line(ops: &mut Vec<Operation>, (x1, y1): (f32, f32), (x2, y2): (f32, f32)) {
    ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
    ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
    ops.push(Operation::new("S", vec![]));
}

fn column_widths() -> Vec<f32> {
    timeguard_core::schema::REPORT_COLUMNS
        .iter()
        .map(|c| c.width_px * PX_TO_PT)
        .collect()
}

// ============================================================================
// Table layout
// ============================================================================

/// One row broken into lines per cell
struct RowLayout {
    cells: Vec<Vec<String>>,
    height: f32,
}

impl RowLayout {
    fn new(cells: Vec<Vec<String>>, leading: f32) -> Self {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        Self {
            cells,
            height: lines as f32 * leading + 2.0 * CELL_PADDING,
        }
    }
}

struct Layout {
    widths: Vec<f32>,
    left: f32,
    top: f32,
    header: RowLayout,
    body: Vec<RowLayout>,
}

impl Layout {
    fn new(table: &ReportTable) -> Self {
        let widths = column_widths();
        let total: f32 = widths.iter().sum();
        let inner = |w: f32| (w - 2.0 * CELL_PADDING).max(1.0);

        let header = RowLayout::new(
            table
                .headers()
                .zip(&widths)
                .map(|(h, w)| wrap(h, Font::HelveticaBold, FONT_SIZE, inner(*w)))
                .collect(),
            HEADER_LEADING,
        );
        let body = table
            .rows
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .zip(&widths)
                    .map(|(value, w)| {
                        if value.chars().count() > WRAP_THRESHOLD {
                            wrap(value, Font::Helvetica, FONT_SIZE, inner(*w))
                        } else {
                            vec![value.clone()]
                        }
                    })
                    .collect();
                RowLayout::new(cells, BODY_LEADING)
            })
            .collect();

        Self {
            left: (PAGE_WIDTH - total) / 2.0,
            top: PAGE_HEIGHT - (MARGIN + TITLE_BAND),
            widths,
            header,
            body,
        }
    }

    /// Split body rows into pages; every page holds at least one row
    fn paginate(&self) -> Vec<Vec<usize>> {
        let mut pages = vec![Vec::new()];
        let mut y = self.top - self.header.height;
        for (idx, row) in self.body.iter().enumerate() {
            let page_has_rows = pages.last().is_some_and(|p| !p.is_empty());
            if y - row.height < MARGIN && page_has_rows {
                pages.push(Vec::new());
                y = self.top - self.header.height;
            }
            if let Some(page) = pages.last_mut() {
                page.push(idx);
            }
            y -= row.height;
        }
        pages
    }

    fn draw_page(&self, ops: &mut Vec<Operation>, rows: &[usize]) {
        let width: f32 = self.widths.iter().sum();
        let mut y = self.top;

        // Header band
        fill_rgb(ops, HEADER_FILL);
        rect(ops, self.left, y - self.header.height, width, self.header.height, "f");
        fill_rgb(ops, [1.0, 1.0, 1.0]);
        self.draw_cells(ops, &self.header, y, Font::HelveticaBold, HEADER_LEADING);
        let mut boundaries = vec![y];
        y -= self.header.height;
        boundaries.push(y);

        for &idx in rows {
            let row = &self.body[idx];
            if idx % 2 == 1 {
                fill_rgb(ops, [STRIPE_GREY; 3]);
                rect(ops, self.left, y - row.height, width, row.height, "f");
            }
            fill_rgb(ops, [0.0; 3]);
            self.draw_cells(ops, row, y, Font::Helvetica, BODY_LEADING);
            y -= row.height;
            boundaries.push(y);
        }

        // Grid
        let bottom = y;
        ops.push(Operation::new("G", vec![0.into()]));
        ops.push(Operation::new("w", vec![GRID_WIDTH.into()]));
        for &b in &boundaries {
            line(ops, (self.left, b), (self.left + width, b));
        }
        let mut x = self.left;
        for w in &self.widths {
            line(ops, (x, self.top), (x, bottom));
            x += w;
        }
        line(ops, (x, self.top), (x, bottom));

        ops.push(Operation::new("w", vec![FRAME_WIDTH.into()]));
        rect(ops, self.left, bottom, width, self.top - bottom, "S");
        let header_bottom = self.top - self.header.height;
        line(ops, (self.left, header_bottom), (self.left + width, header_bottom));
    }

    /// Centered, top-aligned cell text
    fn draw_cells(&self, ops: &mut Vec<Operation>, row: &RowLayout, top: f32, font: Font, leading: f32) {
        let mut x = self.left;
        for (lines, w) in row.cells.iter().zip(&self.widths) {
            let mut baseline = top - CELL_PADDING - FONT_SIZE;
            for text in lines {
                if !text.is_empty() {
                    let tx = x + (w - font.text_width(text, FONT_SIZE)) / 2.0;
                    draw_text(ops, font, FONT_SIZE, tx, baseline, text);
                }
                baseline -= leading;
            }
            x += w;
        }
    }
}
