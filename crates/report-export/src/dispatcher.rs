//! Render dispatch: filling compiled layouts and exporting print jobs

use crate::binding::{resolve_binding, Bound};
use crate::layout::*;
use crate::{csv, pdf, EmbeddedFont, ExportError, ExportFormat, Result};
use report_template::{
    value_to_string, ImageId, ImageResource, Parameter, ParameterSet, Record, RecordSource,
    TemplateHandle, TITLE_PARAMETER,
};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Rendering engine seam used by the reporting service
pub trait RenderDispatcher: Send + Sync {
    /// Fill the compiled template with parameters and a main data source
    fn render(
        &self,
        handle: TemplateHandle,
        parameters: &ParameterSet,
        data_source: &RecordSource,
    ) -> Result<PrintJob>;

    /// Serialize a print job in the given format
    fn export(&self, format: ExportFormat, job: &PrintJob, out: &mut dyn Write) -> Result<()>;

    /// Formats this engine can export
    fn supported_formats(&self) -> &[ExportFormat];

    /// Check whether a format can be exported
    fn supports(&self, format: ExportFormat) -> bool {
        self.supported_formats().contains(&format)
    }
}

/// A filled, paginated document ready for export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintJob {
    pub title: String,
    pub page_width: f64,
    pub page_height: f64,
    pub pages: Vec<Page>,
}

impl PrintJob {
    /// Text of every text element, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|page| {
            page.elements.iter().filter_map(|element| match element {
                Element::Text(text) => Some(text.text.as_str()),
                Element::Image(_) => None,
            })
        })
    }
}

/// One page of a print job
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub elements: Vec<Element>,
}

/// Positioned page content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Image(ImageElement),
}

/// Text anchored at (x, y) from the top-left corner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub align: Align,
    pub text: String,
}

/// Image whose top-left corner sits at (x, y)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageElement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub image_id: ImageId,
    #[serde(skip)]
    pub image: Arc<ImageResource>,
}

/// Dispatcher backed by compiled JSON layouts
///
/// Exports PDF, CSV and JSON. PDF text uses Helvetica (Latin-1 only)
/// unless a TrueType font is set.
#[derive(Debug, Clone)]
pub struct LayoutDispatcher {
    layouts: HashMap<TemplateHandle, Layout>,
    title_parameter: String,
    font: Option<Arc<EmbeddedFont>>,
}

const SUPPORTED: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Csv, ExportFormat::Json];

impl Default for LayoutDispatcher {
    fn default() -> Self {
        Self {
            layouts: HashMap::new(),
            title_parameter: TITLE_PARAMETER.to_string(),
            font: None,
        }
    }
}

impl LayoutDispatcher {
    /// Create a dispatcher with no layouts
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the document title from a different parameter
    pub fn with_title_parameter(mut self, name: impl Into<String>) -> Self {
        self.title_parameter = name.into();
        self
    }

    /// Embed `font` for PDF text
    pub fn with_font(mut self, font: EmbeddedFont) -> Self {
        self.font = Some(Arc::new(font));
        self
    }

    /// Register a compiled layout under a template handle
    pub fn register(&mut self, handle: TemplateHandle, layout: Layout) {
        self.layouts.insert(handle, layout);
    }

    /// Register a layout from JSON
    pub fn register_json(&mut self, handle: TemplateHandle, json: &str) -> Result<()> {
        self.register(handle, parse_layout(json)?);
        Ok(())
    }

    /// Register a layout from a JSON file
    pub fn register_file<P: AsRef<Path>>(&mut self, handle: TemplateHandle, path: P) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        self.register_json(handle, &json)
    }

    /// Number of registered layouts
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Check if no layouts are registered
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl RenderDispatcher for LayoutDispatcher {
    fn render(
        &self,
        handle: TemplateHandle,
        parameters: &ParameterSet,
        data_source: &RecordSource,
    ) -> Result<PrintJob> {
        let layout = self
            .layouts
            .get(&handle)
            .ok_or(ExportError::UnknownTemplate(handle))?;

        let title = match parameters.get(&self.title_parameter) {
            Some(Parameter::Value(value)) => value_to_string(value).map_err(binding_error)?,
            _ => String::new(),
        };

        let mut filler = Filler::new(layout.page, parameters, data_source);
        for block in &layout.blocks {
            filler.fill_block(block)?;
        }

        let job = PrintJob {
            title,
            page_width: layout.page.width,
            page_height: layout.page.height,
            pages: filler.pages,
        };
        debug!(handle, pages = job.pages.len(), "Filled layout");
        Ok(job)
    }

    fn export(&self, format: ExportFormat, job: &PrintJob, out: &mut dyn Write) -> Result<()> {
        match format {
            ExportFormat::Pdf => pdf::write_pdf(job, self.font.as_deref(), out),
            ExportFormat::Csv => csv::write_csv(job, out),
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, job)?;
                Ok(())
            }
            requested => Err(ExportError::UnsupportedFormat {
                requested,
                supported: SUPPORTED.to_vec(),
            }),
        }
    }

    fn supported_formats(&self) -> &[ExportFormat] {
        &SUPPORTED
    }
}

fn binding_error(err: report_template::ReportError) -> ExportError {
    ExportError::BindingError(err.to_string())
}

/// Mutable state while filling one layout
struct Filler<'a> {
    page: PageSetup,
    parameters: &'a ParameterSet,
    data_source: &'a RecordSource,
    pages: Vec<Page>,
    /// Page and y where the last table or flowed block ended
    cursor: Option<(usize, f64)>,
    /// Page and y offset for blocks following the last table
    flow: Option<(usize, f64)>,
}

impl<'a> Filler<'a> {
    fn new(page: PageSetup, parameters: &'a ParameterSet, data_source: &'a RecordSource) -> Self {
        Self {
            page,
            parameters,
            data_source,
            pages: vec![Page::default()],
            cursor: None,
            flow: None,
        }
    }

    fn fill_block(&mut self, block: &Block) -> Result<()> {
        match block {
            Block::Text(b) => self.fill_text(b),
            Block::Table(b) => self.fill_table(b),
            Block::Image(b) => self.fill_image(b),
        }
    }

    fn push(&mut self, page: usize, element: Element) {
        while self.pages.len() <= page {
            self.pages.push(Page::default());
        }
        self.pages[page].elements.push(element);
    }

    /// Page and y for a block of `height` laid out at `y`
    ///
    /// Blocks before the first table sit on the first page as laid out.
    /// Blocks after a table move down by a shared offset so they keep their
    /// relative positions, breaking to a new page when they do not fit.
    fn place(&mut self, y: f64, height: f64) -> (usize, f64) {
        let Some((cursor_page, end)) = self.cursor else {
            return (0, y);
        };

        let (mut page, mut shift) = self.flow.unwrap_or((cursor_page, (end - y).max(0.0)));
        let mut placed = y + shift;
        if placed + height > self.page.height - self.page.margin {
            page += 1;
            placed = self.page.margin;
            shift = placed - y;
        }

        let end = if page == cursor_page {
            end.max(placed + height)
        } else {
            placed + height
        };
        self.flow = Some((page, shift));
        self.cursor = Some((page, end));
        (page, placed)
    }

    fn fill_text(&mut self, block: &TextBlock) -> Result<()> {
        let text = match &block.bind {
            Some(bind) => match resolve_binding(bind, self.parameters) {
                Some(Bound::Value(value)) => value_to_string(value).map_err(binding_error)?,
                Some(_) => {
                    return Err(ExportError::BindingError(format!(
                        "'{bind}' does not bind to a value"
                    )))
                }
                None => {
                    debug!(bind, "Text binding not found");
                    String::new()
                }
            },
            None => block.text.clone().unwrap_or_default(),
        };

        if text.is_empty() {
            return Ok(());
        }

        let (page, y) = self.place(block.position.y, block.size);
        self.push(
            page,
            Element::Text(TextElement {
                x: block.position.x,
                y,
                size: block.size,
                align: block.align,
                text,
            }),
        );
        Ok(())
    }

    fn fill_image(&mut self, block: &ImageBlock) -> Result<()> {
        let image = match resolve_binding(&block.bind, self.parameters) {
            Some(Bound::Image(image)) => Arc::clone(image),
            _ => {
                return Err(ExportError::BindingError(format!(
                    "'{}' does not bind to an image",
                    block.bind
                )))
            }
        };

        let (page, y) = self.place(block.position.y, block.size.height);
        self.push(
            page,
            Element::Image(ImageElement {
                x: block.position.x,
                y,
                width: block.size.width,
                height: block.size.height,
                image_id: image.id,
                image,
            }),
        );
        Ok(())
    }

    fn fill_table(&mut self, block: &TableBlock) -> Result<()> {
        let rows = match &block.bind {
            Some(bind) => match resolve_binding(bind, self.parameters) {
                Some(Bound::Records(source)) => source,
                _ => {
                    return Err(ExportError::BindingError(format!(
                        "'{bind}' does not bind to a record source"
                    )))
                }
            },
            None => self.data_source,
        };

        let bottom = self.page.height - self.page.margin;
        let (mut page, mut y) = match self.cursor {
            Some((page, end)) => (page, block.position.y.max(end)),
            None => (0, block.position.y),
        };

        if block.header {
            if y + block.row_height > bottom {
                page += 1;
                y = self.page.margin;
            }
            self.fill_header(block, page, y);
            y += block.row_height;
        }

        for row in rows.iter() {
            if y + block.row_height > bottom {
                page += 1;
                y = self.page.margin;
                if block.header {
                    self.fill_header(block, page, y);
                    y += block.row_height;
                }
            }
            self.fill_row(block, row, page, y)?;
            y += block.row_height;
        }

        self.cursor = Some((page, y));
        self.flow = None;
        Ok(())
    }

    fn fill_header(&mut self, block: &TableBlock, page: usize, y: f64) {
        for col in &block.columns {
            self.push(
                page,
                Element::Text(TextElement {
                    x: block.position.x + col.x,
                    y,
                    size: block.size,
                    align: col.align,
                    text: col.title().to_string(),
                }),
            );
        }
    }

    fn fill_row(&mut self, block: &TableBlock, row: &Record, page: usize, y: f64) -> Result<()> {
        for col in &block.columns {
            let text = match row.get(&col.field) {
                Some(value) => value_to_string(value).map_err(binding_error)?,
                None => String::new(),
            };

            self.push(
                page,
                Element::Text(TextElement {
                    x: block.position.x + col.x,
                    y,
                    size: block.size,
                    align: col.align,
                    text,
                }),
            );
        }
        Ok(())
    }
}
