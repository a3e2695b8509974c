//! PDF export
//!
//! Text uses an embedded TrueType subset when a font is given. Without
//! one it falls back to the standard Helvetica font with WinAnsi encoding,
//! where only Latin-1 characters print and anything else becomes `?`.
//! Coordinates in a print job are measured from the top-left corner and
//! are flipped here (`pdf_y = page_height - y`).

use crate::dispatcher::{Element, ImageElement, Page, PrintJob, TextElement};
use crate::{Align, EmbeddedFont, ExportError, FontSubset, Result};
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use report_template::{ImageId, ImageResource};
use std::collections::BTreeMap;
use std::io::{Cursor, Write};

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::ImageError(err.to_string())
    }
}

const FONT_NAME: &str = "F1";

/// Font that page text is drawn with
enum TextFont {
    Helvetica,
    Embedded(FontSubset),
}

impl TextFont {
    fn encode_hex(&self, text: &str) -> String {
        match self {
            TextFont::Helvetica => encode_latin1(text)
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect(),
            TextFont::Embedded(subset) => subset.encode_hex(text),
        }
    }

    fn text_width(&self, text: &str, size: f64) -> f64 {
        match self {
            TextFont::Helvetica => helvetica_width(text, size),
            TextFont::Embedded(subset) => subset.text_width(text, size),
        }
    }

    fn embed(&self, doc: &mut Document) -> ObjectId {
        match self {
            TextFont::Helvetica => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
            TextFont::Embedded(subset) => subset.embed(doc),
        }
    }
}

/// Write a print job as a PDF document
pub fn write_pdf(
    job: &PrintJob,
    font: Option<&EmbeddedFont>,
    out: &mut dyn Write,
) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let text_font = match font {
        Some(font) => TextFont::Embedded(font.subset(job.texts().flat_map(str::chars))?),
        None => TextFont::Helvetica,
    };
    let font_id = text_font.embed(&mut doc);

    // One XObject per distinct image, shared by every page that draws it
    let mut images: BTreeMap<ImageId, ObjectId> = BTreeMap::new();
    for element in job.pages.iter().flat_map(|page| &page.elements) {
        if let Element::Image(image) = element {
            if !images.contains_key(&image.image_id) {
                let stream = image_xobject(&image.image)?;
                images.insert(image.image_id, doc.add_object(stream));
            }
        }
    }

    let mut xobjects = Dictionary::new();
    for (id, object_id) in &images {
        xobjects.set(image_name(*id), *object_id);
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_NAME => font_id },
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(job.pages.len());
    for page in &job.pages {
        let content = page_content(page, job.page_height, &text_font);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => job.pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), job.page_width.into(), job.page_height.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(&job.title),
        "Producer" => Object::string_literal("report-export"),
    });

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut out = out;
    doc.save_to(&mut out)
        .map_err(|e| ExportError::SaveError(e.to_string()))?;
    Ok(())
}

fn image_name(id: ImageId) -> String {
    format!("Im{id}")
}

/// PDF text string: UTF-16BE with a byte order mark
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Build the content stream for one page
fn page_content(page: &Page, page_height: f64, font: &TextFont) -> Vec<u8> {
    let mut content = Vec::new();
    for element in &page.elements {
        match element {
            Element::Text(text) => content.extend(text_operators(text, page_height, font)),
            Element::Image(image) => content.extend(image_operators(image, page_height)),
        }
    }
    content
}

/// Generate operators to draw one line of text
///
/// The element's y is the top of the line; the baseline sits one font
/// size below it.
fn text_operators(text: &TextElement, page_height: f64, font: &TextFont) -> Vec<u8> {
    let width = font.text_width(&text.text, text.size);
    let x = match text.align {
        Align::Left => text.x,
        Align::Center => text.x - width / 2.0,
        Align::Right => text.x - width,
    };
    let y = page_height - text.y - text.size;
    let hex = font.encode_hex(&text.text);

    format!(
        "BT\n/{FONT_NAME} {} Tf\n{x:.2} {y:.2} Td\n<{hex}> Tj\nET\n",
        text.size
    )
    .into_bytes()
}

/// Generate operators to draw an image XObject
fn image_operators(image: &ImageElement, page_height: f64) -> Vec<u8> {
    let name = image_name(image.image_id);
    let (x, w, h) = (image.x, image.width, image.height);
    let y = page_height - image.y - h;

    format!("q\n{w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm\n/{name} Do\nQ\n").into_bytes()
}

/// Latin-1 bytes of a string, `?` for characters outside it
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Approximate Helvetica advance width in points
fn helvetica_width(text: &str, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' | 'i' | 'j' | 'l' | 'I' => 278,
            'f' | 't' | 'r' | '(' | ')' | '-' | '/' => 333,
            'm' | 'M' | 'W' => 833,
            'w' => 722,
            'A'..='Z' => 667,
            _ => 556,
        })
        .sum();
    f64::from(units) * size / 1000.0
}

/// Convert an image resource to a PDF image XObject
///
/// JPEG data embeds as-is with DCTDecode. Everything else is decoded,
/// blended against white if it has alpha, and stored with FlateDecode.
fn image_xobject(image: &ImageResource) -> Result<Stream> {
    let reader = ImageReader::with_format(Cursor::new(&image.data), image.format);

    let (data, color_space, filter) = if image.format == ImageFormat::Jpeg {
        let color_type = reader.into_decoder()?.color_type();
        let color_space = match color_type {
            ColorType::L8 | ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };
        (image.data.clone(), color_space, "DCTDecode")
    } else {
        let decoded = reader.decode()?;
        let (raw, color_space) = flatten(&decoded);
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        (encoder.finish()?, color_space, "FlateDecode")
    };

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    };
    Ok(Stream::new(dict, data).with_compression(false))
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let alpha = alpha as f32 / 255.0;
    (channel as f32 * alpha + 255.0 * (1.0 - alpha)) as u8
}

/// Raw 8-bit samples and their color space
fn flatten(image: &DynamicImage) -> (Vec<u8>, &'static str) {
    match image.color() {
        ColorType::L8 | ColorType::L16 => (image.to_luma8().into_raw(), "DeviceGray"),
        ColorType::La8 | ColorType::La16 => {
            let gray: Vec<u8> = image
                .to_luma_alpha8()
                .pixels()
                .map(|p| blend(p[0], p[1]))
                .collect();
            (gray, "DeviceGray")
        }
        color if color.has_alpha() => {
            let rgb: Vec<u8> = image
                .to_rgba8()
                .pixels()
                .flat_map(|p| [blend(p[0], p[3]), blend(p[1], p[3]), blend(p[2], p[3])])
                .collect();
            (rgb, "DeviceRGB")
        }
        _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
    }
}
