//! Embedded TrueType fonts for PDF export

use crate::{ExportError, Result};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use subsetter::GlyphRemapper;
use ttf_parser::{Face, GlyphId};

/// A TrueType font embedded into exported PDFs
///
/// Text drawn with an embedded font is written as glyph ids through a
/// Type0 / Identity-H font, so any script the font covers prints.
#[derive(Clone)]
pub struct EmbeddedFont {
    name: String,
    data: Vec<u8>,
}

impl fmt::Debug for EmbeddedFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl EmbeddedFont {
    /// Create a font from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier, used as the PDF base font name
    /// * `data` - TrueType font file bytes
    pub fn from_ttf(name: &str, data: Vec<u8>) -> Result<Self> {
        Face::parse(&data, 0).map_err(|e| ExportError::FontError(format!("{name}: {e:?}")))?;

        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        Ok(Self { name, data })
    }

    /// Load a font file, named after its file stem
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Embedded");
        Self::from_ttf(name, data)
    }

    /// Font identifier
    pub fn name(&self) -> &str {
        &self.name
    }

    fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, 0).map_err(|e| ExportError::FontError(format!("{e:?}")))
    }

    /// Build the subset covering `chars`
    ///
    /// Characters the font has no glyph for map to `.notdef`.
    pub fn subset<I>(&self, chars: I) -> Result<FontSubset>
    where
        I: IntoIterator<Item = char>,
    {
        let face = self.face()?;
        let chars: BTreeSet<char> = chars.into_iter().collect();

        let mut remapper = GlyphRemapper::new();
        let mut glyphs = BTreeMap::new();
        let mut widths = BTreeMap::new();
        let scale = 1000.0 / f64::from(face.units_per_em());

        for c in chars {
            let old = face.glyph_index(c).unwrap_or(GlyphId(0));
            let new = remapper.remap(old.0);
            let advance = face.glyph_hor_advance(old).unwrap_or(0);
            glyphs.insert(c, new);
            widths.insert(new, (f64::from(advance) * scale).round() as i64);
        }

        let data = subsetter::subset(&self.data, 0, &remapper)
            .map_err(|e| ExportError::FontError(format!("{}: {e:?}", self.name)))?;

        Ok(FontSubset {
            base_font: format!("RPTSUB+{}", self.name),
            data,
            glyphs,
            widths,
            ascent: (f64::from(face.ascender()) * scale).round() as i64,
            descent: (f64::from(face.descender()) * scale).round() as i64,
        })
    }
}

/// Glyph subset of an embedded font for one document
#[derive(Debug, Clone)]
pub struct FontSubset {
    base_font: String,
    data: Vec<u8>,
    /// char -> remapped glyph id
    glyphs: BTreeMap<char, u16>,
    /// remapped glyph id -> advance in 1/1000 em
    widths: BTreeMap<u16, i64>,
    ascent: i64,
    descent: i64,
}

impl FontSubset {
    fn glyph(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    /// Hex string of remapped glyph ids for the `Tj` operator
    pub fn encode_hex(&self, text: &str) -> String {
        text.chars().map(|c| format!("{:04X}", self.glyph(c))).collect()
    }

    /// Advance width of `text` in points
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: i64 = text
            .chars()
            .map(|c| self.widths.get(&self.glyph(c)).copied().unwrap_or(0))
            .sum();
        units as f64 * size / 1000.0
    }

    /// Add the Type0 font and its descendants to `doc`
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let font_file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        ));

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.base_font.clone().into_bytes()),
            "Flags" => 4,
            "FontBBox" => vec![0.into(), self.descent.into(), 1000.into(), self.ascent.into()],
            "ItalicAngle" => 0,
            "Ascent" => self.ascent,
            "Descent" => self.descent,
            "CapHeight" => self.ascent,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut w: Vec<Object> = Vec::with_capacity(self.widths.len() * 2);
        for (gid, width) in &self.widths {
            w.push(i64::from(*gid).into());
            w.push(Object::Array(vec![(*width).into()]));
        }

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(self.base_font.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "W" => w,
            "DW" => 1000,
        });

        let to_unicode_id =
            doc.add_object(Stream::new(dictionary! {}, self.to_unicode_cmap().into_bytes()));

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(self.base_font.clone().into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        })
    }

    /// ToUnicode CMap mapping remapped glyph ids back to characters
    fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );

        let mapped: Vec<(u16, char)> = self
            .glyphs
            .iter()
            .filter(|(_, gid)| **gid != 0)
            .map(|(c, gid)| (*gid, *c))
            .collect();

        for chunk in mapped.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut units = [0u16; 2];
                let hex: String = c
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{hex}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap
    }
}
