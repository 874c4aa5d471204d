/// TrueType font embedding for PDF text
///
/// Text is written as two-byte glyph ids (Identity-H) of a Type0 font whose
/// descendant is the embedded TrueType file. The width table and the
/// ToUnicode map cover the glyphs actually used, so Cyrillic well names and
/// study headers print as written and stay searchable.

use ab_glyph::{Font, GlyphId};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

use crate::render::text::LabelFont;

/// Glyph space units per em in PDF font metrics
const PDF_EM: f32 = 1000.0;
/// A bfchar block may hold at most 100 entries
const BFCHAR_CHUNK: usize = 100;

/// Document font built up while pages are laid out
pub struct PdfFont<'a> {
    font: &'a LabelFont,
    id: ObjectId,
    /// Font units to PDF glyph space
    scale: f32,
    /// Glyphs used so far, with the character each one was encoded from
    used: BTreeMap<u16, char>,
}

impl<'a> PdfFont<'a> {
    /// Reserve the font object in `doc`. Pages can reference it right away;
    /// the dictionary itself is written by [`PdfFont::embed`].
    pub fn new(doc: &mut Document, font: &'a LabelFont) -> Self {
        let units_per_em = font.face().units_per_em().unwrap_or(PDF_EM);
        Self {
            font,
            id: doc.new_object_id(),
            scale: PDF_EM / units_per_em,
            used: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Encode `text` as big-endian glyph ids, recording every glyph
    pub fn encode(&mut self, text: &str) -> Object {
        let face = self.font.face();
        let mut bytes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let GlyphId(gid) = face.glyph_id(c);
            self.used.entry(gid).or_insert(c);
            bytes.extend_from_slice(&gid.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    /// Advance width of `text` in points at `size`
    pub fn width(&self, text: &str, size: f32) -> f32 {
        let face = self.font.face();
        let units: f32 = text.chars().map(|c| face.h_advance_unscaled(face.glyph_id(c))).sum();
        units * self.scale / PDF_EM * size
    }

    fn glyph_width(&self, gid: u16) -> i64 {
        (self.font.face().h_advance_unscaled(GlyphId(gid)) * self.scale).round() as i64
    }

    /// Add the Type0 font and its descendant, descriptor, font file and
    /// ToUnicode objects
    pub fn embed(self, doc: &mut Document) {
        let face = self.font.face();
        let ascent = (face.ascent_unscaled() * self.scale).round() as i64;
        let descent = (face.descent_unscaled() * self.scale).round() as i64;
        let name = || Object::Name(self.font.name().as_bytes().to_vec());

        let data = self.font.data();
        let file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => data.len() as i64 },
            data.to_vec(),
        ));
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => name(),
            // Nonsymbolic
            "Flags" => 32i64,
            "FontBBox" => vec![
                Object::Integer(0),
                Object::Integer(descent),
                Object::Integer(PDF_EM as i64),
                Object::Integer(ascent),
            ],
            "ItalicAngle" => 0i64,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => ascent,
            "StemV" => 80i64,
            "FontFile2" => file_id,
        });

        let widths: Vec<Object> = self
            .used
            .keys()
            .flat_map(|&gid| [Object::Integer(gid.into()), Object::Array(vec![Object::Integer(self.glyph_width(gid))])])
            .collect();
        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => name(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0i64,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => PDF_EM as i64,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&self.used).into_bytes()));
        doc.objects.insert(
            self.id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => name(),
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![Object::Reference(descendant_id)],
                "ToUnicode" => to_unicode_id,
            }),
        );
    }
}

/// CMap from glyph ids back to Unicode (UTF-16BE)
fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
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

    let entries: Vec<(&u16, &char)> = used.iter().collect();
    for chunk in entries.chunks(BFCHAR_CHUNK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut buf = [0u16; 2];
            let units: String = c.encode_utf16(&mut buf).iter().map(|u| format!("{:04X}", u)).collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, units));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_records_glyphs() {
        let label = LabelFont::bundled().unwrap();
        let mut doc = Document::with_version("1.5");
        let mut font = PdfFont::new(&mut doc, &label);

        let Object::String(bytes, StringFormat::Hexadecimal) = font.encode("до") else {
            panic!("expected a hex string");
        };
        assert_eq!(bytes.len(), 4);
        assert_eq!(font.used.len(), 2);
        assert!(font.used.values().any(|&c| c == 'д'));
        // Both letters exist in the face
        assert!(!font.used.contains_key(&0));
    }

    #[test]
    fn test_width_scales_with_size() {
        let label = LabelFont::bundled().unwrap();
        let mut doc = Document::with_version("1.5");
        let font = PdfFont::new(&mut doc, &label);

        let small = font.width("Box 12", 9.0);
        assert!(small > 0.0);
        assert!((font.width("Box 12", 18.0) - 2.0 * small).abs() < 1e-3);
        assert_eq!(font.width("", 9.0), 0.0);
    }

    #[test]
    fn test_cmap_chunks_and_utf16() {
        let used: BTreeMap<u16, char> = (1..=150u16).map(|gid| (gid, 'a')).chain([(300, '𝄞')]).collect();
        let cmap = to_unicode_cmap(&used);

        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("51 beginbfchar"));
        assert!(cmap.contains("<012C> <D834DD1E>"));
        assert!(cmap.contains("<0001> <0061>"));
    }

    #[test]
    fn test_embed_writes_type0_font() {
        let label = LabelFont::bundled().unwrap();
        let mut doc = Document::with_version("1.5");
        let mut font = PdfFont::new(&mut doc, &label);
        font.encode("скв. 12");
        let id = font.id();
        font.embed(&mut doc);

        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name_str().unwrap(), "Type0");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name_str().unwrap(), "Identity-H");
        assert!(dict.get(b"ToUnicode").unwrap().as_reference().is_ok());
    }
}
