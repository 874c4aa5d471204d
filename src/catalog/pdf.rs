/// PDF output for catalogs
///
/// One title page, then one page per box. Each box page is a four column
/// grid (sample numbers, figures, studies, reference scale) with rows for
/// the box label and interval text, the sample block and top depth, the
/// figure strip, and the bottom depth. Figures are printed at a fixed
/// physical height; the row only shrinks when the text above it leaves no
/// room.
///
/// Text is set in the label font, embedded as a Type0 font.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use super::document::{BoxSection, Catalog};
use super::font::PdfFont;
use crate::error::{CatalogError, CatalogResult};
use crate::render::encode::EncodedImage;
use crate::render::text::LabelFont;
use crate::state::config::PageLayout;

const PT_PER_CM: f32 = 72.0 / 2.54;
/// Relative column widths: sample numbers, figures, studies, reference scale
const COLUMN_WEIGHTS: [f32; 4] = [0.9, 3.5, 4.0, 0.5];
const FIGURE_GAP_CM: f32 = 0.15;
const ROW_PADDING_CM: f32 = 0.2;
const LEADING: f32 = 1.25;
const TITLE_SIZE: f32 = 16.0;

/// Resource name of the text font
const FONT: &str = "F1";

/// Renders a finished catalog into a document format
pub trait DocumentWriter {
    /// File extension of the produced documents
    fn extension(&self) -> &'static str;

    fn write(&self, catalog: &Catalog, out: &mut dyn Write) -> CatalogResult<()>;
}

/// Paginated PDF writer
#[derive(Debug, Clone)]
pub struct PdfWriter {
    page: PageLayout,
    font: LabelFont,
}

impl PdfWriter {
    pub fn new(page: PageLayout, font: LabelFont) -> Self {
        Self { page, font }
    }

    fn width(&self) -> f32 {
        self.page.page_width_cm * PT_PER_CM
    }

    fn height(&self) -> f32 {
        self.page.page_height_cm * PT_PER_CM
    }

    fn margin(&self) -> f32 {
        self.page.margin_cm * PT_PER_CM
    }

    fn leading(&self) -> f32 {
        self.page.font_size_pt * LEADING
    }

    /// Left edge and width of each grid column
    fn columns(&self) -> [(f32, f32); 4] {
        let usable = self.width() - 2.0 * self.margin();
        let total: f32 = COLUMN_WEIGHTS.iter().sum();
        let mut x = self.margin();
        COLUMN_WEIGHTS.map(|weight| {
            let width = usable * weight / total;
            let column = (x, width);
            x += width;
            column
        })
    }

    fn title_page(&self, catalog: &Catalog, font: &mut PdfFont) -> PageContent {
        let mut page = PageContent::new(self.height());
        let x = self.margin();
        let text_width = self.width() - 2.0 * self.margin();
        let mut y = self.margin() + TITLE_SIZE;

        for line in wrap(&catalog.title, text_width, |s| font.width(s, TITLE_SIZE)) {
            page.text(font, TITLE_SIZE, x, y, &line);
            y += TITLE_SIZE * LEADING;
        }

        y += self.leading();
        let size = self.page.font_size_pt;
        let paragraph = catalog.intro.join(" ");
        for line in wrap(&paragraph, text_width, |s| font.width(s, size)) {
            page.text(font, size, x, y, &line);
            y += self.leading();
        }
        page
    }

    fn section_page(
        &self,
        section: &BoxSection,
        images: &mut ImageRegistry,
        font: &mut PdfFont,
        doc: &mut Document,
    ) -> PageContent {
        let mut page = PageContent::new(self.height());
        let size = self.page.font_size_pt;
        let leading = self.leading();
        let padding = ROW_PADDING_CM * PT_PER_CM;
        let cols = self.columns();
        let mut y = self.margin();

        // Row 1: label | interval and recovery lines
        page.text(font, size, cols[0].0, y + size, &section.label);
        for (i, line) in section.interval_lines.iter().enumerate() {
            page.text(font, size, cols[1].0, y + size + i as f32 * leading, line);
        }
        y += section.interval_lines.len().max(1) as f32 * leading + padding;

        // Row 2: sample numbers | top depth | studies
        let empty = Vec::new();
        let (numbers, studies) = section
            .samples
            .as_ref()
            .map_or((&empty, &empty), |block| (&block.numbers, &block.studies));
        page.text(font, size, cols[0].0, y + size, "Sample numbers:");
        for (i, line) in numbers.iter().enumerate() {
            page.text(font, size, cols[0].0, y + size + (i + 1) as f32 * leading, line);
        }
        page.text(font, size, cols[1].0, y + size, &section.top);
        page.text(font, size, cols[2].0, y + size, "Studies:");
        for (i, line) in studies.iter().enumerate() {
            page.text(font, size, cols[2].0, y + size + (i + 1) as f32 * leading, line);
        }
        y += (1 + numbers.len().max(studies.len())) as f32 * leading + padding;

        // Row 3: figures, bottom aligned, reference scale flush right
        let bottom_row = leading + padding;
        let available = self.height() - self.margin() - bottom_row - y;
        let nominal = self.page.figure_height_cm * PT_PER_CM;
        let mut scale = (available / nominal).clamp(0.1, 1.0);

        let gap = FIGURE_GAP_CM * PT_PER_CM;
        let ref_image = &section.reference_scale;
        let ref_width = |s: f32| nominal * s * ref_image.aspect();
        let strip_width = |s: f32| -> f32 {
            section
                .figures
                .iter()
                .map(|f| f.height_cm(&self.page) * PT_PER_CM * s * f.image().aspect() + gap)
                .sum()
        };
        let region = self.width() - self.margin() - cols[1].0;
        let needed = strip_width(scale) + ref_width(scale);
        if needed > region && needed > 0.0 {
            scale *= region / needed;
        }
        if scale < 1.0 {
            debug!("Box {}: figures scaled to {:.0}%", section.box_id, scale * 100.0);
        }

        let row_height = nominal * scale;
        let baseline = y + row_height;
        let mut x = cols[1].0;
        for figure in &section.figures {
            let image = figure.image();
            let height = figure.height_cm(&self.page) * PT_PER_CM * scale;
            let width = height * image.aspect();
            let xobject = match figure.shared() {
                Some(shared) => images.shared(doc, shared),
                None => images.owned(doc, image),
            };
            page.image(xobject, x, baseline, width, height);
            x += width + gap;
        }

        let xobject = images.shared(doc, ref_image);
        let ref_w = ref_width(scale);
        page.image(xobject, self.width() - self.margin() - ref_w, baseline, ref_w, row_height);

        // Row 4: bottom depth
        page.text(font, size, cols[1].0, baseline + padding + size, &section.bottom);
        page
    }
}

impl DocumentWriter for PdfWriter {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn write(&self, catalog: &Catalog, out: &mut dyn Write) -> CatalogResult<()> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut font = PdfFont::new(&mut doc, &self.font);
        let fonts = dictionary! {
            FONT => font.id(),
        };

        let mut images = ImageRegistry::default();
        let mut page_ids: Vec<Object> = Vec::with_capacity(catalog.len() + 1);

        let title = self.title_page(catalog, &mut font);
        page_ids.push(title.finish(&mut doc, pages_id, &fonts)?.into());
        for section in &catalog.sections {
            let page = self.section_page(section, &mut images, &mut font, &mut doc);
            page_ids.push(page.finish(&mut doc, pages_id, &fonts)?.into());
        }
        font.embed(&mut doc);

        let count = page_ids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), real(self.width()), real(self.height())],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => text_string(&catalog.title),
            "Producer" => Object::string_literal(concat!("core-catalog ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string()),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(CatalogError::DocumentWrite)?;
        out.write_all(&bytes).map_err(CatalogError::DocumentWrite)?;

        info!("📄 PDF written: {} pages, {} images, {} KB", count, images.len(), bytes.len() / 1024);
        Ok(())
    }
}

/// PDF text string in UTF-16BE with a byte order mark
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// An embedded image: resource name and object id
type XObject = (u32, ObjectId);

/// Embedded image XObjects of a document. Shared assets are embedded once.
#[derive(Default)]
struct ImageRegistry {
    count: u32,
    shared: HashMap<usize, XObject>,
}

impl ImageRegistry {
    fn len(&self) -> usize {
        self.count as usize
    }

    fn owned(&mut self, doc: &mut Document, image: &EncodedImage) -> XObject {
        self.count += 1;
        (self.count, doc.add_object(image_stream(image)))
    }

    fn shared(&mut self, doc: &mut Document, image: &Arc<EncodedImage>) -> XObject {
        let key = Arc::as_ptr(image) as usize;
        if let Some(xobject) = self.shared.get(&key) {
            return *xobject;
        }
        let xobject = self.owned(doc, image);
        self.shared.insert(key, xobject);
        xobject
    }
}

fn xobject_name(number: u32) -> String {
    format!("Im{}", number)
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn image_stream(image: &EncodedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        image.bytes.clone(),
    )
    .with_compression(false)
}

/// Content operations of one page, positioned from the top-left corner
struct PageContent {
    page_height: f32,
    operations: Vec<Operation>,
    images: Vec<XObject>,
}

impl PageContent {
    fn new(page_height: f32) -> Self {
        Self {
            page_height,
            operations: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Draw one line of text with its baseline `baseline` points below the top
    fn text(&mut self, font: &mut PdfFont, size: f32, x: f32, baseline: f32, text: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT.into(), real(size)]),
            Operation::new("Td", vec![real(x), real(self.page_height - baseline)]),
            Operation::new("Tj", vec![font.encode(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Place an image with its bottom edge `bottom` points below the top
    fn image(&mut self, xobject: XObject, x: f32, bottom: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    real(height),
                    real(x),
                    real(self.page_height - bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(xobject_name(xobject.0).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        if !self.images.contains(&xobject) {
            self.images.push(xobject);
        }
    }

    fn finish(self, doc: &mut Document, pages_id: ObjectId, fonts: &Dictionary) -> CatalogResult<ObjectId> {
        let content = Content {
            operations: self.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut xobjects = Dictionary::new();
        for (number, id) in self.images {
            xobjects.set(xobject_name(number), id);
        }

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => fonts.clone(),
                "XObject" => xobjects,
            },
        }))
    }
}

/// Greedy word wrap to `max_width` as measured by `measure`
fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
