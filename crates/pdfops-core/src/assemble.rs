//! Images to multi-page PDF
//!
//! The algorithm:
//! 1. If empty, return error
//! 2. Decode every image, aborting on the first failure
//! 3. Convert each image to the target color mode
//! 4. Emit one page per image, in input order, sized to the image at 72 dpi
//!
//! Nothing is returned until every page has been built.

use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::PdfOpsError;
use crate::flate::deflate;
use crate::modes::{convert, ColorMode, Raster};

/// Decode `bytes` as an image, sniffing the format from its content.
///
/// `index` is 1-based and only used in error messages.
pub fn decode_image(bytes: &[u8], index: usize) -> Result<DynamicImage, PdfOpsError> {
    image::load_from_memory(bytes).map_err(|e| PdfOpsError::DecodeError {
        index,
        message: e.to_string(),
    })
}

/// Build a document with one page per image.
pub fn images_to_document<I, B>(images: I, mode: ColorMode) -> Result<Document, PdfOpsError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut page_ids = Vec::new();

    for (i, bytes) in images.into_iter().enumerate() {
        let decoded = decode_image(bytes.as_ref(), i + 1)?;
        let raster = convert(&decoded, mode);
        let page_id = add_image_page(&mut doc, pages_id, &raster)?;
        page_ids.push(Object::Reference(page_id));
    }

    if page_ids.is_empty() {
        return Err(PdfOpsError::NoImages);
    }

    debug!(pages = page_ids.len(), mode = %mode, "Assembled image pages");

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(page_ids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = Dictionary::new();
    catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog_dict.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog_dict));

    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

/// Build and serialize in one step.
pub fn images_to_pdf<I, B>(images: I, mode: ColorMode) -> Result<Vec<u8>, PdfOpsError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut doc = images_to_document(images, mode)?;
    crate::save_to_vec(&mut doc)
}

fn image_stream(
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
    samples: &[u8],
) -> Result<Stream, PdfOpsError> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(bits_per_component as i64));
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

    let mut stream = Stream::new(dict, deflate(samples)?);
    // Already Flate-encoded
    stream.allows_compression = false;
    Ok(stream)
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    raster: &Raster,
) -> Result<ObjectId, PdfOpsError> {
    let (width, height) = (raster.width, raster.height);
    let mode = raster.mode;

    let mut image = image_stream(
        width,
        height,
        mode.color_space(),
        mode.bits_per_component(),
        &raster.samples,
    )?;

    if let Some(alpha) = raster.alpha.as_deref().filter(|_| mode.has_alpha()) {
        let smask = image_stream(width, height, b"DeviceGray", 8, alpha)?;
        let smask_id = doc.add_object(smask);
        image.dict.set("SMask", Object::Reference(smask_id));
    }

    let image_id = doc.add_object(image);

    let content = format!("q\n{w} 0 0 {h} 0 0 cm\n/Im0 Do\nQ\n", w = width, h = height);
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(pages_id));
    page_dict.set("Resources", Object::Dictionary(resources));
    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ]),
    );

    Ok(doc.add_object(Object::Dictionary(page_dict)))
}
