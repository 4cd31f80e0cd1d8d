//! Sample documents and images for tests
//!
//! Encrypted samples go through the crate's own security handler in the
//! encrypting direction, one profile per supported cipher.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

use crate::security::{
    aes256_wrap, legacy_file_key, owner_entry, revision6_hash, user_entry, CryptMethod, Direction,
    EncryptParams, SecurityHandler,
};

/// Permissions: everything allowed
const PERMISSIONS: i32 = -4;

const FILE_ID: &[u8; 16] = b"pdfops-fixture-0";

/// Cipher profile used by [`encrypted_pdf_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// V1 R2, 40-bit RC4
    Rc4Legacy,
    /// V2 R3, 128-bit RC4
    Rc4,
    /// V4 R4, AES-128 crypt filter
    Aes128,
    /// V5 R6, AES-256 crypt filter
    Aes256,
}

impl Protection {
    pub const ALL: [Protection; 4] = [
        Protection::Rc4Legacy,
        Protection::Rc4,
        Protection::Aes128,
        Protection::Aes256,
    ];

    fn method(&self) -> CryptMethod {
        match self {
            Protection::Rc4Legacy | Protection::Rc4 => CryptMethod::Rc4,
            Protection::Aes128 => CryptMethod::AesV2,
            Protection::Aes256 => CryptMethod::AesV3,
        }
    }

    fn params(&self) -> EncryptParams {
        let (version, revision, key_len) = match self {
            Protection::Rc4Legacy => (1, 2, 5),
            Protection::Rc4 => (2, 3, 16),
            Protection::Aes128 => (4, 4, 16),
            Protection::Aes256 => (5, 6, 32),
        };
        EncryptParams {
            version,
            revision,
            key_len,
            owner: Vec::new(),
            user: Vec::new(),
            owner_key: Vec::new(),
            user_key: Vec::new(),
            permissions: PERMISSIONS,
            encrypt_metadata: true,
            stream_method: self.method(),
            string_method: self.method(),
            file_id: FILE_ID.to_vec(),
        }
    }

    /// Fill in `/O`, `/U` (and `/OE`, `/UE`) and return the file key
    fn protect(&self, user: &[u8], owner: &[u8]) -> (EncryptParams, Vec<u8>) {
        let mut params = self.params();

        if params.revision <= 4 {
            params.owner = owner_entry(&params, user, owner);
            let key = legacy_file_key(&params, user);
            let mut user_value = user_entry(&params, &key);
            user_value.resize(32, 0);
            params.user = user_value;
            return (params, key);
        }

        let key: Vec<u8> = (0..32u8).map(|i| i.wrapping_mul(7).wrapping_add(3)).collect();
        let hash = |password: &[u8], salt: &[u8], udata: &[u8]| {
            revision6_hash(params.revision, password, salt, udata).unwrap()
        };

        let mut user_value = hash(user, b"uvsalt01", &[]);
        user_value.extend_from_slice(b"uvsalt01uksalt02");
        let user_key = aes256_wrap(&hash(user, b"uksalt02", &[]), &key);

        let mut owner_value = hash(owner, b"ovsalt03", &user_value);
        owner_value.extend_from_slice(b"ovsalt03oksalt04");
        let owner_key = aes256_wrap(&hash(owner, b"oksalt04", &user_value), &key);

        params.user = user_value;
        params.owner = owner_value;
        params.user_key = user_key;
        params.owner_key = owner_key;
        (params, key)
    }

    fn encrypt_dictionary(&self, params: &EncryptParams) -> Dictionary {
        let hex = |bytes: &[u8]| Object::String(bytes.to_vec(), StringFormat::Hexadecimal);

        let mut encrypt = Dictionary::new();
        encrypt.set("Filter", Object::Name(b"Standard".to_vec()));
        encrypt.set("V", Object::Integer(params.version));
        encrypt.set("R", Object::Integer(params.revision));
        encrypt.set("Length", Object::Integer(params.key_len as i64 * 8));
        encrypt.set("O", hex(&params.owner));
        encrypt.set("U", hex(&params.user));
        encrypt.set("P", Object::Integer(params.permissions as i64));

        if params.version >= 4 {
            let cfm: &[u8] = match self.method() {
                CryptMethod::AesV3 => b"AESV3",
                CryptMethod::AesV2 => b"AESV2",
                _ => b"V2",
            };
            let mut filter = Dictionary::new();
            filter.set("CFM", Object::Name(cfm.to_vec()));
            filter.set("AuthEvent", Object::Name(b"DocOpen".to_vec()));
            filter.set("Length", Object::Integer(params.key_len as i64));
            let mut filters = Dictionary::new();
            filters.set("StdCF", Object::Dictionary(filter));

            encrypt.set("CF", Object::Dictionary(filters));
            encrypt.set("StmF", Object::Name(b"StdCF".to_vec()));
            encrypt.set("StrF", Object::Name(b"StdCF".to_vec()));
        }
        if params.version >= 5 {
            encrypt.set("OE", hex(&params.owner_key));
            encrypt.set("UE", hex(&params.user_key));
        }
        encrypt
    }
}

/// Create a simple document with N pages containing identifiable text
pub fn sample_document(num_pages: u32, content_prefix: &str) -> Document {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font_dict));

    let mut page_ids = Vec::new();

    for page_num in 0..num_pages {
        let content = format!(
            "BT /F1 12 Tf 50 700 Td ({}-Page-{}) Tj ET",
            content_prefix,
            page_num + 1
        );
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );

        let page_id = doc.add_object(Object::Dictionary(page_dict));
        page_ids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(num_pages as i64));
    pages_dict.set("Kids", Object::Array(page_ids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = Dictionary::new();
    catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog_dict.set("Pages", Object::Reference(pages_id));
    doc.objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc
}

/// Serialized [`sample_document`]
pub fn sample_pdf(num_pages: u32, content_prefix: &str) -> Vec<u8> {
    save(&mut sample_document(num_pages, content_prefix))
}

/// [`sample_pdf`] protected with `user_password` / `owner_password`
/// using 40-bit RC4
pub fn encrypted_pdf(
    num_pages: u32,
    content_prefix: &str,
    user_password: &str,
    owner_password: &str,
) -> Vec<u8> {
    encrypted_pdf_with(
        num_pages,
        content_prefix,
        user_password,
        owner_password,
        Protection::Rc4Legacy,
    )
}

/// [`sample_pdf`] with an `/Info` title, protected with `protection`
pub fn encrypted_pdf_with(
    num_pages: u32,
    content_prefix: &str,
    user_password: &str,
    owner_password: &str,
    protection: Protection,
) -> Vec<u8> {
    let mut doc = sample_document(num_pages, content_prefix);

    let mut info = Dictionary::new();
    info.set(
        "Title",
        Object::String(
            format!("{} title", content_prefix).into_bytes(),
            StringFormat::Literal,
        ),
    );
    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));

    let (params, key) = protection.protect(user_password.as_bytes(), owner_password.as_bytes());
    let encrypt = protection.encrypt_dictionary(&params);

    let handler = SecurityHandler::new(params, key);
    for (&id, object) in doc.objects.iter_mut() {
        handler.apply(object, id, Direction::Encrypt).unwrap();
    }

    let encrypt_id = doc.add_object(Object::Dictionary(encrypt));
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
            Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal),
        ]),
    );

    save(&mut doc)
}

/// Encode a solid-color RGB image
pub fn sample_image(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    encode(&img, format)
}

/// Encode a solid-color RGBA image as PNG
pub fn sample_rgba_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)));
    encode(&img, ImageFormat::Png)
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pdf_loads() {
        let doc = Document::load_mem(&sample_pdf(3, "X")).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_encrypted_pdf_is_marked_encrypted() {
        for protection in Protection::ALL {
            let doc = Document::load_mem(&encrypted_pdf_with(1, "X", "u", "o", protection)).unwrap();
            assert!(doc.is_encrypted(), "{:?}", protection);
        }
    }
}
