//! Standard security handler
//!
//! Authenticates a user or owner password against a document's `/Encrypt`
//! dictionary and decrypts every string and stream in place. Supported:
//! - V1/V2, revisions 2 and 3: RC4 with 40 to 128 bit keys
//! - V4, revision 4: crypt filters using RC4 (`/V2`) or AES-128 (`/AESV2`)
//! - V5, revisions 5 and 6: AES-256 (`/AESV3`)

use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};
use tracing::debug;

use crate::error::PdfOpsError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
#[cfg(any(test, feature = "test-support"))]
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// Padding string appended to short passwords (revisions 2 to 4)
pub(crate) const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// How strings or streams of a document are encrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CryptMethod {
    Identity,
    Rc4,
    AesV2,
    AesV3,
}

/// The parts of an `/Encrypt` dictionary the handler needs
#[derive(Debug, Clone)]
pub(crate) struct EncryptParams {
    pub version: i64,
    pub revision: i64,
    /// File key length in bytes
    pub key_len: usize,
    pub owner: Vec<u8>,
    pub user: Vec<u8>,
    /// `/OE`, revisions 5 and 6 only
    pub owner_key: Vec<u8>,
    /// `/UE`, revisions 5 and 6 only
    pub user_key: Vec<u8>,
    pub permissions: i32,
    pub encrypt_metadata: bool,
    pub stream_method: CryptMethod,
    pub string_method: CryptMethod,
    /// First element of the trailer `/ID`
    pub file_id: Vec<u8>,
}

fn unsupported(what: impl Into<String>) -> PdfOpsError {
    PdfOpsError::UnsupportedEncryption(what.into())
}

fn malformed(what: impl Into<String>) -> PdfOpsError {
    PdfOpsError::Decryption(what.into())
}

fn string_entry(dict: &Dictionary, key: &[u8]) -> Vec<u8> {
    match dict.get(key) {
        Ok(Object::String(bytes, _)) => bytes.clone(),
        _ => Vec::new(),
    }
}

fn integer_entry(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).and_then(Object::as_i64).ok()
}

fn crypt_filter_method(dict: &Dictionary, entry: &[u8]) -> Result<CryptMethod, PdfOpsError> {
    let name: &[u8] = match dict.get(entry) {
        Ok(Object::Name(name)) => name,
        _ => b"Identity",
    };
    if name == b"Identity" {
        return Ok(CryptMethod::Identity);
    }

    let filter = dict
        .get(b"CF")
        .and_then(Object::as_dict)
        .and_then(|filters| filters.get(name))
        .and_then(Object::as_dict)
        .map_err(|_| {
            malformed(format!(
                "crypt filter /{} is not defined",
                String::from_utf8_lossy(name)
            ))
        })?;

    match filter.get(b"CFM") {
        Err(_) => Ok(CryptMethod::Identity),
        Ok(Object::Name(method)) => match method.as_slice() {
            b"None" => Ok(CryptMethod::Identity),
            b"V2" => Ok(CryptMethod::Rc4),
            b"AESV2" => Ok(CryptMethod::AesV2),
            b"AESV3" => Ok(CryptMethod::AesV3),
            other => Err(unsupported(format!(
                "crypt filter method /{}",
                String::from_utf8_lossy(other)
            ))),
        },
        Ok(_) => Err(malformed("/CFM must be a name")),
    }
}

impl EncryptParams {
    /// Read the `/Encrypt` dictionary of `doc`, returning its object id when
    /// it is an indirect object.
    pub(crate) fn from_document(doc: &Document) -> Result<(Option<ObjectId>, Self), PdfOpsError> {
        let (id, dict) = match doc.trailer.get(b"Encrypt") {
            Ok(Object::Reference(id)) => {
                let dict = doc
                    .get_object(*id)
                    .and_then(Object::as_dict)
                    .map_err(|e| malformed(format!("unreadable /Encrypt dictionary: {}", e)))?;
                (Some(*id), dict)
            }
            Ok(Object::Dictionary(dict)) => (None, dict),
            _ => return Err(malformed("missing /Encrypt dictionary")),
        };

        let file_id = match doc.trailer.get(b"ID") {
            Ok(Object::Array(ids)) => match ids.first() {
                Some(Object::String(bytes, _)) => bytes.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok((id, Self::from_dictionary(dict, file_id)?))
    }

    fn from_dictionary(dict: &Dictionary, file_id: Vec<u8>) -> Result<Self, PdfOpsError> {
        match dict.get(b"Filter") {
            Ok(Object::Name(name)) if name == b"Standard" => {}
            Ok(Object::Name(name)) => {
                return Err(unsupported(format!(
                    "security handler /{}",
                    String::from_utf8_lossy(name)
                )))
            }
            _ => return Err(malformed("/Filter is missing")),
        }

        let version = integer_entry(dict, b"V").unwrap_or(0);
        let revision = integer_entry(dict, b"R").ok_or_else(|| malformed("/R is missing"))?;
        let permissions = integer_entry(dict, b"P").ok_or_else(|| malformed("/P is missing"))? as i32;
        let length_bits = integer_entry(dict, b"Length");
        let encrypt_metadata = !matches!(dict.get(b"EncryptMetadata"), Ok(Object::Boolean(false)));

        let (key_len, stream_method, string_method) = match version {
            1 => (5, CryptMethod::Rc4, CryptMethod::Rc4),
            2 => {
                let bits = length_bits.unwrap_or(40);
                if bits % 8 != 0 || !(40..=128).contains(&bits) {
                    return Err(malformed(format!("invalid key length {}", bits)));
                }
                (bits as usize / 8, CryptMethod::Rc4, CryptMethod::Rc4)
            }
            4 => {
                let stream_method = crypt_filter_method(dict, b"StmF")?;
                let string_method = crypt_filter_method(dict, b"StrF")?;
                let aes = [stream_method, string_method].contains(&CryptMethod::AesV2);
                let key_len = match length_bits {
                    Some(bits) if !aes && bits % 8 == 0 && (40..=128).contains(&bits) => {
                        bits as usize / 8
                    }
                    _ => 16,
                };
                (key_len, stream_method, string_method)
            }
            5 => (
                32,
                crypt_filter_method(dict, b"StmF")?,
                crypt_filter_method(dict, b"StrF")?,
            ),
            other => return Err(unsupported(format!("encryption version {}", other))),
        };

        let params = Self {
            version,
            revision,
            key_len,
            owner: string_entry(dict, b"O"),
            user: string_entry(dict, b"U"),
            owner_key: string_entry(dict, b"OE"),
            user_key: string_entry(dict, b"UE"),
            permissions,
            encrypt_metadata,
            stream_method,
            string_method,
            file_id,
        };

        match (version, revision) {
            (1..=4, 2..=4) if params.owner.len() < 32 || params.user.len() < 32 => {
                Err(malformed("/O and /U must be 32 bytes"))
            }
            (1..=4, 2..=4) => Ok(params),
            (5, 5 | 6) if params.owner.len() < 48 || params.user.len() < 48 => {
                Err(malformed("/O and /U must be 48 bytes"))
            }
            (5, 5 | 6) => Ok(params),
            (v, r) => Err(unsupported(format!("version {} revision {}", v, r))),
        }
    }
}

/// An authenticated handler holding the file key
pub(crate) struct SecurityHandler {
    params: EncryptParams,
    file_key: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Decrypt,
    #[cfg(any(test, feature = "test-support"))]
    Encrypt,
}

impl SecurityHandler {
    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn new(params: EncryptParams, file_key: Vec<u8>) -> Self {
        Self { params, file_key }
    }

    /// Derive the file key from `password`, tried first as the user password
    /// and then as the owner password.
    pub(crate) fn authenticate(params: EncryptParams, password: &[u8]) -> Result<Self, PdfOpsError> {
        let file_key = match params.revision {
            2..=4 => match check_user_password(&params, password) {
                Some(key) => key,
                None => {
                    let user_password = recover_user_password(&params, password);
                    check_user_password(&params, &user_password)
                        .ok_or(PdfOpsError::InvalidPassword)?
                }
            },
            _ => aes256_file_key(&params, password)?,
        };

        Ok(Self { params, file_key })
    }

    /// Encrypt or decrypt every string and stream inside `object`.
    pub(crate) fn apply(
        &self,
        object: &mut Object,
        id: ObjectId,
        direction: Direction,
    ) -> Result<(), PdfOpsError> {
        match object {
            Object::String(bytes, _) => {
                let out = self.transform(self.params.string_method, id, bytes, direction)?;
                *bytes = out;
            }
            Object::Array(items) => {
                for item in items.iter_mut() {
                    self.apply(item, id, direction)?;
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.iter_mut() {
                    self.apply(value, id, direction)?;
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    self.apply(value, id, direction)?;
                }
                if self.stream_is_encrypted(stream) {
                    let out =
                        self.transform(self.params.stream_method, id, &stream.content, direction)?;
                    stream.set_content(out);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn stream_is_encrypted(&self, stream: &Stream) -> bool {
        match stream.dict.get(b"Type") {
            Ok(Object::Name(name)) if name == b"XRef" => false,
            Ok(Object::Name(name)) if name == b"Metadata" => self.params.encrypt_metadata,
            _ => true,
        }
    }

    fn transform(
        &self,
        method: CryptMethod,
        id: ObjectId,
        data: &[u8],
        direction: Direction,
    ) -> Result<Vec<u8>, PdfOpsError> {
        let key = object_key(&self.file_key, method, id);
        match (method, direction) {
            (CryptMethod::Identity, _) => Ok(data.to_vec()),
            (CryptMethod::Rc4, _) => Ok(rc4(&key, data)),
            (CryptMethod::AesV2 | CryptMethod::AesV3, Direction::Decrypt) => aes_cbc_decrypt(&key, data),
            #[cfg(any(test, feature = "test-support"))]
            (CryptMethod::AesV2 | CryptMethod::AesV3, Direction::Encrypt) => {
                let mut iv = [0u8; 16];
                iv.copy_from_slice(&Md5::digest(data));
                aes_cbc_encrypt(&key, &iv, data)
            }
        }
    }
}

/// Decrypt `doc` in place with `password` and drop its `/Encrypt` entry.
///
/// Returns `false` for documents that were not encrypted.
pub(crate) fn unlock(doc: &mut Document, password: &[u8]) -> Result<bool, PdfOpsError> {
    if !doc.is_encrypted() {
        return Ok(false);
    }

    let (encrypt_id, params) = EncryptParams::from_document(doc)?;
    debug!(
        version = params.version,
        revision = params.revision,
        key_bits = params.key_len * 8,
        stream_method = ?params.stream_method,
        "Authenticating encrypted document"
    );
    let handler = SecurityHandler::authenticate(params, password)?;

    for (&id, object) in doc.objects.iter_mut() {
        if Some(id) == encrypt_id {
            continue;
        }
        handler.apply(object, id, Direction::Decrypt)?;
    }

    doc.trailer.remove(b"Encrypt");
    if let Some(id) = encrypt_id {
        doc.objects.remove(&id);
    }

    Ok(true)
}

pub(crate) fn pad_password(password: &[u8]) -> [u8; 32] {
    let len = password.len().min(32);
    let mut out = PASSWORD_PAD;
    out[..len].copy_from_slice(&password[..len]);
    out[len..].copy_from_slice(&PASSWORD_PAD[..32 - len]);
    out
}

fn xor_key(key: &[u8], value: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ value).collect()
}

/// File key for revisions 2 to 4
pub(crate) fn legacy_file_key(params: &EncryptParams, password: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(&params.owner[..32]);
    hasher.update(params.permissions.to_le_bytes());
    hasher.update(&params.file_id);
    if params.revision >= 4 && !params.encrypt_metadata {
        hasher.update([0xFF; 4]);
    }

    let n = params.key_len;
    let mut digest = hasher.finalize().to_vec();
    if params.revision >= 3 {
        for _ in 0..50 {
            digest = Md5::digest(&digest[..n]).to_vec();
        }
    }
    digest.truncate(n);
    digest
}

/// Expected `/U` value for `file_key`; only the first 16 bytes are
/// significant from revision 3 on.
pub(crate) fn user_entry(params: &EncryptParams, file_key: &[u8]) -> Vec<u8> {
    if params.revision == 2 {
        return rc4(file_key, &PASSWORD_PAD);
    }

    let mut hasher = Md5::new();
    hasher.update(PASSWORD_PAD);
    hasher.update(&params.file_id);
    let mut value = rc4(file_key, &hasher.finalize());
    for i in 1..=19u8 {
        value = rc4(&xor_key(file_key, i), &value);
    }
    value
}

fn check_user_password(params: &EncryptParams, password: &[u8]) -> Option<Vec<u8>> {
    let key = legacy_file_key(params, password);
    let expected = user_entry(params, &key);
    let significant = if params.revision == 2 { 32 } else { 16 };
    (params.user[..significant] == expected[..significant]).then_some(key)
}

fn owner_rc4_key(params: &EncryptParams, owner_password: &[u8]) -> Vec<u8> {
    let mut digest = Md5::digest(pad_password(owner_password)).to_vec();
    if params.revision >= 3 {
        for _ in 0..50 {
            digest = Md5::digest(&digest).to_vec();
        }
    }
    digest.truncate(params.key_len);
    digest
}

/// Undo the `/O` computation with `owner_password`, yielding the padded user
/// password.
fn recover_user_password(params: &EncryptParams, owner_password: &[u8]) -> Vec<u8> {
    let key = owner_rc4_key(params, owner_password);
    if params.revision == 2 {
        return rc4(&key, &params.owner[..32]);
    }

    let mut value = params.owner[..32].to_vec();
    for i in (0..=19u8).rev() {
        value = rc4(&xor_key(&key, i), &value);
    }
    value
}

/// `/O` value for revisions 2 to 4
#[cfg(any(test, feature = "test-support"))]
pub(crate) fn owner_entry(params: &EncryptParams, user_password: &[u8], owner_password: &[u8]) -> Vec<u8> {
    let key = owner_rc4_key(params, owner_password);
    let mut value = rc4(&key, &pad_password(user_password));
    if params.revision >= 3 {
        for i in 1..=19u8 {
            value = rc4(&xor_key(&key, i), &value);
        }
    }
    value
}

/// Password hash for revisions 5 (single SHA-256) and 6 (iterated).
pub(crate) fn revision6_hash(
    revision: i64,
    password: &[u8],
    salt: &[u8],
    user_data: &[u8],
) -> Result<Vec<u8>, PdfOpsError> {
    let password = &password[..password.len().min(127)];

    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_data);
    let mut k = hasher.finalize().to_vec();
    if revision == 5 {
        return Ok(k);
    }

    let mut round = 0i32;
    loop {
        let mut block = Vec::with_capacity(password.len() + k.len() + user_data.len());
        block.extend_from_slice(password);
        block.extend_from_slice(&k);
        block.extend_from_slice(user_data);
        let repeated = block.repeat(64);

        let e = Aes128CbcEnc::new_from_slices(&k[..16], &k[16..32])
            .map_err(|e| malformed(e.to_string()))?
            .encrypt_padded_vec_mut::<NoPadding>(&repeated);

        // 2^8 = 1 (mod 3), so the byte sum has the same residue as the number
        k = match e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3 {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        let last = e.last().copied().unwrap_or(0) as i32;
        if round >= 64 && last <= round - 32 {
            break;
        }
    }

    k.truncate(32);
    Ok(k)
}

fn aes256_unwrap(key: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, PdfOpsError> {
    if wrapped.len() != 32 {
        return Err(malformed("/OE and /UE must be 32 bytes"));
    }
    Aes256CbcDec::new_from_slices(key, &[0u8; 16])
        .map_err(|e| malformed(e.to_string()))?
        .decrypt_padded_vec_mut::<NoPadding>(wrapped)
        .map_err(|e| malformed(e.to_string()))
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn aes256_wrap(key: &[u8], file_key: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new_from_slices(key, &[0u8; 16])
        .map(|cipher| cipher.encrypt_padded_vec_mut::<NoPadding>(file_key))
        .unwrap_or_default()
}

fn aes256_file_key(params: &EncryptParams, password: &[u8]) -> Result<Vec<u8>, PdfOpsError> {
    let (user, owner) = (&params.user[..48], &params.owner[..48]);
    let revision = params.revision;

    if revision6_hash(revision, password, &user[32..40], &[])?[..] == user[..32] {
        let key = revision6_hash(revision, password, &user[40..48], &[])?;
        return aes256_unwrap(&key, &params.user_key);
    }
    if revision6_hash(revision, password, &owner[32..40], user)?[..] == owner[..32] {
        let key = revision6_hash(revision, password, &owner[40..48], user)?;
        return aes256_unwrap(&key, &params.owner_key);
    }

    Err(PdfOpsError::InvalidPassword)
}

fn object_key(file_key: &[u8], method: CryptMethod, (num, generation): ObjectId) -> Vec<u8> {
    if method == CryptMethod::AesV3 {
        return file_key.to_vec();
    }

    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&num.to_le_bytes()[..3]);
    hasher.update(generation.to_le_bytes());
    if method == CryptMethod::AesV2 {
        hasher.update(b"sAlT");
    }
    let len = (file_key.len() + 5).min(16);
    hasher.finalize()[..len].to_vec()
}

/// Payload layout: 16-byte IV, then CBC ciphertext with PKCS#7 padding.
fn aes_cbc_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PdfOpsError> {
    if data.len() <= 16 {
        return Ok(Vec::new());
    }
    if data.len() % 16 != 0 {
        return Err(malformed("AES data is not a whole number of blocks"));
    }

    let (iv, body) = data.split_at(16);
    let plain = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|e| malformed(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|e| malformed(e.to_string()))?
            .decrypt_padded_vec_mut::<Pkcs7>(body),
        n => return Err(malformed(format!("AES key of {} bytes", n))),
    };
    plain.map_err(|_| malformed("bad AES padding"))
}

#[cfg(any(test, feature = "test-support"))]
fn aes_cbc_encrypt(key: &[u8], iv: &[u8; 16], data: &[u8]) -> Result<Vec<u8>, PdfOpsError> {
    let body = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|e| malformed(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|e| malformed(e.to_string()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        n => return Err(malformed(format!("AES key of {} bytes", n))),
    };
    let mut out = iv.to_vec();
    out.extend_from_slice(&body);
    Ok(out)
}

pub(crate) fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            let k = state[state[i as usize].wrapping_add(state[j as usize]) as usize];
            byte ^ k
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn legacy_params(revision: i64, key_len: usize) -> EncryptParams {
        EncryptParams {
            version: if revision == 2 { 1 } else { 2 },
            revision,
            key_len,
            owner: Vec::new(),
            user: Vec::new(),
            owner_key: Vec::new(),
            user_key: Vec::new(),
            permissions: -4,
            encrypt_metadata: true,
            stream_method: CryptMethod::Rc4,
            string_method: CryptMethod::Rc4,
            file_id: b"0123456789abcdef".to_vec(),
        }
    }

    fn protect(mut params: EncryptParams, user: &[u8], owner: &[u8]) -> (EncryptParams, Vec<u8>) {
        params.owner = owner_entry(&params, user, owner);
        let key = legacy_file_key(&params, user);
        let mut u = user_entry(&params, &key);
        u.resize(32, 0);
        params.user = u;
        (params, key)
    }

    #[test]
    fn test_rc4_known_vector() {
        // "Key" / "Plaintext" from the RC4 test vectors
        let out = rc4(b"Key", b"Plaintext");
        assert_eq!(out, vec![0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]);
    }

    #[test]
    fn test_pad_password() {
        assert_eq!(pad_password(b""), PASSWORD_PAD);
        let padded = pad_password(b"ab");
        assert_eq!(&padded[..2], b"ab");
        assert_eq!(&padded[2..], &PASSWORD_PAD[..30]);
    }

    #[test]
    fn test_user_and_owner_passwords_yield_same_key() {
        for (revision, key_len) in [(2, 5), (3, 16), (4, 16)] {
            let (params, key) = protect(legacy_params(revision, key_len), b"user", b"owner");

            let as_user = SecurityHandler::authenticate(params.clone(), b"user").unwrap();
            let as_owner = SecurityHandler::authenticate(params.clone(), b"owner").unwrap();
            assert_eq!(as_user.file_key, key);
            assert_eq!(as_owner.file_key, key);

            assert!(matches!(
                SecurityHandler::authenticate(params, b"neither"),
                Err(PdfOpsError::InvalidPassword)
            ));
        }
    }

    #[test]
    fn test_aes_roundtrip_through_handler() {
        let mut params = legacy_params(4, 16);
        params.version = 4;
        params.stream_method = CryptMethod::AesV2;
        params.string_method = CryptMethod::AesV2;
        let handler = SecurityHandler::new(params, vec![7; 16]);

        let mut object = Object::String(b"hello aes".to_vec(), lopdf::StringFormat::Literal);
        handler.apply(&mut object, (4, 0), Direction::Encrypt).unwrap();
        match &object {
            // IV plus one padded block
            Object::String(bytes, _) => assert_eq!(bytes.len(), 32),
            other => panic!("unexpected {:?}", other),
        }

        handler.apply(&mut object, (4, 0), Direction::Decrypt).unwrap();
        match object {
            Object::String(bytes, _) => assert_eq!(bytes, b"hello aes".to_vec()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_revision6_hash_is_deterministic_and_salted() {
        let a = revision6_hash(6, b"pw", b"saltsalt", &[]).unwrap();
        let b = revision6_hash(6, b"pw", b"saltsalt", &[]).unwrap();
        let c = revision6_hash(6, b"pw", b"pepper!!", &[]).unwrap();
        assert_eq!(a.len(), 32);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_aes256_wrap_unwrap() {
        let kek = [3u8; 32];
        let file_key: Vec<u8> = (0..32).collect();
        let wrapped = aes256_wrap(&kek, &file_key);
        assert_eq!(aes256_unwrap(&kek, &wrapped).unwrap(), file_key);
    }

    #[test]
    fn test_truncated_aes_payload_is_error() {
        assert!(aes_cbc_decrypt(&[1; 16], &[0; 20]).is_err());
        assert!(aes_cbc_decrypt(&[1; 16], &[0; 16]).unwrap().is_empty());
    }

    #[test]
    fn test_public_key_handler_is_unsupported() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"Adobe.PubSec".to_vec()));
        dict.set("V", Object::Integer(4));
        dict.set("R", Object::Integer(4));
        dict.set("P", Object::Integer(-4));

        let err = EncryptParams::from_dictionary(&dict, Vec::new()).unwrap_err();
        assert!(matches!(err, PdfOpsError::UnsupportedEncryption(_)));
    }
}
