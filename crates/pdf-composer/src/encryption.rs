//! Standard security handler encryption (V4/R4, AESV2 crypt filter).

use crate::error::ComposerError;
use log::debug;
use lopdf::encryption::crypt_filters::{Aes128CryptFilter, CryptFilter};
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions as PdfPermissions};
use lopdf::{Document, Object, StringFormat};
use std::collections::BTreeMap;
use std::sync::Arc;
use stencil_traits::{EncryptionAlgorithm, EncryptionOptions, Permissions};
use uuid::Uuid;

const CRYPT_FILTER_NAME: &[u8] = b"StdCF";

fn pdf_permissions(permissions: &Permissions) -> PdfPermissions {
    let mut granted = PdfPermissions::empty();
    if permissions.print {
        granted |= PdfPermissions::PRINTABLE;
    }
    if permissions.modify {
        granted |= PdfPermissions::MODIFIABLE;
    }
    if permissions.copy {
        granted |= PdfPermissions::COPYABLE;
    }
    if permissions.annotate {
        granted |= PdfPermissions::ANNOTABLE;
    }
    granted
}

/// Gives the document a file identifier if it has none. The standard security
/// handler derives its keys from it.
pub fn ensure_file_id(doc: &mut Document) {
    if doc.trailer.get(b"ID").is_ok() {
        return;
    }
    let id = Uuid::new_v4().as_bytes().to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id, StringFormat::Hexadecimal),
        ]),
    );
}

fn password_str(bytes: &[u8]) -> Result<&str, ComposerError> {
    std::str::from_utf8(bytes).map_err(|e| ComposerError::Encryption(format!("password is not valid text: {}", e)))
}

/// Encrypts every string and stream of `doc` in place.
pub fn encrypt_document(doc: &mut Document, options: &EncryptionOptions) -> Result<(), ComposerError> {
    if doc.is_encrypted() {
        return Err(ComposerError::Encryption("document is already encrypted".to_string()));
    }
    ensure_file_id(doc);

    let crypt_filter: Arc<dyn CryptFilter> = match options.algorithm {
        EncryptionAlgorithm::Aes128 => Arc::new(Aes128CryptFilter),
    };
    let version = EncryptionVersion::V4 {
        document: &*doc,
        encrypt_metadata: true,
        crypt_filters: BTreeMap::from([(CRYPT_FILTER_NAME.to_vec(), crypt_filter)]),
        stream_filter: CRYPT_FILTER_NAME.to_vec(),
        string_filter: CRYPT_FILTER_NAME.to_vec(),
        owner_password: password_str(&options.owner_password)?,
        user_password: password_str(&options.user_password)?,
        permissions: pdf_permissions(&options.permissions),
    };
    let state = EncryptionState::try_from(version).map_err(|e| ComposerError::Encryption(e.to_string()))?;
    doc.encrypt(&state).map_err(|e| ComposerError::Encryption(e.to_string()))?;
    debug!("Encrypted document with {:?}", options.algorithm);
    Ok(())
}
