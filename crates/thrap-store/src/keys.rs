//! Key-space layout.
//!
//! ```text
//! <prefix><namespace>/objects/<digest-bytes>   -> serialized object or header
//! <prefix><namespace>/refs/<name>              -> digest of the head header
//! ```
//!
//! The prefix always ends with `/`. Namespaces cannot contain `/`, so the
//! `objects/` and `refs/` segments of different namespaces never alias.

use thrap_core::Digest;

const OBJECTS: &str = "objects/";
const REFS: &str = "refs/";

/// Builds engine keys for one store instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Create a key space under `prefix`, appending `/` if missing.
    pub fn new(prefix: &str) -> Self {
        let mut prefix = prefix.to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }

    /// The root prefix, always `/`-terminated.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix shared by every object key in a namespace.
    pub fn objects_prefix(&self, namespace: &str) -> Vec<u8> {
        format!("{}{}/{}", self.prefix, namespace, OBJECTS).into_bytes()
    }

    /// Key of the object with the given digest.
    pub fn object_key(&self, namespace: &str, digest: &Digest) -> Vec<u8> {
        let mut key = self.objects_prefix(namespace);
        key.extend_from_slice(digest.as_bytes());
        key
    }

    /// Prefix shared by every ref pointer in a namespace.
    pub fn refs_prefix(&self, namespace: &str) -> Vec<u8> {
        format!("{}{}/{}", self.prefix, namespace, REFS).into_bytes()
    }

    /// Key of a ref pointer.
    pub fn ref_key(&self, namespace: &str, name: &str) -> Vec<u8> {
        let mut key = self.refs_prefix(namespace);
        key.extend_from_slice(name.as_bytes());
        key
    }

    /// Printable form of an object key (digest in hex).
    pub fn object_label(&self, namespace: &str, digest: &Digest) -> String {
        format!("{}{}/{}{}", self.prefix, namespace, OBJECTS, digest.to_hex())
    }

    /// Printable form of a ref key.
    pub fn ref_label(&self, namespace: &str, name: &str) -> String {
        format!("{}{}/{}{}", self.prefix, namespace, REFS, name)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("thrap/")
    }
}
