//! The ref layer: named, mutable pointers to the head of a header chain.
//!
//! Each ref `(namespace, name)` stores the digest of its newest
//! [`ChainHeader`]. Headers are objects in the same namespace and link
//! backwards through `previous` until the genesis header, whose `previous`
//! is the zero digest.
//!
//! ```text
//! refs/app1 ──► H2 { height: 2 } ──► H1 { height: 1 } ──► H0 { height: 0 } ──► 0x00..00
//! ```
//!
//! Every operation that checks and then writes runs in one engine
//! transaction. Whether an append must extend the current head is decided
//! by the [`AppendPolicy`].

use thrap_core::{
    validate_namespace, validate_ref_name, Blake3Digester, CborCodec, ChainHeader, Codec, Digest,
    Digester,
};

use crate::config::{AppendPolicy, StoreConfig};
use crate::error::{Result, StoreError};
use crate::objects::ObjectStore;
use crate::traits::{KvEngine, ReadTxn};

/// Hash-chained refs built on an [`ObjectStore`].
pub struct RefStore<E, D = Blake3Digester, C = CborCodec> {
    objects: ObjectStore<E, D, C>,
    policy: AppendPolicy,
}

impl<E: KvEngine> RefStore<E> {
    /// Blake3 digests, CBOR encoding, default prefix, strict appends.
    pub fn new(engine: E) -> Self {
        Self::with_parts(engine, Blake3Digester, CborCodec, &StoreConfig::default())
    }
}

impl<E, D, C> RefStore<E, D, C>
where
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    pub fn with_parts(engine: E, digester: D, codec: C, config: &StoreConfig) -> Self {
        Self {
            objects: ObjectStore::with_parts(engine, digester, codec, config),
            policy: config.append_policy,
        }
    }

    /// The object layer this store writes headers into.
    ///
    /// Payloads referenced by `data_digest` live here too.
    pub fn objects(&self) -> &ObjectStore<E, D, C> {
        &self.objects
    }

    pub fn policy(&self) -> AppendPolicy {
        self.policy
    }

    /// The "no predecessor" sentinel for this store's hash function.
    pub fn zero_digest(&self) -> Digest {
        self.objects.digester().zero_digest()
    }

    /// Create a ref pointing at a fresh genesis header.
    ///
    /// Fails with [`StoreError::RefExists`] if the ref already has a pointer.
    pub fn create_ref(&self, namespace: &str, name: &str) -> Result<(Digest, ChainHeader)> {
        validate(namespace, name)?;
        let header = ChainHeader::genesis(self.objects.digester().output_len());
        let ref_key = self.objects.keys().ref_key(namespace, name);

        let digest = self.objects.engine().update(|txn| {
            if txn.contains(&ref_key)? {
                return Err(StoreError::RefExists {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            let digest = self.objects.store_in(&mut *txn, namespace, &header)?;
            txn.set(&ref_key, digest.as_bytes())?;
            Ok(digest)
        })?;

        tracing::debug!(namespace, name, digest = %digest, "created ref");
        Ok((digest, header))
    }

    /// Create a ref whose first header already carries `data_digest`.
    ///
    /// The genesis header, the height-1 header, and the pointer are written
    /// in one transaction, so the ref either does not exist afterwards or
    /// points at the new header. Fails with [`StoreError::RefExists`] if the
    /// ref already has a pointer.
    pub fn create_ref_with_data(
        &self,
        namespace: &str,
        name: &str,
        data_digest: Digest,
    ) -> Result<(Digest, ChainHeader)> {
        validate(namespace, name)?;
        let genesis = ChainHeader::genesis(self.objects.digester().output_len());
        let ref_key = self.objects.keys().ref_key(namespace, name);

        let (digest, header) = self.objects.engine().update(|txn| {
            if txn.contains(&ref_key)? {
                return Err(StoreError::RefExists {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            let previous = self.objects.store_in(&mut *txn, namespace, &genesis)?;
            let mut header = ChainHeader::new(previous, data_digest);
            header.height = next_height(namespace, name, &genesis)?;
            let digest = self.objects.store_in(&mut *txn, namespace, &header)?;
            txn.set(&ref_key, digest.as_bytes())?;
            Ok((digest, header))
        })?;

        tracing::debug!(namespace, name, digest = %digest, "created ref with data");
        Ok((digest, header))
    }

    /// Append `header` to a ref and move the pointer to it.
    ///
    /// `header.previous` must name a stored chain header, otherwise this
    /// fails with [`StoreError::ObjectNotFound`] and nothing changes. Under
    /// [`AppendPolicy::Strict`] it must also be the ref's current head
    /// ([`StoreError::HeadMismatch`] otherwise). The height is always
    /// recomputed as the predecessor's height plus one; a predecessor already
    /// at `u64::MAX` is reported as [`StoreError::BrokenChain`]. The
    /// timestamp is kept as given.
    pub fn set_ref(
        &self,
        namespace: &str,
        name: &str,
        header: ChainHeader,
    ) -> Result<(Digest, ChainHeader)> {
        validate(namespace, name)?;
        let ref_key = self.objects.keys().ref_key(namespace, name);

        let (digest, header) = self.objects.engine().update(move |txn| {
            let mut header = header;
            let predecessor: ChainHeader =
                self.objects.load_in(&*txn, namespace, &header.previous)?;

            if self.policy == AppendPolicy::Strict {
                let current = self
                    .read_head(&*txn, namespace, name)?
                    .ok_or_else(|| ref_not_found(namespace, name))?;
                if current != header.previous {
                    return Err(StoreError::HeadMismatch {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                        current,
                        previous: header.previous.clone(),
                    });
                }
            }

            header.height = next_height(namespace, name, &predecessor)?;
            let digest = self.objects.store_in(&mut *txn, namespace, &header)?;
            txn.set(&ref_key, digest.as_bytes())?;
            Ok((digest, header))
        })?;

        tracing::debug!(
            namespace,
            name,
            height = header.height,
            digest = %digest,
            "appended to ref"
        );
        Ok((digest, header))
    }

    /// The head header of a ref and its digest.
    pub fn get_ref(&self, namespace: &str, name: &str) -> Result<(ChainHeader, Digest)> {
        validate(namespace, name)?;
        self.objects.engine().view(|txn| {
            let digest = self
                .read_head(txn, namespace, name)?
                .ok_or_else(|| ref_not_found(namespace, name))?;
            let header: ChainHeader = self.objects.load_in(txn, namespace, &digest)?;
            Ok((header, digest))
        })
    }

    /// The head digest of a ref, if it exists.
    pub fn head(&self, namespace: &str, name: &str) -> Result<Option<Digest>> {
        validate(namespace, name)?;
        self.objects.engine().view(|txn| self.read_head(txn, namespace, name))
    }

    /// Remove a ref pointer. Missing refs are not an error.
    ///
    /// The chain's header objects stay in the object layer.
    pub fn delete_ref(&self, namespace: &str, name: &str) -> Result<()> {
        validate(namespace, name)?;
        let ref_key = self.objects.keys().ref_key(namespace, name);
        self.objects.engine().update(|txn| txn.delete(&ref_key))?;
        tracing::debug!(namespace, name, "deleted ref");
        Ok(())
    }

    /// Walk a ref's history from head to genesis.
    ///
    /// `visit` sees each header (newest first) with its digest. The walk
    /// runs in one read transaction and stops after genesis or at the first
    /// error from `visit`, which is returned unchanged. A missing header
    /// aborts the walk with [`StoreError::ObjectNotFound`]. A chain longer
    /// than its head's height allows fails with [`StoreError::BrokenChain`]
    /// instead of looping.
    pub fn iter_ref_chain<F, Er>(
        &self,
        namespace: &str,
        name: &str,
        mut visit: F,
    ) -> std::result::Result<(), Er>
    where
        F: FnMut(&Digest, &ChainHeader) -> std::result::Result<(), Er>,
        Er: From<StoreError>,
    {
        validate(namespace, name)?;

        let outcome = self.objects.engine().view(|txn| {
            let mut digest = self
                .read_head(txn, namespace, name)?
                .ok_or_else(|| ref_not_found(namespace, name))?;
            let mut limit: Option<u64> = None;
            let mut visited: u64 = 0;

            while !digest.is_zero() {
                let header: ChainHeader = self.objects.load_in(txn, namespace, &digest)?;
                let bound = *limit.get_or_insert(header.height.saturating_add(1));
                if visited == bound {
                    return Err(StoreError::BrokenChain {
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                        reason: format!("more than {} headers below head", bound),
                    });
                }
                visited += 1;

                tracing::trace!(
                    namespace,
                    name,
                    height = header.height,
                    digest = %digest,
                    "visiting header"
                );
                if let Err(e) = visit(&digest, &header) {
                    return Ok(Err(e));
                }
                digest = header.previous;
            }
            Ok(Ok(()))
        });

        match outcome {
            Ok(inner) => inner,
            Err(e) => Err(e.into()),
        }
    }

    /// The whole history of a ref, newest first.
    pub fn ref_chain(&self, namespace: &str, name: &str) -> Result<Vec<(Digest, ChainHeader)>> {
        let mut chain = Vec::new();
        self.iter_ref_chain(namespace, name, |digest, header| {
            chain.push((digest.clone(), header.clone()));
            Ok::<(), StoreError>(())
        })?;
        Ok(chain)
    }

    /// All refs in a namespace with their head digests, sorted by name.
    pub fn list_refs(&self, namespace: &str) -> Result<Vec<(String, Digest)>> {
        validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        let prefix = self.objects.keys().refs_prefix(namespace);

        let pairs = self.objects.engine().view(|txn| txn.scan_prefix(&prefix))?;

        pairs
            .into_iter()
            .map(|(key, value)| -> Result<(String, Digest)> {
                let name = String::from_utf8(key[prefix.len()..].to_vec()).map_err(|e| {
                    StoreError::Corrupt {
                        key: String::from_utf8_lossy(&key).into_owned(),
                        reason: e.to_string(),
                    }
                })?;
                let digest = self.check_digest(namespace, &name, value)?;
                Ok((name, digest))
            })
            .collect()
    }

    /// Check the height invariant along a ref's chain.
    ///
    /// Every step back must lower the height by exactly one and the walk
    /// must end at a height-0 genesis header. Returns the number of headers.
    pub fn verify_ref_chain(&self, namespace: &str, name: &str) -> Result<u64> {
        let broken = |reason: String| StoreError::BrokenChain {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason,
        };

        let mut expected: Option<u64> = None;
        let mut count: u64 = 0;
        let mut reached_genesis = false;

        self.iter_ref_chain(namespace, name, |digest, header| {
            if let Some(height) = expected {
                if header.height != height {
                    return Err(broken(format!(
                        "header {} has height {}, expected {}",
                        digest, header.height, height
                    )));
                }
            }
            match (header.is_genesis(), header.height) {
                (true, 0) => reached_genesis = true,
                (true, h) => {
                    return Err(broken(format!("genesis header {} has height {}", digest, h)))
                }
                (false, 0) => {
                    return Err(broken(format!(
                        "header {} has height 0 but a predecessor",
                        digest
                    )))
                }
                (false, _) => {}
            }
            expected = header.height.checked_sub(1);
            count += 1;
            Ok(())
        })?;

        if !reached_genesis {
            return Err(broken("chain did not end at genesis".to_string()));
        }
        Ok(count)
    }

    fn read_head<T: ReadTxn + ?Sized>(
        &self,
        txn: &T,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Digest>> {
        let key = self.objects.keys().ref_key(namespace, name);
        match txn.get(&key)? {
            Some(value) => self.check_digest(namespace, name, value).map(Some),
            None => Ok(None),
        }
    }

    fn check_digest(&self, namespace: &str, name: &str, value: Vec<u8>) -> Result<Digest> {
        let expected = self.objects.digester().output_len();
        if value.len() != expected {
            return Err(StoreError::Corrupt {
                key: self.objects.keys().ref_label(namespace, name),
                reason: format!("head digest is {} bytes, expected {}", value.len(), expected),
            });
        }
        Ok(Digest::from(value))
    }
}

fn validate(namespace: &str, name: &str) -> Result<()> {
    validate_namespace(namespace).map_err(StoreError::InvalidName)?;
    validate_ref_name(name).map_err(StoreError::InvalidName)
}

fn next_height(namespace: &str, name: &str, predecessor: &ChainHeader) -> Result<u64> {
    predecessor
        .height
        .checked_add(1)
        .ok_or_else(|| StoreError::BrokenChain {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: "predecessor height is at the maximum".to_string(),
        })
}

fn ref_not_found(namespace: &str, name: &str) -> StoreError {
    StoreError::RefNotFound {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}
