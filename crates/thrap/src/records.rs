//! Typed, versioned records on top of the ref layer.
//!
//! A record is a ref whose chain headers point at serialized payloads. The
//! genesis header carries no payload, so the first version of a record has
//! height 1.
//!
//! The store itself is blocking. [`ChainedRecords`] runs every operation on
//! tokio's blocking pool and exposes it through the async
//! [`RecordStorage`] trait.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use thrap_core::{Blake3Digester, CborCodec, ChainHeader, Codec, Digest, Digester, Object};
use thrap_store::{KvEngine, RefStore, StoreError};

use crate::error::{Result, ThrapError};

/// One version of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Version<T> {
    /// Record name (the ref name).
    pub name: String,
    /// Position in the record's history, starting at 1.
    pub height: u64,
    /// When this version was written (nanoseconds since the Unix epoch).
    pub timestamp: i64,
    /// Digest of this version's chain header.
    pub digest: Digest,
    /// Digest of the stored payload.
    pub data_digest: Digest,
    pub record: T,
}

impl<T> Version<T> {
    fn new(name: &str, digest: Digest, header: ChainHeader, record: T) -> Self {
        Self {
            name: name.to_string(),
            height: header.height,
            timestamp: header.timestamp,
            digest,
            data_digest: header.data_digest,
            record,
        }
    }
}

/// Async storage for one kind of record.
#[async_trait]
pub trait RecordStorage<T>: Send + Sync {
    /// The latest version of a record.
    async fn get(&self, name: &str) -> Result<Version<T>>;

    /// Start a new record. Fails with [`ThrapError::RecordExists`] if the
    /// name is taken.
    async fn create(&self, name: &str, record: T) -> Result<Version<T>>;

    /// Append a new version on top of the current one.
    async fn update(&self, name: &str, record: T) -> Result<Version<T>>;

    /// Every version, newest first.
    async fn history(&self, name: &str) -> Result<Vec<Version<T>>>;

    /// The latest version of every record whose name starts with `prefix`,
    /// sorted by name.
    async fn list(&self, prefix: &str) -> Result<Vec<Version<T>>>;

    /// Forget a record. Past versions stay in the object layer.
    async fn remove(&self, name: &str) -> Result<()>;
}

/// [`RecordStorage`] backed by a [`RefStore`] namespace.
///
/// Cheap to clone; clones share the store.
pub struct ChainedRecords<T, E, D = Blake3Digester, C = CborCodec> {
    store: Arc<RefStore<E, D, C>>,
    namespace: Arc<str>,
    _record: PhantomData<fn() -> T>,
}

impl<T, E, D, C> Clone for ChainedRecords<T, E, D, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: Arc::clone(&self.namespace),
            _record: PhantomData,
        }
    }
}

impl<T, E, D, C> ChainedRecords<T, E, D, C>
where
    T: Object + Send + 'static,
    E: KvEngine + 'static,
    D: Digester + 'static,
    C: Codec + 'static,
{
    /// Records of type `T` kept in `namespace`.
    pub fn new(store: Arc<RefStore<E, D, C>>, namespace: &str) -> Result<Self> {
        thrap_core::validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        Ok(Self {
            store,
            namespace: Arc::from(namespace),
            _record: PhantomData,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<RefStore<E, D, C>> {
        &self.store
    }

    async fn run<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&RefStore<E, D, C>, &str) -> Result<R> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let namespace = Arc::clone(&self.namespace);
        tokio::task::spawn_blocking(move || f(&*store, &*namespace)).await?
    }
}

#[async_trait]
impl<T, E, D, C> RecordStorage<T> for ChainedRecords<T, E, D, C>
where
    T: Object + Send + 'static,
    E: KvEngine + 'static,
    D: Digester + 'static,
    C: Codec + 'static,
{
    async fn get(&self, name: &str) -> Result<Version<T>> {
        let name = name.to_string();
        self.run(move |store, ns| latest_record(store, ns, &name)).await
    }

    async fn create(&self, name: &str, record: T) -> Result<Version<T>> {
        let name = name.to_string();
        self.run(move |store, ns| create_record(store, ns, &name, record))
            .await
    }

    async fn update(&self, name: &str, record: T) -> Result<Version<T>> {
        let name = name.to_string();
        self.run(move |store, ns| update_record(store, ns, &name, record))
            .await
    }

    async fn history(&self, name: &str) -> Result<Vec<Version<T>>> {
        let name = name.to_string();
        self.run(move |store, ns| record_history(store, ns, &name)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Version<T>>> {
        let prefix = prefix.to_string();
        self.run(move |store, ns| list_records(store, ns, &prefix)).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.run(move |store, ns| {
            store
                .delete_ref(ns, &name)
                .map_err(|e| ThrapError::for_record(&name, e))
        })
        .await
    }
}

/// Store a payload, reusing an identical one that is already present.
fn put_payload<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    record: &T,
) -> Result<Digest>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    match store.objects().put(namespace, record) {
        Ok(digest) => Ok(digest),
        Err(StoreError::ObjectExists { digest, .. }) => Ok(digest),
        Err(e) => Err(e.into()),
    }
}

fn create_record<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    name: &str,
    record: T,
) -> Result<Version<T>>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    let data = put_payload(store, namespace, &record)?;
    let (digest, header) = store
        .create_ref_with_data(namespace, name, data)
        .map_err(|e| ThrapError::for_record(name, e))?;

    tracing::debug!(namespace, name, digest = %digest, "created record");
    Ok(Version::new(name, digest, header, record))
}

fn update_record<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    name: &str,
    record: T,
) -> Result<Version<T>>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    let head = store
        .head(namespace, name)?
        .ok_or_else(|| ThrapError::RecordNotFound(name.to_string()))?;
    let data = put_payload(store, namespace, &record)?;
    let (digest, header) = store
        .set_ref(namespace, name, ChainHeader::new(head, data))
        .map_err(|e| ThrapError::for_record(name, e))?;

    tracing::debug!(
        namespace,
        name,
        height = header.height,
        digest = %digest,
        "updated record"
    );
    Ok(Version::new(name, digest, header, record))
}

fn latest_record<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    name: &str,
) -> Result<Version<T>>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    let (header, digest) = store
        .get_ref(namespace, name)
        .map_err(|e| ThrapError::for_record(name, e))?;
    if !header.has_data() {
        return Err(ThrapError::RecordNotFound(name.to_string()));
    }
    let record = store.objects().get(namespace, &header.data_digest)?;
    Ok(Version::new(name, digest, header, record))
}

fn record_history<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    name: &str,
) -> Result<Vec<Version<T>>>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    // Collect headers first: payload reads need their own transactions.
    let chain = store
        .ref_chain(namespace, name)
        .map_err(|e| ThrapError::for_record(name, e))?;

    chain
        .into_iter()
        .filter(|(_, header)| header.has_data())
        .map(|(digest, header)| -> Result<Version<T>> {
            let record = store.objects().get(namespace, &header.data_digest)?;
            Ok(Version::new(name, digest, header, record))
        })
        .collect()
}

fn list_records<T, E, D, C>(
    store: &RefStore<E, D, C>,
    namespace: &str,
    prefix: &str,
) -> Result<Vec<Version<T>>>
where
    T: Object,
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    let mut versions = Vec::new();
    for (name, _) in store.list_refs(namespace)? {
        if !name.starts_with(prefix) {
            continue;
        }
        match latest_record(store, namespace, &name) {
            Ok(version) => versions.push(version),
            Err(ThrapError::RecordNotFound(_)) => {}
            Err(ThrapError::Store(
                e @ (StoreError::ObjectNotFound { .. } | StoreError::Corrupt { .. }),
            )) => {
                tracing::warn!(namespace, name = %name, error = %e, "skipping unreadable record");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(versions)
}
