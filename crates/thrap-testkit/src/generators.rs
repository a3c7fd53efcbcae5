//! Proptest generators for property-based testing.

use proptest::prelude::*;

use thrap_core::Digest;

/// Generate a valid namespace.
pub fn namespace() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}".prop_map(String::from)
}

/// Generate one ref name component (never `.` or `..`).
pub fn ref_component() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9_.-]{0,11}".prop_map(String::from)
}

/// Generate a valid, possibly hierarchical, ref name.
pub fn ref_name() -> impl Strategy<Value = String> {
    prop::collection::vec(ref_component(), 1..=3).prop_map(|parts| parts.join("/"))
}

/// Generate a random digest of the given length.
pub fn digest(len: usize) -> impl Strategy<Value = Digest> {
    prop::collection::vec(any::<u8>(), len).prop_map(Digest::from)
}

/// Generate a random non-zero 32-byte digest.
pub fn blake3_digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>()
        .prop_filter("zero digest", |bytes| bytes.iter().any(|b| *b != 0))
        .prop_map(Digest::from)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Parameters for building a chain.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub namespace: String,
    pub ref_name: String,
    /// One payload per appended header.
    pub payloads: Vec<Vec<u8>>,
}

impl Arbitrary for ChainParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            namespace(),
            ref_name(),
            prop::collection::vec(payload(64), 0..12),
        )
            .prop_map(|(namespace, ref_name, payloads)| ChainParams {
                namespace,
                ref_name,
                payloads,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFixture;
    use thrap_core::{
        validate_namespace, validate_ref_name, Blake2bDigester, Blake3Digester, ChainHeader,
        Digester, JsonCodec,
    };
    use thrap_store::{MemoryEngine, RefStore, StoreConfig, StoreError};

    proptest! {
        #[test]
        fn test_generated_names_are_valid(ns in namespace(), name in ref_name()) {
            prop_assert!(validate_namespace(&ns).is_ok());
            prop_assert!(validate_ref_name(&name).is_ok());
        }

        #[test]
        fn test_generated_digests_are_not_zero(d in blake3_digest()) {
            prop_assert!(!d.is_zero());
            prop_assert_eq!(d.len(), 32);
        }

        #[test]
        fn test_blob_digest_is_content_address(ns in namespace(), data in payload(256)) {
            let fixture = TestFixture::new();
            let digest = fixture.store.objects().put_blob(&ns, data.clone()).unwrap();
            prop_assert_eq!(&digest, &Blake3Digester.digest(&data));
            prop_assert_eq!(fixture.store.objects().get_blob(&ns, &digest).unwrap().to_vec(), data);
        }

        #[test]
        fn test_chain_heights_step_by_one(params: ChainParams) {
            let fixture = TestFixture::new();
            let digests = fixture.build_chain_from(&params);

            let chain = fixture.store.ref_chain(&params.namespace, &params.ref_name).unwrap();
            prop_assert_eq!(chain.len(), params.payloads.len() + 1);
            for (i, (_, header)) in chain.iter().enumerate() {
                prop_assert_eq!(header.height, (chain.len() - 1 - i) as u64);
            }
            prop_assert_eq!(&chain[0].0, digests.last().unwrap());
        }

        #[test]
        fn test_unknown_wide_predecessor_is_rejected(
            name in ref_name(),
            previous in digest(64),
        ) {
            prop_assume!(!previous.is_zero());
            let store = RefStore::with_parts(
                MemoryEngine::new(),
                Blake2bDigester,
                JsonCodec,
                &StoreConfig::default(),
            );
            let (genesis, _) = store.create_ref("stacks", &name).unwrap();

            let err = store
                .set_ref("stacks", &name, ChainHeader::new(previous, Digest::zero(64)))
                .unwrap_err();
            let is_missing_object = matches!(err, StoreError::ObjectNotFound { .. });
            prop_assert!(is_missing_object);
            prop_assert_eq!(store.head("stacks", &name).unwrap(), Some(genesis));
        }
    }
}
