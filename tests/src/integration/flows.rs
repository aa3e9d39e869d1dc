//! # Integration Test Flows
//!
//! A signing coordinator tags a transaction with the shares that signed it;
//! an independent verifier, sharing only the filter configuration, reads the
//! tag back and checks which shares contributed.
//!
//! ## Flows Tested:
//!
//! 1. **Authenticated round trip**: fold, seal, verify, membership check
//! 2. **Plain round trip**: fold, seal, preview, untag
//! 3. **Tampering in transit**: random byte corruption of the suffix
//! 4. **Custom geometry**: non-default width, rounds and hash on both sides
//! 5. **Share registry**: registration and revocation of the key set

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use tss_share_filter::{
        FilterConfig, FilterConfigBuilder, HashAlgorithm, JsonShare, MembershipFilter, Metrics,
        ShareIdentity, ShareRegistry, ShareTaggingApi, TagError, TagMode, TaggedPayload,
        TaggingService,
    };

    use crate::integration::{random_key_set, SignatureShare};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn coordinator() -> TaggingService<Metrics> {
        TaggingService::with_metrics(FilterConfig::default(), Arc::new(Metrics::new()))
            .expect("default config is valid")
    }

    /// Pick `threshold` distinct signers out of the key set
    fn pick_signers<'a>(
        rng: &mut StdRng,
        key_set: &'a [SignatureShare],
        threshold: usize,
    ) -> Vec<&'a SignatureShare> {
        key_set.choose_multiple(rng, threshold).collect()
    }

    /// Tag `data` with the given signers and return the sealed payload
    fn sign_and_seal(
        service: &impl ShareTaggingApi,
        data: &[u8],
        signers: &[&SignatureShare],
        mode: TagMode,
    ) -> Vec<u8> {
        let mut tx = service.open_transaction(data);
        for share in signers {
            service
                .fold_share(&mut tx, &JsonShare(*share))
                .expect("share serializes");
        }
        service.seal(&mut tx, mode).expect("first seal");
        tx.payload().to_vec()
    }

    // =============================================================================
    // INTEGRATION TESTS: AUTHENTICATED ROUND TRIP
    // =============================================================================

    /// A verifier with its own service instance recovers the coordinator's filter
    #[test]
    fn test_coordinator_to_verifier_authenticated() {
        let mut rng = StdRng::seed_from_u64(7);
        let key_set = random_key_set(&mut rng, 5);
        let signers = pick_signers(&mut rng, &key_set, 3);

        let coordinator = coordinator();
        let payload = sign_and_seal(&coordinator, b"random_data", &signers, TagMode::Authenticated);
        assert_eq!(payload.len(), b"random_data".len() + 48 + 32);

        let verifier = TaggingService::new(FilterConfig::default()).expect("valid config");
        let filter = verifier.verify(&payload).expect("untampered payload verifies");

        for share in &signers {
            assert!(
                verifier.contains_share(&filter, &JsonShare(*share)).unwrap(),
                "signer {} must be reported as a contributor",
                share.index
            );
        }

        let snapshot = coordinator.metrics().snapshot();
        assert_eq!(snapshot.identities_folded, 3);
        assert_eq!(snapshot.sealed_authenticated, 1);
    }

    /// The structured view splits data, filter and digest back apart
    #[test]
    fn test_structured_payload_split() {
        let mut rng = StdRng::seed_from_u64(11);
        let key_set = random_key_set(&mut rng, 4);
        let signers: Vec<&SignatureShare> = key_set.iter().collect();

        let coordinator = coordinator();
        let data = b"{\"amount\":10,\"to\":\"0xBB\"}";
        let payload = sign_and_seal(&coordinator, data, &signers, TagMode::Authenticated);

        let tagged = TaggedPayload::decode_authenticated(&payload, coordinator.config())
            .expect("untampered payload verifies");
        assert_eq!(tagged.data(), data);
        assert_eq!(tagged.mode(), TagMode::Authenticated);
        assert_eq!(tagged.to_bytes(), payload);

        let digest = tagged.digest().expect("authenticated payload has a digest");
        assert_eq!(digest.as_bytes(), &payload[payload.len() - 32..]);
    }

    /// The filter travels as JSON alongside the payload and still verifies
    #[test]
    fn test_filter_survives_json_transport() {
        let mut rng = StdRng::seed_from_u64(13);
        let key_set = random_key_set(&mut rng, 3);
        let signers: Vec<&SignatureShare> = key_set.iter().collect();

        let coordinator = coordinator();
        let payload = sign_and_seal(&coordinator, b"data", &signers, TagMode::Authenticated);
        let filter = coordinator.verify(&payload).unwrap();

        let json = serde_json::to_string(&filter).expect("filter serializes");
        let received: MembershipFilter = serde_json::from_str(&json).expect("filter deserializes");

        assert_eq!(received, filter);
        assert_eq!(received.render(), filter.render());
    }

    // =============================================================================
    // INTEGRATION TESTS: PLAIN ROUND TRIP
    // =============================================================================

    #[test]
    fn test_plain_tag_preview_and_untag() {
        let mut rng = StdRng::seed_from_u64(17);
        let key_set = random_key_set(&mut rng, 6);
        let signers = pick_signers(&mut rng, &key_set, 4);

        let coordinator = coordinator();
        let mut tx = coordinator.open_transaction(b"random_data");
        for share in &signers {
            coordinator.fold_share(&mut tx, &JsonShare(*share)).unwrap();
        }
        coordinator.seal(&mut tx, TagMode::Plain).expect("first seal");

        assert_eq!(tx.payload().len(), b"random_data".len() + 48);
        assert_eq!(tx.untag().unwrap(), tx.filter().render());

        let previewed = coordinator.preview(tx.payload()).unwrap();
        assert_eq!(&previewed, tx.filter());

        let snapshot = coordinator.metrics().snapshot();
        assert_eq!(snapshot.sealed_plain, 1);
        assert_eq!(snapshot.previews_passed, 1);
        assert_eq!(snapshot.verifications_passed, 0, "a plain read is not a verification");
    }

    /// Shares arriving after the seal cannot change what the payload attests
    #[test]
    fn test_late_share_after_seal_rejected() {
        let mut rng = StdRng::seed_from_u64(19);
        let key_set = random_key_set(&mut rng, 4);
        let (signers, late) = key_set.split_at(3);

        let coordinator = coordinator();
        let mut tx = coordinator.open_transaction(b"random_data");
        for share in signers {
            coordinator.fold_share(&mut tx, &JsonShare(share)).unwrap();
        }
        coordinator.seal(&mut tx, TagMode::Authenticated).expect("first seal");
        let sealed = tx.clone();

        assert!(matches!(
            coordinator.fold_share(&mut tx, &JsonShare(&late[0])),
            Err(TagError::AlreadySealed { mode: TagMode::Authenticated })
        ));
        assert!(matches!(
            coordinator.seal(&mut tx, TagMode::Authenticated),
            Err(TagError::AlreadySealed { .. })
        ));
        assert_eq!(tx, sealed);
        assert_eq!(&coordinator.verify(tx.payload()).unwrap(), tx.filter());
    }

    /// Anyone can rewrite a plain suffix; preview cannot tell
    #[test]
    fn test_plain_suffix_is_forgeable() {
        let coordinator = coordinator();
        let mut tx = coordinator.open_transaction(b"data");
        coordinator.fold_share(&mut tx, &"honest-share").unwrap();
        coordinator.seal(&mut tx, TagMode::Plain).expect("first seal");

        let mut forged = tx.payload().to_vec();
        let suffix_start = forged.len() - 48;
        forged[suffix_start..].copy_from_slice("1".repeat(48).as_bytes());

        let previewed = coordinator.preview(&forged).expect("plain suffix is not authenticated");
        assert_eq!(previewed.bits_set(), 48);
        assert!(coordinator.contains_share(&previewed, &"anyone").unwrap());
    }

    // =============================================================================
    // INTEGRATION TESTS: TAMPERING IN TRANSIT
    // =============================================================================

    #[test]
    fn test_random_suffix_corruption_rejected() {
        let mut rng = StdRng::seed_from_u64(23);
        let key_set = random_key_set(&mut rng, 5);
        let signers = pick_signers(&mut rng, &key_set, 3);

        let coordinator = coordinator();
        let payload = sign_and_seal(&coordinator, b"transfer", &signers, TagMode::Authenticated);
        let suffix_start = b"transfer".len();

        const ROUNDS: u64 = 200;
        for _ in 0..ROUNDS {
            let mut corrupted = payload.clone();
            let position = rng.gen_range(suffix_start..corrupted.len());
            let mask: u8 = rng.gen_range(1..=255);
            corrupted[position] ^= mask;

            let result = coordinator.verify(&corrupted);
            assert!(
                matches!(result, Err(TagError::IntegrityMismatch { .. })),
                "corruption at byte {} must be detected, got {:?}",
                position,
                result
            );
        }

        let snapshot = coordinator.metrics().snapshot();
        assert_eq!(snapshot.integrity_failures, ROUNDS);
        assert_eq!(snapshot.verifications_passed, 0);
    }

    #[test]
    fn test_truncated_in_transit_rejected() {
        let coordinator = coordinator();
        let payload = sign_and_seal(&coordinator, b"", &[], TagMode::Authenticated);
        assert_eq!(payload.len(), 80);

        let result = coordinator.verify(&payload[1..]);
        assert_eq!(
            result,
            Err(TagError::TruncatedPayload {
                actual: 79,
                required: 80
            })
        );
        assert_eq!(coordinator.metrics().snapshot().truncated_payloads, 1);
    }

    // =============================================================================
    // INTEGRATION TESTS: CUSTOM GEOMETRY
    // =============================================================================

    #[test]
    fn test_custom_geometry_both_sides() {
        let config = FilterConfigBuilder::new()
            .width(256)
            .rounds(9)
            .hash(HashAlgorithm::SipHash13)
            .build()
            .expect("valid config");

        let mut rng = StdRng::seed_from_u64(29);
        let key_set = random_key_set(&mut rng, 8);
        let signers = pick_signers(&mut rng, &key_set, 5);

        let coordinator = TaggingService::new(config).unwrap();
        let payload = sign_and_seal(&coordinator, b"data", &signers, TagMode::Authenticated);
        assert_eq!(payload.len(), 4 + 256 + 32);

        let verifier = TaggingService::new(config).unwrap();
        let filter = verifier.verify(&payload).expect("same geometry verifies");
        assert_eq!(filter.width(), 256);
        for share in &signers {
            assert!(verifier.contains_share(&filter, &JsonShare(*share)).unwrap());
        }

        let mismatched = TaggingService::new(FilterConfig::default()).unwrap();
        assert!(
            mismatched.verify(&payload).is_err(),
            "a verifier with different geometry reads the wrong window"
        );
    }

    // =============================================================================
    // INTEGRATION TESTS: SHARE REGISTRY
    // =============================================================================

    #[test]
    fn test_registry_tracks_revocation() {
        let mut rng = StdRng::seed_from_u64(31);
        let key_set = random_key_set(&mut rng, 10);
        let mut registry = ShareRegistry::new(key_set.len());

        for share in &key_set {
            let identity = JsonShare(share).identity().unwrap();
            registry.insert(&identity).expect("registry has room");
        }
        assert_eq!(registry.len(), key_set.len());

        let revoked = JsonShare(&key_set[3]).identity().unwrap();
        assert!(registry.remove(&revoked));
        assert_eq!(registry.len(), key_set.len() - 1);

        for (i, share) in key_set.iter().enumerate() {
            if i == 3 {
                continue;
            }
            let identity = JsonShare(share).identity().unwrap();
            assert!(registry.contains(&identity), "share {} must stay registered", share.index);
        }
    }
}
