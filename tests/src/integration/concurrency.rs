//! # Concurrent Tagging Flows
//!
//! Large signing rounds fold shares in parallel and verifiers check whole
//! batches of payloads at once. Both must agree with the sequential path.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use tss_share_filter::{
        ConcurrentFilter, FilterConfig, JsonShare, Metrics, ShareIdentity, ShareTaggingApi,
        TagError, TagMode, TaggingService,
    };

    use crate::integration::{random_key_set, SignatureShare};

    fn service() -> TaggingService<Metrics> {
        TaggingService::with_metrics(FilterConfig::default(), Arc::new(Metrics::new()))
            .expect("default config is valid")
    }

    fn as_identities<'a>(
        records: &'a [JsonShare<'a, SignatureShare>],
    ) -> Vec<&'a (dyn ShareIdentity + Sync)> {
        records
            .iter()
            .map(|record| record as &(dyn ShareIdentity + Sync))
            .collect()
    }

    #[test]
    fn test_parallel_fold_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(41);
        let key_set = random_key_set(&mut rng, 64);
        let records: Vec<JsonShare<'_, SignatureShare>> = key_set.iter().map(JsonShare).collect();

        let service = service();

        let mut parallel = service.open_transaction(b"round-1");
        service
            .fold_shares_parallel(&mut parallel, &as_identities(&records))
            .expect("all shares serialize");

        let mut sequential = service.open_transaction(b"round-1");
        for record in &records {
            service.fold_share(&mut sequential, record).unwrap();
        }

        assert_eq!(parallel.filter(), sequential.filter());

        service.seal(&mut parallel, TagMode::Authenticated).expect("first seal");
        service.seal(&mut sequential, TagMode::Authenticated).expect("first seal");
        assert_eq!(parallel.payload(), sequential.payload());
    }

    #[test]
    fn test_parallel_fold_extends_existing_filter() {
        let mut rng = StdRng::seed_from_u64(43);
        let key_set = random_key_set(&mut rng, 12);
        let records: Vec<JsonShare<'_, SignatureShare>> = key_set.iter().map(JsonShare).collect();
        let (early, late) = records.split_at(4);

        let service = service();
        let mut tx = service.open_transaction(b"data");
        for record in early {
            service.fold_share(&mut tx, record).unwrap();
        }
        service
            .fold_shares_parallel(&mut tx, &as_identities(late))
            .unwrap();

        for record in &records {
            assert!(service.contains_share(tx.filter(), record).unwrap());
        }
    }

    #[test]
    fn test_threads_share_one_filter() {
        let mut rng = StdRng::seed_from_u64(47);
        let key_set = random_key_set(&mut rng, 32);
        let identities: Vec<String> = key_set
            .iter()
            .map(|share| JsonShare(share).identity().unwrap())
            .collect();

        let shared = ConcurrentFilter::new(&FilterConfig::default()).unwrap();
        thread::scope(|scope| {
            for chunk in identities.chunks(8) {
                let shared = &shared;
                scope.spawn(move || {
                    for identity in chunk {
                        shared.update(identity);
                    }
                });
            }
        });

        let filter = shared.snapshot();
        for identity in &identities {
            assert!(filter.contains(identity));
        }
    }

    #[test]
    fn test_verify_batch_mixed_payloads() {
        let mut rng = StdRng::seed_from_u64(53);
        let key_set = random_key_set(&mut rng, 8);
        let service = service();

        let mut payloads: Vec<Vec<u8>> = Vec::new();
        for i in 0..100usize {
            let mut tx = service.open_transaction(format!("tx-{}", i).as_bytes());
            let signer = &key_set[i % key_set.len()];
            service.fold_share(&mut tx, &JsonShare(signer)).unwrap();
            service.seal(&mut tx, TagMode::Authenticated).expect("first seal");

            let mut payload = tx.payload().to_vec();
            if i % 2 == 1 {
                let position = rng.gen_range(payload.len() - 80..payload.len());
                payload[position] ^= 0x01;
            }
            payloads.push(payload);
        }

        let views: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
        let results = service.verify_batch(&views);

        assert_eq!(results.len(), 100);
        for (i, result) in results.iter().enumerate() {
            if i % 2 == 0 {
                let filter = result.as_ref().expect("untouched payload verifies");
                let signer = &key_set[i % key_set.len()];
                assert!(service.contains_share(filter, &JsonShare(signer)).unwrap());
            } else {
                assert!(
                    matches!(result, Err(TagError::IntegrityMismatch { .. })),
                    "payload {} was tampered",
                    i
                );
            }
        }

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.verifications_passed, 50);
        assert_eq!(snapshot.integrity_failures, 50);
    }
}
