mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{T0, spawn_issuer};
use dsl_server::dsl::{
    CredentialId, CredentialStatus, DslError, HolderProof, HolderProofBuilder, Period,
    PrivateMetadata, Seed, Verifier, seed::derive_seed, verifier,
};
use dsl_server::issuer::{
    CredentialBundle, DEFAULT_DISTRIBUTION_POINT, EntryOptions, Issuer, IssuerError,
    MockCredentialClaims,
};
use dsl_server::storage::{MemoryRepository, Repository};

async fn entry_for(issuer: &Issuer, jti: &str, now: u64) -> CredentialBundle {
    let jwt = issuer
        .secrets()
        .sign(&MockCredentialClaims {
            sub: "Alice".to_string(),
            jti: jti.to_string(),
            sdb: DEFAULT_DISTRIBUTION_POINT.to_string(),
        })
        .unwrap();
    let (_, bundle) = issuer
        .create_entry(&CredentialBundle::new(jwt), &EntryOptions::inline(), now)
        .await
        .unwrap();
    bundle
}

fn proof(bundle: &CredentialBundle, at: u64, hypothesis: CredentialStatus) -> HolderProof {
    HolderProofBuilder::new(Period::default())
        .build_from_jws(bundle.private_metadata(), at, hypothesis)
        .unwrap()
}

#[tokio::test]
async fn test_verifier_polarity() {
    let issuer = spawn_issuer(Arc::new(MemoryRepository::new())).await;
    let bundle = entry_for(&issuer, "abc", T0).await;

    let valid_proof = proof(&bundle, T0, CredentialStatus::Valid);
    let before = issuer.latest_publication().await.unwrap();
    assert_eq!(
        Verifier::new(&before).verify(&valid_proof).unwrap(),
        CredentialStatus::Valid
    );

    // Revoke and republish within the same epoch
    let after = issuer.revoke(&CredentialId::from("abc"), T0 + 30).await.unwrap();
    let current = Verifier::new(&after);
    assert_eq!(current.verify(&valid_proof).unwrap(), CredentialStatus::Revoked);

    let revoked_proof = proof(&bundle, T0, CredentialStatus::Revoked);
    assert_eq!(current.verify(&revoked_proof).unwrap(), CredentialStatus::Revoked);

    // The earlier publication still states what was true in its window
    assert_eq!(
        verifier::verify(&before, &valid_proof).unwrap(),
        CredentialStatus::Valid
    );
}

#[tokio::test]
async fn test_proof_from_another_epoch_is_not_found() {
    let issuer = spawn_issuer(Arc::new(MemoryRepository::new())).await;
    let bundle = entry_for(&issuer, "abc", T0).await;
    let publication = issuer.latest_publication().await.unwrap();

    let stale = proof(&bundle, T0 + 60, CredentialStatus::Valid);
    assert!(matches!(
        Verifier::new(&publication).verify(&stale),
        Err(DslError::IdentifierNotFound)
    ));
}

#[tokio::test]
async fn test_unknown_credential_is_not_found() {
    let issuer = spawn_issuer(Arc::new(MemoryRepository::new())).await;
    entry_for(&issuer, "abc", T0).await;
    entry_for(&issuer, "def", T0).await;
    let publication = issuer.latest_publication().await.unwrap();
    assert_eq!(publication.claims().sid.len(), 2);

    let stranger = PrivateMetadata::new(CredentialId::from("never"), Seed::from_bytes([1; 32]));
    let proof = HolderProofBuilder::default()
        .build(&stranger, T0, CredentialStatus::Valid)
        .unwrap();
    assert!(matches!(
        Verifier::new(&publication).verify(&proof),
        Err(DslError::IdentifierNotFound)
    ));
}

#[tokio::test]
async fn test_revocation_is_monotone() {
    let issuer = spawn_issuer(Arc::new(MemoryRepository::new())).await;
    let bundle = entry_for(&issuer, "abc", T0).await;
    let id = CredentialId::from("abc");

    issuer.revoke(&id, T0).await.unwrap();
    issuer.revoke(&id, T0 + 1).await.unwrap();
    issuer.track(id.clone(), T0 + 2).await.unwrap();
    issuer
        .create_entry(
            &CredentialBundle::new(bundle.jwt.clone()),
            &EntryOptions::inline(),
            T0 + 3,
        )
        .await
        .unwrap();

    assert_eq!(
        issuer.registry().status(&id).await,
        Some(CredentialStatus::Revoked)
    );
    let latest = issuer.latest_publication().await.unwrap();
    assert_eq!(
        Verifier::new(&latest)
            .verify(&proof(&bundle, T0 + 3, CredentialStatus::Valid))
            .unwrap(),
        CredentialStatus::Revoked
    );
}

#[tokio::test]
async fn test_failed_commit_is_not_applied() {
    let repository = MemoryRepository::new();
    let issuer = spawn_issuer(Arc::new(repository.clone())).await;
    let bundle = entry_for(&issuer, "abc", T0).await;
    let before = repository.load_registry().await.unwrap();

    repository.fail_writes(true);
    let result = issuer.revoke(&CredentialId::from("abc"), T0 + 1).await;
    assert!(matches!(result, Err(IssuerError::Storage(_))));

    assert_eq!(repository.load_registry().await.unwrap(), before);
    assert_eq!(
        issuer.registry().status(&CredentialId::from("abc")).await,
        Some(CredentialStatus::Valid)
    );

    // Once storage recovers the revocation goes through
    repository.fail_writes(false);
    let publication = issuer.revoke(&CredentialId::from("abc"), T0 + 2).await.unwrap();
    assert_eq!(
        Verifier::new(&publication)
            .verify(&proof(&bundle, T0 + 2, CredentialStatus::Valid))
            .unwrap(),
        CredentialStatus::Revoked
    );
}

#[tokio::test]
async fn test_identifiers_rotate_between_epochs() {
    let issuer = spawn_issuer(Arc::new(MemoryRepository::new())).await;
    entry_for(&issuer, "abc", T0).await;

    let first = issuer.publish(T0 + 5).await.unwrap();
    let same_epoch = issuer.publish(T0 + 59).await.unwrap();
    let next_epoch = issuer.publish(T0 + 60).await.unwrap();

    assert_eq!(first.claims().sid, same_epoch.claims().sid);
    assert_ne!(first.claims().sid, next_epoch.claims().sid);
    assert_eq!(next_epoch.claims().nbf, T0 + 60);
    assert_eq!(next_epoch.claims().nxt, T0 + 120);
}

fn derived_proof(issuer: &Issuer, id: &CredentialId, at: u64) -> HolderProof {
    let metadata = PrivateMetadata::new(
        id.clone(),
        derive_seed(issuer.secrets().master_secret(), id),
    );
    HolderProofBuilder::default()
        .build(&metadata, at, CredentialStatus::Valid)
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commits_publish_consistent_snapshots() {
    const HELD: usize = 8;
    const FRESH: usize = 16;

    let repository = MemoryRepository::new();
    let issuer = Arc::new(spawn_issuer(Arc::new(repository.clone())).await);
    let held: Vec<CredentialId> = (0..HELD)
        .map(|i| CredentialId::new(format!("held-{i}")))
        .collect();
    for id in &held {
        issuer.track(id.clone(), T0).await.unwrap();
    }

    let mut tracks = Vec::new();
    for i in 0..FRESH {
        let issuer = Arc::clone(&issuer);
        let id = CredentialId::new(format!("fresh-{i}"));
        tracks.push(tokio::spawn(async move {
            let publication = issuer.track(id.clone(), T0 + 1).await.unwrap();
            (id, publication)
        }));
    }
    let mut revokes = Vec::new();
    for id in held.iter().cloned() {
        let issuer = Arc::clone(&issuer);
        revokes.push(tokio::spawn(async move {
            let publication = issuer.revoke(&id, T0 + 2).await.unwrap();
            (id, publication)
        }));
    }
    let mut publishes = Vec::new();
    for i in 0..HELD {
        let issuer = Arc::clone(&issuer);
        publishes.push(tokio::spawn(async move {
            issuer.publish(T0 + 3 + i as u64).await.unwrap()
        }));
    }

    let mut seen = Vec::new();
    for task in tracks {
        let (id, publication) = task.await.unwrap();
        // The publication returned by a commit already contains that commit
        let status = Verifier::new(&publication)
            .verify(&derived_proof(&issuer, &id, T0 + 1))
            .unwrap();
        assert_eq!(status, CredentialStatus::Valid);
        seen.push(publication);
    }
    for task in revokes {
        let (id, publication) = task.await.unwrap();
        let status = Verifier::new(&publication)
            .verify(&derived_proof(&issuer, &id, T0 + 2))
            .unwrap();
        assert_eq!(status, CredentialStatus::Revoked);
        seen.push(publication);
    }
    for task in publishes {
        seen.push(task.await.unwrap());
    }

    // Each publication is a whole registry: one identifier per credential,
    // never a torn mix of two states
    for publication in &seen {
        let sid = &publication.claims().sid;
        assert!((HELD..=HELD + FRESH).contains(&sid.len()));
        assert_eq!(sid.iter().collect::<HashSet<_>>().len(), sid.len());
    }

    let snapshot = issuer.registry().snapshot().await;
    assert_eq!(snapshot.len(), HELD + FRESH);
    assert_eq!(repository.load_registry().await.unwrap(), Some(snapshot));
    assert_eq!(
        issuer.latest_publication().await.unwrap().claims().sid.len(),
        HELD + FRESH
    );
    for id in &held {
        assert_eq!(
            issuer.registry().status(id).await,
            Some(CredentialStatus::Revoked)
        );
    }
}
