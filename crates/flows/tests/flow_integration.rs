//! End-to-end tests for the creation flows against the in-memory backend.

use backend::{DataStore, InMemoryBackend};
use common::RecordId;
use domain::{FileUpload, TeamDraft, tables};
use flows::{FlowError, TeamFlow, team};

fn team_flow(backend: &InMemoryBackend) -> TeamFlow<InMemoryBackend, InMemoryBackend> {
    TeamFlow::new(backend.clone(), backend.clone())
}

fn team_draft_with_logo() -> TeamDraft {
    TeamDraft {
        name: "Acme".to_string(),
        document: "12.345.678/0001-90".to_string(),
        location: "São Paulo, SP".to_string(),
        service_types: vec!["Repair".to_string()],
        logo: Some(FileUpload::new("logo.png", "image/png", vec![1, 2, 3])),
    }
}

async fn assert_no_trace(backend: &InMemoryBackend) {
    assert_eq!(backend.row_count(tables::TEAMS).await, 0);
    assert_eq!(backend.row_count(tables::TEAM_MEMBERS).await, 0);
    assert_eq!(backend.row_count(tables::TEAM_SERVICE_TYPES).await, 0);
    assert_eq!(backend.object_count().await, 0);
}

/// Injects a failure at every step index in turn and verifies that no
/// parent row, dependent row, or asset remains queryable afterwards.
#[tokio::test]
async fn atomicity_at_every_failure_index() {
    type Inject = fn(&InMemoryBackend);
    let injections: [(&str, Inject); 5] = [
        ("insert_team", |b| b.set_fail_on_insert(tables::TEAMS, true)),
        ("insert_members", |b| {
            b.set_fail_on_insert(tables::TEAM_MEMBERS, true)
        }),
        ("insert_service_types", |b| {
            b.set_fail_on_insert(tables::TEAM_SERVICE_TYPES, true)
        }),
        ("upload_logo", |b| b.set_fail_on_upload(true)),
        ("patch_logo_url", |b| {
            b.set_fail_on_update(tables::TEAMS, true)
        }),
    ];

    for (expected_step, inject) in injections {
        let backend = InMemoryBackend::new();
        inject(&backend);

        let err = team_flow(&backend)
            .create(RecordId::new(), team_draft_with_logo())
            .await
            .unwrap_err();

        match err {
            FlowError::Step { failure, .. } => {
                assert_eq!(failure.step, expected_step, "wrong failing step");
            }
            other => panic!("expected step failure at {expected_step}, got {other:?}"),
        }
        assert_no_trace(&backend).await;
    }
}

#[tokio::test]
async fn upload_happens_after_parent_insert_and_under_its_id() {
    let backend = InMemoryBackend::new();

    let team = team_flow(&backend)
        .create(RecordId::new(), team_draft_with_logo())
        .await
        .unwrap();

    // The storage path embeds the parent id, which only exists once the
    // parent insert returned.
    let logo = team.logo.expect("logo set");
    assert!(logo.contains(&team.id.to_string()));

    // When the parent insert fails, no upload is ever issued.
    let failing = InMemoryBackend::new();
    failing.set_fail_on_insert(tables::TEAMS, true);
    let _ = team_flow(&failing)
        .create(RecordId::new(), team_draft_with_logo())
        .await
        .unwrap_err();
    assert_eq!(failing.object_count().await, 0);
}

/// The concrete success scenario: parent insert, admin membership, one
/// service type row, no asset steps, logo unset.
#[tokio::test]
async fn team_creation_success_scenario() {
    let backend = InMemoryBackend::new();
    let owner = RecordId::new();

    let draft = TeamDraft {
        name: "Acme".to_string(),
        document: "12.345.678/0001-90".to_string(),
        location: "São Paulo, SP".to_string(),
        service_types: vec!["Repair".to_string()],
        logo: None,
    };

    let team = team_flow(&backend).create(owner, draft).await.unwrap();

    assert_eq!(backend.row_count(tables::TEAMS).await, 1);
    assert_eq!(backend.row_count(tables::TEAM_MEMBERS).await, 1);
    assert_eq!(backend.row_count(tables::TEAM_SERVICE_TYPES).await, 1);
    assert_eq!(backend.object_count().await, 0);

    let members = backend.fetch_all(tables::TEAM_MEMBERS).await.unwrap();
    assert_eq!(members[0].field_str("role"), Some("admin"));

    assert_eq!(team.name, "Acme");
    assert!(team.logo.is_none());
}

/// The concrete failure scenario: the service-types insert fails, the
/// teams and team_members rows are deleted by compensation, and the
/// error names the service-types step.
#[tokio::test]
async fn team_creation_with_failing_service_types_insert() {
    let backend = InMemoryBackend::new();
    backend.set_fail_on_insert(tables::TEAM_SERVICE_TYPES, true);

    let draft = TeamDraft {
        name: "Acme".to_string(),
        document: "12.345.678/0001-90".to_string(),
        location: "São Paulo, SP".to_string(),
        service_types: vec!["Repair".to_string()],
        logo: None,
    };

    let err = team_flow(&backend)
        .create(RecordId::new(), draft)
        .await
        .unwrap_err();

    assert!(err.to_string().contains(team::STEP_INSERT_SERVICE_TYPES));
    assert_eq!(backend.row_count(tables::TEAMS).await, 0);
    assert_eq!(backend.row_count(tables::TEAM_MEMBERS).await, 0);
}

/// A 6 MiB image is rejected before any backend call.
#[tokio::test]
async fn oversized_file_is_rejected_preflight() {
    let backend = InMemoryBackend::new();

    let mut draft = team_draft_with_logo();
    draft.logo = Some(FileUpload::new(
        "big.png",
        "image/png",
        vec![0; 6 * 1024 * 1024],
    ));

    let err = team_flow(&backend)
        .create(RecordId::new(), draft)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlowError::Draft(domain::DraftError::File(_))
    ));
    assert_eq!(backend.write_call_count(), 0);
    assert_no_trace(&backend).await;
}

/// Unsupported content type is likewise rejected pre-flight.
#[tokio::test]
async fn text_file_is_rejected_preflight() {
    let backend = InMemoryBackend::new();

    let mut draft = team_draft_with_logo();
    draft.logo = Some(FileUpload::new("notes.txt", "text/plain", vec![0; 10]));

    let err = team_flow(&backend)
        .create(RecordId::new(), draft)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlowError::Draft(domain::DraftError::File(_))
    ));
    assert_eq!(backend.write_call_count(), 0);
}

/// Two concurrent creations do not interfere with each other: each
/// transaction compensates only its own writes.
#[tokio::test]
async fn concurrent_creations_are_independent() {
    let backend = InMemoryBackend::new();

    let flow_a = team_flow(&backend);
    let flow_b = team_flow(&backend);

    let draft_a = TeamDraft {
        name: "Alpha".to_string(),
        document: "11.111.111/0001-11".to_string(),
        location: "Recife, PE".to_string(),
        service_types: vec!["Repair".to_string()],
        logo: None,
    };
    let draft_b = TeamDraft {
        name: "Beta".to_string(),
        document: "22.222.222/0001-22".to_string(),
        location: "Curitiba, PR".to_string(),
        service_types: vec!["Install".to_string()],
        logo: None,
    };

    let (a, b) = tokio::join!(
        flow_a.create(RecordId::new(), draft_a),
        flow_b.create(RecordId::new(), draft_b),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(backend.row_count(tables::TEAMS).await, 2);
    assert_eq!(backend.row_count(tables::TEAM_MEMBERS).await, 2);
}
