//! Demo dataset for the development server.
//!
//! Seeds one conference with a proposals session and a grants session so the
//! API is explorable immediately after `cargo run`.

use plenum_core::{
    new_entity_id, AvailableScoreOption, Conference, ConferenceId, Gender, Grant, GrantStatus,
    PlenumResult, ReimbursementCategory, ReviewSession, ReviewSessionId, ReviewSessionStatus,
    ReviewSessionType, ReviewTarget, Submission, SubmissionStatus, UserReview,
};
use plenum_storage::ReviewStore;

/// Ids of the seeded entities, logged at startup.
#[derive(Debug, Clone, Copy)]
pub struct DemoData {
    pub conference_id: ConferenceId,
    pub proposals_session_id: ReviewSessionId,
    pub grants_session_id: ReviewSessionId,
}

pub fn seed_demo_data(store: &dyn ReviewStore) -> PlenumResult<DemoData> {
    let now = chrono::Utc::now();
    let conference = Conference {
        conference_id: new_entity_id(),
        code: "plenumconf1".to_string(),
        name: "PlenumConf, first edition".to_string(),
        created_at: now,
    };
    store.conference_insert(&conference)?;

    let proposals_session = ReviewSession {
        review_session_id: new_entity_id(),
        conference_id: conference.conference_id,
        session_type: ReviewSessionType::Proposals,
        status: ReviewSessionStatus::Open,
        created_at: now,
    };
    let grants_session = ReviewSession {
        review_session_id: new_entity_id(),
        conference_id: conference.conference_id,
        session_type: ReviewSessionType::Grants,
        status: ReviewSessionStatus::Open,
        created_at: now,
    };
    store.review_session_insert(&proposals_session)?;
    store.review_session_insert(&grants_session)?;

    let mut option_ids = Vec::new();
    for session in [&proposals_session, &grants_session] {
        for value in 0..=3 {
            let option = AvailableScoreOption {
                option_id: new_entity_id(),
                review_session_id: session.review_session_id,
                numeric_value: value,
                label: match value {
                    0 => "not for this conference".to_string(),
                    1 => "maybe".to_string(),
                    2 => "good".to_string(),
                    _ => "must have".to_string(),
                },
            };
            store.score_option_insert(&option)?;
            if session.session_type == ReviewSessionType::Grants && value == 2 {
                option_ids.push(option.option_id);
            }
        }
    }

    let talks = [
        ("Lifetimes without tears", vec!["rust", "beginner"]),
        ("Tracing async services", vec!["observability", "async"]),
        ("Profiling async executors", vec!["observability", "async"]),
        ("A pasta lover's guide to build systems", vec!["tooling"]),
    ];
    let mut speaker_ids = Vec::new();
    for (title, tags) in talks {
        let speaker_id = new_entity_id();
        speaker_ids.push(speaker_id);
        store.submission_insert(&Submission {
            submission_id: new_entity_id(),
            conference_id: conference.conference_id,
            speaker_id,
            title: title.to_string(),
            submission_type: "talk".to_string(),
            audience_level: Some("intermediate".to_string()),
            tags: tags.into_iter().map(String::from).collect(),
            status: SubmissionStatus::Proposed,
            pending_status: None,
            created_at: now,
        })?;
    }

    for (name, max_amount_cents) in [("Ticket", 15_000), ("Travel", 40_000), ("Hotel", 30_000)] {
        store.reimbursement_category_insert(&ReimbursementCategory {
            category_id: new_entity_id(),
            conference_id: conference.conference_id,
            name: name.to_string(),
            max_amount_cents,
        })?;
    }

    let applicants = [
        ("Ada", Some("IT"), Some(Gender::Female)),
        ("Bruno", Some("BR"), Some(Gender::Male)),
        ("Chiara", Some("KE"), None),
    ];
    for (i, (name, country, gender)) in applicants.into_iter().enumerate() {
        let grant = Grant {
            grant_id: new_entity_id(),
            conference_id: conference.conference_id,
            // First applicant is also the first speaker, so the recap shows a
            // grant-with-proposal row.
            user_id: if i == 0 {
                speaker_ids[0]
            } else {
                new_entity_id()
            },
            name: name.to_string(),
            status: GrantStatus::Pending,
            pending_status: None,
            approved_type: None,
            country_code: country.map(String::from),
            gender,
            occupation: Some("developer".to_string()),
            internal_notes: String::new(),
            created_at: now,
        };
        store.grant_insert(&grant)?;
        if i == 0 {
            // One seeded review so the shortlist is not entirely unscored.
            store.user_review_upsert(&UserReview {
                review_id: new_entity_id(),
                review_session_id: grants_session.review_session_id,
                reviewer_id: new_entity_id(),
                target: ReviewTarget::Grant(grant.grant_id),
                score_option_id: option_ids[0],
                comment: Some("solid application".to_string()),
                private_comment: None,
                created_at: now,
            })?;
        }
    }

    Ok(DemoData {
        conference_id: conference.conference_id,
        proposals_session_id: proposals_session.review_session_id,
        grants_session_id: grants_session.review_session_id,
    })
}
