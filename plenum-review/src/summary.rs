//! Grant statistics aggregation.
//!
//! Pure folds over grant rows into dense nested tables: every known status is
//! always present as a key, defaulting to zero, so renderers never branch on
//! missing keys. Country rows resolve through the continent table and sort
//! lexicographically by (continent, country code) for grouped display.

use plenum_core::{
    continent_for, display_label, Continent, Grant, GrantId, GrantReimbursement, GrantStatus,
    UserId,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Dense per-status counter table.
pub type StatusCounts = BTreeMap<GrantStatus, u64>;

/// One country row of the summary, pre-resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRow {
    pub continent: Continent,
    /// Raw code as stored; empty when the applicant left it blank.
    pub country_code: String,
    /// Flag-and-name label, or the raw code when unresolvable.
    pub country_label: String,
    pub counts: StatusCounts,
}

/// Whether a grant applicant also sent a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerStatus {
    Speaker,
    NonSpeaker,
}

/// Money attached per status, and the total the organization should plan for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    /// Sum of granted amounts per grant status, dense.
    pub by_status: BTreeMap<GrantStatus, i64>,
    /// Grand total restricted to the statuses that count toward budget
    /// (approved, waiting for confirmation, confirmed).
    pub planned_total_cents: i64,
}

/// The full recap summary over one conference's grants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantSummary {
    /// Sorted by (continent, country code).
    pub by_country: Vec<CountryRow>,
    pub by_continent: BTreeMap<Continent, StatusCounts>,
    /// Keyed by gender db string, with "unknown" for undisclosed.
    pub by_gender: BTreeMap<String, StatusCounts>,
    /// Keyed by grant type db string, with "none" for not-yet-approved.
    pub by_grant_type: BTreeMap<String, StatusCounts>,
    pub by_speaker_status: BTreeMap<SpeakerStatus, StatusCounts>,
    pub financial: FinancialSummary,
    pub totals: StatusCounts,
}

/// All statuses present, zero-filled.
fn zero_counts() -> StatusCounts {
    GrantStatus::ALL.iter().map(|s| (*s, 0)).collect()
}

fn zero_amounts() -> BTreeMap<GrantStatus, i64> {
    GrantStatus::ALL.iter().map(|s| (*s, 0)).collect()
}

fn bump(counts: &mut BTreeMap<String, StatusCounts>, key: String, status: GrantStatus) {
    *counts
        .entry(key)
        .or_insert_with(zero_counts)
        .entry(status)
        .or_default() += 1;
}

/// Fold grants, their reimbursements and the speaker set into the summary.
///
/// `speakers` is the set of applicants who also sent a proposal; the caller
/// derives it from the conference's submissions.
pub fn grant_summary(
    grants: &[Grant],
    reimbursements: &[GrantReimbursement],
    speakers: &HashSet<UserId>,
) -> GrantSummary {
    let mut totals = zero_counts();
    let mut by_continent: BTreeMap<Continent, StatusCounts> = BTreeMap::new();
    let mut country_rows: BTreeMap<(Continent, String), CountryRow> = BTreeMap::new();
    let mut by_gender: BTreeMap<String, StatusCounts> = BTreeMap::new();
    let mut by_grant_type: BTreeMap<String, StatusCounts> = BTreeMap::new();
    let mut by_speaker_status: BTreeMap<SpeakerStatus, StatusCounts> = BTreeMap::new();

    let mut amount_per_grant: HashMap<GrantId, i64> = HashMap::new();
    for row in reimbursements {
        *amount_per_grant.entry(row.grant_id).or_default() += row.granted_amount_cents;
    }

    let mut financial_by_status = zero_amounts();
    let mut planned_total_cents = 0i64;

    for grant in grants {
        *totals.entry(grant.status).or_default() += 1;

        let code = grant.country_code.clone().unwrap_or_default();
        let continent = continent_for(grant.country_code.as_deref());
        by_continent
            .entry(continent)
            .or_insert_with(zero_counts)
            .entry(grant.status)
            .and_modify(|c| *c += 1)
            .or_insert(1);
        let row = country_rows
            .entry((continent, code.clone()))
            .or_insert_with(|| CountryRow {
                continent,
                country_code: code.clone(),
                country_label: if code.is_empty() {
                    "Unknown".to_string()
                } else {
                    display_label(&code)
                },
                counts: zero_counts(),
            });
        *row.counts.entry(grant.status).or_default() += 1;

        let gender_key = grant
            .gender
            .map(|g| g.as_db_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        bump(&mut by_gender, gender_key, grant.status);

        let type_key = grant
            .approved_type
            .map(|t| t.as_db_str().to_string())
            .unwrap_or_else(|| "none".to_string());
        bump(&mut by_grant_type, type_key, grant.status);

        let speaker_status = if speakers.contains(&grant.user_id) {
            SpeakerStatus::Speaker
        } else {
            SpeakerStatus::NonSpeaker
        };
        *by_speaker_status
            .entry(speaker_status)
            .or_insert_with(zero_counts)
            .entry(grant.status)
            .or_default() += 1;

        let amount = amount_per_grant
            .get(&grant.grant_id)
            .copied()
            .unwrap_or_default();
        *financial_by_status.entry(grant.status).or_default() += amount;
        if grant.status.counts_toward_budget() {
            planned_total_cents += amount;
        }
    }

    GrantSummary {
        // BTreeMap iteration order is (continent, code) lexicographic.
        by_country: country_rows.into_values().collect(),
        by_continent,
        by_gender,
        by_grant_type,
        by_speaker_status,
        financial: FinancialSummary {
            by_status: financial_by_status,
            planned_total_cents,
        },
        totals,
    }
}
