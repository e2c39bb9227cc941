//! Cache-resident value objects for the recap similarity analysis.
//!
//! These types are ephemeral: they live only in the cache (24 hours for a
//! success, 2 minutes for an error) and may vanish at any time without
//! correctness loss. The coordinator in plenum-review owns their lifecycle.

use crate::identity::SubmissionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One talk judged similar to another, with its similarity score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarTalk {
    pub submission_id: SubmissionId,
    pub title: String,
    pub similarity: f32,
}

/// Per-submission analysis row shown in the recap side panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub submission_id: SubmissionId,
    pub title: String,
    pub submission_type: String,
    pub speaker: String,
    pub similar: Vec<SimilarTalk>,
}

/// One topic cluster over the conference's submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCluster {
    pub topic_id: usize,
    pub keywords: Vec<String>,
    pub submission_ids: Vec<SubmissionId>,
}

/// Topic clustering output: clusters, unclustered outliers, and the
/// submission -> topic assignment map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopicClusters {
    pub topics: Vec<TopicCluster>,
    pub outliers: Vec<SubmissionId>,
    pub submission_topics: BTreeMap<SubmissionId, usize>,
}

/// Full analysis result as cached on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapAnalysis {
    pub submissions_list: Vec<AnalysisEntry>,
    pub topic_clusters: TopicClusters,
}

/// Wire payload for the compute-analysis endpoint.
///
/// `Empty` and `Processing` are synthesized from cache/lock state and never
/// stored; `Ready` and `Error` are the two cacheable shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisPayload {
    /// Nothing computed and nothing in flight.
    Empty,
    /// A computation is in flight; poll again.
    Processing,
    /// Cached success.
    Ready {
        #[serde(flatten)]
        analysis: RecapAnalysis,
    },
    /// Cached failure; expires quickly so a retry re-dispatches soon.
    Error { message: String },
}

impl AnalysisPayload {
    /// Whether this payload is one of the two cacheable shapes.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, AnalysisPayload::Ready { .. } | AnalysisPayload::Error { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisPayload::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::new_entity_id;

    fn sample_analysis() -> RecapAnalysis {
        let id = new_entity_id();
        RecapAnalysis {
            submissions_list: vec![AnalysisEntry {
                submission_id: id,
                title: "Writing parsers by hand".to_string(),
                submission_type: "talk".to_string(),
                speaker: "Ada".to_string(),
                similar: vec![SimilarTalk {
                    submission_id: new_entity_id(),
                    title: "Parser combinators in practice".to_string(),
                    similarity: 0.71,
                }],
            }],
            topic_clusters: TopicClusters::default(),
        }
    }

    #[test]
    fn test_payload_status_tags() {
        let empty = serde_json::to_value(AnalysisPayload::Empty).unwrap();
        assert_eq!(empty["status"], "empty");

        let processing = serde_json::to_value(AnalysisPayload::Processing).unwrap();
        assert_eq!(processing["status"], "processing");

        let error = serde_json::to_value(AnalysisPayload::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(error["status"], "error");
        assert_eq!(error["message"], "boom");
    }

    #[test]
    fn test_ready_payload_flattens_analysis() {
        let payload = AnalysisPayload::Ready {
            analysis: sample_analysis(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "ready");
        assert!(json["submissions_list"].is_array());
        assert!(json["topic_clusters"].is_object());

        let back: AnalysisPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_cacheable_shapes() {
        assert!(!AnalysisPayload::Empty.is_cacheable());
        assert!(!AnalysisPayload::Processing.is_cacheable());
        assert!(AnalysisPayload::Ready {
            analysis: sample_analysis()
        }
        .is_cacheable());
        assert!(AnalysisPayload::Error {
            message: "x".to_string()
        }
        .is_cacheable());
    }
}
