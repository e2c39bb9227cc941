//! Similarity and topic-clustering collaborator.
//!
//! The recap analysis treats similarity as an external service behind the
//! `Analyzer` trait. `KeywordAnalyzer` is the built-in implementation:
//! deterministic token-overlap scoring that needs no model weights, good
//! enough for development and as a fallback. A deployment with a real
//! embedding pipeline plugs in behind the same trait.

use async_trait::async_trait;
use plenum_core::{
    PlenumResult, SimilarTalk, Submission, SubmissionId, TopicCluster, TopicClusters,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Similar-talk and topic-cluster computation over a conference's submissions.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Map each submission to its most similar peers, best first.
    async fn similar_talks(
        &self,
        submissions: &[Submission],
    ) -> PlenumResult<HashMap<SubmissionId, Vec<SimilarTalk>>>;

    /// Group submissions into keyword topics; submissions sharing no keyword
    /// with anything else land in `outliers`.
    async fn topic_clusters(&self, submissions: &[Submission]) -> PlenumResult<TopicClusters>;
}

/// Token-overlap analyzer: Jaccard similarity over title and tag tokens.
#[derive(Debug, Clone)]
pub struct KeywordAnalyzer {
    /// Minimum Jaccard score for a pair to count as similar.
    pub min_similarity: f32,
    /// How many similar talks to keep per submission.
    pub max_similar: usize,
    /// A keyword must appear in at least this many submissions to seed a topic.
    pub min_topic_size: usize,
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self {
            min_similarity: 0.2,
            max_similar: 3,
            min_topic_size: 2,
        }
    }
}

const STOPWORDS: &[&str] = &[
    "and", "are", "for", "from", "how", "into", "not", "the", "use", "using", "via", "what",
    "when", "why", "with", "you", "your",
];

fn tokens(submission: &Submission) -> BTreeSet<String> {
    submission
        .title
        .split(|c: char| !c.is_alphanumeric())
        .chain(submission.tags.iter().map(String::as_str))
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.len() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    if intersection == 0 {
        return 0.0;
    }
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

#[async_trait]
impl Analyzer for KeywordAnalyzer {
    async fn similar_talks(
        &self,
        submissions: &[Submission],
    ) -> PlenumResult<HashMap<SubmissionId, Vec<SimilarTalk>>> {
        let token_sets: Vec<BTreeSet<String>> = submissions.iter().map(tokens).collect();
        let mut result = HashMap::with_capacity(submissions.len());

        for (i, submission) in submissions.iter().enumerate() {
            let mut similar: Vec<SimilarTalk> = submissions
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .filter_map(|(j, other)| {
                    let score = jaccard(&token_sets[i], &token_sets[j]);
                    (score >= self.min_similarity).then(|| SimilarTalk {
                        submission_id: other.submission_id,
                        title: other.title.clone(),
                        similarity: score,
                    })
                })
                .collect();
            similar.sort_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then_with(|| a.submission_id.cmp(&b.submission_id))
            });
            similar.truncate(self.max_similar);
            result.insert(submission.submission_id, similar);
        }
        Ok(result)
    }

    async fn topic_clusters(&self, submissions: &[Submission]) -> PlenumResult<TopicClusters> {
        // keyword -> submissions mentioning it
        let mut by_keyword: BTreeMap<String, BTreeSet<SubmissionId>> = BTreeMap::new();
        for submission in submissions {
            for token in tokens(submission) {
                by_keyword
                    .entry(token)
                    .or_default()
                    .insert(submission.submission_id);
            }
        }

        // Greedy assignment: the most widely shared keyword seeds the next
        // topic and claims its unassigned submissions.
        let mut candidates: Vec<(String, BTreeSet<SubmissionId>)> = by_keyword
            .into_iter()
            .filter(|(_, ids)| ids.len() >= self.min_topic_size)
            .collect();
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));

        let mut assigned: HashSet<SubmissionId> = HashSet::new();
        let mut topics = Vec::new();
        let mut submission_topics = BTreeMap::new();

        for (keyword, ids) in candidates {
            let members: Vec<SubmissionId> = ids
                .into_iter()
                .filter(|id| !assigned.contains(id))
                .collect();
            if members.len() < self.min_topic_size {
                continue;
            }
            let topic_id = topics.len();
            for id in &members {
                assigned.insert(*id);
                submission_topics.insert(*id, topic_id);
            }
            topics.push(TopicCluster {
                topic_id,
                keywords: vec![keyword],
                submission_ids: members,
            });
        }

        let outliers: Vec<SubmissionId> = submissions
            .iter()
            .map(|s| s.submission_id)
            .filter(|id| !assigned.contains(id))
            .collect();

        Ok(TopicClusters {
            topics,
            outliers,
            submission_topics,
        })
    }
}
