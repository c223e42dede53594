use serde::Serialize;
use serde_json::Value;

use super::upload_queue::UploadOutcome;

/// What a whole upload run produced.
///
/// `successes` and `errors` follow the order outcomes arrived in. With more
/// than one worker that is completion order, not document part order; sort
/// the outcomes with [`UploadOutcome::sort_by_candidate_order`] first if the
/// part order matters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub successes: Vec<Value>,
    pub errors: Vec<String>,
}

impl UploadSummary {
    pub fn from_outcomes(outcomes: &[UploadOutcome]) -> Self {
        let mut successes = Vec::new();
        let mut errors = Vec::new();

        for outcome in outcomes {
            if outcome.success {
                successes.push(outcome.payload.clone().unwrap_or(Value::Null));
            } else {
                errors.push(
                    outcome
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("{}: unknown error", outcome.file_name)),
                );
            }
        }

        if !errors.is_empty() {
            log::warn!("Some files failed to upload: {:?}", errors);
        }

        Self {
            total: outcomes.len(),
            success_count: successes.len(),
            failed_count: errors.len(),
            successes,
            errors,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_outcomes() {
        let summary = UploadSummary::from_outcomes(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.all_succeeded());
    }

    #[test]
    fn test_partitions_and_keeps_arrival_order() {
        let outcomes = vec![
            UploadOutcome::succeeded(2, "doc part 3.pdf", Some(json!({"file_id": "c"}))),
            UploadOutcome::failed(0, "doc.pdf", "HTTP 500"),
            UploadOutcome::succeeded(1, "doc part 2.pdf", None),
            UploadOutcome::failed(3, "doc part 4.pdf", "timeout"),
        ];

        let summary = UploadSummary::from_outcomes(&outcomes);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failed_count, 2);
        assert_eq!(summary.total, summary.success_count + summary.failed_count);
        assert_eq!(summary.successes, vec![json!({"file_id": "c"}), Value::Null]);
        assert_eq!(summary.errors, vec!["HTTP 500", "timeout"]);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_serializes_flat_counts() {
        let summary = UploadSummary::from_outcomes(&[UploadOutcome::failed(0, "a.pdf", "nope")]);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(
            value,
            json!({
                "total": 1,
                "success_count": 0,
                "failed_count": 1,
                "successes": [],
                "errors": ["nope"]
            })
        );
    }
}
