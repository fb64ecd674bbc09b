pub mod report;

// Re-export commonly used types
pub use report::{DetectionReport, PiiDetection, Summary, round3};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_shape() {
        let json = serde_json::to_value(DetectionReport::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pii_detected": [],
                "summary": {"total_pii_found": 0, "average_confidence": 0.0}
            })
        );
    }

    #[test]
    fn json_schema_generates() {
        let schema = schemars::schema_for!(DetectionReport);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("DetectionReport"));
        assert!(json.contains("pii_detected"));
        assert!(json.contains("average_confidence"));
    }
}
