use std::collections::BTreeMap;
use std::fmt;

/// Status reported by the API once a run, job or step has finished.
pub const STATUS_COMPLETED: &str = "completed";

/// Terminal classification used for every count and rate.
///
/// Anything that is not exactly `success` or `failure` (cancelled, skipped,
/// neutral, timed_out, a missing conclusion, ...) collapses into `Others`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    Success,
    Failure,
    Others,
}

impl Conclusion {
    pub const ALL: [Conclusion; 3] = [Conclusion::Success, Conclusion::Failure, Conclusion::Others];

    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("success") => Conclusion::Success,
            Some("failure") => Conclusion::Failure,
            _ => Conclusion::Others,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Others => "others",
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts keyed by every conclusion class, all starting at zero.
pub fn empty_counts() -> BTreeMap<Conclusion, usize> {
    Conclusion::ALL.into_iter().map(|c| (c, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_collapses_everything_else_into_others() {
        assert_eq!(Conclusion::classify(Some("success")), Conclusion::Success);
        assert_eq!(Conclusion::classify(Some("failure")), Conclusion::Failure);
        assert_eq!(Conclusion::classify(Some("cancelled")), Conclusion::Others);
        assert_eq!(Conclusion::classify(Some("Success")), Conclusion::Others);
        assert_eq!(Conclusion::classify(None), Conclusion::Others);
    }

    #[test]
    fn serializes_as_lowercase_map_key() {
        let counts = empty_counts();
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json, serde_json::json!({"success": 0, "failure": 0, "others": 0}));
    }
}
