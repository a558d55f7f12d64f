use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading decision emitted for a symbol sequence.
///
/// Stringified as `"BUY" | "SELL" | "HOLD" | "NONE"` only at external
/// boundaries (reports, tree snapshots, observer events).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
    #[default]
    None,
}

impl Decision {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Decision::Buy),
            "SELL" => Ok(Decision::Sell),
            "HOLD" => Ok(Decision::Hold),
            "NONE" => Ok(Decision::None),
            _ => Err(format!("invalid decision {s:?}; expected BUY|SELL|HOLD|NONE")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
            Decision::None => "NONE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Decision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Decision::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Decision;

    #[test]
    fn from_str_round_trips_all_labels() {
        for d in [Decision::Buy, Decision::Sell, Decision::Hold, Decision::None] {
            assert_eq!(Decision::from_str(d.as_str()).unwrap(), d);
        }
        assert!(Decision::from_str("typo").is_err());
    }

    #[test]
    fn serializes_as_label_string() {
        assert_eq!(serde_json::to_string(&Decision::Buy).unwrap(), "\"BUY\"");
        let parsed: Decision = serde_json::from_str("\"HOLD\"").unwrap();
        assert_eq!(parsed, Decision::Hold);
        let bad: Result<Decision, _> = serde_json::from_str("\"MAYBE\"");
        assert!(bad.is_err());
    }
}
