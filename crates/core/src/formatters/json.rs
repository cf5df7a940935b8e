use crate::Result;
use crate::model::AggregateResult;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Convert an aggregate to JSON
pub fn convert_to_json(result: &AggregateResult, config: &JsonConfig) -> Result<String> {
    if config.pretty { Ok(serde_json::to_string_pretty(result)?) } else { Ok(serde_json::to_string(result)?) }
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, result: &AggregateResult) -> Result<String> {
        convert_to_json(result, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListEntry, UserStats};
    use serde_json::{Value, json};

    fn sample() -> AggregateResult {
        let mut entry = ListEntry::new("v17");
        entry.title = "Ever17".to_string();
        AggregateResult {
            player: UserStats {
                id: "u2".to_string(),
                username: "Yorhel".to_string(),
                total_play_minutes: 125,
                total_play_time: "2h 5m".to_string(),
                finished_count: 2,
                playing_count: 3,
            },
            finished_vns: vec![entry],
            playing_vns: Vec::new(),
            favourite_vns: Vec::new(),
            sections: json!(["player"]),
        }
    }

    #[test]
    fn test_convert_to_json_compact() {
        let output = convert_to_json(&sample(), &JsonConfig::default()).unwrap();
        assert!(!output.contains('\n'));

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["player"]["username"], "Yorhel");
        assert_eq!(value["player"]["total_play_time"], "2h 5m");
        assert_eq!(value["finished_vns"][0]["vn_id"], "v17");
        assert_eq!(value["sections"], json!(["player"]));
    }

    #[test]
    fn test_convert_to_json_pretty() {
        let output = JsonFormatter::new(JsonConfig { pretty: true }).convert(&sample()).unwrap();
        assert!(output.contains('\n'));
        assert!(output.contains(r#""favourite_vns": []"#));
    }
}
