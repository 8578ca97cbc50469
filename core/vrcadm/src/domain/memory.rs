//! 有界メモリのレコード型とプロンプト用の整形
//!
//! JSONL の 1 行に対応する。読み込み側は壊れた行を黙って読み飛ばすため、
//! 整形関数は serde_json::Value の配列を受け取り、欠けたフィールドはデフォルトで埋める。

use serde::{Deserialize, Serialize};

/// アシスタントメモリの 1 レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMemoryRecord {
    pub timestamp: String,
    pub mode: String,
    pub output: String,
}

/// モデレーションメモリの 1 レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModMemoryRecord {
    pub timestamp: String,
    pub user: String,
    pub text: String,
    pub action: String,
    pub confidence: f64,
}

/// アシスタントメモリをプロンプト向けに整形する（1 件 1 行）
pub fn render_assistant_memory(values: &[serde_json::Value]) -> String {
    let mut lines = Vec::new();
    for v in values {
        let mode = v["mode"].as_str().unwrap_or("unknown");
        let output = v["output"].as_str().unwrap_or("").trim();
        if !output.is_empty() {
            lines.push(format!("- {}: {}", mode, output));
        }
    }
    lines.join("\n")
}

/// モデレーションメモリをプロンプト向けに整形する（1 件 1 行）
pub fn render_mod_memory(values: &[serde_json::Value]) -> String {
    let mut lines = Vec::new();
    for v in values {
        let timestamp = v["timestamp"].as_str().unwrap_or("unknown time");
        let user = v["user"].as_str().unwrap_or("unknown user");
        let text = v["text"].as_str().unwrap_or("").trim();
        let action = v["action"].as_str().unwrap_or("allow");
        let confidence = v["confidence"].as_f64().unwrap_or(0.0);
        lines.push(format!(
            "- {} | {} -> {} ({:.2}): {}",
            timestamp, user, action, confidence, text
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_assistant_memory_skips_empty_output() {
        let values = vec![
            json!({"timestamp": "t1", "mode": "idea", "output": "Do the thing"}),
            json!({"timestamp": "t2", "mode": "snippet", "output": "  "}),
            json!({"mode": "idea"}),
        ];
        assert_eq!(render_assistant_memory(&values), "- idea: Do the thing");
    }

    #[test]
    fn test_render_mod_memory_fills_defaults() {
        let values = vec![json!({"text": "hi"})];
        assert_eq!(
            render_mod_memory(&values),
            "- unknown time | unknown user -> allow (0.00): hi"
        );
    }

    #[test]
    fn test_mod_record_round_trip() {
        let rec = ModMemoryRecord {
            timestamp: "2026-08-06T00:00:00Z".to_string(),
            user: "Niko".to_string(),
            text: "hello".to_string(),
            action: "warn".to_string(),
            confidence: 0.8,
        };
        let v = serde_json::to_value(&rec).unwrap();
        let back: ModMemoryRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back.user, "Niko");
        assert_eq!(back.confidence, 0.8);
    }
}
