use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use finwise_core::{ConversationTurn, DeviceClass, MarketMover, MarketSnapshot, Role};

/// Chat request body. History arrives in the wire shape the web client
/// already speaks: `[{"role": "user", "parts": [{"text": "..."}]}]`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chat: String,
    #[serde(default)]
    pub history: Vec<TurnWire>,
}

#[derive(Debug, Deserialize)]
pub struct TurnWire {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub parts: Vec<PartWire>,
}

#[derive(Debug, Deserialize)]
pub struct PartWire {
    #[serde(default)]
    pub text: String,
}

impl TurnWire {
    /// Collapse a wire turn into a conversation turn. The client sends
    /// "model" for the advisor's own turns; anything that is not "user"
    /// maps to the assistant side.
    fn into_turn(self) -> ConversationTurn {
        let role = match self.role.as_str() {
            "user" => Role::User,
            _ => Role::Assistant,
        };
        let text = self
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join(" ");
        ConversationTurn { role, text }
    }
}

pub fn history_from_wire(history: Vec<TurnWire>) -> Vec<ConversationTurn> {
    history.into_iter().map(TurnWire::into_turn).collect()
}

/// Whole-delivery chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
    pub elapsed_ms: u64,
    pub device_class: DeviceClass,
}

/// Structured error payload
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Market data endpoint response
#[derive(Debug, Serialize)]
pub struct MarketDataResponse {
    pub indices: BTreeMap<String, IndexQuoteWire>,
    pub top_gainers: Vec<MoverWire>,
    pub top_losers: Vec<MoverWire>,
    pub forex: ForexWire,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct IndexQuoteWire {
    pub value: f64,
    pub percent_change: f64,
}

#[derive(Debug, Serialize)]
pub struct MoverWire {
    pub symbol: String,
    pub change_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct ForexWire {
    pub usd_inr: f64,
}

impl From<&MarketMover> for MoverWire {
    fn from(mover: &MarketMover) -> Self {
        Self {
            symbol: mover.symbol.clone(),
            change_percent: mover.change_percent,
        }
    }
}

impl From<&MarketSnapshot> for MarketDataResponse {
    fn from(snapshot: &MarketSnapshot) -> Self {
        Self {
            indices: snapshot
                .indices
                .iter()
                .map(|(key, quote)| {
                    (
                        key.clone(),
                        IndexQuoteWire {
                            value: quote.value,
                            percent_change: quote.percent_change,
                        },
                    )
                })
                .collect(),
            top_gainers: snapshot.top_gainers.iter().map(MoverWire::from).collect(),
            top_losers: snapshot.top_losers.iter().map(MoverWire::from).collect(),
            forex: ForexWire {
                usd_inr: snapshot.usd_inr,
            },
            timestamp: snapshot.display_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_request() {
        let json = r#"{
            "chat": "Should I invest in index funds?",
            "history": [
                {"role": "user", "parts": [{"text": "Hi"}]},
                {"role": "model", "parts": [{"text": "Hello! How can I help?"}]}
            ]
        }"#;

        let request: ChatRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.chat, "Should I invest in index funds?");
        assert_eq!(request.history.len(), 2);

        let history = history_from_wire(request.history);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "Hi");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "Hello! How can I help?");
    }

    #[test]
    fn test_missing_fields_default() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.chat, "");
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_multi_part_turn_joins_text() {
        let json = r#"{"role": "user", "parts": [{"text": "first"}, {"text": "second"}]}"#;
        let turn: TurnWire = serde_json::from_str(json).unwrap();
        let turn = turn.into_turn();
        assert_eq!(turn.text, "first second");
    }

    #[test]
    fn test_unknown_role_maps_to_assistant() {
        let json = r#"{"role": "system", "parts": [{"text": "note"}]}"#;
        let turn: TurnWire = serde_json::from_str(json).unwrap();
        assert_eq!(turn.into_turn().role, Role::Assistant);
    }

    #[test]
    fn test_error_body_omits_missing_request_id() {
        let body = ErrorBody {
            error: "boom".to_string(),
            kind: "generation_failed".to_string(),
            request_id: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("request_id"));
    }
}
