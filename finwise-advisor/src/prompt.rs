use finwise_core::text::truncate_chars;
use finwise_core::{ConversationTurn, DeviceClass, MarketSnapshot};

/// Persona and style instructions sent ahead of every query.
pub const ADVISOR_PERSONA: &str = "\
You are an ethical financial advisor specializing in Indian markets. Your name is FinWise.
Provide clear, direct financial advice based on real financial data and best practices.

IMPORTANT RULES:
1. Keep your response to a maximum of 200 words
2. Write in a conversational, easy-to-understand style
3. Focus on actionable advice
4. End with a brief one-line disclaimer in italics
5. Add 3 natural follow-up questions with emojis on new lines

Focus on:
- Long-term investment strategies aligned with the client's goals
- Ethical investment considerations
- Risk management and diversification
- Indian tax implications and regulations
- Market trends in BSE/NSE";

/// Extra instruction appended for mobile clients.
pub const MOBILE_BREVITY_SUFFIX: &str =
    "\n\nKeep the reply short and to the point; the client is reading on a phone screen.";

/// Builder for the advisor prompt: persona, market context, conversation
/// history, then the query, in that order.
pub struct PromptAssembler;

impl PromptAssembler {
    /// Render the full prompt for one request. Pure string assembly, no I/O.
    ///
    /// Mobile requests get the query cut to its character limit and a
    /// brevity instruction appended after everything else.
    pub fn render(
        persona: &str,
        snapshot: &MarketSnapshot,
        history: &[ConversationTurn],
        query: &str,
        device: DeviceClass,
    ) -> String {
        let query = match device.query_char_limit() {
            Some(limit) => truncate_chars(query, limit),
            None => query,
        };

        let mut sections: Vec<String> = Vec::with_capacity(4);
        sections.push(persona.to_string());
        sections.push(Self::market_context(snapshot));
        if !history.is_empty() {
            sections.push(Self::history_block(history));
        }
        sections.push(format!("Query: {}", query));

        let mut prompt = sections.join("\n\n");
        if device == DeviceClass::Mobile {
            prompt.push_str(MOBILE_BREVITY_SUFFIX);
        }
        prompt
    }

    /// Textual rendering of the market snapshot, one line per indicator.
    fn market_context(snapshot: &MarketSnapshot) -> String {
        let gainers = snapshot
            .top_gainers
            .iter()
            .map(|m| format!("{}: +{}%", m.symbol, m.change_percent))
            .collect::<Vec<_>>()
            .join(", ");
        let losers = snapshot
            .top_losers
            .iter()
            .map(|m| format!("{}: {}%", m.symbol, m.change_percent))
            .collect::<Vec<_>>()
            .join(", ");

        let mut block = String::new();
        block.push_str(&format!(
            "Current Indian Market Data ({}):\n",
            snapshot.display_timestamp()
        ));
        for quote in snapshot.indices.values() {
            block.push_str(&format!(
                "- {}: {} ({}%)\n",
                quote.label, quote.value, quote.percent_change
            ));
        }
        block.push_str(&format!("- USD/INR: {}\n", snapshot.usd_inr));
        block.push_str("\nTop Gainers:\n");
        block.push_str(&gainers);
        block.push_str("\n\nTop Losers:\n");
        block.push_str(&losers);
        block
    }

    fn history_block(history: &[ConversationTurn]) -> String {
        let mut block = String::from("Conversation so far:");
        for turn in history {
            block.push_str(&format!("\n{}: {}", turn.role.prompt_name(), turn.text));
        }
        block
    }
}
