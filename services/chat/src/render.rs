//! Terminal presentation of the conversation widget.
//!
//! Each render prints the whole widget; the newest content always ends up at
//! the bottom of the terminal.

use askray_core::fulfilment::IntentFulfilment;
use askray_core::links::SiteLinks;
use askray_core::orchestrator::ConversationView;
use askray_core::transcript::{ConversationTurn, TurnType};
use std::fmt::Display;
use std::io::{self, Write};

pub const EMPTY_TRANSCRIPT_NOTICE: &str = "You are at the start of this conversation";

pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, view: &ConversationView, links: &SiteLinks) -> io::Result<()> {
        writeln!(self.out)?;
        if view.transcript.is_empty() {
            self.notice("Info", EMPTY_TRANSCRIPT_NOTICE)?;
        } else {
            for turn in &view.transcript {
                self.turn(turn)?;
            }
        }

        if let Some(link) = &view.link {
            writeln!(self.out, "[Open] {}", link)?;
        }

        for card in &view.search_results {
            writeln!(self.out, "## {}", card.title)?;
            writeln!(self.out, "   _{}_", card.description)?;
            writeln!(
                self.out,
                "   Read content... {}",
                links.content(&card.friendly_url)
            )?;
        }
        self.out.flush()
    }

    fn turn(&mut self, turn: &ConversationTurn) -> io::Result<()> {
        let header = match turn.turn_type {
            TurnType::Query => "You said...",
            TurnType::Response => "Ray said...",
        };
        writeln!(self.out, "{}", header)?;
        writeln!(self.out, "   {}", turn.fulfilment_message)
    }

    pub fn notice(&mut self, kind: &str, text: impl Display) -> io::Result<()> {
        writeln!(self.out, "--- {}: {}", kind, text)
    }

    /// Persistent warning shown instead of the widget when configuration is incomplete.
    pub fn unconfigured(&mut self, reason: impl Display) -> io::Result<()> {
        self.notice("Warning", format!("Ask Ray is not configured. {}", reason))?;
        self.out.flush()
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    pub fn fulfilments(&mut self, intent: &str, records: &[IntentFulfilment]) -> io::Result<()> {
        if records.is_empty() {
            return self.notice("Info", format!("No fulfilments recorded for '{}'", intent));
        }
        for record in records {
            let priority = record
                .priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                self.out,
                "* [{}] {} {}",
                priority,
                record.intent,
                serde_json::Value::Object(record.fields.clone())
            )?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askray_core::search::SearchResult;

    fn links() -> SiteLinks {
        SiteLinks::new("https://portal.example.com", "/site")
    }

    fn rendered(view: &ConversationView) -> String {
        let mut renderer = Renderer::new(Vec::new());
        renderer.render(view, &links()).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    fn turn(id: u64, turn_type: TurnType, text: &str) -> ConversationTurn {
        ConversationTurn {
            id,
            session_id: "s1".into(),
            turn_type,
            fulfilment_message: text.into(),
        }
    }

    #[test]
    fn test_empty_transcript_shows_notice() {
        let out = rendered(&ConversationView::default());
        assert!(out.contains(EMPTY_TRANSCRIPT_NOTICE));
        assert!(!out.contains("[Open]"));
    }

    #[test]
    fn test_turns_render_in_order() {
        let view = ConversationView {
            transcript: vec![
                turn(1, TurnType::Query, "where is the blog?"),
                turn(2, TurnType::Response, "Here it is"),
            ],
            ..Default::default()
        };
        let out = rendered(&view);
        let query = out.find("You said...").unwrap();
        let response = out.find("Ray said...").unwrap();
        assert!(query < response);
        assert!(out.contains("where is the blog?"));
        assert!(!out.contains(EMPTY_TRANSCRIPT_NOTICE));
    }

    #[test]
    fn test_link_and_cards_follow_transcript() {
        let view = ConversationView {
            transcript: vec![turn(1, TurnType::Query, "refunds")],
            link: Some("https://portal.example.com/site/blogs".into()),
            search_results: vec![SearchResult {
                title: "Refunds".into(),
                description: "Within 30 days".into(),
                friendly_url: "refund-policy".into(),
            }],
            spoken: None,
        };
        let out = rendered(&view);
        assert!(out.contains("[Open] https://portal.example.com/site/blogs"));
        assert!(out.contains("## Refunds"));
        assert!(out.contains("_Within 30 days_"));
        assert!(out.contains("Read content... https://portal.example.com/site/-/refund-policy"));
        assert!(out.find("refunds").unwrap() < out.find("[Open]").unwrap());
    }

    #[test]
    fn test_unconfigured_notice() {
        let mut renderer = Renderer::new(Vec::new());
        renderer.unconfigured("Missing environment variable: X").unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "--- Warning: Ask Ray is not configured. Missing environment variable: X\n"
        );
    }

    #[test]
    fn test_fulfilments_listing() {
        let mut renderer = Renderer::new(Vec::new());
        renderer.fulfilments("blog", &[]).unwrap();
        let record: IntentFulfilment = serde_json::from_value(serde_json::json!({
            "id": 1, "intent": "blog", "priority": 5, "url": "/blogs"
        }))
        .unwrap();
        renderer.fulfilments("blog", &[record]).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("No fulfilments recorded for 'blog'"));
        assert!(out.contains("* [5] blog {\"url\":\"/blogs\"}"));
    }
}
