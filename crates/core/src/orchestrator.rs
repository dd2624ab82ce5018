//! Conversation Orchestrator
//!
//! Drives one conversational turn from user submission to UI state:
//!
//! 1. Clears the previous turn's link, search results and speech flag.
//! 2. Records the query and asks the NLU service for an intent, joined
//!    concurrently; neither outcome blocks the other.
//! 3. Records the response and interprets its fulfillment messages: speaks the
//!    first text line for spoken input, then resolves a redirect, a search or
//!    a symbolic action (checked in that order).
//! 4. Re-fetches the transcript after every successful store write, so the
//!    displayed conversation is always the persisted one.
//!
//! Network failures are logged and end only the affected chain of effects.

use crate::links::SiteLinks;
use crate::nlu::{Directive, FulfillmentResult, IntentDetector, Payload};
use crate::search::{ContentSearch, SearchResult, extract_results};
use crate::speech::SpeechSynthesizer;
use crate::transcript::{ConversationTurn, TranscriptStore, chronological};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a query was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    Typed,
    Speech,
}

/// One user submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub origin: InputOrigin,
}

impl Submission {
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: InputOrigin::Typed,
        }
    }

    pub fn spoken(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: InputOrigin::Speech,
        }
    }
}

/// Where the orchestrator is in the turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Idle,
    QuerySubmitted,
    AwaitingFulfillment,
    SpeakingResult,
    LinkReady,
    SearchReady,
    ActionUnresolved,
}

/// Everything the presentation layer needs to draw the widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationView {
    /// Persisted turns, oldest first.
    pub transcript: Vec<ConversationTurn>,
    pub link: Option<String>,
    pub search_results: Vec<SearchResult>,
    /// Text spoken back for the current turn, if it came from speech.
    pub spoken: Option<String>,
}

pub struct ConversationOrchestrator {
    session_id: String,
    transcript: Arc<dyn TranscriptStore>,
    nlu: Arc<dyn IntentDetector>,
    search: Arc<dyn ContentSearch>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    links: SiteLinks,
    state: ConversationState,
    view: ConversationView,
}

impl ConversationOrchestrator {
    pub fn new(
        session_id: impl Into<String>,
        transcript: Arc<dyn TranscriptStore>,
        nlu: Arc<dyn IntentDetector>,
        search: Arc<dyn ContentSearch>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        links: SiteLinks,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            transcript,
            nlu,
            search,
            synthesizer,
            links,
            state: ConversationState::Idle,
            view: ConversationView::default(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    pub fn links(&self) -> &SiteLinks {
        &self.links
    }

    fn transition(&mut self, next: ConversationState) {
        debug!(from = ?self.state, to = ?next, "Conversation state change");
        self.state = next;
    }

    /// Replaces the displayed transcript with the store's latest page.
    ///
    /// Returns `true` when the transcript was updated.
    pub async fn refresh_transcript(&mut self) -> bool {
        let fetched = self.transcript.fetch_recent(&self.session_id).await;
        match fetched {
            Ok(Some(page)) => {
                self.view.transcript = chronological(page.items);
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!(error = ?e, "Failed to fetch recent conversation");
                false
            }
        }
    }

    /// Runs one full turn and returns the state it settled in.
    pub async fn submit(&mut self, submission: Submission) -> ConversationState {
        self.view.link = None;
        self.view.search_results.clear();
        self.view.spoken = None;
        self.transition(ConversationState::QuerySubmitted);
        info!(origin = ?submission.origin, "Processing query");

        self.transition(ConversationState::AwaitingFulfillment);
        let (recorded, detected) = tokio::join!(
            self.transcript.record_query(&self.session_id, &submission.text),
            self.nlu.detect_intent(&self.session_id, &submission.text),
        );

        match recorded {
            Ok(()) => {
                self.refresh_transcript().await;
            }
            Err(e) => error!(error = ?e, "Failed to record query"),
        }

        let result = match detected {
            Ok(result) => result,
            Err(e) => {
                error!(error = ?e, "Intent detection failed");
                self.transition(ConversationState::Idle);
                return self.state;
            }
        };

        let stored = self
            .transcript
            .record_response(&self.session_id, &result)
            .await;
        match stored {
            Ok(()) => {
                self.refresh_transcript().await;
            }
            Err(e) => error!(error = ?e, "Failed to record response"),
        }

        let next = self.fulfil(&result, submission.origin).await;
        self.transition(next);
        self.state
    }

    async fn fulfil(&mut self, result: &FulfillmentResult, origin: InputOrigin) -> ConversationState {
        let messages = &result.fulfillment_messages;
        debug!(count = messages.len(), "Fulfillment messages received");
        if messages.is_empty() {
            warn!(action = %result.action, "No fulfillment messages; nothing to do");
            return ConversationState::ActionUnresolved;
        }

        if origin == InputOrigin::Speech {
            if let Some(text) = result.first_text() {
                self.transition(ConversationState::SpeakingResult);
                if let Err(e) = self.synthesizer.speak(text).await {
                    error!(error = ?e, "Speech synthesis failed");
                }
                self.view.spoken = Some(text.to_string());
            }
        }

        let directive = messages
            .get(1)
            .and_then(|m| m.payload.as_ref())
            .and_then(Payload::directive);

        match directive {
            Some(Directive::Redirect(target)) => {
                debug!(%target, "redirect");
                self.view.link = Some(self.links.redirect(&target));
                ConversationState::LinkReady
            }
            Some(Directive::Search(phrase)) => {
                debug!(%phrase, "search");
                self.run_search(&phrase).await
            }
            None => {
                debug!(action = %result.action, "action");
                match self.links.action(&result.action) {
                    Some(link) => {
                        self.view.link = Some(link);
                        ConversationState::LinkReady
                    }
                    None => {
                        warn!(action = %result.action, "Unknown action");
                        ConversationState::ActionUnresolved
                    }
                }
            }
        }
    }

    async fn run_search(&mut self, phrase: &str) -> ConversationState {
        match self.search.search(phrase).await {
            Ok(Some(page)) => {
                self.view.search_results = extract_results(&page.items);
                debug!(results = ?self.view.search_results, "Search results extracted");
                ConversationState::SearchReady
            }
            Ok(None) => ConversationState::SearchReady,
            Err(e) => {
                error!(error = ?e, %phrase, "Content search failed");
                ConversationState::Idle
            }
        }
    }
}
