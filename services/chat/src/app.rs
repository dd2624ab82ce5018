//! The interactive client loop: wires configuration, host and clients into an
//! orchestrator, then feeds it user input until the user quits.

use crate::{
    auth::token_provider,
    config::Config,
    console::{ConsoleRecognizer, ConsoleSynthesizer, SharedLines},
    host::ConfiguredHost,
    render::Renderer,
};
use anyhow::{Context, Result};
use askray_core::{
    ConversationOrchestrator, Submission,
    fulfilment::IntentFulfilmentClient,
    host::HostEnvironment,
    links::SiteLinks,
    nlu::DialogflowClient,
    portal::PortalClient,
    search::{HeadlessContentSearch, SearchScope},
    session::{MemoryStore, SessionIdProvider},
    speech::SpeechRecognizer,
    transcript::ObjectTranscriptStore,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(String),
    Speak,
    Fulfilments(String),
    Quit,
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            "/quit" | "/exit" => Command::Quit,
            "/speak" => Command::Speak,
            _ => match line.strip_prefix("/fulfilments") {
                Some(rest) if rest.is_empty() || rest.starts_with(' ') => {
                    Command::Fulfilments(rest.trim().to_string())
                }
                _ => Command::Query(line.to_string()),
            },
        }
    }
}

/// Runs the client until `/quit` or end of input.
pub async fn run(config: Config) -> Result<()> {
    let host = ConfiguredHost::from_config(&config);
    let mut renderer = Renderer::new(std::io::stdout());

    if !host.is_signed_in() {
        info!("User is not signed in; the conversation widget stays hidden.");
        return Ok(());
    }

    let session_id = SessionIdProvider::new(Arc::new(MemoryStore::new()))
        .get_or_create(host.user_identity())
        .context("Client storage is unavailable")?;
    info!(%session_id, "Conversation session ready");

    let portal = PortalClient::new(host.origin(), host.csrf_token().map(str::to_string));
    let access_token = match token_provider(&config.token_source, portal.clone())
        .access_token()
        .await
    {
        Ok(token) => token,
        Err(e) => {
            error!(error = ?e, "Could not obtain an NLU access token");
            String::new()
        }
    };

    let transcript = Arc::new(ObjectTranscriptStore::new(
        portal.clone(),
        &config.transcript_endpoint,
        config.max_entries,
    ));
    let nlu = Arc::new(
        DialogflowClient::new(&config.dialogflow_project_id, access_token)
            .with_http_client(portal.http().clone())
            .with_base_url(&config.dialogflow_base_url),
    );
    let scope = SearchScope::resolve(config.asset_library_id.as_deref(), &host)
        .context("Neither an asset library nor a site group is available for search")?;
    let search = Arc::new(HeadlessContentSearch::new(portal.clone(), scope));
    let fulfilments = config
        .intent_fulfilment_endpoint
        .as_deref()
        .map(|endpoint| IntentFulfilmentClient::new(portal.clone(), endpoint, config.max_entries));
    let links = SiteLinks::new(host.origin(), config.site_url.clone());

    let mut orchestrator = ConversationOrchestrator::new(
        session_id,
        transcript,
        nlu,
        search,
        Arc::new(ConsoleSynthesizer),
        links,
    );

    let lines: SharedLines<_> = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let recognizer = ConsoleRecognizer::new(lines.clone());

    orchestrator.refresh_transcript().await;
    renderer.render(orchestrator.view(), orchestrator.links())?;

    loop {
        renderer.prompt()?;
        let next = lines.lock().await.next_line().await?;
        let Some(line) = next else {
            break;
        };

        let submission = match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Query(text) => Submission::typed(text),
            Command::Speak => match recognizer.capture().await {
                Ok(text) => Submission::spoken(text),
                Err(e) => {
                    warn!(error = ?e, "Speech capture failed");
                    continue;
                }
            },
            Command::Fulfilments(intent) => {
                show_fulfilments(&mut renderer, fulfilments.as_ref(), &intent).await?;
                continue;
            }
        };

        orchestrator.submit(submission).await;
        renderer.render(orchestrator.view(), orchestrator.links())?;
    }

    info!("Conversation closed.");
    Ok(())
}

async fn show_fulfilments<W: Write>(
    renderer: &mut Renderer<W>,
    client: Option<&IntentFulfilmentClient>,
    intent: &str,
) -> Result<()> {
    let Some(client) = client else {
        renderer.notice("Info", "No intent fulfilment endpoint is configured")?;
        return Ok(());
    };
    if intent.is_empty() {
        renderer.notice("Info", "Usage: /fulfilments <intent>")?;
        return Ok(());
    }
    match client.fetch(intent).await {
        Ok(Some(page)) => renderer.fulfilments(intent, &page.items)?,
        Ok(None) => {}
        Err(e) => error!(error = ?e, %intent, "Failed to retrieve intent fulfilment"),
    }
    Ok(())
}
