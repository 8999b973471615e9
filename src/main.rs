//! Terminal chat loop for the betstream library.
//!
//! Registers a thread against the configured backend, prints the reconciled
//! history, then reads user turns from stdin and streams replies to stdout.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use betstream::adapters::ReqwestHttpClient;
use betstream::config::BackendConfig;
use betstream::models::MessageRole;
use betstream::reconcile::TurnState;
use betstream::session::ChatSession;
use betstream::sidechannel::WidgetKind;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = BackendConfig::from_env();
    config
        .require_base_url()
        .map_err(|e| eyre!("{e}. Set MACHINA_CLIENT_URL to the backend base URL."))?;

    let http = Arc::new(ReqwestHttpClient::new());
    let mut session = ChatSession::new(http, config);

    let thread_id = session
        .open()
        .await
        .map_err(|e| eyre!("could not open a chat session: {e}"))?;
    eprintln!("connected (thread {})", thread_id);

    print_history(&session);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }

        match session.send(text).await {
            Ok(TurnState::Failed) | Ok(TurnState::Completed) => print_last_reply(&session),
            Ok(state) => eprintln!("turn ended in unexpected state {state:?}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }

    Ok(())
}

fn print_history<C: betstream::traits::HttpClient + 'static>(session: &ChatSession<C>) {
    let reconciler = session.reconciler();
    for message in reconciler.messages() {
        let prefix = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "bot",
        };
        println!("{}: {}", prefix, reconciler.display_text(message));
    }
}

fn print_last_reply<C: betstream::traits::HttpClient + 'static>(session: &ChatSession<C>) {
    let reconciler = session.reconciler();
    let Some(message) = reconciler
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant)
    else {
        return;
    };

    println!("bot: {}", reconciler.display_text(message));

    let index = reconciler.side_channel();
    let objects = index.objects(message.key);
    if !objects.is_empty() {
        let animate = index.should_animate(WidgetKind::Markets, message.key);
        println!("  [{} market(s){}]", objects.len(), if animate { "" } else { ", cached" });
    }
    for suggestion in index.suggestions(message.key) {
        println!("  try: {}", suggestion);
    }
}
