//! Interactive chat session.

use std::io::Write;

use hiresense::message::upsert_assistant;
use hiresense::{Client, DeltaSink, Message};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;

/// Prints each delta to stdout and mirrors the reply into the history.
struct TerminalSink<'a> {
    history: &'a mut Vec<Message>,
}

impl DeltaSink for TerminalSink<'_> {
    fn on_delta(&mut self, delta: &str, accumulated: &str) {
        print!("{delta}");
        let _ = std::io::stdout().flush();
        upsert_assistant(self.history, accumulated);
    }
}

/// A REPL over one conversation.
#[derive(Debug)]
pub struct ChatSession {
    client: Client,
    history: Vec<Message>,
    prompt: String,
}

impl ChatSession {
    pub const fn new(client: Client, prompt: String) -> Self {
        Self {
            client,
            history: Vec::new(),
            prompt,
        }
    }

    /// Read turns from stdin until EOF or `exit`.
    pub async fn run(&mut self, first: Option<String>) -> Result<()> {
        println!("HireSense chat | '/clear' resets, 'exit' quits\n");

        if let Some(message) = first {
            println!("{}{message}", self.prompt);
            self.submit(message).await;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", self.prompt);
            std::io::stdout().flush()?;

            // Ctrl-C at the prompt ends the session; during a reply it only
            // cancels the reply.
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                println!();
                break;
            };

            match line.trim() {
                "" => {}
                "exit" | "quit" => break,
                "/clear" => {
                    self.history.clear();
                    println!("(conversation cleared)\n");
                }
                text => self.submit(text.to_string()).await,
            }
        }

        Ok(())
    }

    /// Send one user turn. On failure the history is restored to what it
    /// was before the turn and the error is printed.
    async fn submit(&mut self, text: String) {
        let before = self.history.len();
        self.history.push(Message::user(text));
        let snapshot = self.history.clone();

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let mut sink = TerminalSink {
            history: &mut self.history,
        };
        let result = self
            .client
            .stream_chat_with(&snapshot, &mut sink, &cancel)
            .await;
        watcher.abort();

        match result {
            Ok(reply) => {
                debug!(chars = reply.chars().count(), turns = self.history.len(), "reply done");
                println!("\n");
            }
            Err(e) => {
                self.history.truncate(before);
                if e.is_cancelled() {
                    println!("\n(cancelled)\n");
                } else {
                    println!("\nerror: {e}\n");
                }
            }
        }
    }
}
