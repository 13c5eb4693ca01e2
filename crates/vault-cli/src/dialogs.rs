//! Terminal implementations of the edit workflow's user-facing collaborators.

use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use vault_core::services::{Connectivity, Dialogs};

/// Prompts on stderr and reads answers from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDialogs {
    assume_yes: bool,
}

impl TerminalDialogs {
    /// `assume_yes` answers every confirmation without reading stdin
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl Dialogs for TerminalDialogs {
    async fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        eprint!("{prompt} [y/N] ");
        io::stderr().flush().ok();

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await
        {
            Ok(_) => is_affirmative(&answer),
            Err(error) => {
                tracing::warn!("Failed to read confirmation: {error}");
                false
            }
        }
    }

    fn alert(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }

    fn toast(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_busy(&self, message: &str) {
        eprintln!("{message}");
    }

    fn hide_busy(&self) {}
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Connectivity fixed by the CLI configuration
#[derive(Debug, Clone, Copy)]
pub struct StaticConnectivity {
    online: bool,
}

impl StaticConnectivity {
    pub const fn new(online: bool) -> Self {
        Self { online }
    }
}

impl Connectivity for StaticConnectivity {
    fn is_connected(&self) -> bool {
        self.online
    }
}
