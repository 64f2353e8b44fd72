//! Interactive serial terminal over a connected session
//!
//! Lines typed on stdin are sent to the device; inbound lines and connection state
//! changes are printed as they are published.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use nuslink_core::{ClientSnapshot, ConnectionState, NusClient};

use crate::config::CliConfig;
use crate::error::Result;

/// Inbound lines in `snapshot` not printed yet; advances `seen` past them
pub fn unseen_lines<'a>(snapshot: &'a ClientSnapshot, seen: &mut u64) -> &'a [String] {
    let lines = snapshot.inbound_since(*seen);
    *seen = snapshot.inbound_seq;
    lines
}

pub struct TerminalSession {
    client: NusClient,
    config: CliConfig,
}

impl TerminalSession {
    pub fn new(client: NusClient, config: CliConfig) -> Self {
        Self { client, config }
    }

    /// Run until the user quits, stdin closes, or the link drops
    pub async fn run(&self) -> Result<()> {
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut updates = self.client.subscribe();
        let initial = updates.borrow_and_update().clone();
        let mut seen = initial.inbound_seq;
        let mut state = initial.connection_state;

        loop {
            tokio::select! {
                line = input.next_line() => {
                    match line? {
                        Some(line) if line.trim() == self.config.quit_command => {
                            self.client.disconnect().await?;
                            break;
                        }
                        Some(line) => self.send_line(line).await?,
                        None => {
                            debug!("Input closed");
                            self.client.disconnect().await?;
                            break;
                        }
                    }
                }

                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    for line in unseen_lines(&snapshot, &mut seen) {
                        println!("< {}", line);
                    }
                    if snapshot.connection_state != state {
                        state = snapshot.connection_state;
                        if self.config.show_state_changes {
                            println!("* {}", state);
                        }
                    }
                    if link_lost(&snapshot) {
                        println!("* Connection lost");
                        break;
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    self.client.disconnect().await?;
                    break;
                }
            }
        }
        Ok(())
    }

    async fn send_line(&self, line: String) -> Result<()> {
        let text = format!("{}{}", line, self.config.line_ending);
        self.client.send_data(text).await?;
        if let Some(error) = self.client.snapshot().error {
            eprintln!("! {}", error);
            self.client.clear_error().await?;
        }
        Ok(())
    }
}

fn link_lost(snapshot: &ClientSnapshot) -> bool {
    snapshot.connection_state == ConnectionState::Disconnected
}
