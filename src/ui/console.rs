//! 控制台通道

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::ui::UserChannel;

pub struct ConsoleChannel {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserChannel for ConsoleChannel {
    async fn present_message(&mut self, message: &str) {
        println!("Agent: {}", message);
    }

    async fn present_error(&mut self, error: &str) {
        eprintln!("{}", error);
    }

    async fn read_input(&mut self) -> Option<String> {
        print!("You: ");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to read user input: {}", e);
                None
            }
        }
    }
}
