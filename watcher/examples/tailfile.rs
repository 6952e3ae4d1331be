//! Watch a file and print each newly appended payload.
//!
//! ```bash
//! cargo run --example tailfile -- /tmp/demo.log
//! # elsewhere: echo hello >> /tmp/demo.log
//! ```

use eventwatch_watcher::{EventNotifier, SourceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/eventwatch-demo.log".to_string());

    let (notifier, mut rx) = EventNotifier::new(16);
    notifier.add_watcher(SourceConfig::file("demo", &path))?;
    println!("watching {path}; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            entry = rx.recv() => match entry {
                Some(entry) => {
                    println!(
                        "[{}] {} bytes: {}",
                        entry.source,
                        entry.payload.len(),
                        String::from_utf8_lossy(&entry.payload).trim_end()
                    );
                }
                None => break,
            },
        }
    }

    notifier.close().await;
    Ok(())
}
