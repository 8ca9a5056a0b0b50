//! Terminal progress line for `quill run`.

use std::io::Write;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const INTERVAL: Duration = Duration::from_millis(80);

/// A stderr spinner whose label can change while it runs.
///
/// The elapsed time resets whenever the label changes, so each stage
/// shows its own duration.
pub struct Spinner {
    handle: JoinHandle<()>,
    label: watch::Sender<String>,
    cancel: watch::Sender<bool>,
}

impl Spinner {
    pub fn start(label: &str) -> Self {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let (label_tx, mut label_rx) = watch::channel(label.to_string());

        let handle = tokio::spawn(async move {
            let mut i = 0;
            let mut since = Instant::now();
            loop {
                if label_rx.has_changed().unwrap_or(false) {
                    label_rx.mark_unchanged();
                    since = Instant::now();
                }
                let line = render(i, &label_rx.borrow(), since.elapsed());
                eprint!("\x1b[2K\r{line}");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            label: label_tx,
            cancel: cancel_tx,
        }
    }

    pub fn set_label(&self, label: impl Into<String>) {
        let _ = self.label.send(label.into());
    }

    /// Print a line above the spinner without tearing it.
    pub fn println(&self, line: &str) {
        eprintln!("\x1b[2K\r{line}");
    }

    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}

fn render(tick: usize, label: &str, elapsed: Duration) -> String {
    let frame = FRAMES[tick % FRAMES.len()];
    format!("{frame} {label} ({}s)", elapsed.as_secs())
}
