//! Authorization popup abstraction.
//!
//! The connect flow only needs to open a window on a URL and later ask
//! whether it has been closed. The terminal implementation prints the URL
//! and treats the window as closed once the user presses Enter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// An open authorization window.
pub trait Popup: Send + Sync {
    fn is_closed(&self) -> bool;
}

/// Opens authorization windows.
pub trait PopupLauncher: Send + Sync {
    /// Open a window on `url`. `None` means it could not be opened.
    fn open(&self, url: &str) -> Option<Box<dyn Popup>>;
}

/// Prints the authorization URL and waits for Enter on stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalLauncher;

impl PopupLauncher for TerminalLauncher {
    fn open(&self, url: &str) -> Option<Box<dyn Popup>> {
        if url.trim().is_empty() {
            return None;
        }
        eprintln!("🔗 Open this URL in your browser to authorize:");
        eprintln!("   {}", url);
        eprintln!("   Press Enter once the authorization window is closed.");

        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();
        let reader = tokio::spawn(async move {
            let mut line = String::new();
            let _ = BufReader::new(tokio::io::stdin()).read_line(&mut line).await;
            flag.store(true, Ordering::SeqCst);
        });
        Some(Box::new(TerminalPopup { closed, reader }))
    }
}

struct TerminalPopup {
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl Popup for TerminalPopup {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for TerminalPopup {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// A popup closed by flipping a shared flag. Useful for embedding the
/// connect flow behind another surface.
#[derive(Debug, Clone, Default)]
pub struct FlagPopup {
    closed: Arc<AtomicBool>,
}

impl FlagPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Popup for FlagPopup {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
