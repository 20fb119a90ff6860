//! Event-stream conversion API.
//!
//! [`convert_with_events`] runs a conversion in the background and exposes its
//! progress as a `Stream` of [`ConversionEvent`]s, for callers that would
//! rather poll than implement [`ConversionProgressCallback`]. The final
//! result is delivered separately through the returned `JoinHandle`.
//!
//! Events arrive in the order the pipeline emits them: `Started`, a
//! `Progress`/`PageComplete` pair per page, then `Completed` or `Failed`.
//! The stream ends when the conversion task drops its sender.

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::DarkModeError;
use crate::output::ConversionOutput;
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

/// One progress notification from a running conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversionEvent {
    Started {
        total_pages: usize,
    },
    Progress {
        percent: f32,
        status: String,
    },
    PageComplete {
        page_num: usize,
        total_pages: usize,
        jpeg_bytes: usize,
    },
    Completed {
        total_pages: usize,
        output_bytes: usize,
    },
    Failed {
        error: String,
    },
}

/// A boxed stream of conversion events.
pub type EventStream = Pin<Box<dyn Stream<Item = ConversionEvent> + Send>>;

/// Start converting `input` in a background task.
///
/// Any progress callback already set on `config` keeps receiving events as
/// well. Must be called from within a tokio runtime.
///
/// # Example
/// ```rust,no_run
/// use pdf_darkmode::{convert_with_events, ConversionConfig, ConversionEvent};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut events, handle) = convert_with_events("document.pdf", &ConversionConfig::default());
/// while let Some(event) = events.next().await {
///     if let ConversionEvent::Progress { percent, status } = event {
///         eprintln!("{percent:>3.0}% {status}");
///     }
/// }
/// let output = handle.await??;
/// std::fs::write(&output.file_name, &output.pdf)?;
/// # Ok(())
/// # }
/// ```
pub fn convert_with_events(
    input: impl Into<String>,
    config: &ConversionConfig,
) -> (
    EventStream,
    JoinHandle<Result<ConversionOutput, DarkModeError>>,
) {
    let input = input.into();
    let (tx, rx) = mpsc::unbounded_channel();

    let mut config = config.clone();
    config.progress_callback = Some(Arc::new(ChannelProgressCallback {
        tx,
        inner: config.progress_callback.take(),
    }) as ProgressCallback);

    let handle = tokio::spawn(async move { convert::convert(&input, &config).await });
    (Box::pin(UnboundedReceiverStream::new(rx)), handle)
}

/// Forwards callback invocations into a channel, and on to an optional
/// caller-supplied callback.
struct ChannelProgressCallback {
    tx: mpsc::UnboundedSender<ConversionEvent>,
    inner: Option<ProgressCallback>,
}

impl ChannelProgressCallback {
    fn send(&self, event: ConversionEvent) {
        // The receiver may have been dropped; the conversion carries on.
        let _ = self.tx.send(event);
    }
}

impl ConversionProgressCallback for ChannelProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.send(ConversionEvent::Started { total_pages });
        if let Some(ref cb) = self.inner {
            cb.on_conversion_start(total_pages);
        }
    }

    fn on_progress(&self, percent: f32, status: &str) {
        self.send(ConversionEvent::Progress {
            percent,
            status: status.to_string(),
        });
        if let Some(ref cb) = self.inner {
            cb.on_progress(percent, status);
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, jpeg_bytes: usize) {
        self.send(ConversionEvent::PageComplete {
            page_num,
            total_pages,
            jpeg_bytes,
        });
        if let Some(ref cb) = self.inner {
            cb.on_page_complete(page_num, total_pages, jpeg_bytes);
        }
    }

    fn on_conversion_complete(&self, total_pages: usize, output_bytes: usize) {
        self.send(ConversionEvent::Completed {
            total_pages,
            output_bytes,
        });
        if let Some(ref cb) = self.inner {
            cb.on_conversion_complete(total_pages, output_bytes);
        }
    }

    fn on_conversion_failed(&self, error: &str) {
        self.send(ConversionEvent::Failed {
            error: error.to_string(),
        });
        if let Some(ref cb) = self.inner {
            cb.on_conversion_failed(error);
        }
    }
}
