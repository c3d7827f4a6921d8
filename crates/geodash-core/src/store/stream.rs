// ── Layer snapshot subscriptions ──

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::LayerView;

/// A subscription to the layer table.
///
/// Provides both the snapshot captured at subscription time and change
/// notification via [`changed()`](Self::changed) or a `Stream`.
pub struct LayerStream {
    current: Arc<Vec<LayerView>>,
    receiver: watch::Receiver<Arc<Vec<LayerView>>>,
}

impl LayerStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<LayerView>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or the last `changed()`).
    pub fn current(&self) -> &Arc<Vec<LayerView>> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<Vec<LayerView>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publish. `None` once the table is dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<LayerView>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then one item per publish.
    pub fn into_stream(self) -> LayerWatchStream {
        LayerWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct LayerWatchStream {
    inner: WatchStream<Arc<Vec<LayerView>>>,
}

impl Stream for LayerWatchStream {
    type Item = Arc<Vec<LayerView>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
