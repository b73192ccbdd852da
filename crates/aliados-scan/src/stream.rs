//! # Decode Loop
//!
//! A live camera as a lazy, cancellable stream of [`DecodeEvent`]s.
//!
//! ## Task Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          DecodeLoop                                     │
//! │                                                                         │
//! │   spawned task                                   owner                  │
//! │   ────────────                                   ─────                  │
//! │   loop {                                                                │
//! │     select! {                                                           │
//! │       cancelled ──────────────────────────────── release()              │
//! │       frame = source.next_frame()                                       │
//! │     }                                                                   │
//! │     spawn_blocking(decode) ──► DecodeEvent ──mpsc──► Stream::next()     │
//! │   }                                                                     │
//! │   drop(source)   ◄── camera released before release() returns           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Camera errors end the stream with one `Fatal` event. Decode errors become
//! `NotFound` and the loop keeps going.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use aliados_core::scan::DecodeEvent;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::camera::FrameSource;
use crate::decoder::QrDecoder;

/// Events buffered between the loop task and its owner.
const EVENT_BUFFER: usize = 16;

pub struct DecodeLoop {
    device: String,
    cancel: CancellationToken,
    events: ReceiverStream<DecodeEvent>,
    task: JoinHandle<()>,
}

impl DecodeLoop {
    /// Spawns the loop on `source`. The loop owns the source until it ends.
    pub fn spawn(source: Box<dyn FrameSource>, decoder: Arc<dyn QrDecoder>) -> Self {
        let device = source.device().to_string();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(run(source, decoder, tx, cancel.clone()));

        DecodeLoop {
            device,
            cancel,
            events: ReceiverStream::new(rx),
            task,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Token that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the loop and waits until the camera is released.
    pub async fn release(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(device = %self.device, error = %e, "Decode loop task failed");
        }
    }
}

impl Stream for DecodeLoop {
    type Item = DecodeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().events.poll_next_unpin(cx)
    }
}

async fn run(
    mut source: Box<dyn FrameSource>,
    decoder: Arc<dyn QrDecoder>,
    tx: mpsc::Sender<DecodeEvent>,
    cancel: CancellationToken,
) {
    let device = source.device().to_string();
    info!(device = %device, "Decode loop started");

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = source.next_frame() => frame,
        };

        let event = match frame {
            Ok(frame) => {
                let decoder = decoder.clone();
                match tokio::task::spawn_blocking(move || decoder.decode(&frame)).await {
                    Ok(Ok(text)) => {
                        debug!(device = %device, "QR decoded");
                        DecodeEvent::Decoded(text)
                    }
                    Ok(Err(e)) => {
                        trace!(device = %device, reason = %e, "No QR in frame");
                        DecodeEvent::NotFound
                    }
                    Err(e) => {
                        warn!(device = %device, error = %e, "Frame decode task failed");
                        DecodeEvent::NotFound
                    }
                }
            }
            Err(e) if e.is_fatal() => {
                warn!(device = %device, error = %e, "Camera failed, ending decode loop");
                let _ = tx.send(DecodeEvent::Fatal(e.to_string())).await;
                break;
            }
            Err(e) => {
                trace!(device = %device, reason = %e, "Unusable frame");
                DecodeEvent::NotFound
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(event) => {
                if sent.is_err() {
                    debug!(device = %device, "Decode loop receiver dropped");
                    break;
                }
            }
        }
    }

    drop(source);
    info!(device = %device, "Decode loop stopped");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::camera::Frame;
    use crate::error::{CameraAccessError, DecodeError, ScanResult};

    /// Frame whose pixels spell `text`; an empty frame holds no code.
    pub(crate) fn text_frame(text: &str) -> Frame {
        Frame {
            width: text.len() as u32,
            height: 1,
            luma: text.as_bytes().to_vec(),
        }
    }

    /// Decodes frames built by [`text_frame`].
    pub(crate) struct TextDecoder;

    impl QrDecoder for TextDecoder {
        fn decode(&self, frame: &Frame) -> Result<String, DecodeError> {
            if frame.luma.is_empty() {
                return Err(DecodeError::NotFound);
            }
            String::from_utf8(frame.luma.clone()).map_err(|e| DecodeError::Corrupt(e.to_string()))
        }
    }

    /// Plays a script of frames, then idles until cancelled.
    pub(crate) struct ScriptedSource {
        pub device: String,
        pub script: VecDeque<ScanResult<Frame>>,
        pub open: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FrameSource for ScriptedSource {
        fn device(&self) -> &str {
            &self.device
        }

        async fn next_frame(&mut self) -> ScanResult<Frame> {
            match self.script.pop_front() {
                Some(step) => step,
                None => std::future::pending().await,
            }
        }
    }

    impl Drop for ScriptedSource {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn source(script: Vec<ScanResult<Frame>>, open: &Arc<AtomicUsize>) -> Box<dyn FrameSource> {
        open.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedSource {
            device: "cam".into(),
            script: script.into(),
            open: open.clone(),
        })
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut stream = DecodeLoop::spawn(
            source(
                vec![Ok(text_frame("")), Ok(text_frame("hello")), Ok(text_frame(""))],
                &open,
            ),
            Arc::new(TextDecoder),
        );

        assert_eq!(stream.next().await, Some(DecodeEvent::NotFound));
        assert_eq!(stream.next().await, Some(DecodeEvent::Decoded("hello".into())));
        assert_eq!(stream.next().await, Some(DecodeEvent::NotFound));

        stream.release().await;
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_camera_error_ends_stream() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut stream = DecodeLoop::spawn(
            source(
                vec![Err(CameraAccessError::DeviceLost("cam".into()).into())],
                &open,
            ),
            Arc::new(TextDecoder),
        );

        assert!(matches!(stream.next().await, Some(DecodeEvent::Fatal(_))));
        assert_eq!(stream.next().await, None);
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_decode_error_is_not_fatal() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut stream = DecodeLoop::spawn(
            source(
                vec![
                    Err(DecodeError::UnreadableImage("half written".into()).into()),
                    Ok(text_frame("ok")),
                ],
                &open,
            ),
            Arc::new(TextDecoder),
        );

        assert_eq!(stream.next().await, Some(DecodeEvent::NotFound));
        assert_eq!(stream.next().await, Some(DecodeEvent::Decoded("ok".into())));
        stream.release().await;
    }

    #[tokio::test]
    async fn test_cancel_token_ends_stream() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut stream = DecodeLoop::spawn(source(vec![], &open), Arc::new(TextDecoder));

        stream.cancel_token().cancel();
        assert_eq!(stream.next().await, None);
        stream.release().await;
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }

    /// Panics on frames spelling "boom", otherwise reads them as text.
    struct FragileDecoder;

    impl QrDecoder for FragileDecoder {
        fn decode(&self, frame: &Frame) -> Result<String, DecodeError> {
            if frame.luma == b"boom" {
                panic!("decoder blew up");
            }
            TextDecoder.decode(frame)
        }
    }

    #[tokio::test]
    async fn test_decoder_panic_is_not_fatal() {
        let open = Arc::new(AtomicUsize::new(0));
        let mut stream = DecodeLoop::spawn(
            source(vec![Ok(text_frame("boom")), Ok(text_frame("ok"))], &open),
            Arc::new(FragileDecoder),
        );

        assert_eq!(stream.next().await, Some(DecodeEvent::NotFound));
        assert_eq!(stream.next().await, Some(DecodeEvent::Decoded("ok".into())));
        stream.release().await;
        assert_eq!(open.load(Ordering::SeqCst), 0);
    }
}
