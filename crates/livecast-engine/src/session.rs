//! Encoder-facing stream session façade.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use livecast_flv::{AudioConfig, VideoConfig};
use livecast_transport::{
    RtmpPublisher, StatusSink, ThreadContext, TransportError, TransportFactory, TransportResult,
};

use crate::stats::FrameStats;

struct SessionInner {
    publisher: Option<Arc<RtmpPublisher>>,
    sink: Option<Arc<dyn StatusSink>>,
    pending_video: Option<VideoConfig>,
    pending_audio: Option<AudioConfig>,
}

/// Orchestrates one publish pipeline: encoders in, RTMP out.
///
/// Owned by the host as an explicit handle. Mutating operations are
/// serialised on one mutex; the frame path snapshots the publisher
/// under the lock and releases it before muxing, so producers do not
/// contend with configuration changes.
pub struct StreamSession {
    factory: Arc<dyn TransportFactory>,
    inner: Mutex<SessionInner>,
    stats: Mutex<FrameStats>,
}

impl StreamSession {
    /// Create a session using `factory` for transport handles.
    pub fn new(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            inner: Mutex::new(SessionInner {
                publisher: None,
                sink: None,
                pending_video: None,
                pending_audio: None,
            }),
            stats: Mutex::new(FrameStats::new()),
        }
    }

    /// Buffer the video configuration and forward it to the publisher
    /// if one exists.
    ///
    /// Configure video before `start()`; metadata is not re-emitted
    /// mid-session.
    pub fn configure_video(&self, config: VideoConfig) {
        let mut inner = self.inner.lock();
        inner.pending_video = Some(config);
        if let Some(publisher) = &inner.publisher {
            publisher.configure_video(config);
        }
    }

    /// Buffer the audio configuration and forward it to the publisher
    /// if one exists.
    pub fn configure_audio(&self, config: AudioConfig) {
        let mut inner = self.inner.lock();
        inner.pending_audio = Some(config.clone());
        if let Some(publisher) = &inner.publisher {
            publisher.configure_audio(config);
        }
    }

    /// Bind a new publisher to `url` and `sink`, replacing (and
    /// stopping) any previous one. Buffered configurations are applied
    /// to the new publisher.
    #[instrument(name = "session_init", skip(self, sink))]
    pub fn init(&self, url: &str, sink: Arc<dyn StatusSink>) -> TransportResult<()> {
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.publisher.take() {
            debug!("replacing existing publisher");
            previous.stop();
        }

        let publisher = Arc::new(RtmpPublisher::new(
            url,
            Arc::clone(&self.factory),
            Arc::clone(&sink),
        )?);

        if let Some(config) = inner.pending_video {
            publisher.configure_video(config);
        }
        if let Some(config) = inner.pending_audio.clone() {
            publisher.configure_audio(config);
        }

        inner.publisher = Some(publisher);
        inner.sink = Some(sink);

        info!("session initialized");
        Ok(())
    }

    /// Start publishing.
    pub fn start(&self) -> TransportResult<()> {
        let publisher = self
            .inner
            .lock()
            .publisher
            .clone()
            .ok_or(TransportError::NotInitialized)?;
        publisher.start()
    }

    /// Stop publishing, notify the sink and release it. Idempotent.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&self) {
        let (publisher, sink) = {
            let mut inner = self.inner.lock();
            (inner.publisher.take(), inner.sink.take())
        };

        if let Some(publisher) = publisher {
            publisher.stop();
        }
        if let Some(sink) = sink {
            sink.on_closed(ThreadContext::Main);
        }
        self.stats.lock().clear();
    }

    /// Hand one encoded video buffer to the publisher and update the
    /// throughput estimate.
    ///
    /// `pts` is informational; wire timestamps are wall-clock since
    /// publish start.
    pub fn push_video_frame(&self, data: &[u8], pts: i64) {
        let Some(publisher) = self.inner.lock().publisher.clone() else {
            warn!(len = data.len(), pts, "dropping video frame: no publisher");
            return;
        };
        publisher.push_video_frame(data);

        let now_ms = i64::from(self.factory.now_ms());
        if let Some(report) = self.stats.lock().on_sample(data.len(), now_ms) {
            let sink = self.inner.lock().sink.clone();
            if let Some(sink) = sink {
                sink.on_stats(report.bitrate_kbps, report.fps);
            }
        }
    }

    /// Hand one raw AAC frame to the publisher.
    pub fn push_audio_frame(&self, data: &[u8], pts: i64) {
        let Some(publisher) = self.inner.lock().publisher.clone() else {
            warn!(len = data.len(), pts, "dropping audio frame: no publisher");
            return;
        };
        publisher.push_audio_frame(data);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.stop();
    }
}
