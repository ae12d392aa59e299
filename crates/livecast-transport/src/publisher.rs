//! RTMP publisher: connect lifecycle, writer thread and media enqueue.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use url::Url;

use livecast_flv::{AudioConfig, FlvMuxer, VideoConfig};

use crate::error::{StreamErrorCode, TransportError};
use crate::packet::{PacketType, RtmpPacket};
use crate::queue::PacketQueue;
use crate::status::{StatusSink, ThreadContext};
use crate::transport::TransportFactory;
use crate::{TransportResult, CHANNEL_AUDIO, CHANNEL_INFO, CHANNEL_VIDEO, CONNECT_TIMEOUT_SECS};

/// Publish lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublisherState {
    /// No writer task is running.
    #[default]
    Idle,

    /// The writer task is performing the connect sequence.
    Connecting,

    /// Connected; the send loop is draining the queue.
    Publishing,

    /// `stop()` is tearing the session down.
    Closing,

    /// The connect sequence failed; a fresh init/start may retry.
    Failed,
}

impl PublisherState {
    /// Simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Publishing => "Publishing",
            Self::Closing => "Closing",
            Self::Failed => "Failed",
        }
    }
}

/// State shared between the publisher handle and its writer thread.
struct Shared {
    url: String,
    factory: Arc<dyn TransportFactory>,
    sink: Arc<dyn StatusSink>,
    queue: Arc<PacketQueue>,
    state: RwLock<PublisherState>,
    is_publishing: AtomicBool,
    /// Transport clock value at publish success; 0 = not publishing yet.
    publish_started_ms: AtomicU32,
}

/// Publishes muxed FLV tags to an RTMP ingest server.
///
/// One dedicated writer thread owns the transport handle; producers
/// enqueue packets from arbitrary threads. Wire timestamps are derived
/// from the transport clock relative to publish start, not from encoder
/// PTS.
pub struct RtmpPublisher {
    shared: Arc<Shared>,
    muxer: Mutex<FlvMuxer>,
    last_video_ts: AtomicU32,
    last_audio_ts: AtomicU32,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl RtmpPublisher {
    /// Create a publisher bound to `url` and a status sink.
    ///
    /// The URL is validated here; everything else about it is the
    /// transport's business.
    pub fn new(
        url: impl Into<String>,
        factory: Arc<dyn TransportFactory>,
        sink: Arc<dyn StatusSink>,
    ) -> TransportResult<Self> {
        let url = url.into();

        let parsed = Url::parse(&url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "rtmp" | "rtmps") {
            return Err(TransportError::InvalidUrl(
                "URL must start with rtmp:// or rtmps://".to_string(),
            ));
        }

        info!(url = %mask_url(&url), "publisher created");

        Ok(Self {
            shared: Arc::new(Shared {
                url,
                factory,
                sink,
                queue: Arc::new(PacketQueue::new()),
                state: RwLock::new(PublisherState::Idle),
                is_publishing: AtomicBool::new(false),
                publish_started_ms: AtomicU32::new(0),
            }),
            muxer: Mutex::new(FlvMuxer::new()),
            last_video_ts: AtomicU32::new(0),
            last_audio_ts: AtomicU32::new(0),
            writer: Mutex::new(None),
        })
    }

    /// Replace the video configuration. Only effective before `start()`;
    /// metadata is not re-emitted mid-session.
    pub fn configure_video(&self, config: VideoConfig) {
        self.muxer.lock().set_video_config(config);
    }

    /// Replace the audio configuration.
    pub fn configure_audio(&self, config: AudioConfig) {
        self.muxer.lock().set_audio_config(config);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PublisherState {
        *self.shared.state.read()
    }

    /// Spawn the writer thread and begin the connect sequence.
    ///
    /// Connect failures are reported through the status sink on the
    /// writer thread.
    #[instrument(name = "publisher_start", skip(self))]
    pub fn start(&self) -> TransportResult<()> {
        let mut writer = self.writer.lock();
        if let Some(handle) = writer.as_ref() {
            if !handle.is_finished() {
                return Err(TransportError::AlreadyPublishing);
            }
            // A previous session's writer already exited (e.g. failed
            // connect); reap it before starting over.
            if let Some(handle) = writer.take() {
                let _ = handle.join();
            }
        }

        self.shared.is_publishing.store(false, Ordering::SeqCst);
        self.shared.queue.open();

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("rtmp-writer".to_string())
            .spawn(move || run_writer(shared))?;

        *writer = Some(handle);
        Ok(())
    }

    /// Stop publishing and tear the session down. Idempotent.
    ///
    /// Must not be called from inside a status-sink callback; the join
    /// would deadlock on the writer thread.
    #[instrument(name = "publisher_stop", skip(self))]
    pub fn stop(&self) {
        *self.shared.state.write() = PublisherState::Closing;
        self.shared.is_publishing.store(false, Ordering::SeqCst);
        self.shared.queue.close();

        if let Some(handle) = self.writer.lock().take() {
            let _ = handle.join();
        }

        self.shared.queue.clear();
        self.muxer.lock().reset();
        self.last_video_ts.store(0, Ordering::SeqCst);
        self.last_audio_ts.store(0, Ordering::SeqCst);
        self.shared.publish_started_ms.store(0, Ordering::SeqCst);
        *self.shared.state.write() = PublisherState::Idle;

        info!("publisher stopped");
    }

    /// Mux and enqueue one encoded video input buffer.
    ///
    /// Parameter-set-only input updates the muxer and produces no
    /// packet. Encoder PTS is not used for the wire timestamp.
    pub fn push_video_frame(&self, data: &[u8]) {
        let mut muxer = self.muxer.lock();

        let frame = muxer.parse_video_frame(data);
        if !frame.has_data() {
            trace!(len = data.len(), "video input held no slice data");
            return;
        }

        self.ensure_headers(&mut muxer);

        let payload = muxer.build_video_tag(&frame);
        if payload.is_empty() {
            return;
        }

        let ts = self.media_timestamp(&self.last_video_ts);
        self.enqueue(payload, PacketType::Video, ts, CHANNEL_VIDEO);
    }

    /// Mux and enqueue one raw AAC frame.
    ///
    /// Dropped until the audio configuration carries an
    /// AudioSpecificConfig.
    pub fn push_audio_frame(&self, data: &[u8]) {
        let mut muxer = self.muxer.lock();

        if !muxer.audio_sequence_ready() {
            trace!(len = data.len(), "dropping audio frame before ASC is known");
            return;
        }

        self.ensure_headers(&mut muxer);

        let payload = muxer.build_audio_tag(data);
        if payload.is_empty() {
            return;
        }

        let ts = self.media_timestamp(&self.last_audio_ts);
        self.enqueue(payload, PacketType::Audio, ts, CHANNEL_AUDIO);
    }

    /// Wall-clock media timestamp; before publish start, reuse the last
    /// value so the stream stays monotonic.
    fn media_timestamp(&self, last: &AtomicU32) -> u32 {
        let started = self.shared.publish_started_ms.load(Ordering::SeqCst);
        let ts = if started > 0 {
            self.shared.factory.now_ms().wrapping_sub(started)
        } else {
            last.load(Ordering::SeqCst)
        };
        last.store(ts, Ordering::SeqCst);
        ts
    }

    /// Enqueue metadata and sequence headers ahead of the first media
    /// tag of the session. Runs under the muxer lock, which is what
    /// keeps headers ahead of every media packet in queue order.
    fn ensure_headers(&self, muxer: &mut FlvMuxer) {
        if !muxer.metadata_sent() {
            if let Some(tag) = muxer.build_metadata_tag() {
                debug!(len = tag.len(), "enqueueing onMetaData");
                if self.enqueue(tag, PacketType::Info, 0, CHANNEL_INFO) {
                    muxer.mark_metadata_sent();
                }
            }
        }

        if !muxer.video_sequence_sent() {
            if let Some(tag) = muxer.build_video_sequence_header() {
                debug!(len = tag.len(), "enqueueing video sequence header");
                self.enqueue(tag, PacketType::Video, 0, CHANNEL_VIDEO);
            }
        }

        if !muxer.audio_sequence_sent() {
            if let Some(tag) = muxer.build_audio_sequence_header() {
                debug!(len = tag.len(), "enqueueing audio sequence header");
                if self.enqueue(tag, PacketType::Audio, 0, CHANNEL_AUDIO) {
                    muxer.mark_audio_sequence_sent();
                }
            }
        }
    }

    fn enqueue(&self, body: Bytes, packet_type: PacketType, timestamp_ms: u32, channel: u8) -> bool {
        if body.is_empty() {
            return false;
        }
        self.shared
            .queue
            .enqueue(RtmpPacket::new(body, packet_type, timestamp_ms, channel))
    }
}

impl Drop for RtmpPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Writer thread: connect sequence, then the send loop.
fn run_writer(shared: Arc<Shared>) {
    shared.sink.on_connecting(ThreadContext::Worker);
    *shared.state.write() = PublisherState::Connecting;

    let fail = |code: StreamErrorCode| {
        error!(code = code.code(), "connect sequence failed");
        shared.sink.on_error(code);
        *shared.state.write() = PublisherState::Failed;
    };

    let Some(mut transport) = shared.factory.alloc() else {
        fail(StreamErrorCode::InitFailure);
        return;
    };

    transport.init();
    if !transport.setup_url(&shared.url) {
        fail(StreamErrorCode::UrlSetupFailure);
        return;
    }

    transport.set_timeout(CONNECT_TIMEOUT_SECS);
    transport.enable_write();

    if !transport.connect() {
        fail(StreamErrorCode::ConnectFailure);
        return;
    }
    if !transport.connect_stream(0) {
        fail(StreamErrorCode::ConnectFailure);
        return;
    }

    shared
        .publish_started_ms
        .store(shared.factory.now_ms(), Ordering::SeqCst);
    shared.sink.on_connected();
    *shared.state.write() = PublisherState::Publishing;
    shared.is_publishing.store(true, Ordering::SeqCst);

    info!(url = %mask_url(&shared.url), "publishing started");

    while shared.is_publishing.load(Ordering::SeqCst) {
        let Some(mut packet) = shared.queue.dequeue_blocking() else {
            break;
        };

        packet.stream_id = transport.stream_id();
        if !transport.send_packet(&packet, true) {
            // A single bad write must not sink the stream.
            warn!(
                packet_type = ?packet.packet_type,
                len = packet.len(),
                "send_packet failed"
            );
        }
    }

    transport.close();
    debug!("writer thread exiting");
}

/// Mask the final path component of a stream URL for logging.
fn mask_url(url: &str) -> String {
    let Some(idx) = url.rfind('/') else {
        return url.to_string();
    };
    let (prefix, segment) = url.split_at(idx + 1);
    if segment.is_empty() {
        return url.to_string();
    }

    let chars: Vec<char> = segment.chars().collect();
    let masked = if chars.len() > 4 {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "*".repeat(chars.len())
    };
    format!("{prefix}{masked}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::transport::RtmpTransport;
    use livecast_flv::VideoCodecId;

    const SPS_PPS_IDR: &[u8] = &[
        0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1F, // SPS
        0x00, 0x00, 0x00, 0x01, 0x68, 0xCE, 0x06, 0xE2, // PPS
        0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84, // IDR
    ];
    const INTER_FRAME: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x41, 0x9A, 0x24];

    #[derive(Debug, Clone)]
    struct SentPacket {
        packet_type: PacketType,
        channel: u8,
        timestamp_ms: u32,
        stream_id: u32,
        body: Vec<u8>,
    }

    #[derive(Default)]
    struct Behaviour {
        fail_alloc: bool,
        fail_setup_url: bool,
        fail_connect: bool,
        fail_connect_stream: bool,
        fail_sends: bool,
    }

    struct MockTransport {
        behaviour: Arc<Behaviour>,
        sent: Arc<Mutex<Vec<SentPacket>>>,
    }

    impl RtmpTransport for MockTransport {
        fn init(&mut self) {}

        fn setup_url(&mut self, _url: &str) -> bool {
            !self.behaviour.fail_setup_url
        }

        fn set_timeout(&mut self, _seconds: u32) {}

        fn enable_write(&mut self) {}

        fn connect(&mut self) -> bool {
            !self.behaviour.fail_connect
        }

        fn connect_stream(&mut self, _index: u32) -> bool {
            !self.behaviour.fail_connect_stream
        }

        fn send_packet(&mut self, packet: &RtmpPacket, _queued: bool) -> bool {
            self.sent.lock().push(SentPacket {
                packet_type: packet.packet_type,
                channel: packet.channel,
                timestamp_ms: packet.timestamp_ms,
                stream_id: packet.stream_id,
                body: packet.body.to_vec(),
            });
            !self.behaviour.fail_sends
        }

        fn stream_id(&self) -> u32 {
            42
        }

        fn close(&mut self) {}
    }

    struct MockFactory {
        behaviour: Arc<Behaviour>,
        clock_ms: AtomicU32,
        sent: Arc<Mutex<Vec<SentPacket>>>,
    }

    impl MockFactory {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour: Arc::new(behaviour),
                clock_ms: AtomicU32::new(1_000),
                sent: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn advance(&self, ms: u32) {
            self.clock_ms.fetch_add(ms, Ordering::SeqCst);
        }

        fn sent(&self) -> Vec<SentPacket> {
            self.sent.lock().clone()
        }
    }

    impl TransportFactory for MockFactory {
        fn alloc(&self) -> Option<Box<dyn RtmpTransport>> {
            if self.behaviour.fail_alloc {
                return None;
            }
            Some(Box::new(MockTransport {
                behaviour: Arc::clone(&self.behaviour),
                sent: Arc::clone(&self.sent),
            }))
        }

        fn now_ms(&self) -> u32 {
            self.clock_ms.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Connecting(ThreadContext),
        Connected,
        Error(StreamErrorCode),
        Closed(ThreadContext),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl StatusSink for RecordingSink {
        fn on_connecting(&self, ctx: ThreadContext) {
            self.events.lock().push(Event::Connecting(ctx));
        }

        fn on_connected(&self) {
            self.events.lock().push(Event::Connected);
        }

        fn on_error(&self, code: StreamErrorCode) {
            self.events.lock().push(Event::Error(code));
        }

        fn on_closed(&self, ctx: ThreadContext) {
            self.events.lock().push(Event::Closed(ctx));
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn publisher(
        factory: &Arc<MockFactory>,
        sink: &Arc<RecordingSink>,
    ) -> RtmpPublisher {
        let publisher = RtmpPublisher::new(
            "rtmp://ingest.example.com/live/streamkey",
            Arc::clone(factory) as Arc<dyn TransportFactory>,
            Arc::clone(sink) as Arc<dyn StatusSink>,
        )
        .unwrap();
        publisher.configure_video(VideoConfig {
            codec: VideoCodecId::H264,
            width: 1280,
            height: 720,
            fps: 30,
        });
        publisher.configure_audio(AudioConfig {
            sample_rate: 44_100,
            channels: 2,
            sample_size_bits: 16,
            asc: vec![0x12, 0x10],
        });
        publisher
    }

    #[test]
    fn test_rejects_non_rtmp_url() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let result = RtmpPublisher::new(
            "http://example.com/live",
            factory as Arc<dyn TransportFactory>,
            sink as Arc<dyn StatusSink>,
        );
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_connect_success_reports_and_publishes() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        assert_eq!(
            sink.events(),
            vec![Event::Connecting(ThreadContext::Worker), Event::Connected]
        );

        publisher.stop();
        assert_eq!(publisher.state(), PublisherState::Idle);
    }

    #[test]
    fn test_alloc_failure_reports_init_error() {
        let factory = MockFactory::new(Behaviour {
            fail_alloc: true,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Failed);

        assert_eq!(
            sink.events(),
            vec![
                Event::Connecting(ThreadContext::Worker),
                Event::Error(StreamErrorCode::InitFailure),
            ]
        );
    }

    #[test]
    fn test_setup_url_failure_reports_url_error() {
        let factory = MockFactory::new(Behaviour {
            fail_setup_url: true,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Failed);
        assert!(sink
            .events()
            .contains(&Event::Error(StreamErrorCode::UrlSetupFailure)));
    }

    #[test]
    fn test_connect_failure_reports_connect_error() {
        for behaviour in [
            Behaviour {
                fail_connect: true,
                ..Default::default()
            },
            Behaviour {
                fail_connect_stream: true,
                ..Default::default()
            },
        ] {
            let factory = MockFactory::new(behaviour);
            let sink = Arc::new(RecordingSink::default());
            let publisher = publisher(&factory, &sink);

            publisher.start().unwrap();
            wait_until(|| publisher.state() == PublisherState::Failed);
            assert!(sink
                .events()
                .contains(&Event::Error(StreamErrorCode::ConnectFailure)));
        }
    }

    #[test]
    fn test_start_while_publishing_fails() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);
        assert!(matches!(
            publisher.start(),
            Err(TransportError::AlreadyPublishing)
        ));

        publisher.stop();
    }

    #[test]
    fn test_wire_trace_headers_precede_media() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        publisher.push_video_frame(SPS_PPS_IDR);
        publisher.push_audio_frame(&[0x21, 0x1B]);
        wait_until(|| factory.sent().len() == 5);
        publisher.stop();

        let sent = factory.sent();

        // Exactly one metadata packet, first in the trace.
        assert_eq!(sent[0].packet_type, PacketType::Info);
        assert_eq!(sent[0].channel, 0x03);
        assert_eq!(sent[0].timestamp_ms, 0);
        assert_eq!(
            sent.iter()
                .filter(|p| p.packet_type == PacketType::Info)
                .count(),
            1
        );

        // Per type, the first packet is a sequence header (AVC/AAC
        // packet type 0x00) and media follows with 0x01.
        for (packet_type, media_channel) in
            [(PacketType::Video, 0x04u8), (PacketType::Audio, 0x05u8)]
        {
            let of_type: Vec<_> = sent
                .iter()
                .filter(|p| p.packet_type == packet_type)
                .collect();
            assert_eq!(of_type.len(), 2);
            assert_eq!(of_type[0].body[1], 0x00);
            assert_eq!(of_type[0].timestamp_ms, 0);
            assert_eq!(of_type[1].body[1], 0x01);
            assert_eq!(of_type[0].channel, media_channel);
        }

        // The writer stamped the server's stream id on every packet.
        assert!(sent.iter().all(|p| p.stream_id == 42));
    }

    #[test]
    fn test_media_timestamps_follow_wall_clock() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        factory.advance(17);
        publisher.push_video_frame(SPS_PPS_IDR);
        factory.advance(16);
        publisher.push_video_frame(INTER_FRAME);
        wait_until(|| factory.sent().len() == 5);
        publisher.stop();

        let timestamps: Vec<u32> = factory
            .sent()
            .iter()
            .filter(|p| p.packet_type == PacketType::Video && p.body[1] == 0x01)
            .map(|p| p.timestamp_ms)
            .collect();
        assert_eq!(timestamps, vec![17, 33]);
    }

    #[test]
    fn test_send_failures_do_not_stop_the_loop() {
        let factory = MockFactory::new(Behaviour {
            fail_sends: true,
            ..Default::default()
        });
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        publisher.push_video_frame(SPS_PPS_IDR);
        publisher.push_video_frame(INTER_FRAME);
        wait_until(|| factory.sent().len() == 5);

        // Every packet was attempted despite each send failing.
        assert_eq!(publisher.state(), PublisherState::Publishing);
        publisher.stop();
    }

    #[test]
    fn test_parameter_set_only_input_is_a_no_op() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        publisher.push_video_frame(&SPS_PPS_IDR[..16]); // SPS + PPS only
        thread::sleep(Duration::from_millis(50));
        assert!(factory.sent().is_empty());

        publisher.stop();
    }

    #[test]
    fn test_audio_dropped_until_asc_is_known() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);
        publisher.configure_audio(AudioConfig::default()); // empty ASC

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);

        publisher.push_audio_frame(&[0x21, 0x1B]);
        thread::sleep(Duration::from_millis(50));
        assert!(factory.sent().is_empty());

        publisher.stop();
    }

    #[test]
    fn test_stop_is_idempotent_and_resets_session_state() {
        let factory = MockFactory::new(Behaviour::default());
        let sink = Arc::new(RecordingSink::default());
        let publisher = publisher(&factory, &sink);

        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);
        publisher.push_video_frame(SPS_PPS_IDR);

        publisher.stop();
        publisher.stop();
        assert_eq!(publisher.state(), PublisherState::Idle);

        // A new session re-emits headers from scratch.
        publisher.configure_video(VideoConfig {
            codec: VideoCodecId::H264,
            width: 1280,
            height: 720,
            fps: 30,
        });
        publisher.start().unwrap();
        wait_until(|| publisher.state() == PublisherState::Publishing);
        let before = factory.sent().len();
        publisher.push_video_frame(SPS_PPS_IDR);
        wait_until(|| factory.sent().len() >= before + 3);
        publisher.stop();
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("rtmp://host/live/streamkey"),
            "rtmp://host/live/st***ey"
        );
        assert_eq!(mask_url("rtmp://host/live/key"), "rtmp://host/live/***");
        assert_eq!(mask_url("rtmp://host/live/"), "rtmp://host/live/");
        assert_eq!(mask_url("no-separator"), "no-separator");
    }
}
