use std::io::{ErrorKind, Write};
use std::net::TcpStream;

use bytes::Bytes;

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    config: FrameConfig,
    bytes_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            bytes_written: 0,
        }
    }

    /// Write a complete frame and flush (blocking).
    ///
    /// Invalid frames are rejected before anything reaches the stream.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        frame.check_with_limit(self.config.effective_max_body_size())?;

        match frame.write_unchecked(&mut self.inner) {
            Ok(n) => self.bytes_written += n,
            Err(err) => {
                self.bytes_written += err.transferred().unwrap_or(0);
                return Err(err);
            }
        }

        self.flush()
    }

    /// Build a frame around `body` and send it.
    pub fn send(&mut self, cmd: u32, ctx: u64, uid: u64, body: &[u8]) -> Result<()> {
        let frame = Frame {
            cmd,
            ctx,
            uid,
            ..Frame::new()
        }
        .with_body(Bytes::copy_from_slice(body));
        self.write_frame(&frame)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::from(err)),
            }
        }
    }

    /// Total bytes written to the stream so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum body size for subsequent frame encoding.
    pub fn set_max_body_size(&mut self, max_body_size: u32) {
        self.config.max_body_size = max_body_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<TcpStream> {
    /// Create a frame writer for a `TcpStream` and apply write timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(FrameError::from)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::WIRE_HEADER_SIZE;

    fn decode_all(bytes: Vec<u8>) -> Vec<Frame> {
        crate::reader::FrameReader::new(Cursor::new(bytes))
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(1, 2, 3, b"hello").unwrap();
        assert_eq!(writer.bytes_written(), (WIRE_HEADER_SIZE + 5) as u64);

        let frames = decode_all(writer.into_inner().into_inner());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].cmd, 1);
        assert_eq!(frames[0].ctx, 2);
        assert_eq!(frames[0].uid, 3);
        assert_eq!(frames[0].body.as_ref(), b"hello");
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(1, 0, 0, b"one").unwrap();
        writer.send(2, 0, 0, b"two").unwrap();
        writer.send(3, 0, 0, b"three").unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        let got: Vec<(u32, &[u8])> = frames.iter().map(|f| (f.cmd, f.body.as_ref())).collect();
        assert_eq!(
            got,
            vec![
                (1, b"one".as_ref()),
                (2, b"two".as_ref()),
                (3, b"three".as_ref())
            ]
        );
    }

    #[test]
    fn body_too_large_rejected() {
        let cfg = FrameConfig {
            max_body_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(1, 0, 0, b"oversized").unwrap_err();
        assert!(matches!(
            err,
            FrameError::BodySizeTooLarge { max: 4, actual: 9 }
        ));
        assert_eq!(writer.bytes_written(), 0);
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn set_max_body_size_applies_to_next_write() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(1, 0, 0, b"fine").unwrap();

        writer.set_max_body_size(2);
        assert_eq!(writer.config().max_body_size, 2);
        assert!(writer.send(1, 0, 0, b"fine").is_err());
    }

    #[test]
    fn inconsistent_frame_rejected_without_writing() {
        let mut frame = Frame::new().with_body(&b"abc"[..]);
        frame.body_size = 10;

        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let err = writer.write_frame(&frame).unwrap_err();
        assert!(matches!(err, FrameError::BodySizeExceedsBuffer { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(1, 0, 0, b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn write_frame_method() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        let frame = Frame {
            err_code: -7,
            reserved: [1, 2, 3, 4],
            ..Frame::new()
        }
        .with_body("abc");

        writer.write_frame(&frame).unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        assert_eq!(frames, vec![frame]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _inner = writer.into_inner();
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(5, 0, 0, b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), WIRE_HEADER_SIZE + 5);
    }

    #[test]
    fn would_block_is_not_retried() {
        let mut writer = FrameWriter::new(WouldBlockWriter);
        let err = writer.send(6, 0, 0, b"retry").unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io { ref source, transferred: 0 } if source.kind() == ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn write_zero_reports_error() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(1, 0, 0, b"x").unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io { ref source, .. } if source.kind() == ErrorKind::WriteZero
        ));
    }

    #[test]
    fn partial_failure_is_counted() {
        let mut writer = FrameWriter::new(HalfWriter {
            budget: 10,
            data: Vec::new(),
        });
        let err = writer.send(1, 0, 0, b"body").unwrap_err();
        assert_eq!(err.transferred(), Some(10));
        assert_eq!(writer.bytes_written(), 10);
    }

    #[test]
    fn applies_write_timeout_for_tcp_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let connector = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (_server, _) = listener.accept().unwrap();
        let client = connector.join().unwrap();

        let cfg = FrameConfig {
            write_timeout: Some(std::time::Duration::from_secs(2)),
            ..FrameConfig::default()
        };

        let writer = FrameWriter::with_config_tcp(client, cfg).unwrap();
        assert_eq!(
            writer.get_ref().write_timeout().unwrap(),
            Some(std::time::Duration::from_secs(2))
        );
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct WouldBlockWriter;

    impl Write for WouldBlockWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct HalfWriter {
        budget: usize,
        data: Vec<u8>,
    }

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.data.len() >= self.budget {
                return Err(std::io::Error::from(ErrorKind::BrokenPipe));
            }
            let n = (self.budget - self.data.len()).min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
