//! Integration tests for serializer and deserializer sessions.

use std::io::{self, Read, Write};

use rsense::codec::{
    BytesSource, FileSink, FileSource, ReaderSource, WriterSink, binary, json, text,
};
use rsense::error::{CodecError, ErrorKind, RsenseError};
use rsense::{AccelerometerEvent, AccurateTime, CodecConfig, Deserializer, Serializer};
use tempfile::tempdir;

fn event(abs: i64, rel: Option<i64>) -> AccelerometerEvent {
    let mut builder = AccelerometerEvent::builder();
    builder
        .absolute_timestamp(abs)
        .x(abs as f32 * 0.5)
        .y(-1.5)
        .z(9.81);
    if let Some(rel) = rel {
        builder.relative_timestamp(rel);
    }
    builder.build().unwrap()
}

/// Yields its bytes, then fails with `ConnectionReset`.
struct DroppingReader {
    data: &'static [u8],
}

impl Read for DroppingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "link dropped"));
        }
        let n = self.data.read(buf)?;
        Ok(n)
    }
}

/// Rejects every write.
struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_closed_text_serializer_rejects_writes() {
    let config = CodecConfig::default();
    let (e1, e2) = (event(1, None), event(2, Some(20)));
    let mut out = Vec::new();
    {
        let serializer = text::serializer(WriterSink::new(&mut out), &config).unwrap();
        serializer.serialize_all([&e2, &e1]).unwrap().flush().unwrap();
        serializer.close().unwrap();
        assert!(serializer.is_closed());

        let err = serializer.serialize(&e1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClosedResource);
        assert_eq!(
            err.to_string(),
            "codec error: the serializer is closed, no serializing possible"
        );
        assert_eq!(
            serializer.serialize_all([&e1]).unwrap_err().kind(),
            ErrorKind::ClosedResource
        );
        assert_eq!(
            serializer.flush().unwrap_err().kind(),
            ErrorKind::ClosedResource
        );
        serializer.close().unwrap();
    }

    let decoded = text::from_str(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(decoded, vec![e2, e1]);
}

#[test]
fn test_empty_sequence_checked_before_closed_state() {
    let config = CodecConfig::default();
    let serializer = binary::serializer(WriterSink::new(Vec::new()), &config).unwrap();
    let none: [AccelerometerEvent; 0] = [];

    assert_eq!(
        serializer.serialize_all(&none).unwrap_err().kind(),
        ErrorKind::EmptyInput
    );
    serializer.close().unwrap();
    assert_eq!(
        serializer.serialize_all(&none).unwrap_err().kind(),
        ErrorKind::EmptyInput
    );
}

#[test]
fn test_unused_sessions_can_be_closed() {
    let config = CodecConfig::default();
    let serializer = text::serializer(WriterSink::new(Vec::new()), &config).unwrap();
    serializer.close().unwrap();
    serializer.close().unwrap();

    let mut deserializer = text::deserializer(BytesSource::from(Vec::new()), &config).unwrap();
    deserializer.close().unwrap();
    deserializer.close().unwrap();
    assert!(deserializer.is_closed());

    let err = deserializer.deserialize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClosedResource);
    assert_eq!(
        err.to_string(),
        "codec error: the deserializer is closed, no deserializing possible"
    );
}

#[test]
fn test_record_order_and_builder_isolation_in_every_format() {
    let first = event(1, Some(111));
    let second = event(2, None);
    let events = [first, second];
    let config = CodecConfig::default();

    let encoded = [
        ("text", text::to_string(&events).unwrap().into_bytes()),
        ("json", json::to_string(&events).unwrap().into_bytes()),
        ("binary", binary::to_vec(&events).unwrap()),
    ];

    for (format, bytes) in encoded {
        let source = BytesSource::from(bytes);
        let decoded = match format {
            "text" => text::deserializer(source, &config).unwrap().deserialize_all(),
            "json" => json::deserializer::<AccelerometerEvent, _>(source, &config)
                .unwrap()
                .deserialize_all(),
            _ => binary::deserializer(source, &config).unwrap().deserialize_all(),
        }
        .unwrap();

        assert_eq!(decoded, events, "{format}");
        assert_eq!(decoded[0].relative_timestamp(), Some(111), "{format}");
        assert!(!decoded[1].has_relative_timestamp(), "{format}");
    }
}

#[test]
fn test_lazy_pull_tunnels_io_error() {
    let source = ReaderSource::new(DroppingReader {
        data: b"1,false,0,0.5,-1.5,9.81\n",
    });
    let mut deserializer = text::deserializer(source, &CodecConfig::default()).unwrap();

    let mut records = deserializer.deserialize().unwrap();
    assert_eq!(records.next().unwrap().unwrap(), event(1, None));

    let err = records.next().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    match err {
        RsenseError::Codec(CodecError::Io { source, .. }) => {
            assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("expected I/O error, got {other:?}"),
    }
    assert!(records.next().is_none());
}

#[test]
fn test_sink_failure_is_io_failure() {
    let config = CodecConfig::default().with_buffer_capacity(1);
    let serializer = binary::serializer(WriterSink::new(BrokenWriter), &config).unwrap();

    let err = serializer.serialize(&event(1, None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(!err.kind().is_usage());
}

#[test]
fn test_failed_open_is_retried() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("later");
    let path = nested.join("events.txt");
    let config = CodecConfig::default();
    let serializer = text::serializer(FileSink::new(&path), &config).unwrap();

    let err = serializer.serialize(&event(1, None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(!serializer.is_closed());

    std::fs::create_dir(&nested).unwrap();
    serializer.serialize(&event(2, None)).unwrap();
    serializer.close().unwrap();

    let mut deserializer = text::deserializer(FileSource::new(&path), &config).unwrap();
    assert_eq!(deserializer.deserialize_all().unwrap(), vec![event(2, None)]);
}

#[test]
fn test_file_round_trip_binary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.bin");
    let events: Vec<_> = (0..500)
        .map(|i| event(1_700_000_000_000 + i, (i % 3 == 0).then_some(i * 1_000)))
        .collect();

    let config = CodecConfig::default().with_buffer_capacity(256);
    let serializer = binary::serializer(FileSink::new(&path), &config).unwrap();
    serializer.serialize_all(&events).unwrap();
    serializer.close().unwrap();

    let mut deserializer = binary::deserializer(FileSource::new(&path), &config).unwrap();
    let mut records = deserializer.deserialize().unwrap();
    let head: Vec<_> = records.by_ref().take(10).map(Result::unwrap).collect();
    let tail = records.collect_all().unwrap();
    deserializer.close().unwrap();

    assert_eq!(head.len() + tail.len(), events.len());
    assert_eq!([head, tail].concat(), events);
}

#[test]
fn test_file_sink_append_continues_text_stream() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.txt");
    let config = CodecConfig::default();

    let serializer = text::serializer(FileSink::new(&path), &config).unwrap();
    serializer.serialize(&event(1, None)).unwrap();
    serializer.close().unwrap();

    let serializer = text::serializer(FileSink::append(&path), &config).unwrap();
    serializer.serialize(&event(2, Some(5))).unwrap();
    drop(serializer);

    let mut deserializer = text::deserializer(FileSource::new(&path), &config).unwrap();
    assert_eq!(
        deserializer.deserialize_all().unwrap(),
        vec![event(1, None), event(2, Some(5))]
    );
}

#[test]
fn test_concurrent_serialize_never_interleaves() {
    let config = CodecConfig::default();
    let mut out = Vec::new();
    {
        let serializer = text::serializer(WriterSink::new(&mut out), &config).unwrap();
        std::thread::scope(|scope| {
            for thread in 0..4i64 {
                let serializer = &serializer;
                scope.spawn(move || {
                    for i in 0..250 {
                        serializer.serialize(&event(thread * 1_000 + i, Some(thread))).unwrap();
                    }
                });
            }
        });
        serializer.close().unwrap();
    }

    let decoded = text::from_str(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(decoded.len(), 1_000);
    for thread in 0..4i64 {
        let mine: Vec<i64> = decoded
            .iter()
            .filter(|e| e.relative_timestamp() == Some(thread))
            .map(AccelerometerEvent::absolute_timestamp)
            .collect();
        let expected: Vec<i64> = (0..250).map(|i| thread * 1_000 + i).collect();
        assert_eq!(mine, expected);
    }
}

#[test]
fn test_json_accurate_time_stream() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("times.json");
    let config = CodecConfig::default().with_json_pretty(true);
    let times: Vec<_> = (0..3)
        .map(|i| AccurateTime::builder().time(1_000 * i).reference(i).build().unwrap())
        .collect();

    let serializer = json::serializer::<AccurateTime, _>(FileSink::new(&path), &config).unwrap();
    for time in &times {
        serializer.serialize(time).unwrap();
    }
    serializer.close().unwrap();

    let mut deserializer =
        json::deserializer::<AccurateTime, _>(FileSource::new(&path), &config).unwrap();
    assert_eq!(deserializer.deserialize_all().unwrap(), times);
}

#[test]
fn test_one_shot_helpers_reject_empty_input() {
    let none: [AccelerometerEvent; 0] = [];
    assert_eq!(text::to_string(&none).unwrap_err().kind(), ErrorKind::EmptyInput);
    assert_eq!(json::to_string(&none).unwrap_err().kind(), ErrorKind::EmptyInput);
    assert_eq!(binary::to_vec(&none).unwrap_err().kind(), ErrorKind::EmptyInput);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.txt");
    let config = CodecConfig::default().with_text_delimiter('.');

    let err = text::serializer(FileSink::new(&path), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.kind().is_usage());
    assert!(!path.exists());

    let err = binary::deserializer(FileSource::new(&path), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
