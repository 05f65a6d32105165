#![cfg(target_os = "linux")]

use std::thread;
use std::time::Duration;

use mqprims_channel::{Channel, ChannelConfig, ChannelError};
use mqprims_frame::FrameError;
use mqprims_queue::{MessageQueue, QueueName};

mqprims_frame::record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Access {
        kind: u8,
        addr: u64,
    }
}

mqprims_frame::record! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct AccessWithPc {
        kind: u8,
        addr: u64,
        pc: u64,
    }
}

fn unique_id(tag: &str) -> String {
    format!("/mqprims-it-{}-{tag}", std::process::id())
}

fn sample(i: u64) -> Access {
    Access {
        kind: if i % 2 == 1 { b'r' } else { b'w' },
        addr: 0x1000 + i * 0x10,
    }
}

fn reader_with_timeout<T: mqprims_frame::Record>(id: &str, timeout: Duration) -> Channel<T> {
    Channel::with_config(
        id,
        ChannelConfig {
            receive_timeout: Some(timeout),
            ..ChannelConfig::reader(5)
        },
    )
    .expect("reader should open")
}

#[test]
fn streams_twenty_records_then_end_of_stream() {
    let id = unique_id("happy");
    let mut reader = reader_with_timeout::<Access>(&id, Duration::from_secs(5));

    let writer_id = id.clone();
    let writer = thread::spawn(move || {
        let mut writer = Channel::<Access>::writer(&writer_id, 5).expect("writer should open");
        for i in 0..20 {
            writer.send(&sample(i), 0).expect("send should succeed");
        }
    });

    let mut received = Vec::new();
    let mut dest = Access::default();
    while reader.receive(&mut dest).expect("receive should succeed") {
        received.push(dest);
    }
    writer.join().expect("writer thread should finish");

    let expected: Vec<Access> = (0..20).map(sample).collect();
    assert_eq!(received, expected);
    assert!(!reader.is_active());
}

#[test]
fn end_of_stream_is_sticky() {
    let id = unique_id("sticky");
    let mut reader = reader_with_timeout::<u32>(&id, Duration::from_millis(200));
    {
        let mut writer = Channel::<u32>::writer(&id, 5).unwrap();
        writer.send(&11, 0).unwrap();
    }

    let mut dest = 0u32;
    assert!(reader.receive(&mut dest).unwrap());
    assert_eq!(dest, 11);

    for _ in 0..3 {
        assert!(!reader.receive(&mut dest).unwrap());
        assert_eq!(dest, 11, "END must not touch the destination");
    }
    assert!(reader.recv().unwrap().is_none());
    assert_eq!(reader.records().count(), 0);
}

#[test]
fn same_priority_frames_arrive_in_send_order() {
    let id = unique_id("fifo");
    let mut reader = reader_with_timeout::<u64>(&id, Duration::from_secs(2));
    {
        let mut writer = Channel::<u64>::writer(&id, 5).unwrap();
        for value in [5u64, 1, 4] {
            writer.send(&value, 3).unwrap();
        }
    }

    let values: Vec<u64> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(values, vec![5, 1, 4]);
}

#[test]
fn higher_priority_is_delivered_first() {
    let id = unique_id("prio");
    let mut reader = reader_with_timeout::<u16>(&id, Duration::from_secs(2));
    let mut writer = Channel::<u16>::writer(&id, 5).unwrap();

    writer.send(&1, 0).unwrap();
    writer.send(&2, 7).unwrap();

    assert_eq!(reader.recv().unwrap(), Some(2));
    assert_eq!(reader.recv().unwrap(), Some(1));

    drop(writer);
    assert_eq!(reader.recv().unwrap(), None);
}

#[test]
fn larger_reader_record_is_framing_error() {
    let id = unique_id("shape-larger");
    let mut writer = Channel::<Access>::writer(&id, 5).unwrap();
    let mut reader = reader_with_timeout::<AccessWithPc>(&id, Duration::from_secs(2));

    writer.send(&sample(0), 0).unwrap();

    let mut dest = AccessWithPc::default();
    let err = reader.receive(&mut dest).unwrap_err();
    assert!(matches!(
        err,
        ChannelError::Framing(FrameError::SizeMismatch {
            expected: 18,
            actual: 10
        })
    ));
}

#[test]
fn smaller_reader_record_is_framing_error() {
    let id = unique_id("shape-smaller");
    let mut writer = Channel::<AccessWithPc>::writer(&id, 5).unwrap();
    let mut reader = reader_with_timeout::<Access>(&id, Duration::from_secs(2));

    writer.send(&AccessWithPc::default(), 0).unwrap();

    let err = reader.recv().unwrap_err();
    assert!(matches!(
        err,
        ChannelError::Framing(FrameError::SizeMismatch {
            expected: 10,
            actual: 18
        })
    ));
}

#[test]
fn reader_first_with_larger_record_reports_framing_error() {
    let id = unique_id("first-larger");
    let mut reader = reader_with_timeout::<AccessWithPc>(&id, Duration::from_secs(2));
    let mut writer = Channel::<Access>::writer(&id, 5).expect("smaller frames fit the slot");

    writer.send(&sample(0), 0).unwrap();

    let mut dest = AccessWithPc::default();
    let err = reader.receive(&mut dest).unwrap_err();
    assert!(matches!(
        err,
        ChannelError::Framing(FrameError::SizeMismatch {
            expected: 18,
            actual: 10
        })
    ));
    assert_eq!(dest, AccessWithPc::default());
}

#[test]
fn reader_first_with_smaller_record_rejects_the_writer() {
    let id = unique_id("first-smaller");
    let mut reader = reader_with_timeout::<Access>(&id, Duration::from_millis(50));

    let err = Channel::<AccessWithPc>::writer(&id, 5).unwrap_err();
    assert!(matches!(
        err,
        ChannelError::Framing(FrameError::SizeMismatch {
            expected: 18,
            actual: 10
        })
    ));

    // Nothing was sent, so the reader only sees its own timeout.
    let err = reader.recv().unwrap_err();
    assert!(matches!(err, ChannelError::Timeout(_)));
    assert!(reader.is_active());
}

#[test]
fn teardown_unlinks_the_queue() {
    let id = unique_id("unlink");
    {
        let mut writer = Channel::<u32>::writer(&id, 5).unwrap();
        let _reader = Channel::<u32>::reader(&id, 5).unwrap();
        writer.send(&1, 0).unwrap();
        writer.send(&2, 0).unwrap();
    }

    let name = QueueName::new(id.clone()).unwrap();
    assert!(
        !MessageQueue::unlink(&name).unwrap(),
        "queue name should already be gone"
    );

    let mut fresh = reader_with_timeout::<u32>(&id, Duration::from_millis(50));
    let err = fresh.recv().unwrap_err();
    assert!(matches!(err, ChannelError::Timeout(_)), "fresh queue should be empty");
}

#[test]
fn receive_timeout_is_reported() {
    let id = unique_id("timeout");
    let mut reader = reader_with_timeout::<u8>(&id, Duration::from_millis(30));

    let err = reader.recv().unwrap_err();
    assert!(matches!(err, ChannelError::Timeout(_)));
    assert!(err.is_retryable());
    assert!(reader.is_active());
}

#[test]
fn close_reports_blocked_end_of_stream_but_still_unlinks() {
    let id = unique_id("blocked-end");
    let mut writer = Channel::<u8>::with_config(
        &id,
        ChannelConfig {
            shutdown_timeout: Duration::from_millis(30),
            ..ChannelConfig::writer(1)
        },
    )
    .unwrap();
    writer.send(&9, 0).unwrap();

    let err = writer.close().unwrap_err();
    assert!(matches!(err, ChannelError::Timeout(_)));

    let name = QueueName::new(id).unwrap();
    assert!(!MessageQueue::unlink(&name).unwrap());
}
