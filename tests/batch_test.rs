//! Parallel fetch and export helpers.

mod common;

use std::sync::Arc;

use camhd::batch::{fetch_frames, write_frame_across};
use camhd::config::IndexConfig;
use camhd::{Config, FrameReader, LocalFile, Source};
use common::MovFixture;

#[test]
fn test_fetch_frames_keeps_order_and_item_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mov = MovFixture::with_frames(20).build();
    let path = mov.write_to(dir.path());
    let reader =
        FrameReader::open(Arc::new(LocalFile::new(&path)), &IndexConfig::default()).unwrap();

    let wanted = [19, 0, 25, 7, 7];
    let items = fetch_frames(&reader, &wanted, 3).unwrap();

    assert_eq!(items.len(), wanted.len());
    for (item, &index) in items.iter().zip(wanted.iter()) {
        assert_eq!(item.key, index);
        match &item.result {
            Ok(frame) => assert_eq!(frame.as_bytes(), mov.frames[index as usize].as_slice()),
            Err(e) => {
                assert_eq!(index, 25);
                assert!(e.is_index_out_of_range());
            }
        }
    }
    assert_eq!(items.iter().filter(|item| !item.is_ok()).count(), 1);
}

#[test]
fn test_write_frame_across_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let first = MovFixture::with_frames(6)
        .file_name("CAMHDA301-20160101T000000Z.mov")
        .build();
    let second = MovFixture::with_frames(3)
        .file_name("CAMHDA301-20160101T030000Z.mov")
        .build();
    let sources = vec![
        Source::Local(first.write_to(dir.path())),
        Source::Local(second.write_to(dir.path())),
        Source::Local(dir.path().join("CAMHDA301-20160101T060000Z.mov")),
    ];

    let config = Config::default();
    let items = write_frame_across(&sources, 4, out.path(), &config).unwrap();
    assert_eq!(items.len(), 3);

    let written = items[0].result.as_ref().unwrap();
    assert_eq!(
        written.file_name().unwrap().to_str().unwrap(),
        "CAMHDA301-20160101T000000Z_000004.avi"
    );
    assert!(std::fs::metadata(written).unwrap().len() > first.frames[4].len() as u64);

    // Only three frames in the second recording; the third does not exist.
    assert!(items[1].result.as_ref().unwrap_err().is_index_out_of_range());
    assert!(items[2].result.is_err());
    assert_eq!(items[2].key, sources[2]);
}
