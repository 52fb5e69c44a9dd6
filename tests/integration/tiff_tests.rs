//! TIFF codec integration tests over real files.

use std::io::Write;

use tiffserve::tiff::{
    tag, ByteOrder, Directory, Entry, TiffReader, TiffType, TiffWriter, Value,
};

use super::test_utils::{directory_with_sub_ifd, sample_directory};

// =============================================================================
// File round trips
// =============================================================================

#[test]
fn test_classic_round_trip_through_file() {
    let directory = sample_directory();
    let bytes = TiffWriter::classic().write(&directory).unwrap();

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&bytes).unwrap();

    let read_back = TiffReader::new(&file).read().unwrap();
    assert_eq!(read_back, directory);
}

#[test]
fn test_big_endian_round_trip_through_file() {
    let directory = sample_directory();
    let bytes = TiffWriter::classic()
        .with_byte_order(ByteOrder::BigEndian)
        .write(&directory)
        .unwrap();

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&bytes).unwrap();

    let read_back = TiffReader::new(&file).read().unwrap();
    assert_eq!(read_back, directory);
}

#[test]
fn test_bigtiff_round_trip_through_file() {
    let directory = Directory::from_entries(vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Long, Value::Long(100_000)).unwrap(),
        Entry::with_type(
            tag::TILE_OFFSETS,
            TiffType::Long8,
            Value::Long8List(vec![16, 0x1_0000_0000, 0x2_0000_0000]),
        )
        .unwrap(),
    ]);
    let bytes = TiffWriter::bigtiff().write(&directory).unwrap();

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&bytes).unwrap();

    let read_back = TiffReader::new(&file).read().unwrap();
    assert_eq!(read_back, directory);
}

#[test]
fn test_sub_ifd_round_trip_through_file() {
    let directory = directory_with_sub_ifd();
    let bytes = TiffWriter::classic().write(&directory).unwrap();

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(&bytes).unwrap();

    let read_back = TiffReader::new(&file).read().unwrap();
    assert_eq!(read_back, directory);

    // The sub-IFD came back as a resolved nested directory
    match read_back.first().unwrap().entry(tag::SUB_IFD).unwrap().value() {
        Value::Directory(child) => {
            assert_eq!(child.entry(tag::IMAGE_WIDTH).unwrap().value(), &Value::Short(512));
        }
        other => panic!("expected resolved sub-IFD, got {other:?}"),
    }
}

// =============================================================================
// Resilience
// =============================================================================

#[test]
fn test_truncated_stream_yields_partial_directory() {
    // Inline-valued entries first, an out-of-line array last
    let directory = Directory::from_entries(vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Short, Value::Short(1024)).unwrap(),
        Entry::with_type(tag::IMAGE_LENGTH, TiffType::Short, Value::Short(768)).unwrap(),
        Entry::with_type(
            tag::STRIP_OFFSETS,
            TiffType::Long,
            Value::LongList(vec![1, 2, 3, 4, 5, 6, 7, 8]),
        )
        .unwrap(),
    ]);
    let bytes = TiffWriter::classic().write(&directory).unwrap();

    // Cut the stream mid-way through the out-of-line value region (the
    // value data precedes the IFD table, so this truncates the table too)
    let truncated = &bytes[..bytes.len() / 2];
    let read_back = TiffReader::new(truncated).read().unwrap();

    // Not an error: whatever was reachable is returned
    assert!(read_back.len() <= 1);
}

#[test]
fn test_truncated_value_keeps_other_entries() {
    let directory = Directory::from_entries(vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Short, Value::Short(1024)).unwrap(),
        Entry::with_type(
            tag::STRIP_OFFSETS,
            TiffType::Long,
            Value::LongList(vec![1, 2, 3, 4, 5, 6, 7, 8]),
        )
        .unwrap(),
    ]);
    let mut bytes = TiffWriter::classic().write(&directory).unwrap();

    // Rewrite the out-of-line value's offset field to point past the end
    // of the stream, simulating a corrupt file with an intact table
    let table_pos = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    // Second record (StripOffsets) value field
    let field = table_pos + 2 + 12 + 8;
    bytes[field..field + 4].copy_from_slice(&10_000u32.to_le_bytes());

    let read_back = TiffReader::new(&bytes[..]).read().unwrap();
    let ifd = read_back.first().unwrap();
    assert_eq!(ifd.len(), 2);
    assert_eq!(
        ifd.entry(tag::IMAGE_WIDTH).unwrap().value(),
        &Value::Short(1024)
    );
    assert!(matches!(
        ifd.entry(tag::STRIP_OFFSETS).unwrap().value(),
        Value::Unreadable { .. }
    ));
}

#[test]
fn test_non_tiff_file_is_fatal() {
    let bytes = b"GIF89a not a tiff at all";
    assert!(TiffReader::new(&bytes[..]).read().is_err());
}
