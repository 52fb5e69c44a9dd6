//! Test utilities for integration tests.
//!
//! Helpers for building sample TIFF directories, origin directories and
//! counting resolvers shared across the suites.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;

use tiffserve::cache::{CacheRequest, Resolver, ResponseSink};
use tiffserve::error::CacheError;
use tiffserve::tiff::{tag, Directory, Entry, Ifd, Rational, TiffType, Value};

/// A directory exercising every classic TIFF type, arrays included.
pub fn sample_directory() -> Directory {
    let entries = vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Short, Value::Short(1024)).unwrap(),
        Entry::with_type(tag::IMAGE_LENGTH, TiffType::Short, Value::Short(768)).unwrap(),
        Entry::with_type(
            tag::BITS_PER_SAMPLE,
            TiffType::Short,
            Value::ShortList(vec![8, 8, 8]),
        )
        .unwrap(),
        Entry::with_type(
            tag::IMAGE_DESCRIPTION,
            TiffType::Ascii,
            Value::Ascii(vec!["integration sample".to_string()]),
        )
        .unwrap(),
        Entry::with_type(
            tag::STRIP_OFFSETS,
            TiffType::Long,
            Value::LongList(vec![1000, 2000, 3000]),
        )
        .unwrap(),
        Entry::with_type(
            tag::X_RESOLUTION,
            TiffType::Rational,
            Value::Rational(Rational::new(300, 1).unwrap()),
        )
        .unwrap(),
    ];
    Directory::from_entries(entries)
}

/// A directory with a resolvable sub-IFD under the SubIFDs tag.
pub fn directory_with_sub_ifd() -> Directory {
    let child = Ifd::new(vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Short, Value::Short(512)).unwrap(),
        Entry::with_type(tag::IMAGE_LENGTH, TiffType::Short, Value::Short(384)).unwrap(),
    ]);
    Directory::from_entries(vec![
        Entry::with_type(tag::IMAGE_WIDTH, TiffType::Short, Value::Short(1024)).unwrap(),
        Entry::with_type(tag::SUB_IFD, TiffType::Ifd, Value::Directory(child)).unwrap(),
    ])
}

/// Resolver that serves a fixed body and counts invocations.
pub struct CountingResolver {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(body: impl Into<Vec<u8>>, content_type: &'static str) -> Self {
        CountingResolver {
            body: body.into(),
            content_type,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for CountingResolver {
    async fn resolve(
        &self,
        _request: &CacheRequest,
        response: &mut dyn ResponseSink,
    ) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        response.set_status(StatusCode::OK);
        response.set_header(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response.write(&self.body);
        Ok(())
    }
}
