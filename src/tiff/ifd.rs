//! Image File Directories and the top-level directory chain.
//!
//! An [`Ifd`] is an ordered collection of entries describing one image or
//! sub-resource. A [`Directory`] is the ordered sequence of top-level IFDs
//! linked through next-IFD offsets in the stream (the terminal link is
//! offset 0).
//!
//! Both types are immutable after construction: the reader builds them
//! bottom-up in one pass, and the writer consumes them without mutation.

use super::value::Entry;

// =============================================================================
// Ifd
// =============================================================================

/// An ordered collection of IFD entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ifd {
    entries: Vec<Entry>,
}

impl Ifd {
    /// Create an IFD from entries, preserving their order.
    pub fn new(entries: Vec<Entry>) -> Self {
        Ifd { entries }
    }

    /// All entries in order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by tag id.
    pub fn entry(&self, tag: u16) -> Option<&Entry> {
        self.entries.iter().find(|e| e.tag() == tag)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the IFD has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

impl IntoIterator for Ifd {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Ifd {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// =============================================================================
// Directory
// =============================================================================

/// An ordered sequence of linked top-level IFDs.
///
/// Classic TIFF supports multiple top-level IFDs chained through next-IFD
/// offsets; most files have exactly one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Directory {
    ifds: Vec<Ifd>,
}

impl Directory {
    /// Create a directory from a sequence of IFDs.
    pub fn new(ifds: Vec<Ifd>) -> Self {
        Directory { ifds }
    }

    /// Wrap a flat entry collection into a single-IFD directory.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Directory {
            ifds: vec![Ifd::new(entries)],
        }
    }

    /// All IFDs in chain order.
    #[inline]
    pub fn ifds(&self) -> &[Ifd] {
        &self.ifds
    }

    /// The first IFD, if any.
    pub fn first(&self) -> Option<&Ifd> {
        self.ifds.first()
    }

    /// Number of top-level IFDs.
    #[inline]
    pub fn len(&self) -> usize {
        self.ifds.len()
    }

    /// Whether the directory holds no IFDs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ifds.is_empty()
    }

    /// Iterate over the IFDs.
    pub fn iter(&self) -> std::slice::Iter<'_, Ifd> {
        self.ifds.iter()
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a Ifd;
    type IntoIter = std::slice::Iter<'a, Ifd>;

    fn into_iter(self) -> Self::IntoIter {
        self.ifds.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================
