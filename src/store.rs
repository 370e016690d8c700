use heapless::String as HString;

use crate::status::StatusText;

pub const SLOT_COUNT: usize = 4;
pub const BLOB_CAPACITY: usize = 1024;
pub const NAME_LEN: usize = 15;

pub type BlobName = HString<NAME_LEN>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StoreFull;

impl StatusText for StoreFull {
    fn as_str(&self) -> &'static str {
        "Save failed (store full)"
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NotFound;

impl StatusText for NotFound {
    fn as_str(&self) -> &'static str {
        "Not found"
    }
}

pub struct Blob {
    name: BlobName,
    length: u16,
    data: [u8; BLOB_CAPACITY],
}

impl Blob {
    fn new(name: &str) -> Self {
        let mut owned = BlobName::new();
        let _ = owned.push_str(bounded(name));
        Self { name: owned, length: 0, data: [0; BLOB_CAPACITY] }
    }

    fn fill(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(BLOB_CAPACITY);
        self.data[..len].copy_from_slice(&bytes[..len]);
        self.length = len as u16;
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.length as usize]
    }
}

fn bounded(name: &str) -> &str {
    let mut end = name.len().min(NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

pub struct BlobStore {
    slots: [Option<Blob>; SLOT_COUNT],
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore {
    pub fn new() -> Self {
        Self { slots: core::array::from_fn(|_| None) }
    }

    fn find(&self, name: &str) -> Option<usize> {
        let key = bounded(name);
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|blob| blob.name() == key))
    }

    pub fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), StoreFull> {
        let idx = match self.find(name) {
            Some(idx) => idx,
            None => {
                let free = self.slots.iter().position(Option::is_none).ok_or(StoreFull)?;
                self.slots[free] = Some(Blob::new(name));
                free
            }
        };
        if let Some(blob) = self.slots[idx].as_mut() {
            blob.fill(bytes);
        }
        Ok(())
    }

    pub fn load(&self, name: &str) -> Option<&[u8]> {
        let idx = self.find(name)?;
        self.slots[idx].as_ref().map(Blob::bytes)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(Blob::name)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut store = BlobStore::new();
        store.save("notes", b"ab\ncd").unwrap();
        assert_eq!(store.load("notes"), Some(&b"ab\ncd"[..]));
        assert_eq!(store.load("Notes"), None);
        assert_eq!(store.load("missing"), None);
    }

    #[test]
    fn test_empty_blob() {
        let mut store = BlobStore::new();
        store.save("empty", b"").unwrap();
        assert_eq!(store.load("empty"), Some(&b""[..]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_slot_and_replaces_length() {
        let mut store = BlobStore::new();
        store.save("a", b"long contents").unwrap();
        store.save("a", b"short").unwrap();
        assert_eq!(store.load("a"), Some(&b"short"[..]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_fifth_name_is_rejected() {
        let mut store = BlobStore::new();
        for (i, name) in ["one", "two", "three", "four"].iter().enumerate() {
            store.save(name, &[i as u8; 3]).unwrap();
        }
        assert_eq!(store.save("five", b"x"), Err(StoreFull));
        assert_eq!(store.len(), SLOT_COUNT);
        assert_eq!(store.load("five"), None);
        assert_eq!(store.load("three"), Some(&[2u8; 3][..]));

        // A full store still accepts overwrites.
        store.save("two", b"new").unwrap();
        assert_eq!(store.load("two"), Some(&b"new"[..]));
    }

    #[test]
    fn test_oversized_save_truncates() {
        let mut store = BlobStore::new();
        let big = [7u8; BLOB_CAPACITY + 100];
        store.save("big", &big).unwrap();
        assert_eq!(store.load("big").map(<[u8]>::len), Some(BLOB_CAPACITY));
    }

    #[test]
    fn test_names_are_bounded() {
        let mut store = BlobStore::new();
        store.save("abcdefghijklmnopqrst", b"1").unwrap();
        assert_eq!(store.names().next(), Some("abcdefghijklmno"));
        assert_eq!(store.load("abcdefghijklmnoXYZ"), Some(&b"1"[..]));
    }
}
