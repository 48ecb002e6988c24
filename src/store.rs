use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;

use bstr::ByteSlice;
use cqdb::{CQDBWriter, CQDB};

use crate::error::{Error, Result};
use crate::vocabulary::Vocabulary;

const MAGIC: &[u8; 4] = b"GVOC";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 12;

#[inline]
fn unpack_u32(buf: &[u8]) -> Result<u32> {
    if buf.len() < 4 {
        return Err(Error::Format("not enough data for unpacking u32".to_string()));
    }
    Ok(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

impl Vocabulary<String> {
    /// Serialize the vocabulary.
    ///
    /// The layout is a 12 byte header (`GVOC`, version, entry count) followed
    /// by a CQDB holding every (key, id) pair.
    ///
    /// The CQDB is flushed when its writer is dropped, and `cqdb` discards I/O
    /// errors raised by that final flush; only errors from the header and the
    /// individual entries reach the caller.
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let count = u32::try_from(self.len())
            .map_err(|_| Error::Format("vocabulary size exceeds u32::MAX".to_string()))?;
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&count.to_le_bytes())?;

        // CQDBWriter flushes the database when dropped, ignoring flush errors
        let mut db = CQDBWriter::new(writer)?;
        for (key, id) in self.iter() {
            db.put(key.as_str(), id)?;
        }
        drop(db);
        Ok(())
    }

    /// Deserialize a vocabulary written by [`Vocabulary::write`].
    ///
    /// Every id below the stored entry count must resolve to a distinct key;
    /// new keys registered afterwards continue from the next unused id.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::Format("truncated header".to_string()));
        }
        if &buf[0..4] != MAGIC {
            return Err(Error::Format("magic mismatch".to_string()));
        }
        let version = unpack_u32(&buf[4..])?;
        if version != VERSION {
            return Err(Error::Format(format!("unsupported version {}", version)));
        }
        let count = unpack_u32(&buf[8..])?;

        let mut vocab = Vocabulary::new();
        if count == 0 {
            return Ok(vocab);
        }
        let db = CQDB::new(&buf[HEADER_SIZE..])?;
        for id in 0..count {
            let key = db
                .to_str(id)
                .ok_or_else(|| Error::Format(format!("missing key for id {}", id)))?;
            let key = key
                .to_str()
                .map_err(|_| Error::Format(format!("key for id {} is not valid UTF-8", id)))?;
            if vocab.get_id(key) != id {
                return Err(Error::Format(format!("duplicate key {:?}", key)));
            }
        }
        Ok(vocab)
    }

    /// Write the vocabulary to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        self.write(&mut file)
    }

    /// Read a vocabulary from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buf = fs::read(path)?;
        Self::read(&buf)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn round_trip(vocab: &Vocabulary<String>) -> Vocabulary<String> {
        let mut buf = Cursor::new(Vec::new());
        vocab.write(&mut buf).unwrap();
        Vocabulary::<String>::read(buf.get_ref()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let mut vocab = Vocabulary::<String>::new();
        for key in ["(dog)", "(bark)", "(dog -nsubj-> bark)"] {
            vocab.get_id(key);
        }

        let mut restored = round_trip(&vocab);
        assert_eq!(restored.len(), 3);
        for (key, id) in vocab.iter() {
            assert_eq!(restored.lookup(key.as_str()), Some(id));
            assert_eq!(restored.get_word(id).unwrap(), key);
        }
        // new keys continue from the next unused id
        assert_eq!(restored.get_id("(tree)"), 3);
    }

    #[test]
    fn test_empty_round_trip() {
        let restored = round_trip(&Vocabulary::<String>::new());
        assert!(restored.is_empty());
    }

    #[test]
    fn test_invalid_header() {
        assert!(matches!(
            Vocabulary::<String>::read(b"GVOC"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            Vocabulary::<String>::read(b"XXXX\x01\0\0\0\0\0\0\0"),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            Vocabulary::<String>::read(b"GVOC\x02\0\0\0\0\0\0\0"),
            Err(Error::Format(_))
        ));
    }
}
