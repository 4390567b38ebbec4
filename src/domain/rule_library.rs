//! Named rule library persisted as a flat record stream.
//!
//! Each record is a big-endian `i32` index followed by the name, rule string
//! and description, each as a big-endian `u16` byte length and UTF-8 bytes.
//! The stream ends cleanly only at a record boundary.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use super::rules::LifeRule;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("rule library I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("rule library ends in the middle of record {record}")]
    Truncated { record: usize },
    #[error("rule library record {record} holds a field that is not UTF-8")]
    InvalidUtf8 { record: usize },
    #[error("field is {len} bytes long; records hold at most {max}", max = u16::MAX)]
    FieldTooLong { len: usize },
    #[error("no rule named {0:?} in the library")]
    UnknownRule(String),
    #[error("no rule at index {0}")]
    UnknownIndex(usize),
    #[error("invalid rule string {0:?}")]
    InvalidRule(String),
}

/// One named rule in the library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleEntry {
    pub index: i32,
    pub name: String,
    pub rule_string: String,
    pub description: String,
}

impl RuleEntry {
    pub fn new(index: i32, name: &str, rule_string: &str, description: &str) -> Self {
        Self {
            index,
            name: name.to_string(),
            rule_string: rule_string.to_string(),
            description: description.to_string(),
        }
    }

    /// The parsed rule, or Conway's rule if the stored string is invalid.
    pub fn rule(&self) -> LifeRule {
        LifeRule::parse_or_default(Some(&self.rule_string))
    }
}

/// The rules a fresh library starts with.
pub fn builtin_rules() -> Vec<RuleEntry> {
    vec![
        RuleEntry::new(
            0,
            "Conway's Life",
            "s23/b3",
            "A chaotic rule that is by far the most well-known and well-studied. \
             It exhibits highly complex behavior.",
        ),
        RuleEntry::new(
            1,
            "Replicator",
            "s1357/b1357",
            "A rule in which every pattern is a replicator.",
        ),
    ]
}

/// Ordered collection of named rules, optionally backed by a file.
#[derive(Clone, Debug)]
pub struct RuleLibrary {
    path: Option<PathBuf>,
    entries: Vec<RuleEntry>,
}

impl RuleLibrary {
    /// Library holding the built-in rules, never written anywhere.
    pub fn in_memory() -> Self {
        Self { path: None, entries: builtin_rules() }
    }

    /// Load the library at `path`; if no file exists yet, create it with the
    /// built-in rules.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let library = Self { path: Some(path), entries: builtin_rules() };
            library.save()?;
            info!("created rule library {}", library.display_path());
            return Ok(library);
        }

        let entries = read_records(BufReader::new(File::open(&path)?))?;
        info!("loaded {} rules from {}", entries.len(), path.display());
        Ok(Self { path: Some(path), entries })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
    }

    /// Rewrite the whole library file. In-memory libraries have nothing to do.
    pub fn save(&self) -> Result<(), LibraryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            write_records(&mut writer, &self.entries)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        info!("saved {} rules to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Append a rule in memory; call [`RuleLibrary::save`] to persist it.
    pub fn add(
        &mut self,
        name: &str,
        rule_string: &str,
        description: &str,
    ) -> Result<&RuleEntry, LibraryError> {
        if !LifeRule::validate(rule_string) {
            return Err(LibraryError::InvalidRule(rule_string.to_string()));
        }
        let index = self.entries.len() as i32;
        self.entries.push(RuleEntry::new(index, name, rule_string, description));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Drop the most recently added rule.
    pub fn pop(&mut self) -> Option<RuleEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RuleEntry> {
        self.entries.get(index)
    }

    /// Position of the first entry called `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// Forward cursor starting at `start`, clamped into the library.
    pub fn cursor(&self, start: usize) -> RuleCursor<'_> {
        let position = start.min(self.entries.len().saturating_sub(1));
        RuleCursor { entries: &self.entries, position }
    }

    pub fn iter(&self) -> RuleCursor<'_> {
        self.cursor(0)
    }
}

/// Single forward pass over the library.
pub struct RuleCursor<'a> {
    entries: &'a [RuleEntry],
    position: usize,
}

impl<'a> Iterator for RuleCursor<'a> {
    type Item = &'a RuleEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.position)?;
        self.position += 1;
        Some(entry)
    }
}

impl<'a> IntoIterator for &'a RuleLibrary {
    type Item = &'a RuleEntry;
    type IntoIter = RuleCursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub fn write_records<W: Write>(writer: &mut W, entries: &[RuleEntry]) -> Result<(), LibraryError> {
    for entry in entries {
        writer.write_all(&entry.index.to_be_bytes())?;
        write_field(writer, &entry.name)?;
        write_field(writer, &entry.rule_string)?;
        write_field(writer, &entry.description)?;
    }
    Ok(())
}

fn write_field<W: Write>(writer: &mut W, field: &str) -> Result<(), LibraryError> {
    let len = u16::try_from(field.len())
        .map_err(|_| LibraryError::FieldTooLong { len: field.len() })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(field.as_bytes())?;
    Ok(())
}

pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<RuleEntry>, LibraryError> {
    let mut entries = Vec::new();
    loop {
        let record = entries.len();
        let mut index = [0u8; 4];
        // A clean end of stream is only allowed before a record starts.
        match reader.read(&mut index[..1]) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
        read_exact(&mut reader, &mut index[1..], record)?;
        let index = i32::from_be_bytes(index);
        let name = read_field(&mut reader, record)?;
        let rule_string = read_field(&mut reader, record)?;
        let description = read_field(&mut reader, record)?;
        entries.push(RuleEntry { index, name, rule_string, description });
    }
    Ok(entries)
}

fn read_field<R: Read>(reader: &mut R, record: usize) -> Result<String, LibraryError> {
    let mut len = [0u8; 2];
    read_exact(reader, &mut len, record)?;
    let mut bytes = vec![0u8; u16::from_be_bytes(len) as usize];
    read_exact(reader, &mut bytes, record)?;
    String::from_utf8(bytes).map_err(|_| LibraryError::InvalidUtf8 { record })
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], record: usize) -> Result<(), LibraryError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => LibraryError::Truncated { record },
        _ => LibraryError::Io(e),
    })
}
