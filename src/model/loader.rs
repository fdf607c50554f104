//! Model file readers.
//!
//! Supported formats:
//!
//! - word2vec text: optional `count dim` header, then `term v1 v2 ...` per line
//! - word2vec binary: `count dim\n` header, then per entry the term, a space
//!   and `dim` little-endian `f32` values (an optional newline follows)
//! - JSON: `{"entries": [{"term": "...", "vector": [...]}]}`
//!
//! Keys starting with [`DOC_TAG_PREFIX`] are document tags; their presence
//! marks the model as a [`ModelKind::DocumentVectors`] model. Only term keys
//! are kept for similarity queries.

use std::fs::File;
use std::io::{BufRead, Cursor};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SemtreeError};
use crate::model::vectors::{EmbeddingOracle, TermVectors};
use crate::model::{DOC_TAG_PREFIX, ModelKind};

/// On-disk layout of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Text,
    Binary,
    Json,
}

impl ModelFormat {
    /// Pick the format from the file extension, sniffing the content when
    /// the extension says nothing.
    pub fn detect(path: &Path, head: &[u8]) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => ModelFormat::Json,
            Some("bin") => ModelFormat::Binary,
            Some("txt") | Some("vec") => ModelFormat::Text,
            _ if std::str::from_utf8(head).is_ok() => ModelFormat::Text,
            _ => ModelFormat::Binary,
        }
    }
}

/// A decoded model: its kind and the term vectors usable for queries.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub kind: ModelKind,
    pub vectors: TermVectors,
    /// Number of document tags skipped while loading.
    pub document_tags: usize,
}

impl LoadedModel {
    /// Turn the model into a neighbor oracle over its term vectors.
    pub fn into_oracle(self) -> Result<EmbeddingOracle> {
        if self.vectors.is_empty() {
            return Err(SemtreeError::model_load(format!(
                "{} model has no term vectors",
                self.kind.name()
            )));
        }
        Ok(EmbeddingOracle::new(self.vectors))
    }
}

/// JSON model layout.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonModel {
    pub entries: Vec<JsonEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEntry {
    pub term: String,
    pub vector: Vec<f32>,
}

/// Load a model file, detecting its format and kind.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LoadedModel> {
    let path = path.as_ref();
    info!("Loading model from {}", path.display());

    let file = File::open(path).map_err(|e| {
        SemtreeError::model_load(format!("failed to open {}: {e}", path.display()))
    })?;
    // SAFETY: the map is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
        SemtreeError::model_load(format!("failed to map {}: {e}", path.display()))
    })?;
    let bytes: &[u8] = &mmap;

    let head = &bytes[..bytes.len().min(4096)];
    let format = ModelFormat::detect(path, utf8_prefix(head));
    debug!("Reading {} as {:?}", path.display(), format);

    let model = match format {
        ModelFormat::Json => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SemtreeError::model_load(format!("model is not UTF-8 text: {e}")))?;
            parse_json(text)?
        }
        ModelFormat::Text => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SemtreeError::model_load(format!("model is not UTF-8 text: {e}")))?;
            parse_text(text)?
        }
        ModelFormat::Binary => parse_binary(bytes)?,
    };

    info!(
        "Detected {} model: {} term vectors of dimension {}",
        model.kind.name(),
        model.vectors.len(),
        model.vectors.dimension()
    );
    Ok(model)
}

/// Trim a sniffed prefix back to a char boundary so a multi-byte character
/// cut by the sniff window does not look like binary data.
fn utf8_prefix(head: &[u8]) -> &[u8] {
    match std::str::from_utf8(head) {
        Ok(_) => head,
        Err(e) if e.error_len().is_none() => &head[..e.valid_up_to()],
        Err(_) => head,
    }
}

/// Accumulates entries, splitting document tags from terms.
struct ModelBuilder {
    vectors: Option<TermVectors>,
    capacity: usize,
    document_tags: usize,
}

impl ModelBuilder {
    fn new(dimension: Option<usize>, capacity: usize) -> Result<Self> {
        let vectors = match dimension {
            Some(dim) => Some(TermVectors::with_capacity(dim, capacity)?),
            None => None,
        };
        Ok(Self {
            vectors,
            capacity,
            document_tags: 0,
        })
    }

    fn push(&mut self, key: &str, vector: &[f32]) -> Result<()> {
        if key.starts_with(DOC_TAG_PREFIX) {
            self.document_tags += 1;
            return Ok(());
        }
        if self.vectors.is_none() {
            self.vectors = Some(TermVectors::with_capacity(vector.len(), self.capacity)?);
        }
        if let Some(vectors) = self.vectors.as_mut() {
            vectors.insert(key, vector)?;
        }
        Ok(())
    }

    fn finish(self) -> Result<LoadedModel> {
        let vectors = match self.vectors {
            Some(vectors) => vectors,
            None => return Err(SemtreeError::model_load("model contains no vectors")),
        };
        let kind = if self.document_tags > 0 {
            ModelKind::DocumentVectors
        } else {
            ModelKind::TermVectors
        };
        Ok(LoadedModel {
            kind,
            vectors,
            document_tags: self.document_tags,
        })
    }
}

/// Number of vectors worth preallocating for a header claiming `count`
/// entries, given that each value takes at least `value_bytes` bytes and
/// only `available` bytes follow the header.
fn capacity_hint(
    count: usize,
    dim: usize,
    value_bytes: usize,
    available: usize,
) -> Result<usize> {
    let entry_bytes = dim
        .checked_mul(value_bytes)
        .and_then(|n| n.checked_add(2))
        .ok_or_else(|| SemtreeError::model_load(format!("header dimension {dim} is too large")))?;
    Ok(count.min(available / entry_bytes))
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let count = parts.next()?.parse().ok()?;
    let dim = parts.next()?.parse().ok()?;
    match parts.next() {
        None => Some((count, dim)),
        Some(_) => None,
    }
}

/// Parse the word2vec text format.
pub fn parse_text(text: &str) -> Result<LoadedModel> {
    let mut lines = text.lines().enumerate().peekable();

    let header = lines.peek().and_then(|&(_, line)| parse_header(line));
    let mut builder = match header {
        Some((count, dim)) => {
            lines.next();
            ModelBuilder::new(Some(dim), capacity_hint(count, dim, 2, text.len())?)?
        }
        None => ModelBuilder::new(None, 0)?,
    };

    let mut values = Vec::new();
    for (line_num, line) in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split(' ').filter(|p| !p.is_empty());
        let term = match parts.next() {
            Some(term) => term,
            None => continue,
        };

        values.clear();
        for part in parts {
            let value: f32 = part.parse().map_err(|e| {
                SemtreeError::model_load(format!(
                    "line {}: invalid value '{part}': {e}",
                    line_num + 1
                ))
            })?;
            values.push(value);
        }
        builder.push(term, &values)?;
    }

    builder.finish()
}

/// Parse the word2vec binary format.
pub fn parse_binary(bytes: &[u8]) -> Result<LoadedModel> {
    let header_end = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| SemtreeError::model_load("binary model has no header line"))?;
    let header = std::str::from_utf8(&bytes[..header_end])
        .ok()
        .and_then(parse_header)
        .ok_or_else(|| SemtreeError::model_load("binary model header must be 'count dim'"))?;
    let (count, dim) = header;

    let body = &bytes[header_end + 1..];
    let capacity = capacity_hint(count, dim, 4, body.len())?;
    if count == 0 {
        return Err(SemtreeError::model_load("binary model declares no vectors"));
    }
    if capacity == 0 {
        return Err(SemtreeError::model_load(format!(
            "binary model is truncated: header claims {count} vectors of dimension {dim}"
        )));
    }

    let mut builder = ModelBuilder::new(Some(dim), capacity)?;
    let mut cursor = Cursor::new(body);
    let mut vector = vec![0.0f32; dim];
    let mut term_bytes = Vec::new();

    for entry in 0..count {
        let newlines = cursor.fill_buf()?.iter().take_while(|&&b| b == b'\n').count();
        cursor.consume(newlines);

        term_bytes.clear();
        cursor.read_until(b' ', &mut term_bytes)?;
        if term_bytes.pop() != Some(b' ') {
            return Err(SemtreeError::model_load(format!(
                "entry {entry}: missing term separator"
            )));
        }
        let term = String::from_utf8_lossy(&term_bytes).into_owned();

        for slot in vector.iter_mut() {
            *slot = cursor.read_f32::<LittleEndian>().map_err(|e| {
                SemtreeError::model_load(format!("entry {entry} ('{term}'): truncated vector: {e}"))
            })?;
        }
        builder.push(&term, &vector)?;
    }

    builder.finish()
}

/// Parse the JSON model layout.
pub fn parse_json(text: &str) -> Result<LoadedModel> {
    let model: JsonModel = serde_json::from_str(text)?;
    let mut builder = ModelBuilder::new(None, model.entries.len())?;
    for entry in &model.entries {
        builder.push(&entry.term, &entry.vector)?;
    }
    builder.finish()
}
