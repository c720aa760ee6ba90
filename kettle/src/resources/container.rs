//! Resource container: one byte buffer plus a name index.

use super::manifest::is_c_identifier;
use kettle_shared::errors::{KettleError, KettleResult};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

/// Default C symbol prefix of the rendered container.
pub const DEFAULT_CONTAINER_SYMBOL: &str = "kettle_resources";

const BYTES_PER_LINE: usize = 16;

/// Location of one resource inside the container buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSlot {
    pub name: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceContainer {
    data: Vec<u8>,
    slots: Vec<ResourceSlot>,
}

impl ResourceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource. Callers guarantee name uniqueness.
    pub(crate) fn push(&mut self, name: &str, bytes: &[u8]) {
        self.slots.push(ResourceSlot {
            name: name.to_string(),
            offset: self.data.len(),
            length: bytes.len(),
        });
        self.data.extend_from_slice(bytes);
    }

    /// Bytes of resource `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &self.data[slot.offset..slot.offset + slot.length])
    }

    pub fn slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.data.len()
    }

    /// Render the container as a C translation unit.
    ///
    /// Every resource becomes the external symbols `g<Name>Data`,
    /// `g<Name>Size` and `g<Name>End` that incbin declarations link
    /// against. The data array carries a trailing NUL that `g<Name>Size`
    /// does not count, so it can be read as a C string. `<symbol>_entries`
    /// and `<symbol>_count` index all resources by name.
    pub fn to_c_source(&self, symbol: &str) -> KettleResult<String> {
        if !is_c_identifier(symbol) {
            return Err(KettleError::Bundler(format!(
                "invalid container symbol '{}'",
                symbol
            )));
        }

        let mut out = String::with_capacity(self.data.len() * 6 + 512);
        // fmt::Write into a String cannot fail.
        let _ = writeln!(out, "/* Generated by kettle. Do not edit. */");
        let _ = writeln!(out, "#include <stddef.h>\n");

        for slot in &self.slots {
            let bytes = &self.data[slot.offset..slot.offset + slot.length];
            let _ = writeln!(out, "const unsigned char g{}Data[] = {{", slot.name);
            for chunk in bytes.chunks(BYTES_PER_LINE) {
                out.push_str("    ");
                for byte in chunk {
                    let _ = write!(out, "0x{:02X}, ", byte);
                }
                out.truncate(out.trim_end().len());
                out.push('\n');
            }
            out.push_str("    0x00\n};\n");
            let _ = writeln!(
                out,
                "const unsigned int g{}Size = {};",
                slot.name, slot.length
            );
            let _ = writeln!(
                out,
                "const unsigned char *const g{name}End = g{name}Data + {len};\n",
                name = slot.name,
                len = slot.length
            );
        }

        let _ = writeln!(out, "const struct {}_entry {{", symbol);
        out.push_str("    const char* name;\n    const unsigned char* data;\n    size_t length;\n");
        let _ = writeln!(out, "}} {}_entries[] = {{", symbol);
        if self.slots.is_empty() {
            out.push_str("    { 0, 0, 0 },\n");
        }
        for slot in &self.slots {
            let _ = writeln!(
                out,
                "    {{ \"{name}\", g{name}Data, {len} }},",
                name = slot.name,
                len = slot.length
            );
        }
        out.push_str("};\n");
        let _ = writeln!(
            out,
            "const size_t {}_count = {};",
            symbol,
            self.slots.len()
        );

        Ok(out)
    }

    /// Write the C rendering to `path`.
    ///
    /// Goes through a temporary file in the same directory so the
    /// destination is either complete or untouched.
    pub fn write_c_source(&self, path: &Path, symbol: &str) -> KettleResult<()> {
        let source = self.to_c_source(symbol)?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            KettleError::Bundler(format!(
                "failed to create temporary container in {}: {}",
                dir.display(),
                e
            ))
        })?;
        tmp.write_all(source.as_bytes())?;
        tmp.persist(path).map_err(|e| {
            KettleError::Bundler(format!(
                "failed to write resource container {}: {}",
                path.display(),
                e.error
            ))
        })?;

        tracing::debug!(
            path = %path.display(),
            resources = self.slots.len(),
            bytes = self.data.len(),
            "Wrote resource container"
        );
        Ok(())
    }
}
