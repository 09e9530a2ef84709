//! Writes each network document to `<out-dir>/<id>.json`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gsrs_network_core::{NetworkDocument, NetworkSink};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct JsonDirWriter {
    dir: PathBuf,
    pretty: bool,
}

impl JsonDirWriter {
    /// Creates the output directory if needed.
    pub fn create(dir: &Path, pretty: bool) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            pretty,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, root_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(root_id)))
    }
}

impl NetworkSink for JsonDirWriter {
    type Error = anyhow::Error;

    fn write(&self, root_id: &str, document: &NetworkDocument) -> Result<()> {
        let path = self.path_for(root_id);
        let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        write_json(BufWriter::new(file), document, self.pretty, &path)
    }
}

fn write_json(mut out: impl Write, document: &NetworkDocument, pretty: bool, path: &Path) -> Result<()> {
    let serialized = if pretty {
        serde_json::to_writer_pretty(&mut out, document)
    } else {
        serde_json::to_writer(&mut out, document)
    };
    serialized.with_context(|| format!("failed to serialize network into {}", path.display()))?;
    out.flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Keeps ids from escaping the output directory. An id that had to be
/// rewritten gets a digest suffix so distinct ids never share a file.
fn file_stem(id: &str) -> String {
    let mut stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.chars().all(|c| c == '.') {
        stem = "_".to_string();
    }
    if stem == id {
        return stem;
    }
    let digest = Sha256::digest(id.as_bytes());
    let suffix: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{stem}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsrs_network_core::{Legend, Node};

    fn document() -> NetworkDocument {
        NetworkDocument {
            nodes: vec![Node::new("a", "Aspirin", "chemical")],
            links: vec![],
            tags: vec![],
            legend: Legend::default(),
        }
    }

    #[test]
    fn writes_one_file_per_root() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("jsons");
        let writer = JsonDirWriter::create(&out, false).unwrap();
        writer.write("0103a288-6eb6-4ced-b13a-849cd7edf028", &document()).unwrap();

        let path = out.join("0103a288-6eb6-4ced-b13a-849cd7edf028.json");
        let text = fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["nodes"][0]["n"], "Aspirin");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn pretty_output_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonDirWriter::create(dir.path(), true).unwrap();
        writer.write("a", &document()).unwrap();
        let text = fs::read_to_string(dir.path().join("a.json")).unwrap();
        assert!(text.contains("\n  \"nodes\""));
    }

    #[test]
    fn ids_cannot_escape_the_directory() {
        for id in ["../etc/passwd", "..", "", "a/b"] {
            let stem = file_stem(id);
            assert!(!stem.contains('/'), "{stem}");
            assert!(!stem.chars().all(|c| c == '.'), "{stem}");
        }
        assert!(file_stem("../etc/passwd").starts_with(".._etc_passwd-"));
        let uuid = "0103a288-6eb6-4ced-b13a-849cd7edf028";
        assert_eq!(file_stem(uuid), uuid);
    }

    #[test]
    fn rewritten_ids_do_not_collide() {
        assert_eq!(file_stem("a_b"), "a_b");
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
        assert_ne!(file_stem("a/b"), file_stem("a:b"));
        assert_eq!(file_stem("a/b"), file_stem("a/b"));

        let dir = tempfile::tempdir().unwrap();
        let writer = JsonDirWriter::create(dir.path(), false).unwrap();
        writer.write("a/b", &document()).unwrap();
        writer.write("a_b", &document()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_name_the_file() {
        let path = Path::new("jsons/a.json");
        let err = write_json(FullDisk, &document(), false, path).unwrap_err();
        assert!(err.to_string().contains("jsons/a.json"), "{err}");
        assert!(format!("{err:#}").contains("no space left"), "{err:#}");
    }
}
