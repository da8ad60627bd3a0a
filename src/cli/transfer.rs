//! Export and import commands

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::store::{CampaignStore, ExportBundle, ImportMode};

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const ZSTD_LEVEL: i32 = 3;

/// Writes the bundle to `output`, or stdout when no path is given.
pub fn export(store: &CampaignStore, output: Option<&Path>, compress: bool) -> Result<()> {
    let bundle = store.export_bundle()?;
    let bytes = encode_bundle(&bundle, compress)?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("writing export to {}", path.display()))?;
            eprintln!(
                "Exported {} adventures, {} characters, {} quests to {}",
                bundle.adventures.len(),
                bundle.characters.len(),
                bundle.quests.len(),
                path.display()
            );
        }
        None => {
            if compress {
                anyhow::bail!("--compress requires --output");
            }
            std::io::stdout().write_all(&bytes)?;
            println!();
        }
    }
    Ok(())
}

pub fn import(store: &CampaignStore, input: &Path, replace: bool) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("reading bundle {}", input.display()))?;
    let bundle = decode_bundle(&bytes)?;

    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let report = store.import_bundle(&bundle, mode)?;
    println!(
        "✅ Imported {} rows ({:?}) from bundle exported at {}",
        report.rows_written, mode, bundle.exported_at
    );
    Ok(())
}

fn encode_bundle(bundle: &ExportBundle, compress: bool) -> Result<Vec<u8>> {
    let json = serde_json::to_vec_pretty(bundle)?;
    if compress {
        Ok(zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?)
    } else {
        Ok(json)
    }
}

/// Accepts plain JSON or zstd-compressed JSON.
fn decode_bundle(bytes: &[u8]) -> Result<ExportBundle> {
    let json = if bytes.starts_with(&ZSTD_MAGIC) {
        zstd::decode_all(bytes).context("decompressing bundle")?
    } else {
        bytes.to_vec()
    };
    serde_json::from_slice(&json).context("parsing bundle")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_bundle_is_detected() {
        let store = CampaignStore::open_in_memory().unwrap();
        let bundle = store.export_bundle().unwrap();

        let compressed = encode_bundle(&bundle, true).unwrap();
        assert!(compressed.starts_with(&ZSTD_MAGIC));
        assert_eq!(decode_bundle(&compressed).unwrap(), bundle);

        let plain = encode_bundle(&bundle, false).unwrap();
        assert_eq!(plain[0], b'{');
        assert_eq!(decode_bundle(&plain).unwrap(), bundle);
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campaign.json.zst");

        let source = CampaignStore::open_in_memory().unwrap();
        export(&source, Some(&path), true).unwrap();

        let target = CampaignStore::open_in_memory().unwrap();
        target.delete_adventure(2).unwrap();
        import(&target, &path, false).unwrap();
        assert_eq!(target.list_adventures().unwrap().len(), 2);
    }
}
