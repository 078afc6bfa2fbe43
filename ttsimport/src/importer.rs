use std::path::PathBuf;

use anyhow::Context;
use drive_core::{DriveClient, MAX_BATCH_REQUESTS};

use crate::drive::share::LinkSharer;
use crate::drive::tree::{DEFAULT_PAGE_SIZE, DriveMirror};
use crate::tts::convert::{
    ConvertOptions, PairingMode, SideMismatch, convert_folder, find_side_mismatches,
};
use crate::tts::guid::GuidGenerator;
use crate::tts::lua::GuidNameStyle;
use crate::tts::pieces::ColorDiffuse;
use crate::tts::save_file::SaveFile;

const DEFAULT_OUTPUT: &str = "tts_import.json";

#[derive(Clone)]
pub struct ImportConfig {
    pub folder_id: String,
    pub access_token: String,
    pub api_base: Option<String>,
    pub output: PathBuf,
    pub save_name: Option<String>,
    pub page_size: u32,
    pub batch_size: usize,
    pub convert: ConvertOptions,
}

impl ImportConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let folder_id = read_required(&lookup, "TTS_IMPORT_FOLDER_ID")?;
        let access_token = read_required(&lookup, "TTS_IMPORT_ACCESS_TOKEN")?;
        let api_base = read_optional(&lookup, "TTS_IMPORT_API_BASE");
        let output = read_optional(&lookup, "TTS_IMPORT_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
        let save_name = read_optional(&lookup, "TTS_IMPORT_SAVE_NAME");
        let page_size = read_u64(&lookup, "TTS_IMPORT_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE))
            .min(u64::from(u32::MAX)) as u32;
        let batch_size = read_u64(
            &lookup,
            "TTS_IMPORT_BATCH_SIZE",
            MAX_BATCH_REQUESTS as u64,
        )
        .min(MAX_BATCH_REQUESTS as u64) as usize;

        let pairing: PairingMode = match read_optional(&lookup, "TTS_IMPORT_PAIRING") {
            Some(value) => value.parse().map_err(anyhow::Error::msg)?,
            None => Default::default(),
        };
        let guid_style: GuidNameStyle = match read_optional(&lookup, "TTS_IMPORT_GUID_STYLE") {
            Some(value) => value.parse().map_err(anyhow::Error::msg)?,
            None => Default::default(),
        };
        let tint = match read_optional(&lookup, "TTS_IMPORT_TINT") {
            Some(value) => ColorDiffuse::from_hex(&value)?,
            None => ColorDiffuse::WHITE,
        };
        let emit_script = read_bool(&lookup, "TTS_IMPORT_LUA_SCRIPT", false);

        Ok(Self {
            folder_id,
            access_token,
            api_base,
            output,
            save_name,
            page_size,
            batch_size,
            convert: ConvertOptions {
                pairing,
                emit_script,
                guid_style,
                tint,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    Share,
    Skip,
}

pub struct ImportRuntime {
    config: ImportConfig,
    client: DriveClient,
}

impl ImportRuntime {
    pub fn bootstrap(config: ImportConfig) -> anyhow::Result<Self> {
        let client = match config.api_base.as_deref() {
            Some(base) => DriveClient::with_base_url(base, config.access_token.clone()),
            None => DriveClient::new(config.access_token.clone()),
        }
        .context("failed to build drive client")?;
        Ok(Self { config, client })
    }

    /// Mirrors the tree and reports unpaired `.A`/`.B` images. Nothing is shared or written.
    pub async fn check(&self) -> anyhow::Result<Vec<SideMismatch>> {
        let tree = DriveMirror::new(&self.client)
            .with_page_size(self.config.page_size)
            .mirror(&self.config.folder_id)
            .await
            .with_context(|| format!("failed to mirror drive folder {}", self.config.folder_id))?;
        let found = find_side_mismatches(&tree);
        tracing::info!(
            folders = tree.folder_count(),
            with_mismatches = found.len(),
            "checked side pairing"
        );
        Ok(found)
    }

    /// Mirror, share, convert, then write the save file. Returns the document written.
    pub async fn run(&self, share: ShareMode) -> anyhow::Result<SaveFile> {
        let config = &self.config;
        tracing::info!(
            folder_id = %config.folder_id,
            pairing = ?config.convert.pairing,
            output = %config.output.display(),
            "starting import"
        );

        let tree = DriveMirror::new(&self.client)
            .with_page_size(config.page_size)
            .mirror(&config.folder_id)
            .await
            .with_context(|| format!("failed to mirror drive folder {}", config.folder_id))?;

        match share {
            ShareMode::Share => LinkSharer::new(&self.client)
                .with_batch_size(config.batch_size)
                .propagate(&tree)
                .await
                .with_context(|| format!("failed to share \"{}\"", tree.name))?,
            ShareMode::Skip => tracing::warn!(
                "link sharing skipped; download links only work for files that are already public"
            ),
        }

        let mut guids = GuidGenerator::new();
        let bag = convert_folder(&tree, true, &config.convert, &mut guids)
            .with_context(|| format!("failed to convert \"{}\"", tree.name))?;

        let mut save = SaveFile::new(config.save_name.clone().unwrap_or_else(|| tree.name.clone()));
        save.add_piece(bag);
        save.write_to(&config.output)
            .await
            .with_context(|| format!("failed to save {}", config.output.display()))?;

        tracing::info!(
            folders = tree.folder_count(),
            files = tree.file_count(),
            guids = guids.issued(),
            "import finished"
        );
        Ok(save)
    }
}

include!("importer_helpers.rs");

#[cfg(test)]
#[path = "importer_tests.rs"]
mod tests;
