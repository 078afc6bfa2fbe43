//! Drive folder tree -> nested bags of tokens and tiles.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use thiserror::Error;

use super::guid::GuidGenerator;
use super::lua::{GuidNameStyle, LuaScript};
use super::natural::natural_cmp;
use super::pieces::{ColorDiffuse, GamePiece};
use crate::drive::tree::{RemoteFile, RemoteFolder};

/// Table-top height; the root bag starts here so it does not snap up on load.
pub const ROOT_LIFT_Y: f32 = 0.77;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg"];

// `Recon.A.png` / `Recon.B.png` / `Smoke.token.png`
static SIDE_A: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.A").unwrap());
static SIDE_B: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.B").unwrap());
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.token").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error(
        "folder \"{folder}\" has an odd number of tile images ({count}); \
         sequential pairing needs front/back pairs"
    )]
    OddFileCount { folder: String, count: usize },
    #[error("folder \"{folder}\" has {side_a} side-A images but {side_b} side-B images")]
    SideCountMismatch {
        folder: String,
        side_a: usize,
        side_b: usize,
    },
    #[error("folder \"{folder}\": no side-B image matches \"{file}\"")]
    UnmatchedSide { folder: String, file: String },
    #[error("folder \"{folder}\": side-B images \"{first}\" and \"{second}\" have the same name")]
    DuplicateSide {
        folder: String,
        first: String,
        second: String,
    },
}

/// How tile images are matched into front/back pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// `X.A.png` pairs with `X.B.png`; unmarked images become single-sided tiles.
    #[default]
    SuffixAb,
    /// Natural-sorted images pair up two by two.
    Sequential,
}

impl FromStr for PairingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ab" | "suffix-ab" | "suffix_ab" => Ok(Self::SuffixAb),
            "sequential" | "seq" => Ok(Self::Sequential),
            other => Err(format!("unknown pairing mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub pairing: PairingMode,
    pub emit_script: bool,
    pub guid_style: GuidNameStyle,
    /// Applied to tokens and tiles. Bags keep their own color.
    pub tint: ColorDiffuse,
}

struct TileFaces<'a> {
    front: &'a RemoteFile,
    back: Option<&'a RemoteFile>,
}

/// Converts `folder` and everything below it into a bag.
///
/// Direct children are ordered tokens, then tiles, then sub-bags. When a script is
/// requested it is built from the children's names before those names are blanked, so
/// the finished pieces carry only their GUIDs.
pub fn convert_folder<R: Rng>(
    folder: &RemoteFolder,
    is_root: bool,
    options: &ConvertOptions,
    guids: &mut GuidGenerator<R>,
) -> Result<GamePiece, ConvertError> {
    let images = folder.files.iter().filter(|file| is_image(&file.name));
    let (token_files, tile_files): (Vec<&RemoteFile>, Vec<&RemoteFile>) =
        images.partition(|file| is_token(&file.name));

    let mut children: Vec<GamePiece> = token_files
        .into_iter()
        .map(|file| {
            GamePiece::token(
                guids.next_guid(),
                display_name(&file.name),
                file.download_url(),
                options.tint,
            )
        })
        .collect();

    for faces in pair_tiles(&folder.name, tile_files, options.pairing)? {
        children.push(GamePiece::tile(
            guids.next_guid(),
            display_name(&faces.front.name),
            faces.front.download_url(),
            faces.back.map(RemoteFile::download_url),
            options.tint,
        ));
    }

    for sub in &folder.folders {
        children.push(convert_folder(sub, false, options, guids)?);
    }

    let script = options.emit_script.then(|| {
        let mut script = LuaScript::new(options.guid_style);
        script.add_guids(&children);
        script
    });
    for child in &mut children {
        child.nickname.clear();
    }

    let mut bag = GamePiece::bag(guids.next_guid(), folder.name.clone(), children);
    if is_root {
        bag.transform.pos_y = ROOT_LIFT_Y;
    }
    let script_entries = script.as_ref().map_or(0, LuaScript::len);
    if let Some(script) = script {
        bag.lua_script = script.render();
    }
    tracing::debug!(
        folder = %folder.name,
        pieces = bag.contained().len(),
        script_entries,
        "converted folder"
    );
    Ok(bag)
}

fn pair_tiles<'a>(
    folder: &str,
    mut files: Vec<&'a RemoteFile>,
    mode: PairingMode,
) -> Result<Vec<TileFaces<'a>>, ConvertError> {
    match mode {
        PairingMode::Sequential => {
            if files.len() % 2 != 0 {
                return Err(ConvertError::OddFileCount {
                    folder: folder.to_string(),
                    count: files.len(),
                });
            }
            files.sort_by(|a, b| natural_cmp(&a.name, &b.name));
            Ok(files
                .chunks_exact(2)
                .map(|pair| TileFaces {
                    front: pair[0],
                    back: Some(pair[1]),
                })
                .collect())
        }
        PairingMode::SuffixAb => {
            let side_a: Vec<&RemoteFile> = files
                .iter()
                .copied()
                .filter(|f| SIDE_A.is_match(&f.name))
                .collect();
            let side_b: Vec<&RemoteFile> = files
                .iter()
                .copied()
                .filter(|f| SIDE_B.is_match(&f.name))
                .collect();
            let mut backs: HashMap<String, &RemoteFile> = HashMap::with_capacity(side_b.len());
            for &back in &side_b {
                let key = SIDE_B.replace_all(&back.name, "").into_owned();
                if let Some(first) = backs.insert(key, back) {
                    return Err(ConvertError::DuplicateSide {
                        folder: folder.to_string(),
                        first: first.name.clone(),
                        second: back.name.clone(),
                    });
                }
            }
            let mut tiles = Vec::with_capacity(files.len() - side_b.len());
            // Unmatched fronts are reported ahead of the count check. Each back pairs once.
            for &front in &side_a {
                let key = SIDE_A.replace_all(&front.name, "");
                let back = backs.remove(key.as_ref()).ok_or_else(|| {
                    ConvertError::UnmatchedSide {
                        folder: folder.to_string(),
                        file: front.name.clone(),
                    }
                })?;
                tiles.push(TileFaces {
                    front,
                    back: Some(back),
                });
            }
            if side_a.len() != side_b.len() {
                return Err(ConvertError::SideCountMismatch {
                    folder: folder.to_string(),
                    side_a: side_a.len(),
                    side_b: side_b.len(),
                });
            }
            tiles.extend(
                files
                    .into_iter()
                    .filter(|f| !SIDE_A.is_match(&f.name) && !SIDE_B.is_match(&f.name))
                    .map(|front| TileFaces { front, back: None }),
            );
            Ok(tiles)
        }
    }
}

/// Marked images in one folder that have no partner on the other side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideMismatch {
    /// Slash-joined folder names from the root.
    pub folder: String,
    /// `.A` images with no `.B` partner.
    pub missing_back: Vec<String>,
    /// `.B` images with no `.A` partner.
    pub missing_front: Vec<String>,
}

/// Reports every folder whose `.A`/`.B` images do not pair up, without converting anything.
/// Tokens, unmarked images and non-images are ignored.
pub fn find_side_mismatches(root: &RemoteFolder) -> Vec<SideMismatch> {
    let mut found = Vec::new();
    collect_side_mismatches(root, root.name.clone(), &mut found);
    found
}

fn collect_side_mismatches(folder: &RemoteFolder, path: String, found: &mut Vec<SideMismatch>) {
    let tiles: Vec<&str> = folder
        .files
        .iter()
        .map(|f| f.name.as_str())
        .filter(|name| is_image(name) && !is_token(name))
        .collect();
    let fronts: HashSet<String> = tiles
        .iter()
        .filter(|name| SIDE_A.is_match(name))
        .map(|name| SIDE_A.replace_all(name, "").into_owned())
        .collect();
    let backs: HashSet<String> = tiles
        .iter()
        .filter(|name| SIDE_B.is_match(name))
        .map(|name| SIDE_B.replace_all(name, "").into_owned())
        .collect();

    let mut missing_back: Vec<String> = tiles
        .iter()
        .filter(|name| SIDE_A.is_match(name))
        .filter(|name| !backs.contains(SIDE_A.replace_all(name, "").as_ref()))
        .map(|name| name.to_string())
        .collect();
    let mut missing_front: Vec<String> = tiles
        .iter()
        .filter(|name| SIDE_B.is_match(name))
        .filter(|name| !fronts.contains(SIDE_B.replace_all(name, "").as_ref()))
        .map(|name| name.to_string())
        .collect();

    if !missing_back.is_empty() || !missing_front.is_empty() {
        missing_back.sort_by(|a, b| natural_cmp(a, b));
        missing_front.sort_by(|a, b| natural_cmp(a, b));
        found.push(SideMismatch {
            folder: path.clone(),
            missing_back,
            missing_front,
        });
    }
    for sub in &folder.folders {
        collect_side_mismatches(sub, format!("{path}/{}", sub.name), found);
    }
}

/// True if the extension is on the image allowlist, ignoring case.
pub fn is_image(name: &str) -> bool {
    extension(name).is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}

pub fn is_token(name: &str) -> bool {
    TOKEN.is_match(name)
}

/// File name without extension, side markers, or token marker.
pub fn display_name(file_name: &str) -> String {
    let name = strip_extension(file_name);
    let name = SIDE_A.replace_all(name, "");
    let name = SIDE_B.replace_all(&name, "");
    TOKEN.replace_all(&name, "").into_owned()
}

fn extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[pos + 1..])
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
