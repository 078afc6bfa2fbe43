//! Tabletop Simulator object model, serialized in the save-file shape.

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid hex color \"{0}\", expected rrggbb")]
pub struct ColorParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDiffuse {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorDiffuse {
    pub const WHITE: ColorDiffuse = ColorDiffuse::new(1.0, 1.0, 1.0);
    /// Default tint of a bag.
    pub const BAG_BROWN: ColorDiffuse = ColorDiffuse::new(0.705_882_3, 0.366_520_88, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `rrggbb`, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let hex = value.trim().trim_start_matches('#');
        let invalid = || ColorParseError(value.to_string());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Default for ColorDiffuse {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub pos_x: f32,
    pub pos_y: f32,
    pub pos_z: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub scale_z: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos_x: 0.0,
            pos_y: 0.0,
            pos_z: 0.0,
            rot_x: 0.0,
            // Face-up, oriented toward the first seat.
            rot_y: 180.0,
            rot_z: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    Box = 0,
    Hex = 1,
    Circle = 2,
    Rounded = 3,
}

impl Serialize for TileType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TileShape {
    #[serde(rename = "Type")]
    pub tile_type: TileType,
    pub thickness: f32,
    pub stackable: bool,
    pub stretch: bool,
}

impl Default for TileShape {
    fn default() -> Self {
        Self {
            tile_type: TileType::Rounded,
            thickness: 0.2,
            stackable: false,
            stretch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenShape {
    pub thickness: f32,
    pub merge_distance_pixels: f32,
    pub stand_up: bool,
    pub stackable: bool,
}

impl Default for TokenShape {
    fn default() -> Self {
        Self {
            thickness: 0.2,
            merge_distance_pixels: 15.0,
            stand_up: false,
            stackable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImageShape {
    CustomTile(TileShape),
    CustomToken(TokenShape),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomImage {
    #[serde(rename = "ImageURL")]
    pub image_url: String,
    #[serde(rename = "ImageSecondaryURL")]
    pub image_secondary_url: String,
    pub image_scalar: f32,
    pub width_scale: f32,
    #[serde(flatten)]
    pub shape: ImageShape,
}

impl CustomImage {
    fn new(front: String, back: Option<String>, shape: ImageShape) -> Self {
        Self {
            image_url: front,
            image_secondary_url: back.unwrap_or_default(),
            image_scalar: 1.0,
            width_scale: 0.0,
            shape,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Name")]
pub enum PieceKind {
    #[serde(rename = "Custom_Token")]
    Token {
        #[serde(rename = "CustomImage")]
        image: CustomImage,
    },
    #[serde(rename = "Custom_Tile")]
    Tile {
        #[serde(rename = "CustomImage")]
        image: CustomImage,
    },
    #[serde(rename = "Bag")]
    Bag {
        #[serde(rename = "ContainedObjects")]
        contained: Vec<GamePiece>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GamePiece {
    #[serde(rename = "GUID")]
    pub guid: String,
    pub nickname: String,
    pub description: String,
    pub transform: Transform,
    pub color_diffuse: ColorDiffuse,
    pub locked: bool,
    pub grid: bool,
    pub snap: bool,
    pub autoraise: bool,
    pub sticky: bool,
    pub tooltip: bool,
    pub grid_projection: bool,
    pub hands: bool,
    #[serde(rename = "XmlUI")]
    pub xml_ui: String,
    pub lua_script: String,
    pub lua_script_state: String,
    #[serde(flatten)]
    pub kind: PieceKind,
}

impl GamePiece {
    fn base(guid: String, nickname: String, color: ColorDiffuse, kind: PieceKind) -> Self {
        Self {
            guid,
            nickname,
            description: String::new(),
            transform: Transform::default(),
            color_diffuse: color,
            locked: false,
            grid: true,
            snap: true,
            autoraise: true,
            sticky: true,
            tooltip: true,
            grid_projection: false,
            hands: false,
            xml_ui: String::new(),
            lua_script: String::new(),
            lua_script_state: String::new(),
            kind,
        }
    }

    pub fn token(guid: String, nickname: String, image_url: String, tint: ColorDiffuse) -> Self {
        let image = CustomImage::new(image_url, None, ImageShape::CustomToken(TokenShape::default()));
        Self::base(guid, nickname, tint, PieceKind::Token { image })
    }

    /// A tile with a front face and, when `back` is set, a distinct back face.
    pub fn tile(
        guid: String,
        nickname: String,
        front: String,
        back: Option<String>,
        tint: ColorDiffuse,
    ) -> Self {
        let image = CustomImage::new(front, back, ImageShape::CustomTile(TileShape::default()));
        Self::base(guid, nickname, tint, PieceKind::Tile { image })
    }

    pub fn bag(guid: String, nickname: String, contained: Vec<GamePiece>) -> Self {
        Self::base(
            guid,
            nickname,
            ColorDiffuse::BAG_BROWN,
            PieceKind::Bag { contained },
        )
    }

    pub fn image(&self) -> Option<&CustomImage> {
        match &self.kind {
            PieceKind::Token { image } | PieceKind::Tile { image } => Some(image),
            PieceKind::Bag { .. } => None,
        }
    }

    pub fn contained(&self) -> &[GamePiece] {
        match &self.kind {
            PieceKind::Bag { contained } => contained,
            PieceKind::Token { .. } | PieceKind::Tile { .. } => &[],
        }
    }

    pub fn is_double_sided(&self) -> bool {
        matches!(&self.kind, PieceKind::Tile { image } if !image.image_secondary_url.is_empty())
    }
}
