use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::pieces::GamePiece;

static LEADING_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+").unwrap());
static NON_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z_]").unwrap());

/// How a GUID entry is labelled in the generated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuidNameStyle {
    /// `recon_team = '123abc',`
    #[default]
    NameAsKey,
    /// `["recon team"] = '123abc',`
    NameAsKeyWithBrackets,
    /// `'123abc',   -- recon_team`
    NameAsComment,
    /// `'123abc',`
    NoName,
}

impl FromStr for GuidNameStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "key" | "name-as-key" => Ok(Self::NameAsKey),
            "brackets" | "name-as-key-with-brackets" => Ok(Self::NameAsKeyWithBrackets),
            "comment" | "name-as-comment" => Ok(Self::NameAsComment),
            "none" | "no-name" => Ok(Self::NoName),
            other => Err(format!("unknown guid name style: {other}")),
        }
    }
}

/// Builds the `GUIDs = { ... }` table attached to a bag.
#[derive(Debug, Default)]
pub struct LuaScript {
    style: GuidNameStyle,
    // Table value plus an optional trailing comment.
    entries: Vec<(String, Option<String>)>,
}

impl LuaScript {
    pub fn new(style: GuidNameStyle) -> Self {
        Self {
            style,
            entries: Vec::new(),
        }
    }

    /// One entry per piece, keyed by its current nickname.
    pub fn add_guids(&mut self, pieces: &[GamePiece]) {
        for piece in pieces {
            self.add_guid(&piece.nickname, &piece.guid);
        }
    }

    pub fn add_guid(&mut self, name: &str, guid: &str) {
        let quoted = format!("'{guid}'");
        let identifier = lua_identifier(name);
        let entry = match self.style {
            _ if identifier.is_empty() => (quoted, None),
            GuidNameStyle::NoName => (quoted, None),
            GuidNameStyle::NameAsKey => (format!("{identifier} = {quoted}"), None),
            GuidNameStyle::NameAsComment => (quoted, Some(identifier)),
            GuidNameStyle::NameAsKeyWithBrackets => (
                format!("[\"{}\"] = {quoted}", escape_lua_string(name)),
                None,
            ),
        };
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn render(&self) -> String {
        let mut script = String::from("GUIDs = {\n");
        for (value, comment) in &self.entries {
            script.push_str("    ");
            script.push_str(value);
            script.push(',');
            if let Some(comment) = comment {
                script.push_str("   -- ");
                script.push_str(comment);
            }
            script.push('\n');
        }
        script.push_str("}\n");
        script
    }
}

/// Turns a display name into a Lua identifier: drops the extension and whitespace,
/// prefixes a leading number with `_`, then drops anything outside `[0-9a-zA-Z_]`.
pub fn lua_identifier(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    };
    let compact: String = stem.chars().filter(|c| !c.is_whitespace()).collect();
    let padded = LEADING_DIGITS.replace(&compact, "_$0");
    NON_IDENTIFIER.replace_all(&padded, "").into_owned()
}

fn escape_lua_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
