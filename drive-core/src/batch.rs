//! `multipart/mixed` framing for the batch endpoint.

pub(crate) const REQUEST_BOUNDARY: &str = "ttsimport_batch_boundary";

pub(crate) struct BatchPart {
    pub method: &'static str,
    pub path: String,
    pub body: String,
}

#[derive(Debug)]
pub(crate) struct PartResponse {
    /// Position of the matching sub-request, recovered from `Content-ID`.
    pub index: Option<usize>,
    pub status: u16,
    pub body: String,
}

pub(crate) fn encode_request(parts: &[BatchPart], boundary: &str) -> String {
    let mut out = String::new();
    for (index, part) in parts.iter().enumerate() {
        out.push_str(&format!("--{boundary}\r\n"));
        out.push_str("Content-Type: application/http\r\n");
        out.push_str(&format!("Content-ID: <item-{index}>\r\n\r\n"));
        out.push_str(&format!("{} {}\r\n", part.method, part.path));
        out.push_str("Content-Type: application/json; charset=UTF-8\r\n\r\n");
        out.push_str(&part.body);
        out.push_str("\r\n");
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out
}

pub(crate) fn boundary_from_content_type(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .map(|boundary| boundary.trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

pub(crate) fn decode_response(body: &str, boundary: &str) -> Result<Vec<PartResponse>, String> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    for chunk in body.split(delimiter.as_str()).skip(1) {
        if chunk.starts_with("--") {
            break;
        }
        parts.push(parse_part(chunk)?);
    }
    Ok(parts)
}

fn parse_part(chunk: &str) -> Result<PartResponse, String> {
    let chunk = chunk.trim_start_matches(['\r', '\n']);
    let (headers, http) =
        split_head(chunk).ok_or_else(|| "part is missing its header block".to_string())?;
    let index = headers.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-id") {
            parse_content_id(value.trim())
        } else {
            None
        }
    });

    let (head, body) = split_head(http).unwrap_or((http, ""));
    let status_line = head
        .lines()
        .next()
        .ok_or_else(|| "part has no status line".to_string())?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| format!("invalid status line: {status_line}"))?;

    Ok(PartResponse {
        index,
        status,
        body: body.trim().to_string(),
    })
}

// `<response-item-7>` -> 7
fn parse_content_id(value: &str) -> Option<usize> {
    value
        .trim_matches(['<', '>'])
        .rsplit('-')
        .next()
        .and_then(|n| n.parse().ok())
}

fn split_head(text: &str) -> Option<(&str, &str)> {
    if let Some(pos) = text.find("\r\n\r\n") {
        return Some((&text[..pos], &text[pos + 4..]));
    }
    text.find("\n\n").map(|pos| (&text[..pos], &text[pos + 2..]))
}
