//! Fragment parser for fixture markup.
//!
//! Handles elements, attributes, text, comments and declarations. Unknown end tags are
//! ignored and open elements are closed implicitly at the end of input. `script` and
//! `style` bodies are kept as raw text.

use crate::dom::Dom;
use lockstep_core::HostError;

fn parse_error(message: &str) -> HostError {
    HostError::Parse {
        message: message.to_string(),
    }
}

pub(crate) fn parse_fragment(html: &str) -> Result<Dom, HostError> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;
    let mut text_start = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'<' || !starts_markup(bytes, i) {
            i += 1;
            continue;
        }

        flush_text(&mut dom, &stack, &html[text_start..i]);

        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| parse_error("unclosed HTML comment"))?;
            i = end + 3;
        } else if starts_with_at(bytes, i, b"</") {
            let (tag, next) = parse_end_tag(html, i)?;
            i = next;
            // pop up to the matching open element; stray end tags are dropped
            if let Some(pos) = stack
                .iter()
                .rposition(|node| dom.tag_name(*node) == Some(tag.as_str()))
            {
                stack.truncate(pos);
            }
        } else if starts_with_at(bytes, i, b"<!") {
            let end = find_subslice(bytes, i, b">")
                .ok_or_else(|| parse_error("unclosed declaration tag"))?;
            i = end + 1;
        } else {
            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            let parent = *stack
                .last()
                .ok_or_else(|| parse_error("missing parent element"))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if tag == "script" || tag == "style" {
                let close = find_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| parse_error("unclosed raw text element"))?;
                if close > i {
                    dom.create_text(node, html[i..close].to_string());
                }
                let (_, after) = parse_end_tag(html, close)?;
                i = after;
            } else if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
        }
        text_start = i;
    }

    flush_text(&mut dom, &stack, &html[text_start..]);
    Ok(dom)
}

fn flush_text(dom: &mut Dom, stack: &[crate::dom::NodeId], raw: &str) {
    if raw.is_empty() {
        return;
    }
    if let Some(parent) = stack.last() {
        dom.create_text(*parent, decode_entities(raw));
    }
}

/// A `<` only opens markup when followed by a tag name, `/` or `!`.
fn starts_markup(bytes: &[u8], at: usize) -> bool {
    matches!(bytes.get(at + 1), Some(b) if b.is_ascii_alphabetic() || *b == b'/' || *b == b'!')
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, Vec<(String, String)>, bool, usize), HostError> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html[tag_start..i].to_ascii_lowercase();
    if tag.is_empty() {
        return Err(parse_error("empty tag name"));
    }

    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(parse_error("unclosed start tag"));
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        if starts_with_at(bytes, i, b"/>") {
            self_closing = true;
            i += 2;
            break;
        }
        if !is_attr_name_char(bytes[i]) {
            return Err(parse_error("invalid attribute name"));
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let name = html[name_start..i].to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };

        if !attrs.iter().any(|(k, _)| *k == name) {
            attrs.push((name, value));
        }
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize), HostError> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html[tag_start..i].to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(parse_error("unclosed end tag"));
    }
    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, i: &mut usize) -> Result<String, HostError> {
    let bytes = html.as_bytes();
    if *i >= bytes.len() {
        return Err(parse_error("missing attribute value"));
    }

    if bytes[*i] == b'"' || bytes[*i] == b'\'' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(parse_error("unclosed quoted attribute value"));
        }
        let value = decode_entities(&html[start..*i]);
        *i += 1;
        return Ok(value);
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !starts_with_at(bytes, *i, b"/>")
    {
        *i += 1;
    }
    Ok(decode_entities(&html[start..*i]))
}

/// Named references fixtures actually use, plus numeric ones. Anything else stays literal.
fn decode_entities(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_reference(&tail[..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => None,
    }
}

fn find_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i + 2 + tag.len() <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + 2 + tag.len()].eq_ignore_ascii_case(tag)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "param" | "source" | "track" | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.get(at..at + needle.len()) == Some(needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}
