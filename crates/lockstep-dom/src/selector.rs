//! Selector subset: `*`, `tag`, `#id`, `.class`, `[attr]`, `[attr=value]`, descendant and
//! child combinators, and comma-separated groups.

use lockstep_core::HostError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal && self.tag.is_none() && self.classes.is_empty() && self.attrs.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    /// Relation to the part on the left.
    pub(crate) combinator: Option<Combinator>,
}

fn unsupported(selector: &str) -> HostError {
    HostError::UnsupportedSelector {
        selector: selector.to_string(),
    }
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>, HostError> {
    split_groups(selector)?
        .iter()
        .map(|group| parse_chain(group).map_err(|_| unsupported(selector)))
        .collect()
}

fn split_groups(selector: &str) -> Result<Vec<String>, HostError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in selector.chars() {
        match ch {
            '[' if !in_brackets => in_brackets = true,
            ']' if in_brackets => in_brackets = false,
            '[' | ']' => return Err(unsupported(selector)),
            ',' if !in_brackets => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(unsupported(selector));
                }
                groups.push(trimmed.to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let trimmed = current.trim();
    if in_brackets || trimmed.is_empty() {
        return Err(unsupported(selector));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn parse_chain(selector: &str) -> Result<Vec<SelectorPart>, HostError> {
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokenize(selector) {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(unsupported(selector));
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(unsupported(selector));
    }
    Ok(parts)
}

fn tokenize(selector: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in selector.chars() {
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            ']' => {
                in_brackets = false;
                current.push(ch);
            }
            '>' if !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            ch if ch.is_ascii_whitespace() && !in_brackets => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_step(part: &str) -> Result<SelectorStep, HostError> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if i != 0 {
                    return Err(unsupported(part));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                if step.id.replace(id).is_some() {
                    return Err(unsupported(part));
                }
                i = next;
            }
            b'.' => {
                let (class_name, next) =
                    parse_ident(part, i + 1).ok_or_else(|| unsupported(part))?;
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr_condition(part, i)?;
                step.attrs.push(cond);
                i = next;
            }
            _ if i == 0 => {
                let (tag, next) = parse_ident(part, i).ok_or_else(|| unsupported(part))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
            _ => return Err(unsupported(part)),
        }
    }
    Ok(step)
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len()
        && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'-' || bytes[end] == b'_')
    {
        end += 1;
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

fn parse_attr_condition(part: &str, start: usize) -> Result<(AttrCondition, usize), HostError> {
    let close = part[start..]
        .find(']')
        .map(|pos| start + pos)
        .ok_or_else(|| unsupported(part))?;
    let inner = part[start + 1..close].trim();

    let cond = match inner.split_once('=') {
        None => {
            let key = inner.to_ascii_lowercase();
            if key.is_empty() {
                return Err(unsupported(part));
            }
            AttrCondition::Exists { key }
        }
        Some((key, value)) => {
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return Err(unsupported(part));
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            AttrCondition::Eq {
                key,
                value: value.to_string(),
            }
        }
    };
    Ok((cond, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_step_parses_all_parts() {
        let groups = parse_selector_groups("DIV#main.a.b[data-x='1'][hidden]").unwrap();
        let step = &groups[0][0].step;
        assert_eq!(step.tag.as_deref(), Some("div"));
        assert_eq!(step.id.as_deref(), Some("main"));
        assert_eq!(step.classes, vec!["a", "b"]);
        assert_eq!(
            step.attrs,
            vec![
                AttrCondition::Eq {
                    key: "data-x".into(),
                    value: "1".into()
                },
                AttrCondition::Exists {
                    key: "hidden".into()
                },
            ]
        );
    }

    #[test]
    fn combinators_and_groups() {
        let groups = parse_selector_groups("ul > li a, p").unwrap();
        assert_eq!(groups.len(), 2);
        let combinators: Vec<_> = groups[0].iter().map(|p| p.combinator).collect();
        assert_eq!(
            combinators,
            vec![None, Some(Combinator::Child), Some(Combinator::Descendant)]
        );
        assert_eq!(groups[1][0].step.tag.as_deref(), Some("p"));
    }

    #[test]
    fn id_only_fast_path() {
        let groups = parse_selector_groups("#x").unwrap();
        assert_eq!(groups[0][0].step.id_only(), Some("x"));
        let groups = parse_selector_groups("p#x").unwrap();
        assert_eq!(groups[0][0].step.id_only(), None);
    }

    #[test]
    fn unsupported_forms_are_rejected() {
        for bad in ["", "a,", "> a", "a >", "a:hover", "a + b", "[x", "#", "a*"] {
            let err = parse_selector_groups(bad).unwrap_err();
            assert!(
                matches!(err, HostError::UnsupportedSelector { .. }),
                "{bad} should be rejected"
            );
        }
    }
}
