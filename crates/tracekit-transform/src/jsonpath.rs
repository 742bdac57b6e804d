//! Minimal JSONPath subset: dotted field access and numeric array indices
//! (`$.a.b[0].c`). This covers exactly what the matcher contract needs
//! (§4.3) — it is not a general JSONPath implementation.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("jsonPath must start with '$'")]
    MissingRoot,
    #[error("empty path segment in '{0}'")]
    EmptySegment(String),
    #[error("invalid array index in '{0}'")]
    InvalidIndex(String),
}

/// Parse `$.a.b[0].c` into `[Field("a"), Field("b"), Index(0), Field("c")]`.
pub fn parse(path: &str) -> Result<Vec<Segment>, PathError> {
    let path = path.trim();
    let rest = path.strip_prefix('$').ok_or(PathError::MissingRoot)?;

    let mut segments = Vec::new();
    let mut chars = rest.chars().peekable();
    let mut buf = String::new();

    fn flush_field(buf: &mut String, segments: &mut Vec<Segment>) -> Result<(), PathError> {
        if !buf.is_empty() {
            segments.push(Segment::Field(std::mem::take(buf)));
        }
        Ok(())
    }

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                flush_field(&mut buf, &mut segments)?;
            }
            '[' => {
                flush_field(&mut buf, &mut segments)?;
                let mut idx_buf = String::new();
                for idx_char in chars.by_ref() {
                    if idx_char == ']' {
                        break;
                    }
                    idx_buf.push(idx_char);
                }
                let idx: usize = idx_buf
                    .parse()
                    .map_err(|_| PathError::InvalidIndex(idx_buf.clone()))?;
                segments.push(Segment::Index(idx));
            }
            other => buf.push(other),
        }
    }
    flush_field(&mut buf, &mut segments)?;

    if segments.is_empty() && !rest.is_empty() {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    Ok(segments)
}

/// Apply `f` to every node the path resolves to (single node, since this
/// subset has no wildcards). No-op if the path does not resolve.
pub fn apply_in_place<F>(root: &mut serde_json::Value, segments: &[Segment], f: F)
where
    F: FnOnce(&mut serde_json::Value),
{
    if let Some(node) = resolve_mut(root, segments) {
        f(node);
    }
}

pub fn resolve<'a>(root: &'a serde_json::Value, segments: &[Segment]) -> Option<&'a serde_json::Value> {
    let mut current = root;
    for seg in segments {
        current = match (seg, current) {
            (Segment::Field(name), serde_json::Value::Object(map)) => map.get(name)?,
            (Segment::Index(i), serde_json::Value::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn resolve_mut<'a>(root: &'a mut serde_json::Value, segments: &[Segment]) -> Option<&'a mut serde_json::Value> {
    let mut current = root;
    for seg in segments {
        current = match (seg, current) {
            (Segment::Field(name), serde_json::Value::Object(map)) => map.get_mut(name)?,
            (Segment::Index(i), serde_json::Value::Array(arr)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}
