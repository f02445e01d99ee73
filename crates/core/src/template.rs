use crate::error::{Error, Result};
use crate::sanitize::INVALID_CHARS;
use crate::types::{Field, TagRecord};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed filename template such as `"{track} {title} _ {artist}"`.
///
/// `{{` and `}}` expand to literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FilenameTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let err = |reason: String| Error::Template {
            template: source.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(n) => name.push(n),
                            None => return Err(err("unclosed '{'".to_string())),
                        }
                    }
                    let field = Field::from_placeholder(&name)
                        .ok_or_else(|| err(format!("unknown placeholder '{{{}}}'", name)))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(err("unmatched '}'".to_string())),
                c if INVALID_CHARS.contains(&c) => {
                    return Err(err(format!("literal text contains invalid character {:?}", c)));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Field(_))) {
            return Err(err("template must reference at least one field".to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn references(&self, field: Field) -> bool {
        self.fields().any(|f| f == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(f) => Some(*f),
            Segment::Literal(_) => None,
        })
    }

    /// Expand the template; absent values become empty strings.
    pub fn render(&self, value: impl Fn(Field) -> Option<String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    if let Some(v) = value(*field) {
                        out.push_str(&v);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Zero-pad a numeric track to two digits; non-numeric values pass through.
pub fn pad_track(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(n) => format!("{:02}", n),
        Err(_) => raw.to_string(),
    }
}

/// Builds destination filenames from a primary template and a fallback used
/// when there is no track number.
#[derive(Debug, Clone)]
pub struct FilenameGenerator {
    primary: FilenameTemplate,
    no_track: FilenameTemplate,
}

impl FilenameGenerator {
    pub fn new(primary: FilenameTemplate, no_track: FilenameTemplate) -> Self {
        Self { primary, no_track }
    }

    pub fn primary(&self) -> &FilenameTemplate {
        &self.primary
    }

    pub fn no_track(&self) -> &FilenameTemplate {
        &self.no_track
    }

    /// Text fields referenced by either template. Track is never required
    /// since its absence selects the fallback template.
    pub fn required_fields(&self) -> BTreeSet<Field> {
        self.primary
            .fields()
            .chain(self.no_track.fields())
            .filter(|f| *f != Field::Track)
            .collect()
    }

    /// Template that applies to `tags`.
    pub fn select(&self, tags: &TagRecord) -> &FilenameTemplate {
        if tags.track_number.is_some() && self.primary.references(Field::Track) {
            &self.primary
        } else {
            &self.no_track
        }
    }

    /// `extension` may be given with or without its leading dot.
    pub fn generate(&self, tags: &TagRecord, extension: &str) -> String {
        let stem = self.select(tags).render(|field| match field {
            Field::Track => tags.track_number.as_deref().map(pad_track),
            other => tags.get(other).map(str::to_string),
        });

        let extension = extension.trim_start_matches('.').to_lowercase();
        if extension.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, extension)
        }
    }
}
