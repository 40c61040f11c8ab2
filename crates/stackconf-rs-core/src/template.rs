//! Site properties derived from global values through placeholder templates.
//!
//! A template mixes literal text with `<templateName[i]>` and
//! `<foreignKey[i]>` references. Mappings without foreign keys resolve
//! first against globals. Mappings with foreign keys then resolve in
//! declared order: foreign keys in the value, foreign keys in the name, and
//! finally template names in the value.

use log::debug;
use serde::{Deserialize, Serialize};

const TEMPLATE_NAME: &str = "templateName";
const FOREIGN_KEY: &str = "foreignKey";

/// A catalog rule deriving one site property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapping {
    pub name: String,
    #[serde(default)]
    pub template_name: Vec<String>,
    #[serde(default)]
    pub foreign_key: Option<Vec<String>>,
    pub value: String,
    pub filename: String,
}

impl ConfigMapping {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            template_name: Vec::new(),
            foreign_key: None,
            value: value.into(),
            filename: filename.into(),
        }
    }

    pub fn with_template_names(mut self, names: &[&str]) -> Self {
        self.template_name = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_foreign_keys(mut self, keys: &[&str]) -> Self {
        self.foreign_key = Some(keys.iter().map(|key| key.to_string()).collect());
        self
    }

    fn has_foreign_keys(&self) -> bool {
        self.foreign_key.is_some()
    }
}

/// A global value that templates may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalValue {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub default_value: String,
}

impl GlobalValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            default_value: String::new(),
        }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = default_value.into();
        self
    }
}

/// A resolved site property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedProperty {
    pub name: String,
    pub value: String,
    pub filename: String,
}

/// One parsed piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    TemplateName(usize),
    ForeignKey(usize),
}

/// Split a template into segments. Anything between `<` and `>` that is not
/// a recognised reference stays literal.
pub fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('<') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            literal.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let inner = &after[..close];
        match parse_reference(inner) {
            Some(segment) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            None => {
                literal.push('<');
                literal.push_str(inner);
                literal.push('>');
            }
        }
        rest = &after[close + 1..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn parse_reference(inner: &str) -> Option<Segment> {
    let (kind, index) = inner.strip_suffix(']')?.split_once('[')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = index.parse().ok()?;
    match kind {
        TEMPLATE_NAME => Some(Segment::TemplateName(index)),
        FOREIGN_KEY => Some(Segment::ForeignKey(index)),
        _ => None,
    }
}

fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Literal(text) => text.clone(),
            Segment::TemplateName(idx) => format!("<{TEMPLATE_NAME}[{idx}]>"),
            Segment::ForeignKey(idx) => format!("<{FOREIGN_KEY}[{idx}]>"),
        })
        .collect()
}

/// Resolves catalog mappings against global values.
pub struct TemplateResolver<'a> {
    globals: &'a [GlobalValue],
}

impl<'a> TemplateResolver<'a> {
    pub fn new(globals: &'a [GlobalValue]) -> Self {
        Self { globals }
    }

    /// Resolve every mapping. Mappings with an unresolvable template name are
    /// dropped.
    pub fn resolve(&self, mappings: &[ConfigMapping]) -> Vec<DerivedProperty> {
        let mut derived: Vec<DerivedProperty> = Vec::new();

        for mapping in mappings.iter().filter(|m| !m.has_foreign_keys()) {
            match self.resolve_templates(mapping, &parse_template(&mapping.value)) {
                Some(value) => derived.push(DerivedProperty {
                    name: mapping.name.clone(),
                    value,
                    filename: mapping.filename.clone(),
                }),
                None => debug!("mapping dropped (name={})", mapping.name),
            }
        }

        for mapping in mappings.iter().filter(|m| m.has_foreign_keys()) {
            let value = self.substitute_foreign_keys(mapping, &mapping.value, &derived);
            let name = self.substitute_foreign_keys(mapping, &mapping.name, &derived);
            match self.resolve_templates(mapping, &parse_template(&value)) {
                Some(value) => derived.push(DerivedProperty {
                    name,
                    value,
                    filename: mapping.filename.clone(),
                }),
                None => debug!("dependent mapping dropped (name={name})"),
            }
        }
        derived
    }

    /// Replace template-name references; `None` when any is missing.
    fn resolve_templates(&self, mapping: &ConfigMapping, segments: &[Segment]) -> Option<String> {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::TemplateName(idx) => {
                    let name = mapping.template_name.get(*idx)?;
                    out.push_str(&self.global(name)?.value);
                }
                Segment::ForeignKey(_) if mapping.has_foreign_keys() => {
                    out.push_str(&render(std::slice::from_ref(segment)));
                }
                Segment::ForeignKey(_) => return None,
            }
        }
        Some(out)
    }

    /// Replace foreign-key references from derived properties, then globals.
    /// Unresolved references are left in place.
    fn substitute_foreign_keys(
        &self,
        mapping: &ConfigMapping,
        template: &str,
        derived: &[DerivedProperty],
    ) -> String {
        let keys = mapping.foreign_key.as_deref().unwrap_or_default();
        let segments = parse_template(template)
            .into_iter()
            .map(|segment| match segment {
                Segment::ForeignKey(idx) => keys
                    .get(idx)
                    .and_then(|key| self.foreign_value(key, derived))
                    .map(Segment::Literal)
                    .unwrap_or(Segment::ForeignKey(idx)),
                other => other,
            })
            .collect::<Vec<_>>();
        render(&segments)
    }

    fn foreign_value(&self, key: &str, derived: &[DerivedProperty]) -> Option<String> {
        if let Some(property) = derived.iter().find(|property| property.name == key) {
            return Some(property.value.clone());
        }
        self.global(key).map(|global| {
            if global.value.is_empty() {
                global.default_value.clone()
            } else {
                global.value.clone()
            }
        })
    }

    fn global(&self, name: &str) -> Option<&GlobalValue> {
        self.globals.iter().find(|global| global.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_typed_segments() {
        assert_eq!(
            parse_template("hdfs://<templateName[0]>:<foreignKey[1]>/<other>"),
            vec![
                Segment::Literal("hdfs://".to_string()),
                Segment::TemplateName(0),
                Segment::Literal(":".to_string()),
                Segment::ForeignKey(1),
                Segment::Literal("/<other>".to_string()),
            ]
        );
    }

    #[test]
    fn unclosed_reference_is_literal() {
        assert_eq!(
            parse_template("a<templateName[0]"),
            vec![Segment::Literal("a<templateName[0]".to_string())]
        );
        assert_eq!(
            parse_template("<templateName[x]>"),
            vec![Segment::Literal("<templateName[x]>".to_string())]
        );
    }

    #[test]
    fn literal_value_passes_through() {
        let resolver = TemplateResolver::new(&[]);
        let derived = resolver.resolve(&[ConfigMapping::new("dfs.permissions", "true", "hdfs-site.xml")]);
        assert_eq!(derived[0].value, "true");
    }
}
