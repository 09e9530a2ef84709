//! Link-type classification from reference paths.

use tracing::error;

use crate::error::Result;
use crate::path::{JsonPath, PathPattern};

/// Known reference locations, evaluated top to bottom.
pub const DEFAULT_LINK_TYPE_RULES: &[(&str, &str)] = &[
    ("$['mixture']['components'][*]['substance']", "Component"),
    ("$['mixture']['parentSubstance']", "Mixture"),
    (
        "$['modifications']['agentModifications'][*]['agentSubstance']",
        "AgentModification",
    ),
    (
        "$['modifications']['structuralModifications'][*]['molecularFragment']",
        "StructuralModification",
    ),
    (
        "$['polymer']['classification']['parentSubstance']",
        "PolymerClassification",
    ),
    ("$['polymer']['monomers'][*]['monomerSubstance']", "Monomer"),
    ("$['relationships'][*]['mediatorSubstance']", "Relationship"),
    ("$['relationships'][*]['relatedSubstance']", "Relationship"),
    (
        "$['structurallyDiverse']['hybridSpeciesMaternalOrganism']",
        "StructurallyDiverse",
    ),
    (
        "$['structurallyDiverse']['hybridSpeciesPaternalOrganism']",
        "StructurallyDiverse",
    ),
    ("$['structurallyDiverse']['parentSubstance']", "StructurallyDiverse"),
];

/// Category used when a path has no leading field name to fall back on.
pub const UNNAMED_LINK_TYPE: &str = "Reference";

#[derive(Debug, Clone)]
pub struct LinkClassifier {
    rules: Vec<(PathPattern, String)>,
}

impl LinkClassifier {
    pub fn new<'a>(rules: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|(pattern, category)| Ok((PathPattern::parse(pattern)?, category.to_string())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// A classifier with no rules; every path takes the fallback.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn classify(&self, path: &JsonPath) -> String {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, category)| category.clone())
            .unwrap_or_else(|| fallback_link_type(path))
    }
}

impl Default for LinkClassifier {
    /// The built-in table. Every built-in pattern parses; if one ever stops
    /// parsing, the failure is logged and no rule is kept rather than a
    /// partial table.
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TYPE_RULES.iter().copied()).unwrap_or_else(|err| {
            error!(error = %err, "built-in link type rules failed to parse");
            Self::empty()
        })
    }
}

/// `transformations[0].productSubstance` -> `Transformation`.
fn fallback_link_type(path: &JsonPath) -> String {
    let Some(first) = path.first_key().filter(|k| !k.is_empty()) else {
        return UNNAMED_LINK_TYPE.to_string();
    };
    let capitalized = capitalize_first(first);
    match capitalized.strip_suffix('s') {
        Some(singular) if !singular.is_empty() => singular.to_string(),
        _ => capitalized,
    }
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
