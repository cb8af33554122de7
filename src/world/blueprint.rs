//! Actor templates and the catalog they are looked up from

use std::collections::BTreeMap;

use super::error::WorldError;

/// A single named attribute on a blueprint
#[derive(Debug, Clone, PartialEq)]
pub struct ActorAttribute {
    pub value: String,
    pub recommended_values: Vec<String>,
    pub modifiable: bool,
}

impl ActorAttribute {
    /// A fixed attribute the client cannot change
    pub fn fixed(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            recommended_values: Vec::new(),
            modifiable: false,
        }
    }

    /// A settable attribute, starting at the first recommended value
    pub fn choice(recommended: &[&str]) -> Self {
        Self {
            value: recommended.first().map(|v| v.to_string()).unwrap_or_default(),
            recommended_values: recommended.iter().map(|v| v.to_string()).collect(),
            modifiable: true,
        }
    }

    /// A settable attribute without recommended values
    pub fn free(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            recommended_values: Vec::new(),
            modifiable: true,
        }
    }
}

/// Template an actor is instantiated from
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub id: String,
    attributes: BTreeMap<String, ActorAttribute>,
}

impl Blueprint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, attribute: ActorAttribute) -> Self {
        self.attributes.insert(key.to_string(), attribute);
        self
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attribute(&self, key: &str) -> Option<&ActorAttribute> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) -> Result<(), WorldError> {
        let attribute = self
            .attributes
            .get_mut(key)
            .ok_or_else(|| WorldError::UnknownAttribute {
                blueprint: self.id.clone(),
                attribute: key.to_string(),
            })?;

        if !attribute.modifiable {
            return Err(WorldError::ReadOnlyAttribute {
                blueprint: self.id.clone(),
                attribute: key.to_string(),
            });
        }

        attribute.value = value.into();
        Ok(())
    }

    /// Wheel count for vehicle templates
    pub fn number_of_wheels(&self) -> Option<u32> {
        self.attribute("number_of_wheels")
            .and_then(|attribute| attribute.value.parse().ok())
    }

    /// Current attribute values, as copied onto a spawned actor
    pub fn attribute_values(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .map(|(key, attribute)| (key.clone(), attribute.value.clone()))
            .collect()
    }
}

/// Catalog of every template the world can instantiate
#[derive(Debug, Clone, Default)]
pub struct BlueprintLibrary {
    blueprints: Vec<Blueprint>,
}

impl BlueprintLibrary {
    pub fn new(blueprints: Vec<Blueprint>) -> Self {
        Self { blueprints }
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    /// All templates whose id matches a `*` wildcard pattern
    pub fn filter(&self, pattern: &str) -> Vec<Blueprint> {
        self.blueprints
            .iter()
            .filter(|bp| wildcard_match(pattern, &bp.id))
            .cloned()
            .collect()
    }

    /// Exact lookup by id
    pub fn find(&self, id: &str) -> Result<Blueprint, WorldError> {
        self.blueprints
            .iter()
            .find(|bp| bp.id == id)
            .cloned()
            .ok_or_else(|| WorldError::UnknownBlueprint(id.to_string()))
    }
}

/// Shell-style matching where `*` spans any run of characters
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star_p, star_t)) = star {
            // Let the last star swallow one more character
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
