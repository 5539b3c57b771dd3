//! Schema validation for a [`Graph`] (§4.10 "`validate(schema)` checks
//! required sections/keys with typed coercion").

// Layer 1: Standard library imports
// (none)

// Layer 3: Internal module imports
use super::error::ConfigError;
use super::graph::Graph;

/// The declared type of one property, used only to pick which
/// coercion to run during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Str,
    Bool,
    Int,
    List,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub required: bool,
    pub kind: PropertyType,
}

impl Property {
    pub fn required(key: impl Into<String>, kind: PropertyType) -> Self {
        Self { key: key.into(), required: true, kind }
    }

    pub fn optional(key: impl Into<String>, kind: PropertyType) -> Self {
        Self { key: key.into(), required: false, kind }
    }
}

#[derive(Debug, Clone)]
pub struct SectionSchema {
    pub name: String,
    pub required: bool,
    pub properties: Vec<Property>,
}

impl SectionSchema {
    pub fn required(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self { name: name.into(), required: true, properties }
    }

    pub fn optional(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self { name: name.into(), required: false, properties }
    }
}

/// A set of section schemas. Unknown sections and unknown keys within
/// a known section never fail validation (§4.10).
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub sections: Vec<SectionSchema>,
}

impl Schema {
    pub fn new(sections: Vec<SectionSchema>) -> Self {
        Self { sections }
    }

    pub fn validate(&self, graph: &Graph) -> Result<(), ConfigError> {
        for section in &self.sections {
            let present = graph.section(&section.name);
            if present.is_none() {
                if section.required {
                    return Err(ConfigError::MissingSection { section: section.name.clone() });
                }
                continue;
            }
            for property in &section.properties {
                let value = graph.get(&section.name, &property.key);
                if value.is_none() {
                    if property.required {
                        return Err(ConfigError::MissingKey {
                            section: section.name.clone(),
                            key: property.key.clone(),
                        });
                    }
                    continue;
                }
                match property.kind {
                    PropertyType::Bool => {
                        graph.get_bool(&section.name, &property.key)?;
                    }
                    PropertyType::Int => {
                        graph.get_int(&section.name, &property.key)?;
                    }
                    PropertyType::Str | PropertyType::List => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![SectionSchema::required(
            "main",
            vec![
                Property::required("name", PropertyType::Str),
                Property::optional("enabled", PropertyType::Bool),
            ],
        )])
    }

    #[test]
    fn accepts_well_formed_graph() {
        let mut g = Graph::new();
        g.set("main", "name", "demo");
        g.set("main", "enabled", "true");
        assert!(schema().validate(&g).is_ok());
    }

    #[test]
    fn rejects_missing_required_section() {
        let g = Graph::new();
        assert!(matches!(schema().validate(&g), Err(ConfigError::MissingSection { .. })));
    }

    #[test]
    fn rejects_missing_required_key() {
        let mut g = Graph::new();
        g.set("main", "enabled", "true");
        assert!(matches!(schema().validate(&g), Err(ConfigError::MissingKey { .. })));
    }

    #[test]
    fn ignores_unknown_sections_and_keys() {
        let mut g = Graph::new();
        g.set("main", "name", "demo");
        g.set("extra", "whatever", "1");
        assert!(schema().validate(&g).is_ok());
    }
}
