//! Template variable schema and its normalizer
//!
//! Copier templates describe their questions in a handful of YAML shapes:
//! a dedicated `_variables:` / `variables:` section, or question mappings
//! directly at the root next to `_`-prefixed directives. All of them are
//! normalized into a [`VariableSchema`].

use super::value::DocValue;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Dedicated section keys, in priority order
const VARIABLE_SECTIONS: &[&str] = &["_variables", "variables"];

/// Keys that mark a root-level mapping as a question definition
const DESCRIPTOR_KEYS: &[&str] = &["type", "help", "default", "choices"];

/// Prefix of copier directives (`_subdirectory`, `_tasks`, ...)
const DIRECTIVE_PREFIX: char = '_';

/// Value kind of a template variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VariableKind {
    #[default]
    String,
    Bool,
    Number,
    List,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::String => "string",
            VariableKind::Bool => "bool",
            VariableKind::Number => "number",
            VariableKind::List => "list",
        }
    }

    /// Map a declared `type:` to a kind; unknown names fall back to string
    pub fn from_declared(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => VariableKind::Bool,
            "int" | "integer" | "float" | "number" => VariableKind::Number,
            "list" | "array" | "sequence" => VariableKind::List,
            _ => VariableKind::String,
        }
    }

    /// Infer a kind from the runtime shape of a default value
    pub fn infer(value: Option<&DocValue>) -> Self {
        match value {
            Some(DocValue::Bool(_)) => VariableKind::Bool,
            Some(DocValue::Number(_)) => VariableKind::Number,
            Some(DocValue::Sequence(_)) => VariableKind::List,
            Some(DocValue::String(_)) | Some(DocValue::Mapping(_)) | Some(DocValue::Null) | None => {
                VariableKind::String
            }
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question from a template schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub kind: VariableKind,
    /// Stringified default, empty when absent
    pub default_value: String,
    pub help: String,
    /// Allowed values; empty means free-form
    pub choices: Vec<String>,
}

impl TemplateVariable {
    /// Parse one entry. Mappings are full definitions, anything else is a bare default.
    pub fn parse(name: &str, definition: &DocValue) -> Self {
        match definition {
            DocValue::Mapping(_) => {
                let default = definition.get("default").filter(|v| !v.is_null());
                let kind = match definition.get("type").and_then(DocValue::as_str) {
                    Some(declared) => VariableKind::from_declared(declared),
                    None => VariableKind::infer(default),
                };
                Self {
                    name: name.to_string(),
                    kind,
                    default_value: default.map(ToString::to_string).unwrap_or_default(),
                    help: definition
                        .get("help")
                        .and_then(DocValue::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    choices: definition
                        .get("choices")
                        .and_then(DocValue::as_sequence)
                        .map(|items| items.iter().map(ToString::to_string).collect())
                        .unwrap_or_default(),
                }
            }
            scalar => Self {
                name: name.to_string(),
                kind: VariableKind::infer(Some(scalar)),
                default_value: scalar.to_string(),
                help: String::new(),
                choices: Vec::new(),
            },
        }
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }
}

/// Variables of one template, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableSchema {
    variables: HashMap<String, TemplateVariable>,
}

impl VariableSchema {
    /// Normalize a loaded schema document
    ///
    /// A dedicated section, when present, is the only source of variables;
    /// root-level scanning is skipped entirely in that case.
    pub fn from_document(document: &DocValue) -> Self {
        let mut variables = HashMap::new();

        let section = VARIABLE_SECTIONS
            .iter()
            .find_map(|key| document.get(key).and_then(DocValue::as_mapping));

        match section {
            Some(entries) => {
                for (name, definition) in entries {
                    variables.insert(name.clone(), TemplateVariable::parse(name, definition));
                }
            }
            None => {
                for (name, definition) in document.as_mapping().unwrap_or_default() {
                    if is_root_question(name, definition) {
                        variables.insert(name.clone(), TemplateVariable::parse(name, definition));
                    }
                }
            }
        }

        Self { variables }
    }

    /// Parse YAML text; `origin` names the source in errors
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| Error::SchemaParse {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;

        let document = DocValue::from(value);
        match &document {
            // An empty file has no questions.
            DocValue::Null => Ok(Self::default()),
            DocValue::Mapping(_) => Ok(Self::from_document(&document)),
            other => Err(Error::SchemaParse {
                origin: origin.to_string(),
                reason: format!("expected a mapping at the top level, found `{}`", other),
            }),
        }
    }

    /// Read and normalize a schema file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema = Self::from_yaml(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            count = schema.len(),
            "parsed template variables"
        );
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// No variables means the template needs no configuration
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables ordered by name, for display
    pub fn sorted(&self) -> Vec<&TemplateVariable> {
        let mut vars: Vec<_> = self.variables.values().collect();
        vars.sort_by(|a, b| a.name.cmp(&b.name));
        vars
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateVariable> {
        self.variables.values()
    }
}

fn is_root_question(name: &str, definition: &DocValue) -> bool {
    !name.starts_with(DIRECTIVE_PREFIX)
        && DESCRIPTOR_KEYS.iter().any(|key| definition.get(key).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> VariableSchema {
        VariableSchema::from_yaml(yaml, "copier.yaml").unwrap()
    }

    #[test]
    fn test_root_level_questions() {
        let schema = parse(
            r#"
sport:
  type: str
  help: What sport you want to generate?
version:
  type: str
  help: Version of the template
  default: 0.0.7
_subdirectory: template
"#,
        );

        assert_eq!(schema.len(), 2);

        let sport = schema.get("sport").unwrap();
        assert_eq!(sport.kind, VariableKind::String);
        assert_eq!(sport.default_value, "");
        assert_eq!(sport.help, "What sport you want to generate?");
        assert!(sport.choices.is_empty());

        let version = schema.get("version").unwrap();
        assert_eq!(version.default_value, "0.0.7");
        assert_eq!(version.help, "Version of the template");

        assert!(schema.get("_subdirectory").is_none());
    }

    #[test]
    fn test_directive_mappings_are_not_questions() {
        let schema = parse(
            r#"
_envops:
  default: x
  help: looks like a question but is a directive
name:
  default: demo
"#,
        );
        assert_eq!(schema.len(), 1);
        assert!(schema.get("_envops").is_none());
    }

    #[test]
    fn test_root_mapping_without_descriptor_keys_is_skipped() {
        let schema = parse(
            r#"
project_name:
  default: demo
tooling:
  linter: ruff
  formatter: black
plain_scalar: hello
"#,
        );
        assert_eq!(schema.len(), 1);
        assert!(schema.get("tooling").is_none());
        assert!(schema.get("plain_scalar").is_none());
    }

    #[test]
    fn test_private_section_wins_over_public_section() {
        let schema = parse(
            r#"
_variables:
  a:
    default: 1
variables:
  b:
    default: 2
"#,
        );
        assert_eq!(schema.len(), 1);
        assert!(schema.get("a").is_some());
        assert!(schema.get("b").is_none());
    }

    #[test]
    fn test_public_section_used_when_private_absent() {
        let schema = parse(
            r#"
variables:
  b:
    default: 2
"#,
        );
        assert_eq!(schema.get("b").unwrap().kind, VariableKind::Number);
    }

    #[test]
    fn test_dedicated_section_disables_root_scanning() {
        let schema = parse(
            r#"
variables:
  inside: x
outside:
  type: str
  help: would be a root question without the section
"#,
        );
        assert_eq!(schema.len(), 1);
        assert!(schema.get("outside").is_none());

        let inside = schema.get("inside").unwrap();
        assert_eq!(inside.default_value, "x");
        assert_eq!(inside.kind, VariableKind::String);
        assert!(inside.help.is_empty());
    }

    #[test]
    fn test_kind_inferred_from_default() {
        let schema = parse(
            r#"
_variables:
  use_docker:
    default: true
  port:
    default: 8080
  ratio:
    default: 0.5
  features:
    default: [api, cli]
  author:
    default: Jane
  nothing:
    help: no default at all
"#,
        );
        assert_eq!(schema.get("use_docker").unwrap().kind, VariableKind::Bool);
        assert_eq!(schema.get("use_docker").unwrap().default_value, "true");
        assert_eq!(schema.get("port").unwrap().kind, VariableKind::Number);
        assert_eq!(schema.get("ratio").unwrap().kind, VariableKind::Number);
        assert_eq!(schema.get("features").unwrap().kind, VariableKind::List);
        assert_eq!(schema.get("features").unwrap().default_value, "[api, cli]");
        assert_eq!(schema.get("author").unwrap().kind, VariableKind::String);
        assert_eq!(schema.get("nothing").unwrap().kind, VariableKind::String);
        assert_eq!(schema.get("nothing").unwrap().default_value, "");
    }

    #[test]
    fn test_scalar_entries_in_section_are_defaults() {
        let schema = parse(
            r#"
_variables:
  debug: false
  workers: 4
  tags: [a, b]
"#,
        );
        let debug = schema.get("debug").unwrap();
        assert_eq!(debug.kind, VariableKind::Bool);
        assert_eq!(debug.default_value, "false");
        assert_eq!(schema.get("workers").unwrap().kind, VariableKind::Number);
        assert_eq!(schema.get("tags").unwrap().kind, VariableKind::List);
    }

    #[test]
    fn test_declared_type_takes_precedence() {
        let schema = parse(
            r#"
port:
  type: str
  default: 8080
"#,
        );
        let port = schema.get("port").unwrap();
        assert_eq!(port.kind, VariableKind::String);
        assert_eq!(port.default_value, "8080");
    }

    #[test]
    fn test_non_string_type_falls_back_to_inference() {
        let schema = parse(
            r#"
flag:
  type: ~
  default: true
"#,
        );
        assert_eq!(schema.get("flag").unwrap().kind, VariableKind::Bool);
    }

    #[test]
    fn test_choices_are_stringified() {
        let schema = parse(
            r#"
python_version:
  type: str
  choices: ["3.11", 3.12, 3]
  default: "3.11"
"#,
        );
        let var = schema.get("python_version").unwrap();
        assert!(var.has_choices());
        assert_eq!(var.choices, vec!["3.11", "3.12", "3"]);
    }

    #[test]
    fn test_number_round_trip() {
        let schema = parse("count:\n  type: number\n  default: 3\n");
        let count = schema.get("count").unwrap();
        assert_eq!(count.kind, VariableKind::Number);
        assert_eq!(count.kind.as_str(), "number");
        assert_eq!(count.default_value, "3");
        assert!(count.choices.is_empty());
    }

    #[test]
    fn test_empty_document_has_no_variables() {
        assert!(parse("").is_empty());
        assert!(parse("_subdirectory: template\n").is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_schema_parse_error() {
        let err = VariableSchema::from_yaml("a: [unclosed\n  b: {", "copier.yml").unwrap_err();
        match err {
            Error::SchemaParse { origin, .. } => assert_eq!(origin, "copier.yml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_mapping_document_is_schema_parse_error() {
        let err = VariableSchema::from_yaml("- a\n- b\n", "copier.yml").unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }));
    }

    #[test]
    fn test_sorted_orders_by_name() {
        let schema = parse("_variables:\n  zeta: 1\n  alpha: 2\n  mid: 3\n");
        let names: Vec<&str> = schema.sorted().into_iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_declared_type_names() {
        assert_eq!(VariableKind::from_declared("int"), VariableKind::Number);
        assert_eq!(VariableKind::from_declared("float"), VariableKind::Number);
        assert_eq!(VariableKind::from_declared("bool"), VariableKind::Bool);
        assert_eq!(VariableKind::from_declared("yaml"), VariableKind::String);
        assert_eq!(VariableKind::from_declared("path"), VariableKind::String);
    }
}
