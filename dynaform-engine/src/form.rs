//! Loading and definition-time validation of forms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dynaform_conditions::{ComparisonOp, Condition};
use dynaform_fields::{FieldDef, FieldType, FieldTypeRegistry, ValidatorRule};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::access::Access;
use crate::definition::FormDefinition;
use crate::error::{DefinitionError, Result};

/// A loaded, definition-validated form.
///
/// Construction through [`Form::load`] guarantees every invariant the
/// pipeline relies on: slugs are unique, every type tag has a handler
/// (resolved once and cached here), every condition reference points at a
/// real field with a compatible literal, and the presence dependency graph
/// is acyclic. A rejected definition never accepts submissions.
pub struct Form {
    definition: FormDefinition,
    /// Slug → position in `definition.fields`, in definition order.
    field_index: IndexMap<String, usize>,
    /// Slug → resolved type handler, cached at load.
    handlers: HashMap<String, Arc<dyn FieldType>>,
    /// Target slug → indices into `definition.rules`, in definition order.
    rules_by_field: HashMap<String, Vec<usize>>,
    /// (role, field) → explicit capability grant.
    access_rules: HashMap<(String, String), Access>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("definition", &self.definition)
            .field("field_index", &self.field_index)
            .field("rules_by_field", &self.rules_by_field)
            .field("access_rules", &self.access_rules)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Validate a definition against the registry and build the loaded form.
    pub fn load(definition: FormDefinition, registry: &FieldTypeRegistry) -> Result<Self> {
        tracing::debug!(form = %definition.id, fields = definition.fields.len(), "loading form definition");

        let mut field_index = IndexMap::new();
        let mut handlers: HashMap<String, Arc<dyn FieldType>> = HashMap::new();

        for (position, field) in definition.fields.iter().enumerate() {
            if field_index.insert(field.slug.clone(), position).is_some() {
                return Err(DefinitionError::DuplicateSlug {
                    slug: field.slug.clone(),
                });
            }
            let handler =
                registry
                    .get(&field.type_tag)
                    .map_err(|_| DefinitionError::UnknownFieldType {
                        field: field.slug.clone(),
                        tag: field.type_tag.clone(),
                    })?;
            check_field_rules(field, handler.as_ref())?;
            check_field_default(field, handler.as_ref())?;
            handlers.insert(field.slug.clone(), handler);
        }

        let mut rules_by_field: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, rule) in definition.rules.iter().enumerate() {
            if !field_index.contains_key(&rule.field) {
                return Err(DefinitionError::UnknownSlug {
                    slug: rule.field.clone(),
                    context: "presence rule target".into(),
                });
            }
            check_condition(&rule.field, &rule.when, &field_index, &handlers)?;
            rules_by_field
                .entry(rule.field.clone())
                .or_default()
                .push(position);
        }

        detect_presence_cycles(&definition, &field_index)?;

        let mut access_rules = HashMap::new();
        for rule in &definition.accesses {
            if !field_index.contains_key(&rule.field) {
                return Err(DefinitionError::UnknownSlug {
                    slug: rule.field.clone(),
                    context: format!("access rule for role '{}'", rule.role),
                });
            }
            let key = (rule.role.clone(), rule.field.clone());
            if access_rules.insert(key, Access::from_rule(rule)).is_some() {
                return Err(DefinitionError::DuplicateAccessRule {
                    role: rule.role.clone(),
                    field: rule.field.clone(),
                });
            }
        }

        for preset in &definition.presets {
            for slug in preset.referenced_fields() {
                if !field_index.contains_key(slug) {
                    return Err(DefinitionError::UnknownSlug {
                        slug: slug.into(),
                        context: format!("{} preset", preset.name()),
                    });
                }
            }
        }

        Ok(Self {
            definition,
            field_index,
            handlers,
            rules_by_field,
            access_rules,
        })
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    /// Fields in definition order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.definition.fields.iter()
    }

    pub fn field(&self, slug: &str) -> Option<&FieldDef> {
        self.field_index
            .get(slug)
            .map(|&position| &self.definition.fields[position])
    }

    /// The handler resolved for a field at load time.
    pub(crate) fn handler(&self, slug: &str) -> &Arc<dyn FieldType> {
        &self.handlers[slug]
    }

    /// Presence rules targeting a field, in definition order.
    pub(crate) fn rules_for(&self, slug: &str) -> impl Iterator<Item = &crate::PresenceRule> {
        self.rules_by_field
            .get(slug)
            .into_iter()
            .flatten()
            .map(|&position| &self.definition.rules[position])
    }

    pub(crate) fn explicit_access(&self, role: &str, slug: &str) -> Option<Access> {
        self.access_rules
            .get(&(role.to_string(), slug.to_string()))
            .copied()
    }
}

/// Reject validator rules the field's type cannot apply, and patterns that
/// do not compile.
fn check_field_rules(field: &FieldDef, handler: &dyn FieldType) -> Result<()> {
    for rule in &field.validations {
        if !handler.supports_rule(rule) {
            return Err(DefinitionError::IncompatibleRule {
                field: field.slug.clone(),
                tag: field.type_tag.clone(),
                rule: rule.name().into(),
            });
        }
        if let ValidatorRule::Regex { pattern } = rule {
            if let Err(err) = Regex::new(pattern) {
                return Err(DefinitionError::InvalidPattern {
                    field: field.slug.clone(),
                    pattern: pattern.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// A stored default that cannot coerce to its own type would poison every
/// submission that falls back to it.
fn check_field_default(field: &FieldDef, handler: &dyn FieldType) -> Result<()> {
    if let Some(default) = &field.default {
        handler
            .coerce(default, field)
            .map_err(|err| DefinitionError::InvalidDefault {
                field: field.slug.clone(),
                message: err.message,
            })?;
    }
    Ok(())
}

/// Check every comparison leaf of a condition: referenced fields must exist,
/// and literals must be comparable with the referenced field's type.
fn check_condition(
    target: &str,
    condition: &Condition,
    field_index: &IndexMap<String, usize>,
    handlers: &HashMap<String, Arc<dyn FieldType>>,
) -> Result<()> {
    let mut outcome = Ok(());
    condition.for_each_comparison(&mut |field, operator, literal| {
        if outcome.is_err() {
            return;
        }
        let Some(handler) = handlers.get(field) else {
            outcome = Err(DefinitionError::UnknownSlug {
                slug: field.into(),
                context: format!("presence rule condition for '{target}'"),
            });
            return;
        };
        debug_assert!(field_index.contains_key(field));
        if operator.takes_no_value() {
            return;
        }
        let compatible = match operator {
            ComparisonOp::InSet => match literal.as_array() {
                Some(set) => set.iter().all(|item| handler.literal_compatible(item)),
                None => false,
            },
            ComparisonOp::GreaterThan | ComparisonOp::LessThan => {
                handler.orderable() && handler.literal_compatible(literal)
            }
            _ => handler.literal_compatible(literal),
        };
        if !compatible {
            let detail = if operator.is_ordering() && !handler.orderable() {
                "field type does not support ordering comparisons".to_string()
            } else {
                format!("literal {literal} is incompatible with the field's type")
            };
            outcome = Err(DefinitionError::IncompatibleComparison {
                target: target.into(),
                field: field.into(),
                detail,
            });
        }
    });
    outcome
}

/// Build the presence dependency graph (target field → fields read by its
/// rule conditions) and reject any cycle, naming a path on it.
///
/// Presence is single-step (a field's presence depends on other fields'
/// *values*, never their computed presence), so an acyclic graph keeps
/// evaluation order irrelevant.
fn detect_presence_cycles(
    definition: &FormDefinition,
    field_index: &IndexMap<String, usize>,
) -> Result<()> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in &definition.rules {
        let deps = edges.entry(rule.field.as_str()).or_default();
        for slug in rule.when.referenced_fields() {
            if !deps.contains(&slug) {
                deps.push(slug);
            }
        }
    }

    let mut done: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    for slug in field_index.keys() {
        visit(slug, &edges, &mut done, &mut stack)?;
    }
    Ok(())
}

fn visit<'a>(
    node: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    done: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> Result<()> {
    if done.contains(node) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|&seen| seen == node) {
        let mut path: Vec<&str> = stack[start..].to_vec();
        path.push(node);
        return Err(DefinitionError::PresenceCycle {
            path: path.join(" -> "),
        });
    }
    stack.push(node);
    for &dep in edges.get(node).into_iter().flatten() {
        visit(dep, edges, done, stack)?;
    }
    stack.pop();
    done.insert(node);
    Ok(())
}

/// Values keyed by field slug, as delivered by the transport layer.
pub type ValueMap = HashMap<String, Value>;
