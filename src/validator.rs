use std::collections::{BTreeMap, BTreeSet};

use log::{trace, warn};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::address::{Address, DeviceNumber};
use crate::error::{ErrorKind, ValidationErrors};
use crate::hw_config::HwConfig;
use crate::raw::{key_text, Node};
use crate::schema::{self, Category, FieldKind, FieldSpec, HARDWARE_FIELDS, HARDWARE_KEY};

const MASK_WIDTHS: [usize; 2] = [8, 32];

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Reads a boolean the way machine configs write them.
fn boolean(node: &Node) -> Option<bool> {
    match node {
        Node::Scalar(Value::Bool(b)) => Some(*b),
        Node::Scalar(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Some(true),
            "false" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn invalid(expected: &str, node: &Node) -> ErrorKind {
    ErrorKind::InvalidValue {
        expected: expected.to_owned(),
        found: node.describe(),
    }
}

/// Record names per category, gathered before any record is checked so that
/// references can be resolved regardless of document order.
type Names = BTreeMap<Category, BTreeSet<String>>;

struct Validator {
    strict: bool,
    errors: ValidationErrors,
}

impl Validator {
    /// Checks one field value and returns it normalised for deserialisation.
    fn check_value(&mut self, path: &str, kind: FieldKind, node: &Node, names: &Names) -> Option<Value> {
        let result = match kind {
            FieldKind::Number(address_kind) => {
                let number = match node {
                    Node::Scalar(Value::Number(n)) => n.as_u64().map(DeviceNumber::Integer),
                    Node::Scalar(Value::String(s)) => Some(DeviceNumber::Text(s.clone())),
                    _ => None,
                };
                match number {
                    Some(number) if Address::parse(address_kind, &number).is_some() => Ok(()),
                    Some(number) => Err(ErrorKind::MalformedNumber(number.to_string())),
                    None => Err(ErrorKind::MalformedNumber(node.describe())),
                }
            }
            FieldKind::Integer { min, max } => match node {
                Node::Scalar(Value::Number(n)) => match n.as_i64() {
                    Some(v) if v >= min && v <= max => Ok(()),
                    Some(v) => Err(ErrorKind::OutOfRange {
                        value: v as f64,
                        min: min as f64,
                        max: max as f64,
                    }),
                    None => Err(invalid("an integer", node)),
                },
                _ => Err(invalid("an integer", node)),
            },
            FieldKind::Fraction => match node {
                Node::Scalar(Value::Number(n)) => match n.as_f64() {
                    Some(v) if (0.0..=1.0).contains(&v) => Ok(()),
                    Some(v) => Err(ErrorKind::OutOfRange {
                        value: v,
                        min: 0.0,
                        max: 1.0,
                    }),
                    None => Err(invalid("a number between 0 and 1", node)),
                },
                _ => Err(invalid("a number between 0 and 1", node)),
            },
            FieldKind::Boolean => match boolean(node) {
                Some(b) => return Some(Value::Bool(b)),
                None => Err(invalid("a boolean", node)),
            },
            FieldKind::Text => match node {
                Node::Scalar(Value::String(_)) => Ok(()),
                _ => Err(invalid("text", node)),
            },
            FieldKind::Choice(allowed) => match node.as_str() {
                Some(s) if allowed.contains(&s) => Ok(()),
                Some(s) => Err(ErrorKind::InvalidChoice {
                    value: s.to_owned(),
                    allowed: allowed.to_vec(),
                }),
                None => Err(ErrorKind::InvalidChoice {
                    value: node.describe(),
                    allowed: allowed.to_vec(),
                }),
            },
            FieldKind::Bitmask => match node.as_str() {
                Some(s) if MASK_WIDTHS.contains(&s.len()) && s.chars().all(|c| c == '0' || c == '1') => Ok(()),
                Some(s) => Err(ErrorKind::MalformedMask(s.to_owned())),
                None => Err(ErrorKind::MalformedMask(node.describe())),
            },
            FieldKind::Color => {
                // An all-digit color such as 112233 arrives as a number.
                let text = match node {
                    Node::Scalar(Value::String(s)) => Some(s.clone()),
                    Node::Scalar(Value::Number(n)) if n.is_u64() => Some(n.to_string()),
                    _ => None,
                };
                match text {
                    Some(s) if s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()) => {
                        return Some(Value::String(s))
                    }
                    _ => Err(invalid("six hex digits", node)),
                }
            }
            FieldKind::Reference(target) => match node.as_str() {
                Some(name) if names.get(&target).map_or(false, |n| n.contains(name)) => Ok(()),
                Some(name) => Err(ErrorKind::UndefinedReference {
                    category: target,
                    name: name.to_owned(),
                }),
                None => Err(invalid("a name", node)),
            },
            FieldKind::EventList => match node {
                Node::Scalar(Value::String(_)) => Ok(()),
                Node::Sequence(items) if items.iter().all(|i| i.as_str().is_some()) => Ok(()),
                _ => Err(invalid("an event name or list of event names", node)),
            },
        };

        match result {
            Ok(()) => Some(node.clone().into_value()),
            Err(kind) => {
                self.errors.push(path, kind);
                None
            }
        }
    }

    /// Checks every field of one record against its schema.
    fn check_fields(
        &mut self,
        path: &str,
        fields: &'static [FieldSpec],
        node: &Node,
        names: &Names,
    ) -> Option<Mapping> {
        let entries: &[(Value, Node)] = match node {
            Node::Mapping(entries) => entries,
            Node::Scalar(Value::Null) => &[],
            other => {
                self.errors.push(path, invalid("a mapping of settings", other));
                return None;
            }
        };

        let before = self.errors.len();
        let mut seen = BTreeSet::new();
        let mut mapping = Mapping::new();
        for (key, value) in entries {
            let key = key_text(key);
            let field_path = join(path, &key);
            if !seen.insert(key.clone()) {
                self.errors.push(field_path, ErrorKind::DuplicateName);
                continue;
            }

            match schema::field(fields, &key) {
                Some(spec) => {
                    if let Some(value) = self.check_value(&field_path, spec.kind, value, names) {
                        mapping.insert(Value::String(key), value);
                    }
                }
                None => self.errors.push(field_path, ErrorKind::UnknownField),
            }
        }

        for spec in fields.iter().filter(|f| f.required) {
            if !seen.contains(spec.name) {
                self.errors.push(join(path, spec.name), ErrorKind::MissingField);
            }
        }

        if self.errors.len() == before {
            Some(mapping)
        } else {
            None
        }
    }

    /// Rules that span more than one field of a record.
    fn check_record(&mut self, category: Category, path: &str, record: &Mapping) {
        let float = |key: &str| record.get(key).and_then(Value::as_f64);
        let text = |key: &str| record.get(key).and_then(Value::as_str);

        match category {
            Category::Coils => {
                if let (Some(pulse), Some(hold)) = (text("pulse_pwm_mask"), text("hold_pwm_mask")) {
                    if pulse.len() != hold.len() {
                        self.errors.push(
                            join(path, "hold_pwm_mask"),
                            ErrorKind::MaskWidthMismatch {
                                pulse: pulse.len(),
                                hold: hold.len(),
                            },
                        );
                    }
                }
            }
            Category::Servos => {
                let min = float("servo_min").unwrap_or(0.1);
                let max = float("servo_max").unwrap_or(0.9);
                let reset = float("reset_position").unwrap_or(0.5);
                if min > max {
                    self.errors.push(
                        join(path, "servo_min"),
                        ErrorKind::OutOfRange {
                            value: min,
                            min: 0.0,
                            max,
                        },
                    );
                } else if reset < min || reset > max {
                    self.errors.push(
                        join(path, "reset_position"),
                        ErrorKind::OutOfRange {
                            value: reset,
                            min,
                            max,
                        },
                    );
                }
            }
            Category::Flippers => {
                let use_eos = record.get("use_eos").and_then(Value::as_bool).unwrap_or(false);
                if use_eos && record.get("eos_switch").is_none() {
                    self.errors.push(join(path, "eos_switch"), ErrorKind::MissingField);
                }
            }
            _ => {}
        }
    }

    fn typed<T: DeserializeOwned>(&mut self, path: &str, value: Value) -> Option<T> {
        match serde_yaml::from_value(value) {
            Ok(t) => Some(t),
            Err(e) => {
                self.errors.push(
                    path,
                    ErrorKind::InvalidValue {
                        expected: "a valid record".to_owned(),
                        found: e.to_string(),
                    },
                );
                None
            }
        }
    }

    fn insert(&mut self, config: &mut HwConfig, category: Category, name: String, record: Mapping) {
        let path = join(category.key(), &name);
        let value = Value::Mapping(record);
        match category {
            Category::Switches => {
                if let Some(r) = self.typed(&path, value) {
                    config.switches.insert(name, r);
                }
            }
            Category::Coils => {
                if let Some(r) = self.typed(&path, value) {
                    config.coils.insert(name, r);
                }
            }
            Category::AutofireCoils => {
                if let Some(r) = self.typed(&path, value) {
                    config.autofire_coils.insert(name, r);
                }
            }
            Category::Servos => {
                if let Some(r) = self.typed(&path, value) {
                    config.servos.insert(name, r);
                }
            }
            Category::Flippers => {
                if let Some(r) = self.typed(&path, value) {
                    config.flippers.insert(name, r);
                }
            }
            Category::MatrixLights => {
                if let Some(r) = self.typed(&path, value) {
                    config.matrix_lights.insert(name, r);
                }
            }
            Category::Gis => {
                if let Some(r) = self.typed(&path, value) {
                    config.gis.insert(name, r);
                }
            }
            Category::Leds => {
                if let Some(r) = self.typed(&path, value) {
                    config.leds.insert(name, r);
                }
            }
        }
    }

    /// Top-level keys: reports duplicates and unknown keys, returns the
    /// sections to check.
    fn sections<'a>(&mut self, root: &'a [(Value, Node)]) -> (Option<&'a Node>, Vec<(Category, &'a Node)>) {
        let mut seen = BTreeSet::new();
        let mut hardware = None;
        let mut categories = Vec::new();

        for (key, node) in root {
            let key = key_text(key);
            if !seen.insert(key.clone()) {
                self.errors.push(key, ErrorKind::DuplicateName);
                continue;
            }

            if key == HARDWARE_KEY {
                hardware = Some(node);
            } else if let Some(category) = Category::from_key(&key) {
                categories.push((category, node));
            } else if self.strict {
                self.errors.push(key, ErrorKind::UnknownCategory);
            } else {
                warn!("Ignoring unknown config section '{}'.", key);
            }
        }

        (hardware, categories)
    }

    fn records<'a>(&mut self, category: Category, node: &'a Node) -> Vec<(String, &'a Node)> {
        match node {
            Node::Scalar(Value::Null) => Vec::new(),
            Node::Mapping(entries) => {
                let mut seen = BTreeSet::new();
                let mut records = Vec::new();
                for (key, record) in entries {
                    let name = key_text(key);
                    if seen.insert(name.clone()) {
                        records.push((name, record));
                    } else {
                        self.errors.push(join(category.key(), &name), ErrorKind::DuplicateName);
                    }
                }
                records
            }
            other => {
                self.errors
                    .push(category.key(), invalid("a mapping of names to records", other));
                Vec::new()
            }
        }
    }
}

/// Validates a parsed document against the schema. Every problem found is
/// reported, not just the first.
pub fn validate(root: &Node, strict: bool) -> Result<HwConfig, ValidationErrors> {
    let mut validator = Validator {
        strict,
        errors: ValidationErrors::default(),
    };
    let mut config = HwConfig::default();

    let entries: &[(Value, Node)] = match root {
        Node::Scalar(Value::Null) => &[],
        Node::Mapping(entries) => entries,
        other => {
            validator.errors.push("", invalid("a mapping of config sections", other));
            return Err(validator.errors);
        }
    };

    let (hardware, categories) = validator.sections(entries);

    let mut sections = Vec::new();
    let mut names = Names::new();
    for (category, node) in categories {
        let records = validator.records(category, node);
        names.insert(
            category,
            records.iter().map(|(name, _)| name.clone()).collect(),
        );
        sections.push((category, records));
    }

    if let Some(node) = hardware {
        if let Some(mapping) = validator.check_fields(HARDWARE_KEY, HARDWARE_FIELDS, node, &names) {
            config.hardware = validator.typed(HARDWARE_KEY, Value::Mapping(mapping));
        }
    }

    for (category, records) in sections {
        for (name, node) in records {
            let path = join(category.key(), &name);
            if let Some(record) = validator.check_fields(&path, category.fields(), node, &names) {
                validator.check_record(category, &path, &record);
                trace!("Validated {} '{}'.", category, name);
                validator.insert(&mut config, category, name, record);
            }
        }
    }

    if validator.errors.is_empty() {
        Ok(config)
    } else {
        Err(validator.errors)
    }
}
