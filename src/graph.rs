use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::address::{Address, AddressKind};
use crate::error::{ConfigResult, ErrorExt};
use crate::hw_config::{AutofireCoil, Coil, Flipper, Gi, Hardware, HwConfig, Led, MatrixLight, Servo, Switch};
use crate::schema::{Category, FieldKind};

/// A record that refers to another record by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Referrer {
    pub category: Category,
    pub name: String,
    pub field: &'static str,
}

/// A record that reacts to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventBinding {
    pub category: Category,
    pub name: String,
    pub field: &'static str,
}

/// Records in one category that decode to the same hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub category: Category,
    pub names: Vec<String>,
}

pub struct FlipperParts<'a> {
    pub main_coil: &'a Coil,
    pub hold_coil: Option<&'a Coil>,
    pub activation_switch: &'a Switch,
    pub eos_switch: Option<&'a Switch>,
}

/// The validated, cross-referenced machine configuration. Every reference in
/// it resolves.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigGraph {
    version: u32,
    #[serde(flatten)]
    config: HwConfig,
    addresses: BTreeMap<Category, BTreeMap<String, Address>>,
}

fn address_kind(category: Category) -> Option<AddressKind> {
    category
        .fields()
        .iter()
        .find_map(|field| match field.kind {
            FieldKind::Number(kind) => Some(kind),
            _ => None,
        })
}

impl ConfigGraph {
    pub fn new(version: u32, config: HwConfig) -> ConfigGraph {
        let mut addresses = BTreeMap::new();
        for category in Category::ALL.iter().copied() {
            let kind = match address_kind(category) {
                Some(kind) => kind,
                None => continue,
            };

            let decoded: BTreeMap<String, Address> = config
                .numbers(category)
                .into_iter()
                .filter_map(|(name, number)| {
                    Address::parse(kind, number).map(|address| (name.to_owned(), address))
                })
                .collect();
            addresses.insert(category, decoded);
        }

        let graph = ConfigGraph {
            version,
            config,
            addresses,
        };

        for collision in graph.address_collisions() {
            warn!(
                "{} share a hardware address: {}",
                collision.category,
                collision.names.join(", ")
            );
        }

        graph
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn config(&self) -> &HwConfig {
        &self.config
    }

    pub fn hardware(&self) -> Option<&Hardware> {
        self.config.hardware.as_ref()
    }

    pub fn count(&self, category: Category) -> usize {
        self.config.count(category)
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        Category::ALL
            .iter()
            .map(|category| (*category, self.count(*category)))
            .collect()
    }

    pub fn switch(&self, name: &str) -> Option<&Switch> {
        self.config.switches.get(name)
    }

    pub fn coil(&self, name: &str) -> Option<&Coil> {
        self.config.coils.get(name)
    }

    pub fn autofire_coil(&self, name: &str) -> Option<&AutofireCoil> {
        self.config.autofire_coils.get(name)
    }

    pub fn servo(&self, name: &str) -> Option<&Servo> {
        self.config.servos.get(name)
    }

    pub fn flipper(&self, name: &str) -> Option<&Flipper> {
        self.config.flippers.get(name)
    }

    pub fn matrix_light(&self, name: &str) -> Option<&MatrixLight> {
        self.config.matrix_lights.get(name)
    }

    pub fn gi(&self, name: &str) -> Option<&Gi> {
        self.config.gis.get(name)
    }

    pub fn led(&self, name: &str) -> Option<&Led> {
        self.config.leds.get(name)
    }

    pub fn address(&self, category: Category, name: &str) -> Option<&Address> {
        self.addresses.get(&category).and_then(|a| a.get(name))
    }

    /// The coil and switch an autofire coil drives.
    pub fn autofire_parts(&self, name: &str) -> Option<(&Coil, &Switch)> {
        let autofire = self.autofire_coil(name)?;
        Some((self.coil(&autofire.coil)?, self.switch(&autofire.switch)?))
    }

    pub fn flipper_parts(&self, name: &str) -> Option<FlipperParts> {
        let flipper = self.flipper(name)?;
        Some(FlipperParts {
            main_coil: self.coil(&flipper.main_coil)?,
            hold_coil: flipper.hold_coil.as_deref().and_then(|n| self.coil(n)),
            activation_switch: self.switch(&flipper.activation_switch)?,
            eos_switch: flipper.eos_switch.as_deref().and_then(|n| self.switch(n)),
        })
    }

    /// Every autofire coil and flipper that uses the coil `name`.
    pub fn coil_referrers(&self, name: &str) -> Vec<Referrer> {
        let mut referrers = Vec::new();
        for (autofire_name, autofire) in &self.config.autofire_coils {
            if autofire.coil == name {
                referrers.push(Referrer {
                    category: Category::AutofireCoils,
                    name: autofire_name.clone(),
                    field: "coil",
                });
            }
        }
        for (flipper_name, flipper) in &self.config.flippers {
            let fields = [
                ("main_coil", Some(flipper.main_coil.as_str())),
                ("hold_coil", flipper.hold_coil.as_deref()),
            ];
            for (field, coil) in fields.iter() {
                if *coil == Some(name) {
                    referrers.push(Referrer {
                        category: Category::Flippers,
                        name: flipper_name.clone(),
                        field: *field,
                    });
                }
            }
        }
        referrers
    }

    /// Every autofire coil and flipper that uses the switch `name`.
    pub fn switch_referrers(&self, name: &str) -> Vec<Referrer> {
        let mut referrers = Vec::new();
        for (autofire_name, autofire) in &self.config.autofire_coils {
            if autofire.switch == name {
                referrers.push(Referrer {
                    category: Category::AutofireCoils,
                    name: autofire_name.clone(),
                    field: "switch",
                });
            }
        }
        for (flipper_name, flipper) in &self.config.flippers {
            let fields = [
                ("activation_switch", Some(flipper.activation_switch.as_str())),
                ("eos_switch", flipper.eos_switch.as_deref()),
            ];
            for (field, switch) in fields.iter() {
                if *switch == Some(name) {
                    referrers.push(Referrer {
                        category: Category::Flippers,
                        name: flipper_name.clone(),
                        field: *field,
                    });
                }
            }
        }
        referrers
    }

    /// Every device that is triggered by `event`, so shared triggers can be
    /// traced back to all of their listeners.
    pub fn devices_for_event(&self, event: &str) -> Vec<EventBinding> {
        let mut bindings = Vec::new();
        let mut bind = |category, name: &String, field, events: Vec<&str>| {
            if events.iter().any(|e| *e == event) {
                bindings.push(EventBinding {
                    category,
                    name: name.clone(),
                    field,
                });
            }
        };

        for (name, autofire) in &self.config.autofire_coils {
            bind(Category::AutofireCoils, name, "enable_events", autofire.enable_events());
            bind(Category::AutofireCoils, name, "disable_events", autofire.disable_events());
        }
        for (name, flipper) in &self.config.flippers {
            bind(Category::Flippers, name, "enable_events", flipper.enable_events());
            bind(Category::Flippers, name, "disable_events", flipper.disable_events());
        }
        for (name, servo) in &self.config.servos {
            bind(Category::Servos, name, "reset_events", servo.reset_events());
        }

        bindings
    }

    /// Records sharing a hardware address. Not an error, but rarely intended.
    pub fn address_collisions(&self) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for (category, addresses) in &self.addresses {
            let mut by_address: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (name, address) in addresses {
                // Switch inputs collide on the controller number, whatever their notation.
                let key = match address.switch_number() {
                    Some(number) if *category == Category::Switches => number.to_string(),
                    _ => format!("{:?}", address),
                };
                by_address.entry(key).or_default().push(name.clone());
            }

            collisions.extend(
                by_address
                    .into_iter()
                    .filter(|(_, names)| names.len() > 1)
                    .map(|(_, names)| Collision {
                        category: *category,
                        names,
                    }),
            );
        }
        collisions
    }

    /// Serialises the document again, version marker first.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let body = serde_yaml::to_string(&self.config).prefix("Failed to serialize config")?;
        Ok(format!("#config_version={}\n\n{}", self.version, body))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).prefix("Failed to serialize config")
    }
}
