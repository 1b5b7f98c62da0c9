use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::DeviceNumber;
use crate::schema::Category;

// Optional fields stay `Option` so that re-serialising only writes what the
// document contained. Defaults are applied by the accessors.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchType {
    #[serde(rename = "NO")]
    NormallyOpen,
    #[serde(rename = "NC")]
    NormallyClosed,
}

impl SwitchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SwitchType::NormallyOpen => "NO",
            SwitchType::NormallyClosed => "NC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Debounce {
    Auto,
    Quick,
    Normal,
}

/// A list of event names. Written either as one comma separated string or as
/// a sequence, and kept in that form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventList {
    Joined(String),
    List(Vec<String>),
}

impl EventList {
    pub fn names(&self) -> Vec<&str> {
        let names: Box<dyn Iterator<Item = &str>> = match self {
            EventList::Joined(joined) => Box::new(joined.split(',')),
            EventList::List(list) => Box::new(list.iter().map(|s| s.as_str())),
        };
        names.map(str::trim).filter(|s| !s.is_empty()).collect()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.names().iter().any(|name| *name == event)
    }
}

fn names(list: &Option<EventList>) -> Vec<&str> {
    list.as_ref().map(EventList::names).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hardware {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driverboards: Option<String>,
}

impl Hardware {
    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or("virtual")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Switch {
    pub number: DeviceNumber,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SwitchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<Debounce>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Switch {
    pub fn switch_type(&self) -> SwitchType {
        self.kind.unwrap_or(SwitchType::NormallyOpen)
    }

    pub fn debounce(&self) -> Debounce {
        self.debounce.unwrap_or(Debounce::Auto)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

pub const DEFAULT_PULSE_MS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coil {
    pub number: DeviceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_enable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_pwm_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_pwm_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Coil {
    pub fn pulse_ms(&self) -> u32 {
        self.pulse_ms.unwrap_or(DEFAULT_PULSE_MS)
    }

    pub fn allow_enable(&self) -> bool {
        self.allow_enable.unwrap_or(false)
    }

    pub fn recycle(&self) -> bool {
        self.recycle.unwrap_or(true)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    /// The pulse and hold masks as bit vectors, most significant bit first.
    pub fn pwm_masks(&self) -> Option<(Vec<bool>, Vec<bool>)> {
        let bits = |mask: &String| mask.chars().map(|c| c == '1').collect::<Vec<bool>>();
        match (&self.pulse_pwm_mask, &self.hold_pwm_mask) {
            (Some(pulse), Some(hold)) => Some((bits(pulse), bits(hold))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutofireCoil {
    pub coil: String,
    pub switch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_switch: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_events: Option<EventList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_events: Option<EventList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl AutofireCoil {
    pub fn reverse_switch(&self) -> bool {
        self.reverse_switch.unwrap_or(false)
    }

    pub fn enable_events(&self) -> Vec<&str> {
        names(&self.enable_events)
    }

    pub fn disable_events(&self) -> Vec<&str> {
        names(&self.disable_events)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Servo {
    pub number: DeviceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servo_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servo_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_events: Option<EventList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Servo {
    pub fn servo_min(&self) -> f64 {
        self.servo_min.unwrap_or(0.1)
    }

    pub fn servo_max(&self) -> f64 {
        self.servo_max.unwrap_or(0.9)
    }

    pub fn reset_position(&self) -> f64 {
        self.reset_position.unwrap_or(0.5)
    }

    pub fn reset_events(&self) -> Vec<&str> {
        names(&self.reset_events)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Flipper {
    pub main_coil: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_coil: Option<String>,
    pub activation_switch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos_switch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_eos: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_events: Option<EventList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_events: Option<EventList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Flipper {
    pub fn use_eos(&self) -> bool {
        self.use_eos.unwrap_or(false)
    }

    pub fn enable_events(&self) -> Vec<&str> {
        names(&self.enable_events)
    }

    pub fn disable_events(&self) -> Vec<&str> {
        names(&self.disable_events)
    }

    pub fn debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }

    pub fn coils(&self) -> impl Iterator<Item = &str> {
        Some(self.main_coil.as_str())
            .into_iter()
            .chain(self.hold_coil.as_deref())
    }

    pub fn switches(&self) -> impl Iterator<Item = &str> {
        Some(self.activation_switch.as_str())
            .into_iter()
            .chain(self.eos_switch.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixLight {
    pub number: DeviceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gi {
    pub number: DeviceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimmable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Gi {
    pub fn dimmable(&self) -> bool {
        self.dimmable.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Led {
    pub number: DeviceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Led {
    /// The default colour as RGB.
    pub fn default_color(&self) -> [u8; 3] {
        let hex = self.default_color.as_deref().unwrap_or("ffffff");
        let channel = |i: usize| {
            hex.get(i * 2..i * 2 + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .unwrap_or(255)
        };
        [channel(0), channel(1), channel(2)]
    }
}

/// The typed hardware document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HwConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Hardware>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub switches: BTreeMap<String, Switch>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coils: BTreeMap<String, Coil>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub autofire_coils: BTreeMap<String, AutofireCoil>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servos: BTreeMap<String, Servo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flippers: BTreeMap<String, Flipper>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub matrix_lights: BTreeMap<String, MatrixLight>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gis: BTreeMap<String, Gi>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub leds: BTreeMap<String, Led>,
}

impl HwConfig {
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Switches => self.switches.len(),
            Category::Coils => self.coils.len(),
            Category::AutofireCoils => self.autofire_coils.len(),
            Category::Servos => self.servos.len(),
            Category::Flippers => self.flippers.len(),
            Category::MatrixLights => self.matrix_lights.len(),
            Category::Gis => self.gis.len(),
            Category::Leds => self.leds.len(),
        }
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        match category {
            Category::Switches => self.switches.contains_key(name),
            Category::Coils => self.coils.contains_key(name),
            Category::AutofireCoils => self.autofire_coils.contains_key(name),
            Category::Servos => self.servos.contains_key(name),
            Category::Flippers => self.flippers.contains_key(name),
            Category::MatrixLights => self.matrix_lights.contains_key(name),
            Category::Gis => self.gis.contains_key(name),
            Category::Leds => self.leds.contains_key(name),
        }
    }

    /// The `number` of every addressed record in `category`.
    pub fn numbers(&self, category: Category) -> Vec<(&str, &DeviceNumber)> {
        fn collect<'a, T, F>(map: &'a BTreeMap<String, T>, f: F) -> Vec<(&'a str, &'a DeviceNumber)>
        where
            F: Fn(&'a T) -> &'a DeviceNumber,
        {
            map.iter().map(|(name, r)| (name.as_str(), f(r))).collect()
        }

        match category {
            Category::Switches => collect(&self.switches, |r| &r.number),
            Category::Coils => collect(&self.coils, |r| &r.number),
            Category::Servos => collect(&self.servos, |r| &r.number),
            Category::MatrixLights => collect(&self.matrix_lights, |r| &r.number),
            Category::Gis => collect(&self.gis, |r| &r.number),
            Category::Leds => collect(&self.leds, |r| &r.number),
            Category::AutofireCoils | Category::Flippers => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_lists_split_and_trim() {
        let joined = EventList::Joined("ball_ending, tilt,,".into());
        assert_eq!(joined.names(), vec!["ball_ending", "tilt"]);
        assert!(joined.contains("tilt"));

        let list = EventList::List(vec![" ball_started ".into()]);
        assert_eq!(list.names(), vec!["ball_started"]);
        assert!(!list.contains("tilt"));
    }

    #[test]
    fn defaults_apply_when_absent() {
        let coil: Coil = serde_yaml::from_str("number: 3").unwrap();
        assert_eq!(coil.pulse_ms(), DEFAULT_PULSE_MS);
        assert!(!coil.allow_enable());
        assert!(coil.recycle());
        assert_eq!(coil.pwm_masks(), None);
        assert_eq!(serde_yaml::to_string(&coil).unwrap().trim(), "number: 3");

        let switch: Switch = serde_yaml::from_str("number: 1\ntype: NC").unwrap();
        assert_eq!(switch.switch_type().as_str(), "NC");
        assert_eq!(switch.debounce(), Debounce::Auto);
    }

    #[test]
    fn led_color_parses_hex() {
        let led: Led = serde_yaml::from_str("number: 2-23\ndefault_color: ff8000").unwrap();
        assert_eq!(led.default_color(), [255, 128, 0]);
    }
}
