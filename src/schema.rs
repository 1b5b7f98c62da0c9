use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::AddressKind;

/// The version of the document schema this crate understands.
pub const CONFIG_VERSION: u32 = 4;

pub const HARDWARE_KEY: &str = "hardware";

/// A top-level section holding named device records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Switches,
    Coils,
    AutofireCoils,
    Servos,
    Flippers,
    MatrixLights,
    Gis,
    Leds,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Switches,
        Category::Coils,
        Category::AutofireCoils,
        Category::Servos,
        Category::Flippers,
        Category::MatrixLights,
        Category::Gis,
        Category::Leds,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Switches => "switches",
            Category::Coils => "coils",
            Category::AutofireCoils => "autofire_coils",
            Category::Servos => "servos",
            Category::Flippers => "flippers",
            Category::MatrixLights => "matrix_lights",
            Category::Gis => "gis",
            Category::Leds => "leds",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Category::Switches => SWITCH_FIELDS,
            Category::Coils => COIL_FIELDS,
            Category::AutofireCoils => AUTOFIRE_COIL_FIELDS,
            Category::Servos => SERVO_FIELDS,
            Category::Flippers => FLIPPER_FIELDS,
            Category::MatrixLights => MATRIX_LIGHT_FIELDS,
            Category::Gis => GI_FIELDS,
            Category::Leds => LED_FIELDS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// The device's board address.
    Number(AddressKind),
    Integer { min: i64, max: i64 },
    /// A float in `0.0..=1.0`.
    Fraction,
    Boolean,
    Text,
    Choice(&'static [&'static str]),
    /// A quoted string of `0`/`1`, 8 or 32 characters wide.
    Bitmask,
    /// Six hex digits.
    Color,
    /// The name of a record in another category.
    Reference(Category),
    /// A string of comma separated event names, or a sequence of names.
    EventList,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

pub const SWITCH_TYPES: &[&str] = &["NO", "NC"];
pub const DEBOUNCE_MODES: &[&str] = &["auto", "quick", "normal"];

const DEBUG: FieldSpec = optional("debug", FieldKind::Boolean);

pub static HARDWARE_FIELDS: &[FieldSpec] = &[
    optional("platform", FieldKind::Text),
    optional("driverboards", FieldKind::Text),
];

static SWITCH_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Switch)),
    optional("type", FieldKind::Choice(SWITCH_TYPES)),
    optional("debounce", FieldKind::Choice(DEBOUNCE_MODES)),
    DEBUG,
];

static COIL_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Coil)),
    optional("pulse_ms", FieldKind::Integer { min: 0, max: 255 }),
    optional("hold_power", FieldKind::Fraction),
    optional("allow_enable", FieldKind::Boolean),
    optional("pulse_pwm_mask", FieldKind::Bitmask),
    optional("hold_pwm_mask", FieldKind::Bitmask),
    optional("recycle", FieldKind::Boolean),
    DEBUG,
];

static AUTOFIRE_COIL_FIELDS: &[FieldSpec] = &[
    required("coil", FieldKind::Reference(Category::Coils)),
    required("switch", FieldKind::Reference(Category::Switches)),
    optional("reverse_switch", FieldKind::Boolean),
    optional("enable_events", FieldKind::EventList),
    optional("disable_events", FieldKind::EventList),
    DEBUG,
];

static SERVO_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Index)),
    optional("servo_min", FieldKind::Fraction),
    optional("servo_max", FieldKind::Fraction),
    optional("reset_position", FieldKind::Fraction),
    optional("reset_events", FieldKind::EventList),
    DEBUG,
];

static FLIPPER_FIELDS: &[FieldSpec] = &[
    required("main_coil", FieldKind::Reference(Category::Coils)),
    optional("hold_coil", FieldKind::Reference(Category::Coils)),
    required("activation_switch", FieldKind::Reference(Category::Switches)),
    optional("eos_switch", FieldKind::Reference(Category::Switches)),
    optional("use_eos", FieldKind::Boolean),
    optional("enable_events", FieldKind::EventList),
    optional("disable_events", FieldKind::EventList),
    DEBUG,
];

static MATRIX_LIGHT_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Lamp)),
    DEBUG,
];

static GI_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Gi)),
    optional("dimmable", FieldKind::Boolean),
    DEBUG,
];

static LED_FIELDS: &[FieldSpec] = &[
    required("number", FieldKind::Number(AddressKind::Led)),
    optional("default_color", FieldKind::Color),
    DEBUG,
];

pub fn field<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}
