use std::fmt;

use serde::{Deserialize, Serialize};

/// The `number` of a device exactly as it was written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceNumber {
    Integer(u64),
    Text(String),
}

impl fmt::Display for DeviceNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceNumber::Integer(n) => n.fmt(f),
            DeviceNumber::Text(s) => s.fmt(f),
        }
    }
}

/// Which address grammar applies to a device's `number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Switch,
    Coil,
    Lamp,
    Gi,
    Led,
    /// A plain non-negative integer.
    Index,
}

/// A driver board output in `A<board>-B<bank>-<output>` or
/// `<board>/<bank>/<output>` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoardAddress {
    pub board: u32,
    pub bank: u32,
    pub output: u32,
}

impl BoardAddress {
    pub fn parse(text: &str) -> Option<BoardAddress> {
        if text.contains('-') {
            let params: Vec<&str> = text.split('-').collect();
            if params.len() != 3 {
                return None;
            }
            BoardAddress {
                board: prefixed(params[0], 'A')?,
                bank: prefixed(params[1], 'B')?,
                output: integer(params[2])?,
            }
            .checked()
        } else if text.contains('/') {
            let params: Vec<&str> = text.split('/').collect();
            if params.len() != 3 {
                return None;
            }
            BoardAddress {
                board: integer(params[0])?,
                bank: integer(params[1])?,
                output: integer(params[2])?,
            }
            .checked()
        } else {
            None
        }
    }

    /// The bank number across all boards, two banks per board.
    pub fn global_bank(&self) -> Option<u32> {
        self.board.checked_mul(2)?.checked_add(self.bank)
    }

    fn checked(self) -> Option<BoardAddress> {
        self.global_bank().map(|_| self)
    }
}

/// A decoded device address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Address {
    Index { index: u32 },
    DedicatedSwitch { index: u32 },
    MatrixSwitch { column: u32, row: u32 },
    DedicatedDriver { index: u32 },
    Board(BoardAddress),
    DedicatedLamp { index: u32 },
    LampMatrix { source: BoardAddress, sink: BoardAddress },
    Gi { index: u32, bank: Option<char> },
    Led { segments: Vec<u32> },
}

impl Address {
    pub fn parse(kind: AddressKind, number: &DeviceNumber) -> Option<Address> {
        let text = number.to_string();
        let text = text.trim();
        match kind {
            AddressKind::Switch => parse_switch(text),
            AddressKind::Coil => parse_coil(text),
            AddressKind::Lamp => parse_lamp(text),
            AddressKind::Gi => parse_gi(text),
            AddressKind::Led => parse_led(text),
            AddressKind::Index => integer(text).map(|index| Address::Index { index }),
        }
    }

    /// The number the controller uses for a switch input. Matrix switches
    /// start at 32, sixteen rows per column.
    pub fn switch_number(&self) -> Option<u32> {
        match *self {
            Address::Index { index } | Address::DedicatedSwitch { index } => Some(index),
            Address::MatrixSwitch { column, row } => column.checked_mul(16)?.checked_add(32)?.checked_add(row),
            _ => None,
        }
    }
}

fn integer(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn prefixed(text: &str, prefix: char) -> Option<u32> {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.eq_ignore_ascii_case(&prefix) => integer(chars.as_str()),
        _ => None,
    }
}

fn parse_switch(text: &str) -> Option<Address> {
    let upper = text.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("SD") {
        integer(rest).map(|index| Address::DedicatedSwitch { index })
    } else if upper.contains('/') {
        let parts: Vec<&str> = upper.split('/').collect();
        if parts.len() != 2 {
            return None;
        }
        let matrix = Address::MatrixSwitch {
            column: integer(parts[0])?,
            row: integer(parts[1])?,
        };
        matrix.switch_number().map(|_| matrix)
    } else {
        integer(&upper).map(|index| Address::Index { index })
    }
}

fn parse_coil(text: &str) -> Option<Address> {
    if (2..=3).contains(&text.len()) {
        if let Some(index) = prefixed(text, 'C') {
            return Some(Address::DedicatedDriver { index });
        }
    }
    if let Some(index) = integer(text) {
        return Some(Address::Index { index });
    }
    BoardAddress::parse(text).map(Address::Board)
}

fn parse_lamp(text: &str) -> Option<Address> {
    if (2..=3).contains(&text.len()) {
        if let Some(index) = prefixed(text, 'L') {
            return Some(Address::DedicatedLamp { index });
        }
    }
    if let Some(index) = integer(text) {
        return Some(Address::Index { index });
    }

    // C-<addr>:R-<addr>
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    Some(Address::LampMatrix {
        source: lamp_side(parts[0], 'C')?,
        sink: lamp_side(parts[1], 'R')?,
    })
}

fn lamp_side(text: &str, side: char) -> Option<BoardAddress> {
    let mut bits = text.splitn(2, '-');
    let prefix = bits.next()?;
    let mut chars = prefix.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.eq_ignore_ascii_case(&side) => BoardAddress::parse(bits.next()?),
        _ => None,
    }
}

fn parse_gi(text: &str) -> Option<Address> {
    match text.chars().last() {
        Some(last) if last.is_ascii_alphabetic() => {
            let index = integer(&text[..text.len() - 1])?;
            Some(Address::Gi {
                index,
                bank: Some(last.to_ascii_uppercase()),
            })
        }
        _ => integer(text).map(|index| Address::Gi { index, bank: None }),
    }
}

fn parse_led(text: &str) -> Option<Address> {
    let segments = text
        .split('-')
        .map(integer)
        .collect::<Option<Vec<u32>>>()?;
    if segments.is_empty() || segments.len() > 4 {
        return None;
    }
    Some(Address::Led { segments })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> DeviceNumber {
        DeviceNumber::Text(s.to_owned())
    }

    #[test]
    fn switch_addresses() {
        assert_eq!(
            Address::parse(AddressKind::Switch, &DeviceNumber::Integer(23)),
            Some(Address::Index { index: 23 })
        );
        assert_eq!(
            Address::parse(AddressKind::Switch, &text("sd7")),
            Some(Address::DedicatedSwitch { index: 7 })
        );

        let matrix = Address::parse(AddressKind::Switch, &text("1/3")).unwrap();
        assert_eq!(matrix, Address::MatrixSwitch { column: 1, row: 3 });
        assert_eq!(matrix.switch_number(), Some(51));

        assert_eq!(Address::parse(AddressKind::Switch, &text("1/2/3")), None);
        assert_eq!(Address::parse(AddressKind::Switch, &text("-4")), None);
        assert_eq!(Address::parse(AddressKind::Switch, &text("SDx")), None);
    }

    #[test]
    fn oversized_addresses_are_rejected() {
        assert_eq!(Address::parse(AddressKind::Switch, &text("268435456/0")), None);
        assert_eq!(Address::parse(AddressKind::Switch, &text("268435455/15")), None);
        assert_eq!(
            Address::MatrixSwitch {
                column: u32::MAX,
                row: 0
            }
            .switch_number(),
            None
        );
        assert_eq!(Address::parse(AddressKind::Coil, &text("2147483648/1/0")), None);
        assert_eq!(Address::parse(AddressKind::Coil, &text("A4294967295-B0-1")), None);
    }

    #[test]
    fn coil_addresses() {
        assert_eq!(
            Address::parse(AddressKind::Coil, &text("C12")),
            Some(Address::DedicatedDriver { index: 12 })
        );
        assert_eq!(
            Address::parse(AddressKind::Coil, &text("A0-B1-2")),
            Some(Address::Board(BoardAddress {
                board: 0,
                bank: 1,
                output: 2
            }))
        );

        let slashed = Address::parse(AddressKind::Coil, &text("2/1/5")).unwrap();
        match slashed {
            Address::Board(board) => assert_eq!(board.global_bank(), Some(5)),
            other => panic!("unexpected address {:?}", other),
        }

        assert_eq!(Address::parse(AddressKind::Coil, &text("C123")), None);
        assert_eq!(Address::parse(AddressKind::Coil, &text("A0-B1")), None);
        assert_eq!(Address::parse(AddressKind::Coil, &text("X0-B1-2")), None);
    }

    #[test]
    fn lamp_addresses() {
        assert_eq!(
            Address::parse(AddressKind::Lamp, &text("L5")),
            Some(Address::DedicatedLamp { index: 5 })
        );
        assert_eq!(
            Address::parse(AddressKind::Lamp, &text("C-A2-B0-1:R-A3-B1-6")),
            Some(Address::LampMatrix {
                source: BoardAddress {
                    board: 2,
                    bank: 0,
                    output: 1
                },
                sink: BoardAddress {
                    board: 3,
                    bank: 1,
                    output: 6
                },
            })
        );
        assert!(Address::parse(AddressKind::Lamp, &text("C-0/0/1:R-0/1/2")).is_some());
        assert_eq!(Address::parse(AddressKind::Lamp, &text("C-A2-B0-1")), None);
        assert_eq!(Address::parse(AddressKind::Lamp, &text("X-A2-B0-1:Y-A3-B1-6")), None);
        assert_eq!(Address::parse(AddressKind::Lamp, &text("R-A3-B1-6:C-A2-B0-1")), None);
        assert_eq!(Address::parse(AddressKind::Lamp, &text("A2-B0-1:A3-B1-6")), None);
        assert!(Address::parse(AddressKind::Lamp, &text("c-A2-B0-1:r-A3-B1-6")).is_some());
    }

    #[test]
    fn gi_and_led_addresses() {
        assert_eq!(
            Address::parse(AddressKind::Gi, &text("1A")),
            Some(Address::Gi {
                index: 1,
                bank: Some('A')
            })
        );
        assert_eq!(
            Address::parse(AddressKind::Gi, &DeviceNumber::Integer(3)),
            Some(Address::Gi {
                index: 3,
                bank: None
            })
        );
        assert_eq!(Address::parse(AddressKind::Gi, &text("AB")), None);

        assert_eq!(
            Address::parse(AddressKind::Led, &text("2-23")),
            Some(Address::Led {
                segments: vec![2, 23]
            })
        );
        assert_eq!(Address::parse(AddressKind::Led, &text("2--23")), None);
        assert_eq!(Address::parse(AddressKind::Led, &text("1-2-3-4-5")), None);
    }

    #[test]
    fn numbers_keep_their_form() {
        let number: DeviceNumber = serde_yaml::from_str("2-23").unwrap();
        assert_eq!(number, text("2-23"));
        let number: DeviceNumber = serde_yaml::from_str("17").unwrap();
        assert_eq!(number, DeviceNumber::Integer(17));
        assert_eq!(serde_yaml::to_string(&number).unwrap().trim(), "17");
    }
}
