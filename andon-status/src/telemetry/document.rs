//! Telemetry document model
//!
//! One telemetry file is a list of device items:
//!
//! ```json
//! {"items": [{"device": {"code": "X", "number": "576"}, "digits": 1, "unit": "bit", "value": 1}]}
//! ```
//!
//! Keys are accepted in camelCase or PascalCase, and the device number may be
//! written as a string or an integer.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Device value as written by the collector
///
/// Resolved to an integer at read time; anything that is not an integer or a
/// numeric string reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Integer(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for TelemetryValue {
    fn default() -> Self {
        TelemetryValue::Other(serde_json::Value::Null)
    }
}

impl TelemetryValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TelemetryValue::Integer(v) => Some(*v),
            TelemetryValue::Text(s) => s.trim().parse().ok(),
            TelemetryValue::Other(_) => None,
        }
    }
}

/// Device class code and numeric address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAddress {
    #[serde(alias = "Code", default)]
    pub code: String,
    #[serde(alias = "Number", default, deserialize_with = "number_or_string")]
    pub number: String,
}

impl DeviceAddress {
    /// Composite identifier, e.g. "X" + "576" = "X576"
    pub fn device_id(&self) -> String {
        format!("{}{}", self.code, self.number)
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

/// One device reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryItem {
    #[serde(alias = "Device", default)]
    pub device: DeviceAddress,
    /// Declared digit width
    #[serde(alias = "Digits", default)]
    pub digits: u32,
    /// Declared unit (bit, word, dword)
    #[serde(alias = "Unit", default)]
    pub unit: String,
    #[serde(alias = "Value", default)]
    pub value: TelemetryValue,
}

/// On-disk layout of a single telemetry file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryFile {
    #[serde(alias = "Items", default)]
    pub items: Vec<TelemetryItem>,
}

impl TelemetryFile {
    /// Parse one file as written by the collector
    ///
    /// Accepts a leading UTF-8 BOM, `//` and `/* */` comments, and trailing
    /// commas before `]` or `}`.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => serde_json::from_str(&remove_trailing_commas(&strip_comments(text))),
            Err(_) => serde_json::from_slice(bytes),
        }
    }
}

/// Tracks whether a scan position is inside a JSON string literal
#[derive(Default)]
struct StringState {
    in_string: bool,
    escaped: bool,
}

impl StringState {
    /// Feed one character; true when it belongs to a string literal
    fn step(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            true
        } else if c == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if state.step(c) {
            out.push(c);
            continue;
        }
        match (c, chars.peek().copied()) {
            ('/', Some('/')) => {
                // Line comment; the newline itself is kept
                while chars.next_if(|&next| next != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();

    for (position, &c) in chars.iter().enumerate() {
        if !state.step(c) && c == ',' {
            let next = chars[position + 1..]
                .iter()
                .copied()
                .find(|next| !next.is_whitespace());
            if matches!(next, Some(']' | '}')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Merged items of every file loaded in one refresh cycle
///
/// Items from later files are appended after earlier ones. Duplicate device
/// identifiers are kept; lookups return the first one in list order.
#[derive(Debug, Clone, Default)]
pub struct TelemetryDocument {
    items: Vec<TelemetryItem>,
    index: HashMap<String, usize>,
}

impl TelemetryDocument {
    pub fn new(items: Vec<TelemetryItem>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            index.entry(item.device.device_id()).or_insert(position);
        }
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, device_id: &str) -> Option<&TelemetryItem> {
        self.index.get(device_id).map(|&position| &self.items[position])
    }

    /// Integer value of a device, `None` if unknown or not an integer
    pub fn value(&self, device_id: &str) -> Option<i64> {
        self.item(device_id).and_then(|item| item.value.as_integer())
    }
}
