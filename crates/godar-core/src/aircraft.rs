//! Aircraft list wire types
//!
//! Mirrors the JSON document served by Virtual Radar Server at
//! `AircraftList.json`. Only the fields godar reads or forwards are modeled;
//! unknown fields are ignored, and absent or `null` fields take their
//! defaults.
//!
//! ## Polymorphic fields
//!
//! Different server versions encode some fields as a JSON string in one
//! release and a JSON number in the next. Those fields use small newtypes
//! ([`Revision`], [`Squawk`], [`Category`]) that all decode through one
//! string-or-number step: the string shape is tried first, then the numeric
//! shape. Anything else is a decode error.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Top-level aircraft list document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AircraftList {
    /// Revision marker of the server's aircraft list
    pub last_dv: Revision,
    /// Total aircraft known to the server (before filtering)
    #[serde(deserialize_with = "null_as_default")]
    pub total_ac: i64,
    /// Source of the list
    #[serde(deserialize_with = "null_as_default")]
    pub src: i32,
    /// Server time in milliseconds since the epoch
    #[serde(deserialize_with = "null_as_default")]
    pub stm: i64,
    /// Aircraft matching the request's filters
    #[serde(deserialize_with = "null_as_default", rename = "acList")]
    pub aircraft: Vec<Aircraft>,
    /// Receiver feeds available on the server
    #[serde(deserialize_with = "null_as_default")]
    pub feeds: Vec<Feed>,
    #[serde(deserialize_with = "null_as_default")]
    pub src_feed: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub config_changed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub show_sil: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub show_flg: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub show_pic: bool,
}

impl AircraftList {
    /// Decode an aircraft list from a response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::decode(e.to_string()))
    }
}

/// A receiver feed advertised by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feed {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// One aircraft as reported in a single poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Aircraft {
    /// Server-side row id
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    /// Seconds the aircraft has been tracked
    #[serde(deserialize_with = "null_as_default")]
    pub t_secs: i64,
    /// Receiver id
    #[serde(deserialize_with = "null_as_default")]
    pub rcvr: i64,
    /// ICAO 24-bit address as hex
    #[serde(deserialize_with = "null_as_default")]
    pub icao: String,
    /// Registration
    #[serde(deserialize_with = "null_as_default")]
    pub reg: String,
    /// Pressure altitude in feet
    #[serde(deserialize_with = "null_as_default")]
    pub alt: i32,
    /// Geometric altitude in feet
    #[serde(deserialize_with = "null_as_default")]
    pub g_alt: i32,
    /// Callsign
    #[serde(deserialize_with = "null_as_default")]
    pub call: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub long: f64,
    /// Position timestamp in milliseconds since the epoch
    #[serde(deserialize_with = "null_as_default")]
    pub pos_time: i64,
    /// Position came from multilateration
    #[serde(deserialize_with = "null_as_default")]
    pub mlat: bool,
    /// Ground speed in knots
    #[serde(deserialize_with = "null_as_default")]
    pub spd: f64,
    /// Track over ground in degrees
    #[serde(deserialize_with = "null_as_default")]
    pub trak: f64,
    /// Vertical speed in feet per minute
    #[serde(deserialize_with = "null_as_default")]
    pub vsi: i32,
    /// ICAO aircraft type designator (e.g. "A320")
    #[serde(deserialize_with = "null_as_default", rename = "Type")]
    pub aircraft_type: String,
    /// Model description
    #[serde(deserialize_with = "null_as_default")]
    pub mdl: String,
    /// Manufacturer
    #[serde(deserialize_with = "null_as_default")]
    pub man: String,
    #[serde(deserialize_with = "null_as_default")]
    pub from: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to: String,
    /// Operator name
    #[serde(deserialize_with = "null_as_default")]
    pub op: String,
    /// Operator ICAO code
    #[serde(deserialize_with = "null_as_default")]
    pub op_code: String,
    pub sqk: Squawk,
    /// Emergency flag
    #[serde(deserialize_with = "null_as_default")]
    pub help: bool,
    /// Server-computed distance (only when lat/lng were sent)
    #[serde(deserialize_with = "null_as_default")]
    pub dst: f64,
    /// Server-computed bearing (only when lat/lng were sent)
    #[serde(deserialize_with = "null_as_default")]
    pub brng: f64,
    /// Wake turbulence category
    #[serde(rename = "WTC")]
    pub wtc: Category,
    /// Number of engines
    #[serde(deserialize_with = "null_as_default")]
    pub engines: String,
    pub eng_type: Category,
    pub eng_mount: Category,
    pub species: Category,
    /// Military aircraft
    #[serde(deserialize_with = "null_as_default")]
    pub mil: bool,
    /// Country of registration
    #[serde(deserialize_with = "null_as_default")]
    pub cou: String,
    /// On the ground
    #[serde(deserialize_with = "null_as_default")]
    pub gnd: bool,
    /// Year of manufacture
    #[serde(deserialize_with = "null_as_default")]
    pub year: String,
}

/// Decode `null` as the field's default, like an absent field
///
/// Values of the wrong type are still errors.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw shape of a string-or-number field
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// A scalar the server may send either as a string or as a number
trait Lenient: Sized + Default {
    /// Field name used in decode errors
    const NAME: &'static str;

    fn from_text(text: String) -> std::result::Result<Self, String>;

    fn from_number(number: serde_json::Number) -> std::result::Result<Self, String>;
}

fn deserialize_lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Lenient,
{
    let raw = Option::<StringOrNumber>::deserialize(deserializer).map_err(|_| {
        <D::Error as de::Error>::custom(format!("{}: expected a string or a number", T::NAME))
    })?;

    match raw {
        None => Ok(T::default()),
        Some(StringOrNumber::String(text)) => T::from_text(text),
        Some(StringOrNumber::Number(number)) => T::from_number(number),
    }
    .map_err(|msg| de::Error::custom(format!("{}: {}", T::NAME, msg)))
}

macro_rules! deserialize_leniently {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserialize_lenient(deserializer)
                }
            }
        )+
    };
}

deserialize_leniently!(Revision, Squawk, Category);

/// Revision marker of the aircraft list (`lastDv`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Revision(pub i64);

impl Revision {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl Lenient for Revision {
    const NAME: &'static str = "lastDv";

    fn from_text(text: String) -> std::result::Result<Self, String> {
        text.parse()
            .map(Revision)
            .map_err(|e| format!("invalid revision {:?}: {}", text, e))
    }

    fn from_number(number: serde_json::Number) -> std::result::Result<Self, String> {
        number
            .as_i64()
            .map(Revision)
            .ok_or_else(|| format!("revision {} is not an integer", number))
    }
}

/// Transponder squawk code; 0 when the server sends an empty string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Squawk(pub u32);

impl Squawk {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Lenient for Squawk {
    const NAME: &'static str = "Sqk";

    fn from_text(text: String) -> std::result::Result<Self, String> {
        if text.is_empty() {
            return Ok(Squawk(0));
        }
        text.parse()
            .map(Squawk)
            .map_err(|e| format!("invalid squawk {:?}: {}", text, e))
    }

    fn from_number(number: serde_json::Number) -> std::result::Result<Self, String> {
        number
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Squawk)
            .ok_or_else(|| format!("squawk {} is out of range", number))
    }
}

/// Categorical code (wake category, species, engine type, engine mount)
///
/// Numeric input is kept as its decimal string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Lenient for Category {
    const NAME: &'static str = "category";

    fn from_text(text: String) -> std::result::Result<Self, String> {
        Ok(Category(text))
    }

    fn from_number(number: serde_json::Number) -> std::result::Result<Self, String> {
        if number.is_f64() {
            return Err(format!("category {} is not an integer", number));
        }
        Ok(Category(number.to_string()))
    }
}
