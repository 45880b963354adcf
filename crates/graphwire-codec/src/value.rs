//! The logical value universe.
//!
//! Everything the codec can round-trip is a [`Value`]: atoms, byte strings,
//! the two aggregate kinds (sequence and mapping), and the domain tuple
//! types. Aggregates are `Rc<RefCell<..>>` cells so that one graph can hold
//! the same aggregate in several places, including inside itself; the codec
//! keys its reference tracking on the `Rc` allocation address.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use graphwire_core::constants::{
    TAG_ARRAY_START, TAG_BOOLEAN_FALSE, TAG_BOOLEAN_TRUE, TAG_BRICKCOLOR, TAG_CFRAME, TAG_COLOR3,
    TAG_COLORSEQUENCE, TAG_DATETIME, TAG_ENUM, TAG_INSTANCE_REF, TAG_NIL, TAG_NUMBERSEQUENCE,
    TAG_NUMBER_FLOAT, TAG_NUMBER_INT, TAG_RECT, TAG_STRING_SHORT, TAG_TABLE_START, TAG_UDIM2,
    TAG_VECTOR2, TAG_VECTOR3,
};

/// Shared handle to an ordered sequence of values.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
/// Shared handle to a keyed mapping.
pub type TableRef = Rc<RefCell<Table>>;

/// A value the codec can encode and decode.
///
/// Equality is structural and recurses through aggregates; do not compare
/// cyclic graphs with `==`, use [`Value::ptr_eq`] on the aggregates instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value
    Nil,
    /// A boolean
    Bool(bool),
    /// A signed integer. Values within the 32-bit signed range travel as a
    /// variable-width integer frame; anything wider reroutes through the
    /// float frame, losing precision beyond 2^53.
    Int(i64),
    /// An IEEE-754 binary64
    Float(f64),
    /// An opaque byte string
    Bytes(Vec<u8>),
    /// An ordered sequence (shared, may participate in cycles)
    Array(ArrayRef),
    /// A keyed mapping (shared, may participate in cycles)
    Table(TableRef),
    /// A 3-vector
    Vector3(Vector3),
    /// A 2-vector
    Vector2(Vector2),
    /// An RGB color with binary64 channels
    Color3(Color3),
    /// A scale/offset pair per axis
    UDim2(UDim2),
    /// An axis-aligned rectangle
    Rect(Rect),
    /// A position plus a row-major 3x3 rotation
    CFrame(CFrame),
    /// A named member of a named enumeration
    Enum(EnumItem),
    /// An opaque instance path
    InstanceRef(InstanceRef),
    /// An instant in milliseconds since the Unix epoch
    DateTime(DateTime),
    /// A palette color index
    BrickColor(BrickColor),
    /// A list of (time, value, envelope) keypoints
    NumberSequence(NumberSequence),
    /// A list of (time, r, g, b) keypoints
    ColorSequence(ColorSequence),
}

impl Value {
    /// Wraps a vector of values into a fresh shared sequence.
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Wraps a table into a fresh shared mapping.
    pub fn table(table: Table) -> Value {
        Value::Table(Rc::new(RefCell::new(table)))
    }

    /// Builds a byte-string value from anything byte-like.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(bytes.into())
    }

    /// Builds a byte-string value from UTF-8 text.
    pub fn str(s: &str) -> Value {
        Value::Bytes(s.as_bytes().to_vec())
    }

    /// Returns the nominal tag byte this value's frame opens with.
    ///
    /// The encoder may deviate for integers outside the 32-bit range (float
    /// reroute) and for tables whose key set reads as a sequence.
    pub fn wire_tag(&self) -> u8 {
        match self {
            Value::Nil => TAG_NIL,
            Value::Bool(false) => TAG_BOOLEAN_FALSE,
            Value::Bool(true) => TAG_BOOLEAN_TRUE,
            Value::Int(_) => TAG_NUMBER_INT,
            Value::Float(_) => TAG_NUMBER_FLOAT,
            Value::Bytes(_) => TAG_STRING_SHORT,
            Value::Array(_) => TAG_ARRAY_START,
            Value::Table(_) => TAG_TABLE_START,
            Value::Vector3(_) => TAG_VECTOR3,
            Value::Vector2(_) => TAG_VECTOR2,
            Value::Color3(_) => TAG_COLOR3,
            Value::UDim2(_) => TAG_UDIM2,
            Value::Rect(_) => TAG_RECT,
            Value::CFrame(_) => TAG_CFRAME,
            Value::Enum(_) => TAG_ENUM,
            Value::InstanceRef(_) => TAG_INSTANCE_REF,
            Value::DateTime(_) => TAG_DATETIME,
            Value::BrickColor(_) => TAG_BRICKCOLOR,
            Value::NumberSequence(_) => TAG_NUMBERSEQUENCE,
            Value::ColorSequence(_) => TAG_COLORSEQUENCE,
        }
    }

    /// Human-readable kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Table(_) => "Table",
            Value::Vector3(_) => "Vector3",
            Value::Vector2(_) => "Vector2",
            Value::Color3(_) => "Color3",
            Value::UDim2(_) => "UDim2",
            Value::Rect(_) => "Rect",
            Value::CFrame(_) => "CFrame",
            Value::Enum(_) => "Enum",
            Value::InstanceRef(_) => "InstanceRef",
            Value::DateTime(_) => "DateTime",
            Value::BrickColor(_) => "BrickColor",
            Value::NumberSequence(_) => "NumberSequence",
            Value::ColorSequence(_) => "ColorSequence",
        }
    }

    /// Returns true for the two aggregate kinds, false for atoms and tuples.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Table(_))
    }

    /// Returns true if this value encodes as a sequence frame.
    ///
    /// Arrays always do. A table does iff its key set is exactly the
    /// integers `1..=n` for its entry count `n`; the empty table counts as a
    /// sequence. Everything else is false.
    pub fn is_sequence(&self) -> bool {
        match self {
            Value::Array(_) => true,
            Value::Table(cell) => cell.borrow().is_sequence(),
            _ => false,
        }
    }

    /// Allocation address of the aggregate cell, stable while the handle is
    /// alive. None for non-aggregates.
    pub fn aggregate_identity(&self) -> Option<usize> {
        match self {
            Value::Array(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            Value::Table(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            _ => None,
        }
    }

    /// Identity comparison: true iff both values are aggregates backed by
    /// the same allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.aggregate_identity(), other.aggregate_identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

/// A mapping key: byte string or integer. No other kind can key a table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKey {
    /// Integer key
    Int(i64),
    /// Byte-string key
    Bytes(Vec<u8>),
}

impl TableKey {
    /// Converts a value into a key, if its kind can key a table.
    ///
    /// Integers convert directly, floats convert when they are integral and
    /// finite, byte strings convert by clone. Every other kind yields None.
    pub fn from_value(value: &Value) -> Option<TableKey> {
        match value {
            Value::Int(n) => Some(TableKey::Int(*n)),
            Value::Float(f)
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f <= i64::MAX as f64 =>
            {
                Some(TableKey::Int(*f as i64))
            }
            Value::Bytes(b) => Some(TableKey::Bytes(b.clone())),
            _ => None,
        }
    }

    /// Key for UTF-8 text.
    pub fn str(s: &str) -> TableKey {
        TableKey::Bytes(s.as_bytes().to_vec())
    }

    /// The key as a value, for re-encoding.
    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Int(n) => Value::Int(*n),
            TableKey::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

/// A keyed mapping with byte-string or integer keys.
///
/// Iteration order is the key order (integers first, ascending, then byte
/// strings lexicographically); the wire format does not make pair order a
/// semantic property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    entries: BTreeMap<TableKey, Value>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a typed key, replacing any previous entry.
    pub fn insert(&mut self, key: TableKey, value: Value) {
        self.entries.insert(key, value);
    }

    /// Permissive insert: converts the key via [`TableKey::from_value`] and
    /// silently drops the entry when the key's kind cannot key a table.
    pub fn set(&mut self, key: &Value, value: Value) {
        if let Some(key) = TableKey::from_value(key) {
            self.entries.insert(key, value);
        }
    }

    /// Looks up a key.
    pub fn get(&self, key: &TableKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&TableKey, &Value)> {
        self.entries.iter()
    }

    /// True iff the key set is exactly the integers `1..=n` where `n` is the
    /// entry count. The empty table is a sequence. A table holding keys
    /// `1..=n` plus anything else is a mapping; no entry is ever dropped by
    /// this classification.
    pub fn is_sequence(&self) -> bool {
        let mut expected: i64 = 1;
        for key in self.entries.keys() {
            match key {
                TableKey::Int(n) if *n == expected => expected += 1,
                _ => return false,
            }
        }
        true
    }
}

impl FromIterator<(TableKey, Value)> for Table {
    fn from_iter<I: IntoIterator<Item = (TableKey, Value)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// A 3-vector of binary64 components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

/// A 2-vector of binary64 components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

/// An RGB color with binary64 channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color3 {
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
}

/// A scale/offset pair per screen axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UDim2 {
    /// X axis scale
    pub x_scale: f64,
    /// X axis offset
    pub x_offset: f64,
    /// Y axis scale
    pub y_scale: f64,
    /// Y axis offset
    pub y_offset: f64,
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum X
    pub min_x: f64,
    /// Minimum Y
    pub min_y: f64,
    /// Maximum X
    pub max_x: f64,
    /// Maximum Y
    pub max_y: f64,
}

/// A position plus a row-major 3x3 rotation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CFrame {
    /// Position X
    pub x: f64,
    /// Position Y
    pub y: f64,
    /// Position Z
    pub z: f64,
    /// Rotation entries, row-major
    pub rotation: [f64; 9],
}

impl CFrame {
    /// A coordinate frame at the given position with identity rotation.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, rotation: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
    }
}

/// A named member of a named enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    /// Enumeration type name
    pub enum_type: Vec<u8>,
    /// Member name
    pub member: Vec<u8>,
}

impl EnumItem {
    /// Builds an enum item, rejecting empty names.
    pub fn try_new(enum_type: Vec<u8>, member: Vec<u8>) -> Result<Self, &'static str> {
        if enum_type.is_empty() {
            return Err("empty enum type name");
        }
        if member.is_empty() {
            return Err("empty enum member name");
        }
        Ok(Self { enum_type, member })
    }
}

/// An opaque path identifying an instance in the host's object tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    /// The path bytes, uninterpreted by the codec
    pub path: Vec<u8>,
}

/// An instant in signed milliseconds since the Unix epoch.
///
/// The wire carries the instant as one binary64, so values are exact only
/// within +-2^53 ms of the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    /// Milliseconds since the Unix epoch
    pub unix_millis: i64,
}

impl DateTime {
    /// Reconstructs an instant from the wire's binary64 millisecond count,
    /// rejecting non-finite input.
    pub fn try_from_wire_millis(millis: f64) -> Result<Self, &'static str> {
        if !millis.is_finite() {
            return Err("non-finite millisecond count");
        }
        Ok(Self { unix_millis: millis as i64 })
    }
}

/// Highest palette number a brick color can carry.
pub const BRICKCOLOR_MAX_NUMBER: i64 = 1032;

/// A color from the fixed brick palette, identified by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrickColor {
    /// Palette number, `1..=1032`
    pub number: i32,
}

impl BrickColor {
    /// Validates a palette number from the wire.
    pub fn try_from_number(number: i64) -> Result<Self, &'static str> {
        if !(1..=BRICKCOLOR_MAX_NUMBER).contains(&number) {
            return Err("palette number out of range");
        }
        Ok(Self { number: number as i32 })
    }
}

/// One keypoint of a number sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberKeypoint {
    /// Keypoint time
    pub time: f64,
    /// Value at this time
    pub value: f64,
    /// Random-variation envelope around the value
    pub envelope: f64,
}

/// A piecewise-linear number-over-time curve.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberSequence {
    /// Keypoints in time order
    pub keypoints: Vec<NumberKeypoint>,
}

impl NumberSequence {
    /// Builds a sequence, rejecting non-finite or decreasing keypoint times.
    pub fn try_new(keypoints: Vec<NumberKeypoint>) -> Result<Self, &'static str> {
        validate_times(keypoints.iter().map(|k| k.time))?;
        Ok(Self { keypoints })
    }
}

/// One keypoint of a color sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorKeypoint {
    /// Keypoint time
    pub time: f64,
    /// Red channel
    pub r: f64,
    /// Green channel
    pub g: f64,
    /// Blue channel
    pub b: f64,
}

/// A piecewise-linear color-over-time curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSequence {
    /// Keypoints in time order
    pub keypoints: Vec<ColorKeypoint>,
}

impl ColorSequence {
    /// Builds a sequence, rejecting non-finite or decreasing keypoint times.
    pub fn try_new(keypoints: Vec<ColorKeypoint>) -> Result<Self, &'static str> {
        validate_times(keypoints.iter().map(|k| k.time))?;
        Ok(Self { keypoints })
    }
}

fn validate_times(times: impl Iterator<Item = f64>) -> Result<(), &'static str> {
    let mut previous = f64::NEG_INFINITY;
    for time in times {
        if !time.is_finite() {
            return Err("non-finite keypoint time");
        }
        if time < previous {
            return Err("keypoint times decrease");
        }
        previous = time;
    }
    Ok(())
}
