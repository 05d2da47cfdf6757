//! Named, typed shader uniform values
//!
//! Each light publishes its numeric state as a [`UniformTable`]: an ordered
//! list of slots whose names are stable per light type (`point_color`,
//! `spot_angle_cos`, ...) so a backend can bind them once.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Typed uniform value
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int`
    Int(i32),
    /// `bool`
    Bool(bool),
    /// `vec3`
    Vec3([f32; 3]),
    /// `mat4` (column-major)
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// Shader type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Mat4(_) => "mat4",
        }
    }

    /// Float payload
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Vec3 payload
    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            UniformValue::Vec3(v) => Some(Vec3::from_array(v)),
            _ => None,
        }
    }

    /// Bool payload
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            UniformValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v.to_array())
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array_2d())
    }
}

/// One named uniform
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformSlot {
    /// Binding name
    pub name: String,
    /// Current value
    pub value: UniformValue,
}

/// Ordered set of named uniforms
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UniformTable {
    slots: Vec<UniformSlot>,
}

impl UniformTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot, replacing any previous value with the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        let name = name.into();
        let value = value.into();
        match self.slots.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.value = value,
            None => self.slots.push(UniformSlot { name, value }),
        }
    }

    /// Look up a slot value by name
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.slots.iter().find(|slot| slot.name == name).map(|slot| &slot.value)
    }

    /// All slots in insertion order
    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove all slots
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
