// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime values.
//!
//! Maps and lists are plain values without identity. Objects are shared
//! handles: two [`ObjectRef`] clones point at the same instance, which is
//! what cycle detection and reference equality rely on.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

thread_local! {
    static COMPARING: RefCell<HashSet<(usize, usize)>> = RefCell::new(HashSet::new());
    static FORMATTING: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

/// A case of a registered enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum type name.
    pub enum_name: Arc<str>,
    /// Case name.
    pub case: Arc<str>,
}

impl EnumValue {
    /// Create an enum case value.
    pub fn new(enum_name: impl Into<Arc<str>>, case: impl Into<Arc<str>>) -> Self {
        Self {
            enum_name: enum_name.into(),
            case: case.into(),
        }
    }
}

/// A class instance. Fields that were never initialized are absent.
#[derive(Debug, Clone)]
pub struct Object {
    class: Arc<str>,
    fields: BTreeMap<String, Value>,
}

impl Object {
    /// Create an instance with no initialized fields.
    pub fn new(class: impl Into<Arc<str>>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field initialization.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Shared class name.
    pub fn class_name(&self) -> &Arc<str> {
        &self.class
    }

    /// Get an initialized field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Check whether a field is initialized.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field, leaving it uninitialized.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// All initialized fields.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }
}

/// Shared, identity-bearing handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Wrap an object.
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Class name of the instance.
    pub fn class(&self) -> Arc<str> {
        self.0.read().class.clone()
    }

    /// Clone out a field value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).cloned()
    }

    /// Set a field value.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.write().set(name, value);
    }

    /// Identity of the instance (stable while any handle is alive).
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Reference equality.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Structural equality. Pairs already under comparison are assumed equal,
/// so cyclic graphs terminate.
impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let pair = (self.id(), other.id());
        if !COMPARING.with(|c| c.borrow_mut().insert(pair)) {
            return true;
        }
        let (left, right) = (self.read().clone(), other.read().clone());
        let equal = left.class == right.class && left.fields == right.fields;
        COMPARING.with(|c| c.borrow_mut().remove(&pair));
        equal
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id();
        let snapshot = self.read().clone();
        if !FORMATTING.with(|s| s.borrow_mut().insert(id)) {
            return write!(f, "{}@{:#x}", snapshot.class, id);
        }
        let mut out = f.debug_struct(&snapshot.class);
        for (name, value) in &snapshot.fields {
            out.field(name, value);
        }
        let result = out.finish();
        FORMATTING.with(|s| s.borrow_mut().remove(&id));
        result
    }
}

/// A dynamic value: scalar, container or object.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(EnumValue),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(ObjectRef),
}

impl Value {
    /// Wrap an object into a fresh shared instance.
    pub fn object(object: Object) -> Self {
        Self::Object(ObjectRef::new(object))
    }

    /// Build a map value from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the runtime kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Scalar values (bool, numbers, strings).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_)
        )
    }

    /// Lists and maps.
    pub fn is_iterable(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64 (integers widen).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as enum case.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as object handle.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Read a field of a map or object. Missing fields read as `None`.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        match self {
            Self::Map(entries) => entries.get(name).cloned(),
            Self::Object(object) => object.get(name),
            _ => None,
        }
    }

    /// Follow a dotted path (`address.zipcode`) through maps and objects.
    pub fn get_path(&self, path: &[String]) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        let next = self.get_field(first)?;
        if rest.is_empty() {
            Some(next)
        } else {
            next.get_path(rest)
        }
    }

    /// Reference equality for objects, `false` for everything else.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Convert to JSON. Objects become JSON objects, enums their case name;
    /// an object reached again along its own path is emitted as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::Int(v) => Json::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::String(v) => Json::String(v.clone()),
            Self::Enum(v) => Json::String(v.case.to_string()),
            Self::List(items) => Json::Array(items.iter().map(|i| i.to_json_inner(path)).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_inner(path)))
                    .collect(),
            ),
            Self::Object(object) => {
                if !path.insert(object.id()) {
                    return Json::Null;
                }
                let snapshot = object.read().clone();
                let json = Json::Object(
                    snapshot
                        .fields
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json_inner(path)))
                        .collect(),
                );
                path.remove(&object.id());
                json
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Self::Enum(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::object(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Json::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
