use std::fmt;

use super::collection::{Collection, CollectionMode};
use super::RuntimeError;

/// A polymorphic runtime object.
///
/// The kinds are:
/// - Integer: 32-bit signed integer
/// - Float: 32-bit IEEE 754 float
/// - Str: owned immutable byte string
/// - Collection: growable container of objects (list or stack discipline)
/// - Vector: fixed-dimension float coordinates
///
/// An object owns its payload outright; containers own their children.
/// Cloning is always deep, so no two owners ever share a subtree.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i32),
    Float(f32),
    Str(String),
    Collection(Collection),
    Vector(Vector),
}

/// The kind tag of an object, used in diagnostics and dispatch errors.
///
/// List and Stack are reported as distinct kinds even though both are
/// collections; error messages are clearer for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Integer,
    Float,
    Str,
    List,
    Stack,
    Vector,
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Integer => "integer",
            ObjectKind::Float => "float",
            ObjectKind::Str => "string",
            ObjectKind::List => "list",
            ObjectKind::Stack => "stack",
            ObjectKind::Vector => "vector",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Object {
    /// Create an integer object.
    pub fn integer(value: i32) -> Self {
        Object::Integer(value)
    }

    /// Create a float object.
    pub fn float(value: f32) -> Self {
        Object::Float(value)
    }

    /// Create a string object that owns a copy of `value`.
    pub fn string(value: impl Into<String>) -> Self {
        Object::Str(value.into())
    }

    /// Create a vector object. Fails if `coords` is empty.
    pub fn vector(coords: Vec<f32>) -> Result<Self, RuntimeError> {
        Ok(Object::Vector(Vector::new(coords)?))
    }

    /// Create an empty collection object. Fails if `capacity` is zero.
    pub fn collection(capacity: usize, mode: CollectionMode) -> Result<Self, RuntimeError> {
        Ok(Object::Collection(Collection::new(capacity, mode)?))
    }

    /// Get the kind tag of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Integer(_) => ObjectKind::Integer,
            Object::Float(_) => ObjectKind::Float,
            Object::Str(_) => ObjectKind::Str,
            Object::Collection(c) => match c.mode() {
                CollectionMode::List => ObjectKind::List,
                CollectionMode::Stack => ObjectKind::Stack,
            },
            Object::Vector(_) => ObjectKind::Vector,
        }
    }

    /// Element count: byte length for strings, item count for collections.
    /// Numbers and vectors have no length.
    pub fn length(&self) -> Result<usize, RuntimeError> {
        match self {
            Object::Str(s) => Ok(s.len()),
            Object::Collection(c) => Ok(c.len()),
            other => Err(RuntimeError::InvalidOperand {
                op: "length",
                kind: other.kind(),
            }),
        }
    }

    /// Structural equality.
    ///
    /// Objects of different kinds are never equal; there is no numeric
    /// promotion here. Floats compare exactly, with no epsilon. Collections
    /// compare by length and element-wise equality in order; capacity and
    /// mode are ignored. Vectors compare by dimension and element-wise
    /// coordinate equality.
    pub fn equals(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::Str(a), Object::Str(b)) => a == b,
            (Object::Collection(a), Object::Collection(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Object::Vector(a), Object::Vector(b)) => a.coords() == b.coords(),
            _ => false,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Object::equals(self, other)
    }
}

impl fmt::Display for Object {
    /// The canonical text rendering:
    /// integers in decimal, floats with six decimal places, strings raw,
    /// collections as `[e0, e1]`, vectors as `<c0,c1>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::Float(x) => write!(f, "{:.6}", x),
            Object::Str(s) => f.write_str(s),
            Object::Collection(c) => {
                write!(f, "[")?;
                for (i, item) in c.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Object::Vector(v) => {
                write!(f, "<")?;
                for (i, c) in v.coords().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{:.6}", c)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Fixed-dimension float coordinates.
///
/// The dimension is set at construction and never changes; there is no
/// resize operation. Cloning copies the coordinate buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    coords: Box<[f32]>,
}

impl Vector {
    /// Create a vector from its coordinates. Fails on zero dimension.
    pub fn new(coords: Vec<f32>) -> Result<Self, RuntimeError> {
        if coords.is_empty() {
            return Err(RuntimeError::InvalidArgument(
                "vector dimension must be nonzero",
            ));
        }
        Ok(Vector {
            coords: coords.into_boxed_slice(),
        })
    }

    /// Number of coordinates.
    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    /// Read access to the coordinates.
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }
}
