//! Polymorphic operators over [`Object`] values.
//!
//! Dispatch is on the left operand's kind first, then the right's.
//! Unsupported pairs fail with `IncompatibleKinds`.
//!
//! Ownership follows the operator table: `add` and `subtract` take their
//! operands by value because their collection rows consume them (list
//! concatenation moves elements, stack subtraction mutates the left stack
//! in place), so a spent operand cannot be touched again. `multiply` and
//! `divide` only borrow; list repetition hands back deep clones and leaves
//! the original untouched.

use super::collection::{Collection, CollectionMode};
use super::value::{Object, Vector};
use super::RuntimeError;

/// Add two objects.
///
/// Numbers add with promotion to float when either side is a float.
/// Strings concatenate into a new string. Two lists merge by moving every
/// element of the left operand, then the right, into a fresh list; both
/// operands are consumed. A vector accepts a number (broadcast over every
/// coordinate) or an equal-dimension vector (element-wise).
pub fn add(lhs: Object, rhs: Object) -> Result<Object, RuntimeError> {
    match (lhs, rhs) {
        (Object::Integer(a), Object::Integer(b)) => Ok(Object::Integer(a.wrapping_add(b))),
        (Object::Integer(a), Object::Float(b)) => Ok(Object::Float(a as f32 + b)),
        (Object::Float(a), Object::Integer(b)) => Ok(Object::Float(a + b as f32)),
        (Object::Float(a), Object::Float(b)) => Ok(Object::Float(a + b)),
        (Object::Str(a), Object::Str(b)) => Ok(Object::Str(format!("{}{}", a, b))),
        (Object::Collection(a), Object::Collection(b))
            if a.mode() == CollectionMode::List && b.mode() == CollectionMode::List =>
        {
            // Merge by moving the element handles; nothing is cloned. The
            // drained shells are dropped empty, so the moved elements have
            // exactly one owner: the merged list.
            let total = a.len() + b.len();
            let mut merged = Collection::new(total.max(1), CollectionMode::List)?;
            for item in a.into_items() {
                merged.append(item);
            }
            for item in b.into_items() {
                merged.append(item);
            }
            Ok(Object::Collection(merged))
        }
        (Object::Vector(a), Object::Integer(b)) => vector_scalar(&a, b as f32, |x, s| x + s),
        (Object::Vector(a), Object::Float(b)) => vector_scalar(&a, b, |x, s| x + s),
        (Object::Vector(a), Object::Vector(b)) => vector_pairwise(&a, &b, |x, y| x + y),
        (lhs, rhs) => Err(incompatible("add", &lhs, &rhs)),
    }
}

/// Subtract the right object from the left.
///
/// Numbers subtract with float promotion. Two stacks perform a checked
/// suffix pop: the right stack, read front to back, must match the left
/// stack top-down; on a full match those items are popped (and dropped)
/// and the left stack is returned, mutated in place. Vectors accept a
/// number or an equal-dimension vector.
pub fn subtract(lhs: Object, rhs: Object) -> Result<Object, RuntimeError> {
    match (lhs, rhs) {
        (Object::Integer(a), Object::Integer(b)) => Ok(Object::Integer(a.wrapping_sub(b))),
        (Object::Integer(a), Object::Float(b)) => Ok(Object::Float(a as f32 - b)),
        (Object::Float(a), Object::Integer(b)) => Ok(Object::Float(a - b as f32)),
        (Object::Float(a), Object::Float(b)) => Ok(Object::Float(a - b)),
        (Object::Collection(mut a), Object::Collection(b))
            if a.mode() == CollectionMode::Stack && b.mode() == CollectionMode::Stack =>
        {
            a.remove_suffix(&b)?;
            Ok(Object::Collection(a))
        }
        (Object::Vector(a), Object::Integer(b)) => vector_scalar(&a, b as f32, |x, s| x - s),
        (Object::Vector(a), Object::Float(b)) => vector_scalar(&a, b, |x, s| x - s),
        (Object::Vector(a), Object::Vector(b)) => vector_pairwise(&a, &b, |x, y| x - y),
        (lhs, rhs) => Err(incompatible("subtract", &lhs, &rhs)),
    }
}

/// Multiply two objects.
///
/// Numbers multiply with float promotion. A string times a positive
/// integer repeats it. A list times a positive integer builds a new list
/// holding that many deep clones of the elements, cycled in order; the
/// original list is not consumed and shares nothing with the result.
/// Vectors accept a number or an equal-dimension vector.
pub fn multiply(lhs: &Object, rhs: &Object) -> Result<Object, RuntimeError> {
    match (lhs, rhs) {
        (Object::Integer(a), Object::Integer(b)) => Ok(Object::Integer(a.wrapping_mul(*b))),
        (Object::Integer(a), Object::Float(b)) => Ok(Object::Float(*a as f32 * b)),
        (Object::Float(a), Object::Integer(b)) => Ok(Object::Float(a * *b as f32)),
        (Object::Float(a), Object::Float(b)) => Ok(Object::Float(a * b)),
        (Object::Str(s), Object::Integer(n)) => {
            if *n <= 0 {
                return Err(RuntimeError::InvalidArgument(
                    "repeat count must be positive",
                ));
            }
            Ok(Object::Str(s.repeat(*n as usize)))
        }
        (Object::Collection(c), Object::Integer(n)) if c.mode() == CollectionMode::List => {
            if *n <= 0 {
                return Err(RuntimeError::InvalidArgument(
                    "repeat count must be positive",
                ));
            }
            let n = *n as usize;
            let mut repeated = Collection::new((c.len() * n).max(1), CollectionMode::List)?;
            for _ in 0..n {
                for item in c.iter() {
                    repeated.append(item.clone());
                }
            }
            Ok(Object::Collection(repeated))
        }
        (Object::Vector(a), Object::Integer(b)) => vector_scalar(a, *b as f32, |x, s| x * s),
        (Object::Vector(a), Object::Float(b)) => vector_scalar(a, *b, |x, s| x * s),
        (Object::Vector(a), Object::Vector(b)) => vector_pairwise(a, b, |x, y| x * y),
        (lhs, rhs) => Err(incompatible("multiply", lhs, rhs)),
    }
}

/// Divide the left object by the right.
///
/// Numbers divide with float promotion; a zero divisor fails. Integer by
/// integer stays integral (truncating). A vector divides by a nonzero
/// number (broadcast) or by an equal-dimension vector in which every
/// coordinate is nonzero.
pub fn divide(lhs: &Object, rhs: &Object) -> Result<Object, RuntimeError> {
    match (lhs, rhs) {
        (Object::Integer(a), Object::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Object::Integer(a.wrapping_div(*b)))
        }
        (Object::Integer(a), Object::Float(b)) => {
            if *b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Object::Float(*a as f32 / b))
        }
        (Object::Float(a), Object::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Object::Float(a / *b as f32))
        }
        (Object::Float(a), Object::Float(b)) => {
            if *b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Object::Float(a / b))
        }
        (Object::Vector(a), Object::Integer(b)) => {
            if *b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            vector_scalar(a, *b as f32, |x, s| x / s)
        }
        (Object::Vector(a), Object::Float(b)) => {
            if *b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            vector_scalar(a, *b, |x, s| x / s)
        }
        (Object::Vector(a), Object::Vector(b)) => {
            if b.coords().iter().any(|c| *c == 0.0) {
                return Err(RuntimeError::DivisionByZero);
            }
            vector_pairwise(a, b, |x, y| x / y)
        }
        (lhs, rhs) => Err(incompatible("divide", lhs, rhs)),
    }
}

/// Apply `op` between every coordinate and a scalar, producing a new vector.
fn vector_scalar(v: &Vector, s: f32, op: fn(f32, f32) -> f32) -> Result<Object, RuntimeError> {
    let coords = v.coords().iter().map(|c| op(*c, s)).collect();
    Ok(Object::Vector(Vector::new(coords)?))
}

/// Apply `op` coordinate-by-coordinate between two equal-dimension vectors.
fn vector_pairwise(a: &Vector, b: &Vector, op: fn(f32, f32) -> f32) -> Result<Object, RuntimeError> {
    if a.dims() != b.dims() {
        return Err(RuntimeError::DimensionMismatch {
            lhs: a.dims(),
            rhs: b.dims(),
        });
    }
    let coords = a
        .coords()
        .iter()
        .zip(b.coords())
        .map(|(x, y)| op(*x, *y))
        .collect();
    Ok(Object::Vector(Vector::new(coords)?))
}

fn incompatible(op: &'static str, lhs: &Object, rhs: &Object) -> RuntimeError {
    RuntimeError::IncompatibleKinds {
        op,
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    }
}
