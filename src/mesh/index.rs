//! Identifier registry for mesh elements.
//!
//! Vertices and faces are named by type-safe keys. Keys are generic over the
//! underlying integer type so small meshes can use `u16` and massive ones `u64`.
//! A [`KeyRegistry`] hands out keys in increasing order and never reuses one,
//! so a key stays meaningful to the caller for as long as the element lives.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::error::{MeshError, Result};

/// Trait for types that can be used as mesh keys.
///
/// This trait is implemented for `u16`, `u32`, and `u64`.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// The maximum valid key value.
    const MAX: Self;

    /// Convert from usize, returning `None` if the value does not fit.
    fn try_from_usize(v: usize) -> Option<Self>;

    /// Convert to usize.
    fn to_usize(self) -> usize;
}

macro_rules! impl_mesh_index {
    ($ty:ty) => {
        impl MeshIndex for $ty {
            const MAX: Self = <$ty>::MAX - 1;

            #[inline]
            fn try_from_usize(v: usize) -> Option<Self> {
                <$ty>::try_from(v).ok().filter(|&k| k <= Self::MAX)
            }

            #[inline]
            fn to_usize(self) -> usize {
                self as usize
            }
        }
    };
}

impl_mesh_index!(u16);
impl_mesh_index!(u32);
impl_mesh_index!(u64);

/// A type-safe vertex key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexKey<I: MeshIndex = u32>(I);

/// A type-safe face key.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceKey<I: MeshIndex = u32>(I);

macro_rules! impl_key_type {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a key from a raw value.
            ///
            /// # Panics
            /// Panics if the value does not fit the key type.
            #[inline]
            pub fn new(key: usize) -> Self {
                match I::try_from_usize(key) {
                    Some(raw) => Self(raw),
                    None => panic!("key {} out of range for {}", key, stringify!($name)),
                }
            }

            /// Create a key from a raw value, or `None` if it does not fit.
            #[inline]
            pub fn try_new(key: usize) -> Option<Self> {
                I::try_from_usize(key).map(Self)
            }

            /// Get the key as a usize.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Get the raw value of the underlying type.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.index())
            }
        }

        impl<I: MeshIndex> Display for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.index())
            }
        }

        impl<I: MeshIndex> From<$name<I>> for usize {
            fn from(key: $name<I>) -> usize {
                key.index()
            }
        }
    };
}

impl_key_type!(VertexKey, "V");
impl_key_type!(FaceKey, "F");

/// Monotonic key allocator.
///
/// Generated keys are strictly increasing. Reserving an explicit key moves the
/// counter past it, so a later generated key can never collide with it.
#[derive(Debug, Clone)]
pub struct KeyRegistry<I: MeshIndex = u32> {
    next: usize,
    _marker: PhantomData<I>,
}

impl<I: MeshIndex> Default for KeyRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> KeyRegistry<I> {
    /// Create a registry whose first key is 0.
    pub fn new() -> Self {
        Self {
            next: 0,
            _marker: PhantomData,
        }
    }

    /// The key the next call to [`allocate`](Self::allocate) would return.
    #[inline]
    pub fn peek(&self) -> usize {
        self.next
    }

    /// Allocate a fresh key.
    pub fn allocate(&mut self) -> Result<I> {
        let raw = I::try_from_usize(self.next).ok_or_else(|| {
            MeshError::invalid_param("key", self.next, "key space of the index type is exhausted")
        })?;
        self.next += 1;
        Ok(raw)
    }

    /// Record an explicitly chosen key.
    pub fn reserve(&mut self, key: usize) -> Result<I> {
        let raw = I::try_from_usize(key)
            .ok_or_else(|| MeshError::invalid_param("key", key, "does not fit the index type"))?;
        self.next = self.next.max(key + 1);
        Ok(raw)
    }
}

impl<I: MeshIndex> KeyRegistry<I> {
    pub(crate) fn allocate_vertex(&mut self) -> Result<VertexKey<I>> {
        self.allocate().map(VertexKey)
    }

    pub(crate) fn reserve_vertex(&mut self, key: usize) -> Result<VertexKey<I>> {
        self.reserve(key).map(VertexKey)
    }

    pub(crate) fn allocate_face(&mut self) -> Result<FaceKey<I>> {
        self.allocate().map(FaceKey)
    }

    pub(crate) fn reserve_face(&mut self, key: usize) -> Result<FaceKey<I>> {
        self.reserve(key).map(FaceKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_key() {
        let v: VertexKey = VertexKey::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(usize::from(v), 42);
    }

    #[test]
    fn test_type_safety() {
        // Different types with the same raw value
        let v: VertexKey = VertexKey::new(0);
        let f: FaceKey = FaceKey::new(0);
        assert_eq!(v.index(), f.index());
    }

    #[test]
    fn test_small_keys() {
        let v: VertexKey<u16> = VertexKey::new(1000);
        assert_eq!(v.index(), 1000);
        assert!(VertexKey::<u16>::try_new(70_000).is_none());
        assert!(VertexKey::<u16>::try_new(u16::MAX as usize).is_none());
    }

    #[test]
    fn test_debug_format() {
        let v: VertexKey = VertexKey::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");
        assert_eq!(format!("{}", v), "42");
        let f: FaceKey = FaceKey::new(7);
        assert_eq!(format!("{:?}", f), "F(7)");
    }

    #[test]
    fn test_registry_is_monotonic() {
        let mut reg = KeyRegistry::<u32>::new();
        assert_eq!(reg.allocate().unwrap(), 0);
        assert_eq!(reg.allocate().unwrap(), 1);
        assert_eq!(reg.reserve(10).unwrap(), 10);
        assert_eq!(reg.allocate().unwrap(), 11);
        // Reserving below the counter does not move it back
        assert_eq!(reg.reserve(3).unwrap(), 3);
        assert_eq!(reg.peek(), 12);
    }

    #[test]
    fn test_registry_exhaustion() {
        let mut reg = KeyRegistry::<u16>::new();
        assert!(reg.reserve(u16::MAX as usize - 1).is_ok());
        assert!(reg.allocate().is_err());
    }
}
