//! Typed indices for mesh elements.
//!
//! Vertices, half-edges and faces are addressed by distinct newtypes over
//! `u32`, so a face index can never be passed where a vertex is expected.
//! `u32::MAX` is reserved as the null index.

use std::fmt::{self, Debug};

const NULL: u32 = u32::MAX;

/// A vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A half-edge index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

/// A face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create an index from a position in the element array.
            ///
            /// # Panics
            /// Panics in debug builds if `index` does not fit below the null value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < NULL as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// The null index.
            #[inline]
            pub const fn invalid() -> Self {
                Self(NULL)
            }

            /// Position in the element array.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Whether this index refers to an element.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != NULL
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "HE");
impl_index_type!(FaceId, "F");
