//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The type of a tensor value, along with what is statically known about
/// whether it is an autograd zero.
///
/// `autograd_zero` is an annotation produced by whatever profiled or inferred
/// the type: `Some(true)` asserts the value is a structural zero, `Some(false)`
/// asserts that it isn't, and `None` means nothing was recorded.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct TensorType {
    autograd_zero: Option<bool>,
}

impl TensorType {
    /// A tensor with no zero-ness annotation.
    pub const fn unannotated() -> Self {
        Self {
            autograd_zero: None,
        }
    }

    /// A tensor annotated as a structural zero (`zero == true`) or as
    /// definitely not one.
    pub const fn annotated(zero: bool) -> Self {
        Self {
            autograd_zero: Some(zero),
        }
    }

    /// Gets the zero-ness annotation, if there is one.
    pub fn autograd_zero(self) -> Option<bool> {
        self.autograd_zero
    }
}

/// The type of a value in the IR.
///
/// Types only exist to say what a value is "shaped like", the pass that
/// cares about them mostly needs to know whether a value is a tensor (or
/// a list of tensors) and what was recorded about its zero-ness.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// `tensor`, `tensor(zero)` or `tensor(nonzero)`
    Tensor(TensorType),
    /// `tensor[]`
    TensorList,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `int[]`
    IntList,
    /// `none`
    None,
}

impl Type {
    /// An unannotated `tensor`.
    pub const fn tensor() -> Self {
        Self::Tensor(TensorType::unannotated())
    }

    /// `tensor(zero)`
    pub const fn zero_tensor() -> Self {
        Self::Tensor(TensorType::annotated(true))
    }

    /// `tensor(nonzero)`
    pub const fn nonzero_tensor() -> Self {
        Self::Tensor(TensorType::annotated(false))
    }

    /// Gets the tensor type if this is a tensor.
    pub fn as_tensor(self) -> Option<TensorType> {
        match self {
            Self::Tensor(tt) => Some(tt),
            _ => None,
        }
    }

    /// Checks if `self` is a tensor of any kind.
    pub fn is_tensor(self) -> bool {
        self.as_tensor().is_some()
    }

    /// Checks if every value of type `self` is also a valid value of `other`.
    ///
    /// An annotated tensor is a subtype of the unannotated tensor, but two
    /// differently-annotated tensors are unrelated.
    pub fn is_subtype_of(self, other: Type) -> bool {
        match (self, other) {
            (Self::Tensor(lhs), Self::Tensor(rhs)) => {
                rhs.autograd_zero().is_none() || lhs.autograd_zero() == rhs.autograd_zero()
            }
            (lhs, rhs) => lhs == rhs,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tensor(tt) => match tt.autograd_zero() {
                None => write!(f, "tensor"),
                Some(true) => write!(f, "tensor(zero)"),
                Some(false) => write!(f, "tensor(nonzero)"),
            },
            Self::TensorList => write!(f, "tensor[]"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::IntList => write!(f, "int[]"),
            Self::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotated_tensors_are_tensors() {
        assert!(Type::zero_tensor().is_subtype_of(Type::tensor()));
        assert!(Type::nonzero_tensor().is_subtype_of(Type::tensor()));
        assert!(Type::tensor().is_subtype_of(Type::tensor()));
        assert!(!Type::zero_tensor().is_subtype_of(Type::nonzero_tensor()));
        assert!(!Type::tensor().is_subtype_of(Type::zero_tensor()));
    }

    #[test]
    fn non_tensors_only_match_themselves() {
        assert!(Type::TensorList.is_subtype_of(Type::TensorList));
        assert!(!Type::IntList.is_subtype_of(Type::TensorList));
        assert!(!Type::Int.is_subtype_of(Type::tensor()));
        assert_eq!(Type::Float.as_tensor(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Type::tensor().to_string(), "tensor");
        assert_eq!(Type::zero_tensor().to_string(), "tensor(zero)");
        assert_eq!(Type::nonzero_tensor().to_string(), "tensor(nonzero)");
        assert_eq!(Type::TensorList.to_string(), "tensor[]");
        assert_eq!(Type::IntList.to_string(), "int[]");
    }
}
