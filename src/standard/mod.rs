//! Standard basis functions: the raw function sets a blending matrix maps onto.
//!
//! A [`StandardBasis`] pairs one of the two function families with its
//! compact argument vector `[dimension, a_1, ..., a_dimension]`. For the
//! monomial family each `a_d` is the polynomial order in xi_d; the polygon
//! family additionally packs polygon coordinates as negative values (see
//! [`polygon::PackedArgument`]).

pub mod evaluation;
pub mod monomial;
pub mod polygon;

use crate::basis_error::{BasisError, try_zeroed};
use crate::config::MAXIMUM_ELEMENT_XI_DIMENSIONS;
use polygon::PackedArgument;
use serde::{Deserialize, Serialize};

/// The two standard function families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardBasisFunction {
    Monomial,
    Polygon,
}

/// A standard function family together with its argument vector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StandardBasis {
    function: StandardBasisFunction,
    arguments: Vec<i32>,
    number_of_functions: usize,
}

impl StandardBasis {
    /// Tensor-product monomials of the given orders, xi_1 varying fastest.
    pub fn monomial(orders: &[usize]) -> Result<Self, BasisError> {
        let mut arguments = Vec::with_capacity(orders.len() + 1);
        arguments.push(orders.len() as i32);
        for &order in orders {
            arguments.push(PackedArgument::Order(order).encode(orders.len())?);
        }
        Self::new(StandardBasisFunction::Monomial, arguments)
    }

    /// Validate an argument vector `[dimension, a_1, ...]` for `function`.
    pub fn new(function: StandardBasisFunction, arguments: Vec<i32>) -> Result<Self, BasisError> {
        let Some(&dimension) = arguments.first() else {
            return Err(BasisError::invalid_type("empty standard basis arguments"));
        };
        if dimension < 0
            || dimension as usize > MAXIMUM_ELEMENT_XI_DIMENSIONS
            || arguments.len() != dimension as usize + 1
        {
            return Err(BasisError::invalid_type(format!(
                "standard basis arguments {arguments:?} do not match their dimension"
            )));
        }
        let per_xi = &arguments[1..];
        let number_of_functions = match function {
            StandardBasisFunction::Monomial => {
                if per_xi.iter().any(|&a| a < 0) {
                    return Err(BasisError::invalid_type(
                        "monomial orders must be non-negative",
                    ));
                }
                monomial::count(per_xi.iter().map(|&a| a as usize))
            }
            StandardBasisFunction::Polygon => {
                polygon::validate(per_xi)?;
                polygon::count(per_xi)
            }
        }
        .ok_or_else(|| {
            BasisError::invalid_type(format!(
                "standard basis arguments {arguments:?} give too many functions"
            ))
        })?;
        Ok(Self {
            function,
            arguments,
            number_of_functions,
        })
    }

    #[inline]
    pub fn function(&self) -> StandardBasisFunction {
        self.function
    }

    /// Full argument vector including the leading dimension.
    #[inline]
    pub fn arguments(&self) -> &[i32] {
        &self.arguments
    }

    /// Per-coordinate arguments without the leading dimension.
    #[inline]
    pub fn xi_arguments(&self) -> &[i32] {
        &self.arguments[1..]
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.arguments.len() - 1
    }

    #[inline]
    pub fn number_of_functions(&self) -> usize {
        self.number_of_functions
    }

    /// Decoded per-coordinate arguments.
    pub fn packed_arguments(&self) -> Vec<PackedArgument> {
        let dimension = self.dimension();
        self.xi_arguments()
            .iter()
            .map(|&a| PackedArgument::decode(a, dimension))
            .collect()
    }

    /// Per-coordinate monomial orders, or `None` for the polygon family.
    pub fn monomial_orders(&self) -> Option<Vec<usize>> {
        match self.function {
            StandardBasisFunction::Monomial => {
                Some(self.xi_arguments().iter().map(|&a| a as usize).collect())
            }
            StandardBasisFunction::Polygon => None,
        }
    }

    /// Number of standard functions spanned by coordinate `xi` in the
    /// flattened index. The radial polygon coordinate spans 1 since its
    /// functions are carried by the circumferential one.
    pub fn radix(&self, xi: usize) -> usize {
        match PackedArgument::decode(self.xi_arguments()[xi], self.dimension()) {
            PackedArgument::Order(order) => order + 1,
            PackedArgument::Circumferential { offset } => {
                match PackedArgument::decode(self.xi_arguments()[xi + offset], self.dimension()) {
                    PackedArgument::Radial { vertices } => 4 * vertices,
                    _ => 1,
                }
            }
            PackedArgument::Radial { .. } => 1,
        }
    }

    fn check_xi(&self, xi: &[f64]) -> Result<(), BasisError> {
        if xi.len() != self.dimension() {
            return Err(BasisError::DimensionMismatch {
                expected: self.dimension(),
                found: xi.len(),
            });
        }
        Ok(())
    }

    /// Write the function values at `xi` into `values`, which must hold
    /// exactly [`number_of_functions`](Self::number_of_functions) entries.
    pub fn evaluate_into(&self, xi: &[f64], values: &mut [f64]) -> Result<(), BasisError> {
        self.check_xi(xi)?;
        if values.len() != self.number_of_functions {
            return Err(BasisError::DimensionMismatch {
                expected: self.number_of_functions,
                found: values.len(),
            });
        }
        match self.function {
            StandardBasisFunction::Monomial => {
                let orders: Vec<usize> = self.xi_arguments().iter().map(|&a| a as usize).collect();
                monomial::evaluate(&orders, xi, values);
            }
            StandardBasisFunction::Polygon => polygon::evaluate(self.xi_arguments(), xi, values),
        }
        Ok(())
    }

    /// Function values at `xi`.
    pub fn evaluate(&self, xi: &[f64]) -> Result<Vec<f64>, BasisError> {
        let mut values = try_zeroed(self.number_of_functions, "standard basis values")?;
        self.evaluate_into(xi, &mut values)?;
        Ok(values)
    }
}
