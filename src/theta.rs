//! Angular (theta) nodal value adjustment for bases whose xi1 runs around
//! an axis, as in cylindrical or prolate spheroidal coordinates.
//!
//! Nodal theta values are stored in `[0, 2pi)` and need a `+-2pi` shift
//! before interpolation so that consecutive nodes along xi1 follow the
//! requested direction around the axis.

use crate::basis::Basis;
use crate::basis_error::BasisError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

const TWO_PI: f64 = 2.0 * PI;

/// How consecutive theta values along xi1 are made consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyThetaMode {
    /// Shift by `2pi` whenever neighbours are more than `pi` apart.
    ClosestInXi1,
    /// Each value strictly below the previous one.
    DecreasingInXi1,
    /// Each value strictly above the previous one.
    IncreasingInXi1,
    NonDecreasingInXi1,
    NonIncreasingInXi1,
}

impl ModifyThetaMode {
    pub const ALL: [ModifyThetaMode; 5] = [
        ModifyThetaMode::ClosestInXi1,
        ModifyThetaMode::DecreasingInXi1,
        ModifyThetaMode::IncreasingInXi1,
        ModifyThetaMode::NonDecreasingInXi1,
        ModifyThetaMode::NonIncreasingInXi1,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModifyThetaMode::ClosestInXi1 => "closest in xi1",
            ModifyThetaMode::DecreasingInXi1 => "decreasing in xi1",
            ModifyThetaMode::IncreasingInXi1 => "increasing in xi1",
            ModifyThetaMode::NonDecreasingInXi1 => "non-decreasing in xi1",
            ModifyThetaMode::NonIncreasingInXi1 => "non-increasing in xi1",
        }
    }

    fn adjust(self, last: f64, theta: &mut f64) {
        match self {
            ModifyThetaMode::ClosestInXi1 => {
                if last < *theta - PI {
                    *theta -= TWO_PI;
                } else if last > *theta + PI {
                    *theta += TWO_PI;
                }
            }
            ModifyThetaMode::DecreasingInXi1 => {
                if last <= *theta {
                    *theta -= TWO_PI;
                }
            }
            ModifyThetaMode::IncreasingInXi1 => {
                if last >= *theta {
                    *theta += TWO_PI;
                }
            }
            ModifyThetaMode::NonDecreasingInXi1 => {
                if last > *theta {
                    *theta += TWO_PI;
                }
            }
            ModifyThetaMode::NonIncreasingInXi1 => {
                if last < *theta {
                    *theta -= TWO_PI;
                }
            }
        }
    }
}

impl fmt::Display for ModifyThetaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModifyThetaMode {
    type Err = BasisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == trimmed)
            .ok_or_else(|| BasisError::invalid_type(format!("unknown theta mode '{trimmed}'")))
    }
}

/// Offset applied to the first node of the next row (or layer) so it stays
/// within `pi` of the first node of the current one.
fn row_offset(last: f64, theta: &mut f64) -> f64 {
    let offset = if *theta > last + PI {
        -TWO_PI
    } else if *theta < last - PI {
        TWO_PI
    } else {
        0.0
    };
    *theta += offset;
    offset
}

impl Basis {
    /// Adjust the theta nodal values in `values` (one entry per nodal
    /// function, derivatives included) according to `mode`.
    ///
    /// When all values on an xi3 or xi2 boundary plane are zero the plane is
    /// taken to lie on the axis and receives the theta values of the
    /// adjacent row of nodes first. Only tensor product bases are
    /// supported; derivative entries are left untouched.
    pub fn modify_theta_in_xi1(
        &self,
        mode: ModifyThetaMode,
        values: &mut [f64],
    ) -> Result<(), BasisError> {
        let basis_type = self.basis_type();
        if !basis_type.is_tensor_product() {
            return Err(BasisError::unsupported_operation(format!(
                "theta modification of non tensor product basis {basis_type}"
            )));
        }
        if values.len() < self.number_of_functions() {
            return Err(BasisError::DimensionMismatch {
                expected: self.number_of_functions(),
                found: values.len(),
            });
        }
        let mut nodes_in = [1usize; 3];
        for (xi, nodes) in nodes_in.iter_mut().enumerate().take(self.dimension()) {
            let family = basis_type.function_type(xi)?;
            *nodes = family.nodes_in_xi().ok_or_else(|| {
                BasisError::unsupported_operation(format!(
                    "theta modification of {family} on xi{}",
                    xi + 1
                ))
            })?;
        }
        let [n1, n2, n3] = nodes_in;
        if n1 * n2 * n3 != self.node_count() {
            return Err(BasisError::unsupported_operation(format!(
                "{basis_type} has {} nodes, expected a {n1}x{n2}x{n3} grid",
                self.node_count()
            )));
        }

        let derivatives = self.function_derivatives();
        let mut node_values = Vec::with_capacity(n1 * n2 * n3);
        let mut on_axis_xi2_0 = n2 > 1;
        let mut on_axis_xi2_1 = on_axis_xi2_0;
        let mut on_axis_xi3_0 = n3 > 1;
        let mut on_axis_xi3_1 = on_axis_xi3_0;
        let mut index = 0;
        for k in 0..n3 {
            for j in 0..n2 {
                for _ in 0..n1 {
                    node_values.push(index);
                    let zero = values[index] == 0.0;
                    if j == 0 {
                        on_axis_xi2_0 &= zero;
                    } else if j == n2 - 1 {
                        on_axis_xi2_1 &= zero;
                    }
                    if k == 0 {
                        on_axis_xi3_0 &= zero;
                    } else if k == n3 - 1 {
                        on_axis_xi3_1 &= zero;
                    }
                    index += 1;
                    while index < derivatives.len() && derivatives[index] != 0 {
                        index += 1;
                    }
                }
            }
        }
        let node = |i: usize, j: usize, k: usize| node_values[(k * n2 + j) * n1 + i];
        // (destination, source) value indexes
        let mut copies = Vec::new();
        if on_axis_xi3_0 {
            log::trace!("theta: xi3 = 0 plane lies on the axis");
            for j in 0..n2 {
                copies.extend((0..n1).map(|i| (node(i, j, 0), node(i, j, 1))));
            }
        } else if on_axis_xi3_1 {
            log::trace!("theta: xi3 = 1 plane lies on the axis");
            for j in 0..n2 {
                copies.extend((0..n1).map(|i| (node(i, j, n3 - 1), node(i, j, n3 - 2))));
            }
        } else if on_axis_xi2_0 {
            log::trace!("theta: xi2 = 0 plane lies on the axis");
            for k in 0..n3 {
                copies.extend((0..n1).map(|i| (node(i, 0, k), node(i, 1, k))));
            }
        } else if on_axis_xi2_1 {
            log::trace!("theta: xi2 = 1 plane lies on the axis");
            for k in 0..n3 {
                copies.extend((0..n1).map(|i| (node(i, n2 - 1, k), node(i, n2 - 2, k))));
            }
        }
        for (to, from) in copies {
            values[to] = values[from];
        }

        // walk nodes in order; value entries start each node's run
        let mut theta = 0;
        let mut local_node = 0;
        let mut offset_xi2 = 0.0;
        let mut offset_xi3 = 0.0;
        for k in (0..n3).rev() {
            let last_xi3 = values[theta];
            for j in (0..n2).rev() {
                let last_xi2 = values[theta];
                for _ in 1..n1 {
                    let last_xi1 = values[theta];
                    theta += self.functions_per_node(local_node)?;
                    local_node += 1;
                    let value = &mut values[theta];
                    *value += offset_xi2 + offset_xi3;
                    mode.adjust(last_xi1, value);
                }
                theta += self.functions_per_node(local_node)?;
                local_node += 1;
                if j != 0 {
                    offset_xi2 = row_offset(last_xi2, &mut values[theta]);
                }
            }
            if k != 0 {
                offset_xi2 = 0.0;
                offset_xi3 = row_offset(last_xi3, &mut values[theta]);
            }
        }
        Ok(())
    }
}
