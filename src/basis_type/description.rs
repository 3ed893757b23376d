//! Human-readable basis descriptions, e.g. `c.Hermite*l.simplex(3)*l.simplex`.
//!
//! Coordinates are separated by `*`. The first member of a tied simplex or
//! serendipity group lists its linked (1-based) coordinates in parentheses;
//! later members give just the family name. A polygon is written
//! `polygon(vertices;radial_xi)` on the circumferential coordinate and
//! plain `polygon` on the radial one.

use super::{BasisFunctionType, BasisType, NO_RELATION, entry_offset, type_array_len};
use crate::basis_error::BasisError;
use crate::config::{MAXIMUM_ELEMENT_XI_DIMENSIONS, MAXIMUM_POLYGON_VERTICES};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

// Prefixes are tried in order, so longer names sharing a prefix come first.
const NAMES: [(&str, BasisFunctionType); 11] = [
    ("c.HermiteSerendipity", BasisFunctionType::CubicHermiteSerendipity),
    ("c.Hermite", BasisFunctionType::CubicHermite),
    ("c.Lagrange", BasisFunctionType::CubicLagrange),
    ("constant", BasisFunctionType::Constant),
    ("HermiteLagrange", BasisFunctionType::HermiteLagrange),
    ("LagrangeHermite", BasisFunctionType::LagrangeHermite),
    ("l.Lagrange", BasisFunctionType::LinearLagrange),
    ("l.simplex", BasisFunctionType::LinearSimplex),
    ("polygon", BasisFunctionType::Polygon),
    ("q.Lagrange", BasisFunctionType::QuadraticLagrange),
    ("q.simplex", BasisFunctionType::QuadraticSimplex),
];

impl BasisFunctionType {
    /// Short name used in basis descriptions.
    pub fn description_name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, t)| *t == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for BasisFunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description_name())
    }
}

impl fmt::Display for BasisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dimension();
        for xi in 0..n {
            if xi > 0 {
                f.write_str("*")?;
            }
            let family = self.function_type(xi).map_err(|_| fmt::Error)?;
            f.write_str(family.description_name())?;
            // only the first member of a group carries links
            let first_member = (0..xi).all(|k| self.relation(k, xi) == NO_RELATION);
            let links: Vec<usize> = ((xi + 1)..n)
                .filter(|&j| self.relation(xi, j) != NO_RELATION)
                .collect();
            if !first_member || links.is_empty() {
                continue;
            }
            if family == BasisFunctionType::Polygon {
                write!(f, "({};{})", self.relation(xi, links[0]), links[0] + 1)?;
            } else {
                write!(f, "({})", links.iter().map(|j| j + 1).join(";"))?;
            }
        }
        Ok(())
    }
}

impl FromStr for BasisType {
    type Err = BasisError;

    fn from_str(description: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = description.split('*').collect();
        let n = tokens.len();
        if n > MAXIMUM_ELEMENT_XI_DIMENSIONS {
            return Err(BasisError::invalid_type(format!(
                "description '{description}' has {n} coordinates, at most {MAXIMUM_ELEMENT_XI_DIMENSIONS} supported"
            )));
        }
        let mut array = vec![NO_RELATION; type_array_len(n)];
        array[0] = n as i32;
        for (xi, token) in tokens.iter().enumerate() {
            let token = token.trim();
            let (name, family) = NAMES
                .iter()
                .find(|(name, _)| token.starts_with(name))
                .ok_or_else(|| {
                    BasisError::invalid_type(format!("unknown basis '{token}' for xi{}", xi + 1))
                })?;
            array[entry_offset(n, xi, xi)] = family.code();
            let rest = token[name.len()..].trim_start();
            if let Some(links) = rest.strip_prefix('(') {
                let Some(inner) = links.strip_suffix(')') else {
                    return Err(BasisError::invalid_type(format!(
                        "unterminated link list in '{token}'"
                    )));
                };
                let values = parse_links(inner)?;
                parse_link_list(&mut array, n, xi, *family, &values)?;
            } else if rest.is_empty() {
                copy_earlier_links(&mut array, n, xi, *family)?;
            } else {
                return Err(BasisError::invalid_type(format!(
                    "unexpected text '{rest}' after '{name}'"
                )));
            }
        }
        BasisType::from_array(&array)
    }
}

fn parse_links(inner: &str) -> Result<Vec<usize>, BasisError> {
    inner
        .split([';', ','])
        .map(|s| {
            s.trim().parse::<usize>().map_err(|_| {
                BasisError::invalid_type(format!("bad link value '{}'", s.trim()))
            })
        })
        .collect()
}

fn parse_link_list(
    array: &mut [i32],
    n: usize,
    xi: usize,
    family: BasisFunctionType,
    values: &[usize],
) -> Result<(), BasisError> {
    let later = |target: usize| -> Result<usize, BasisError> {
        if target <= xi + 1 || target > n {
            return Err(BasisError::invalid_type(format!(
                "xi{} cannot link to xi{target}",
                xi + 1
            )));
        }
        Ok(target - 1)
    };
    match family {
        BasisFunctionType::Polygon => {
            let [vertices, radial] = values[..] else {
                return Err(BasisError::invalid_type(
                    "polygon links must be (vertices;xi)",
                ));
            };
            if !(3..=MAXIMUM_POLYGON_VERTICES).contains(&vertices) {
                return Err(BasisError::invalid_type(format!(
                    "polygon needs 3 to {MAXIMUM_POLYGON_VERTICES} vertices, got {vertices}"
                )));
            }
            let radial = later(radial)?;
            array[entry_offset(n, xi, radial)] = vertices as i32;
        }
        f if f.is_simplex_like() => {
            let mut previous = xi;
            for &target in values {
                let j = later(target)?;
                if j <= previous {
                    return Err(BasisError::invalid_type(
                        "linked coordinates must be listed in increasing order",
                    ));
                }
                array[entry_offset(n, xi, j)] = 1;
                previous = j;
            }
        }
        f => {
            return Err(BasisError::invalid_type(format!(
                "{f} on xi{} takes no links",
                xi + 1
            )));
        }
    }
    Ok(())
}

/// A later group member repeats the first member's links to coordinates after it.
fn copy_earlier_links(
    array: &mut [i32],
    n: usize,
    xi: usize,
    family: BasisFunctionType,
) -> Result<(), BasisError> {
    if !(family.is_simplex_like() || family == BasisFunctionType::Polygon) {
        return Ok(());
    }
    let Some(first) = (0..xi).find(|&k| array[entry_offset(n, k, xi)] != NO_RELATION) else {
        return Err(BasisError::invalid_type(format!(
            "{family} on xi{} is not linked from an earlier coordinate",
            xi + 1
        )));
    };
    if array[entry_offset(n, first, first)] != family.code() {
        return Err(BasisError::invalid_type(format!(
            "xi{} is linked to xi{} of a different family",
            xi + 1,
            first + 1
        )));
    }
    if family.is_simplex_like() {
        for j in (xi + 1)..n {
            array[entry_offset(n, xi, j)] = array[entry_offset(n, first, j)];
        }
    }
    Ok(())
}
