//! Blending-matrix construction.
//!
//! Linkage groups are visited in order of their first coordinate. Each one
//! contributes a fixed table (see [`tables`]) that is Kronecker-multiplied
//! onto the running matrix, so after the scan the standard functions are
//! laid out in scan order. A tied group whose coordinates are not adjacent
//! leaves that order different from xi order; the columns and arguments are
//! then permuted so that xi_1 varies fastest. Finally the rows are sorted by
//! node (xi_N slowest) and derivative label and grouped into local nodes.

pub(crate) mod tables;
pub(crate) mod tensor;

use crate::basis_error::BasisError;
use crate::basis_type::{BasisType, LinkedGroup};
use crate::standard::polygon::PackedArgument;
use crate::standard::{StandardBasis, StandardBasisFunction};
use itertools::Itertools;
use tables::UnitTable;
use tensor::FunctionLabel;

/// Output of [`construct`], ready to be frozen into a
/// [`Basis`](crate::basis::Basis).
#[derive(Clone, Debug)]
pub(crate) struct Blending {
    pub number_of_functions: usize,
    pub number_of_standard_functions: usize,
    /// `functions x standard functions`, row-major.
    pub matrix: Vec<f64>,
    pub column_sizes: Vec<usize>,
    pub function_nodes: Vec<usize>,
    pub function_derivatives: Vec<u32>,
    pub standard_basis: StandardBasis,
}

/// Accumulates the tensor product one linkage group at a time.
struct BlendingBuilder {
    dimension: usize,
    functions: usize,
    standard: usize,
    matrix: Vec<f64>,
    labels: Vec<FunctionLabel>,
    /// Xi of each scan position.
    scan: Vec<usize>,
    /// Packed argument of each scan position.
    arguments: Vec<PackedArgument>,
    polygon: bool,
}

impl BlendingBuilder {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            functions: 1,
            standard: 1,
            matrix: vec![1.0],
            labels: vec![FunctionLabel::default()],
            scan: Vec::with_capacity(dimension),
            arguments: Vec::with_capacity(dimension),
            polygon: false,
        }
    }

    fn push(
        &mut self,
        table: &UnitTable,
        xis: &[usize],
        arguments: &[PackedArgument],
    ) -> Result<(), BasisError> {
        self.matrix = tensor::kronecker(
            &table.matrix,
            (table.functions, table.standard),
            &self.matrix,
            (self.functions, self.standard),
        )?;
        self.labels = tensor::splice_labels(&table.labels, xis, &self.labels);
        self.functions *= table.functions;
        self.standard *= table.standard;
        self.scan.extend_from_slice(xis);
        self.arguments.extend_from_slice(arguments);
        Ok(())
    }

    fn push_group(&mut self, group: &LinkedGroup) -> Result<(), BasisError> {
        match group {
            LinkedGroup::Single { xi, family } => {
                let table = tables::single(*family).ok_or_else(|| {
                    BasisError::invalid_type(format!("{family:?} cannot stand alone on xi{}", xi + 1))
                })?;
                let order = PackedArgument::Order(tables::single_order(*family));
                self.push(table, &[*xi], &[order])
            }
            LinkedGroup::Tied { family, xis } => {
                let table = tables::tied(*family, xis.len()).ok_or_else(|| {
                    BasisError::invalid_type(format!(
                        "{family:?} over {} coordinates is not supported",
                        xis.len()
                    ))
                })?;
                let order = PackedArgument::Order(tables::single_order(*family));
                self.push(table, xis, &vec![order; xis.len()])
            }
            LinkedGroup::Polygon {
                circumferential,
                radial,
                vertices,
            } => {
                self.polygon = true;
                let table = tables::polygon(*vertices)?;
                // radial follows directly in scan order; fixed up after reordering
                self.push(
                    &table,
                    &[*circumferential, *radial],
                    &[
                        PackedArgument::Circumferential { offset: 1 },
                        PackedArgument::Radial {
                            vertices: *vertices,
                        },
                    ],
                )
            }
        }
    }

    fn radices(&self) -> Vec<usize> {
        self.arguments
            .iter()
            .enumerate()
            .map(|(p, argument)| match *argument {
                PackedArgument::Order(order) => order + 1,
                PackedArgument::Circumferential { offset } => match self.arguments[p + offset] {
                    PackedArgument::Radial { vertices } => 4 * vertices,
                    _ => 1,
                },
                PackedArgument::Radial { .. } => 1,
            })
            .collect()
    }

    /// Put columns and arguments into xi order.
    fn reorder_columns(&mut self) -> Result<(), BasisError> {
        if self.scan.iter().copied().eq(0..self.dimension) {
            return Ok(());
        }
        log::trace!("reordering standard functions from scan order {:?}", self.scan);
        let permutation = tensor::column_permutation(&self.scan, &self.radices());
        self.matrix =
            tensor::permute_columns(&self.matrix, self.functions, self.standard, &permutation)?;
        let mut reordered = vec![PackedArgument::Order(0); self.dimension];
        for (p, &xi) in self.scan.iter().enumerate() {
            reordered[xi] = match self.arguments[p] {
                PackedArgument::Circumferential { offset } => PackedArgument::Circumferential {
                    offset: self.scan[p + offset] - xi,
                },
                other => other,
            };
        }
        self.arguments = reordered;
        self.scan = (0..self.dimension).collect();
        Ok(())
    }

    fn finish(mut self) -> Result<Blending, BasisError> {
        self.reorder_columns()?;
        let dimension = self.dimension;
        let order: Vec<usize> = (0..self.functions)
            .sorted_by_cached_key(|&f| self.labels[f].sort_key(dimension))
            .collect();

        let standard = self.standard;
        let mut matrix = crate::basis_error::try_zeroed(self.functions * standard, "blending matrix")?;
        let mut function_nodes = Vec::with_capacity(self.functions);
        let mut function_derivatives = Vec::with_capacity(self.functions);
        let mut node = 0;
        let mut previous: Option<&FunctionLabel> = None;
        for (row, &f) in order.iter().enumerate() {
            matrix[row * standard..(row + 1) * standard]
                .copy_from_slice(&self.matrix[f * standard..(f + 1) * standard]);
            let label = &self.labels[f];
            if previous.is_some_and(|p| p.node[..dimension] != label.node[..dimension]) {
                node += 1;
            }
            function_nodes.push(node);
            function_derivatives.push(label.derivative_mask());
            previous = Some(label);
        }

        let column_sizes = (0..standard)
            .map(|s| {
                (0..self.functions)
                    .rev()
                    .find(|&f| matrix[f * standard + s] != 0.0)
                    .map_or(0, |f| f + 1)
            })
            .collect();

        let function = if self.polygon {
            StandardBasisFunction::Polygon
        } else {
            StandardBasisFunction::Monomial
        };
        let mut arguments = Vec::with_capacity(dimension + 1);
        arguments.push(dimension as i32);
        for argument in &self.arguments {
            arguments.push(argument.encode(dimension)?);
        }
        let standard_basis = StandardBasis::new(function, arguments)?;
        if standard_basis.number_of_functions() != standard {
            return Err(BasisError::invalid_type(format!(
                "standard basis has {} functions, blending matrix {standard} columns",
                standard_basis.number_of_functions()
            )));
        }
        Ok(Blending {
            number_of_functions: self.functions,
            number_of_standard_functions: standard,
            matrix,
            column_sizes,
            function_nodes,
            function_derivatives,
            standard_basis,
        })
    }
}

/// Build the blending matrix and function metadata for `basis_type`.
pub(crate) fn construct(basis_type: &BasisType) -> Result<Blending, BasisError> {
    let mut builder = BlendingBuilder::new(basis_type.dimension());
    for group in basis_type.linked_groups() {
        builder.push_group(group)?;
    }
    if builder.scan.len() != basis_type.dimension() {
        return Err(BasisError::invalid_type(format!(
            "{basis_type} covers {} of {} coordinates",
            builder.scan.len(),
            basis_type.dimension()
        )));
    }
    let blending = builder.finish()?;
    log::debug!(
        "constructed basis {basis_type}: {} functions over {} standard functions",
        blending.number_of_functions,
        blending.number_of_standard_functions
    );
    Ok(blending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(description: &str) -> Blending {
        construct(&description.parse().unwrap()).unwrap()
    }

    #[test]
    fn hermite_by_linear_sizes() {
        let b = build("c.Hermite*l.Lagrange");
        assert_eq!(b.number_of_functions, 8);
        assert_eq!(b.number_of_standard_functions, 8);
        assert_eq!(b.standard_basis.arguments(), &[2, 3, 1]);
        assert_eq!(b.function_nodes, vec![0, 0, 1, 1, 2, 2, 3, 3]);
        assert_eq!(b.function_derivatives, vec![0, 1, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn triangle() {
        let b = build("l.simplex(2)*l.simplex");
        assert_eq!(b.number_of_functions, 3);
        assert_eq!(b.matrix, vec![1.0, -1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(b.column_sizes, vec![1, 2, 3, 0]);
    }

    #[test]
    fn separated_simplex_is_reordered() {
        // simplex on xi1/xi3 with quadratic Lagrange on xi2
        let b = build("l.simplex(3)*q.Lagrange*l.simplex");
        assert_eq!(b.number_of_functions, 9);
        assert_eq!(b.number_of_standard_functions, 12);
        assert_eq!(b.standard_basis.arguments(), &[3, 1, 2, 1]);
        // first node is the origin: (1 - x - z) * (1 - 3y + 2y^2)
        // columns are i + 2j + 6k for x^i y^j z^k
        let row0 = &b.matrix[..12];
        assert_eq!(row0[0], 1.0);
        assert_eq!(row0[1], -1.0);
        assert_eq!(row0[2], -3.0);
        assert_eq!(row0[4], 2.0);
        assert_eq!(row0[6], -1.0);
        assert_eq!(row0[8], 3.0);
        assert_eq!(row0[10], -2.0);
    }

    #[test]
    fn polygon_arguments_point_at_radial_xi() {
        let b = build("polygon(5;3)*l.Lagrange*polygon");
        assert_eq!(b.standard_basis.function(), StandardBasisFunction::Polygon);
        assert_eq!(b.number_of_functions, 12);
        assert_eq!(b.number_of_standard_functions, 40);
        let packed = b.standard_basis.packed_arguments();
        assert_eq!(packed[0], PackedArgument::Circumferential { offset: 2 });
        assert_eq!(packed[1], PackedArgument::Order(1));
        assert_eq!(packed[2], PackedArgument::Radial { vertices: 5 });
    }
}
