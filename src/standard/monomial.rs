//! Tensor-product monomials `xi_1^k_1 * ... * xi_n^k_n`, xi_1 varying fastest.

/// Append the powers `xi^1..=xi^order` of one coordinate to the `count`
/// values already at the front of `values`. Returns the new count.
pub(crate) fn extend_with_powers(values: &mut [f64], count: usize, xi: f64, order: usize) -> usize {
    let mut power = xi;
    for p in 1..=order {
        let (head, tail) = values.split_at_mut(p * count);
        for (dst, src) in tail[..count].iter_mut().zip(&head[..count]) {
            *dst = src * power;
        }
        power *= xi;
    }
    count * (order + 1)
}

/// Number of monomials for the given per-coordinate orders, `None` on
/// overflow.
pub(crate) fn count(orders: impl IntoIterator<Item = usize>) -> Option<usize> {
    orders
        .into_iter()
        .try_fold(1usize, |n, o| n.checked_mul(o.checked_add(1)?))
}

/// Write all monomial values at `xi` into `values` (length [`count`]).
pub(crate) fn evaluate(orders: &[usize], xi: &[f64], values: &mut [f64]) {
    values[0] = 1.0;
    let mut n = 1;
    for (&order, &x) in orders.iter().zip(xi) {
        n = extend_with_powers(values, n, x, order);
    }
}

/// Stride of coordinate `d` in the flattened monomial index.
pub(crate) fn stride(orders: &[usize], d: usize) -> usize {
    orders[..d].iter().map(|o| o + 1).product()
}

/// Power of coordinate `d` in monomial number `index`.
#[inline]
pub(crate) fn power_of(orders: &[usize], d: usize, index: usize) -> usize {
    (index / stride(orders, d)) % (orders[d] + 1)
}

/// Differentiate once with respect to coordinate `d`: `dest[s]` is
/// `k_d * src[s - stride_d]` for monomials with power `k_d > 0` and zero
/// otherwise. `src` holds the (possibly already differentiated) values.
pub(crate) fn differentiate(orders: &[usize], d: usize, src: &[f64], dest: &mut [f64]) {
    let stride = stride(orders, d);
    let radix = orders[d] + 1;
    for (s, out) in dest.iter_mut().enumerate() {
        let power = (s / stride) % radix;
        *out = if power > 0 {
            power as f64 * src[s - stride]
        } else {
            0.0
        };
    }
}
