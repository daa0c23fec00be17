pub fn weighted_average(x: f64, wx: f64, y: f64, wy: f64) -> f64 {
    if wx + wy == 0. {
        return 0.;
    }
    ((x * wx) + (y * wy)) / (wx + wy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_over_uneven_batches() {
        let mut mean = 0.;
        let mut seen = 0.;
        for (value, n) in [(1., 4.), (4., 2.)] {
            mean = weighted_average(mean, seen, value, n);
            seen += n;
        }
        assert!((mean - 2.).abs() < 1e-12);
        assert_eq!(weighted_average(3., 0., 5., 0.), 0.);
    }
}
