use ndarray::{Array2, Zip};

/// Decision threshold for a sigmoid output.
pub const THRESHOLD: f64 = 0.5;

/// Fraction of elements where `pred > THRESHOLD` agrees with `target`.
pub fn binary_accuracy(pred: &Array2<f64>, target: &Array2<f64>) -> f64 {
    if pred.is_empty() {
        return 0.;
    }

    let mut hits = 0usize;
    Zip::from(pred).and(target).for_each(|&p, &t| {
        let class = if p > THRESHOLD { 1. } else { 0. };
        if class == t {
            hits += 1;
        }
    });

    hits as f64 / pred.len() as f64
}

/// Hard `0.0` / `1.0` predictions.
pub fn classify(pred: &Array2<f64>) -> Array2<f64> {
    pred.mapv(|p| if p > THRESHOLD { 1. } else { 0. })
}
