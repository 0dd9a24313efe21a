//! Loss functions with analytic gradients.
//!
//! Both losses return `(mean loss, gradient w.r.t. logits)`; the gradients
//! are already divided by the batch size.

use ndarray::{Array1, Array2};

/// Numerically stable sigmoid.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Softmax cross-entropy over class logits.
///
/// `logits` is `(m, num_classes)`; `labels[i]` is the class index of row `i`.
/// Gradient: `(softmax - onehot) / m`.
pub fn softmax_cross_entropy(logits: &Array2<f32>, labels: &[usize]) -> (f32, Array2<f32>) {
    let m = logits.nrows();
    debug_assert_eq!(m, labels.len());
    if m == 0 {
        return (0.0, Array2::zeros(logits.raw_dim()));
    }

    let mut loss = 0.0f64;
    let mut grad = Array2::zeros(logits.raw_dim());

    for (i, (row, &label)) in logits.outer_iter().zip(labels).enumerate() {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp_sum: f32 = row.iter().map(|&v| (v - max).exp()).sum();
        let log_sum = exp_sum.ln() + max;

        loss += f64::from(log_sum - row[label]);
        for (j, &v) in row.iter().enumerate() {
            let p = (v - log_sum).exp();
            grad[[i, j]] = (p - if j == label { 1.0 } else { 0.0 }) / m as f32;
        }
    }

    ((loss / m as f64) as f32, grad)
}

/// Binary cross-entropy with logits.
///
/// `targets[i]` is 0.0 or 1.0. Uses the stable formulation
/// `max(x, 0) - x*y + ln(1 + exp(-|x|))`. Gradient: `(sigmoid(x) - y) / m`.
pub fn bce_with_logits(logits: &Array1<f32>, targets: &[f32]) -> (f32, Array1<f32>) {
    let m = logits.len();
    debug_assert_eq!(m, targets.len());
    if m == 0 {
        return (0.0, Array1::zeros(0));
    }

    let mut loss = 0.0f64;
    let mut grad = Array1::zeros(m);

    for (i, (&x, &y)) in logits.iter().zip(targets).enumerate() {
        loss += f64::from(x.max(0.0) - x * y + (-x.abs()).exp().ln_1p());
        grad[i] = (sigmoid(x) - y) / m as f32;
    }

    ((loss / m as f64) as f32, grad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_entropy_uniform_logits() {
        // Equal logits over 2 classes: loss = ln 2 regardless of label.
        let logits = Array2::zeros((1, 2));
        let (loss, grad) = softmax_cross_entropy(&logits, &[0]);
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
        assert!((grad[[0, 0]] - (-0.5)).abs() < 1e-6);
        assert!((grad[[0, 1]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cross_entropy_confident_correct() {
        let logits = Array2::from_shape_vec((1, 2), vec![10.0, -10.0]).unwrap();
        let (loss, _) = softmax_cross_entropy(&logits, &[0]);
        assert!(loss < 1e-4);
        let (wrong_loss, _) = softmax_cross_entropy(&logits, &[1]);
        assert!(wrong_loss > 10.0);
    }

    #[test]
    fn test_cross_entropy_gradient_matches_finite_differences() {
        let logits = Array2::from_shape_vec((2, 2), vec![0.3, -0.8, 1.2, 0.4]).unwrap();
        let labels = [1, 0];
        let (_, grad) = softmax_cross_entropy(&logits, &labels);

        let eps = 1e-3;
        for i in 0..2 {
            for j in 0..2 {
                let mut plus = logits.clone();
                plus[[i, j]] += eps;
                let mut minus = logits.clone();
                minus[[i, j]] -= eps;
                let (lp, _) = softmax_cross_entropy(&plus, &labels);
                let (lm, _) = softmax_cross_entropy(&minus, &labels);
                let num = (lp - lm) / (2.0 * eps);
                assert!((grad[[i, j]] - num).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_bce_at_zero_logit() {
        let logits = Array1::zeros(1);
        let (loss, grad) = bce_with_logits(&logits, &[1.0]);
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-6);
        assert!((grad[0] - (-0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_bce_extreme_logits_are_stable() {
        let logits = Array1::from_vec(vec![100.0, -100.0]);
        let (loss, grad) = bce_with_logits(&logits, &[1.0, 0.0]);
        assert!(loss.abs() < 1e-6);
        assert!(grad.iter().all(|g| g.is_finite()));

        let (loss_bad, _) = bce_with_logits(&Array1::from_vec(vec![-100.0]), &[1.0]);
        assert!(loss_bad > 50.0);
        assert!(loss_bad.is_finite());
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-40.0) < 0.001);
    }
}
