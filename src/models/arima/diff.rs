//! Differencing and its inverse.

/// Difference a series `d` times. Each pass shortens it by one.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` passes of differencing for values that continue `history`.
///
/// `differenced` holds future values on the `d`-times differenced scale;
/// the result continues `history` on its original scale.
pub fn integrate(differenced: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let anchor = difference(history, level).last().copied().unwrap_or(0.0);
        result = result
            .iter()
            .scan(anchor, |acc, &step| {
                *acc += step;
                Some(*acc)
            })
            .collect();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_difference() {
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
        assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 2), vec![1.0, 1.0]);
        assert_eq!(difference(&[5.0], 3), vec![5.0]);
        assert_eq!(difference(&[1.0, 2.0], 0), vec![1.0, 2.0]);
    }

    #[test]
    fn integrate_continues_history() {
        let history = [1.0, 3.0, 6.0, 10.0];
        // next first differences 5, 6
        assert_eq!(integrate(&[5.0, 6.0], &history, 1), vec![15.0, 21.0]);
        // next second differences 1, 1 -> first differences 5, 6
        assert_eq!(integrate(&[1.0, 1.0], &history, 2), vec![15.0, 21.0]);
    }
}
