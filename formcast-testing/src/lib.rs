//! Floating-point assertions shared by the formcast test suites.

use std::ops::RangeInclusive;

use assert_float_eq::*;

/// Asserts that two slices hold the same number of elements and that each pair of elements is
/// within `epsilon` of one another in absolute terms.
pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_absolute_eq!(expected, actual, epsilon);
        }
    }
}

pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

/// Asserts that `actual` lies in the closed interval `range`.
pub fn assert_f64_within(range: &RangeInclusive<f64>, actual: f64) {
    assert!(
        actual.is_finite(),
        "{actual} is not finite (expected within {}..={})",
        range.start(),
        range.end()
    );
    assert!(
        range.contains(&actual),
        "{actual} outside of {}..={}",
        range.start(),
        range.end()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_within_epsilon() {
        assert_slice_f64_absolute(&[1.0, 2.0], &[1.0 + 1e-10, 2.0 - 1e-10], 1e-9);
        assert_slice_f64_relative(&[100.0], &[100.0 + 1e-7], 1e-6);
    }

    #[test]
    #[should_panic(expected = "lengths do not match: 2 ≠ 1")]
    fn slices_of_different_lengths() {
        assert_slice_f64_absolute(&[1.0, 2.0], &[1.0], 1e-9);
    }

    #[test]
    fn value_within_range() {
        assert_f64_within(&(1.5..=8.0), 1.5);
        assert_f64_within(&(1.5..=8.0), 8.0);
    }

    #[test]
    #[should_panic(expected = "outside of")]
    fn value_outside_range() {
        assert_f64_within(&(1.5..=8.0), 8.01);
    }
}
