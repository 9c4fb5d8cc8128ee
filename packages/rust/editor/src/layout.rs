//! Column-width arithmetic behind the `column-widths` rule.
//!
//! Widths are percentages of the table width and must always sum to 100.

use templatesmith_shared::{Result, TemplatesmithError};

/// Allowed drift when checking that widths sum to 100.
pub const WIDTH_TOLERANCE: f64 = 1e-6;

/// Rescale `widths` to make room for a new column of `new_width` percent,
/// which is appended last.
///
/// Each existing width is multiplied by `(100 - new_width) / 100`.
pub fn add_column(widths: &[f64], new_width: f64) -> Result<Vec<f64>> {
    check_widths(widths)?;
    if !(new_width > 0.0 && new_width < 100.0) {
        return Err(TemplatesmithError::validation(format!(
            "new column width must be within (0, 100), got {new_width}"
        )));
    }

    let factor = (100.0 - new_width) / 100.0;
    let mut scaled: Vec<f64> = widths.iter().map(|w| w * factor).collect();
    scaled.push(new_width);
    Ok(scaled)
}

/// Drop column `index` and scale the survivors by `100 / (100 - removed)`.
pub fn remove_column(widths: &[f64], index: usize) -> Result<Vec<f64>> {
    check_widths(widths)?;
    if widths.len() < 2 {
        return Err(TemplatesmithError::validation(
            "cannot remove the only column of a table",
        ));
    }
    let removed = *widths.get(index).ok_or_else(|| {
        TemplatesmithError::validation(format!(
            "column {index} out of range for {} columns",
            widths.len()
        ))
    })?;

    let factor = 100.0 / (100.0 - removed);
    Ok(widths
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, w)| w * factor)
        .collect())
}

/// Whether `widths` sum to 100 within [`WIDTH_TOLERANCE`].
pub fn sums_to_full_width(widths: &[f64]) -> bool {
    (widths.iter().sum::<f64>() - 100.0).abs() <= WIDTH_TOLERANCE
}

fn check_widths(widths: &[f64]) -> Result<()> {
    if widths.is_empty() {
        return Err(TemplatesmithError::validation("table has no columns"));
    }
    if widths.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return Err(TemplatesmithError::validation(
            "column widths must be positive percentages",
        ));
    }
    if !sums_to_full_width(widths) {
        return Err(TemplatesmithError::validation(format!(
            "column widths sum to {}, expected 100",
            widths.iter().sum::<f64>()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= WIDTH_TOLERANCE, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn adding_25_to_30_70() {
        let widths = add_column(&[30.0, 70.0], 25.0).unwrap();
        assert_close(&widths, &[22.5, 52.5, 25.0]);
        assert!(sums_to_full_width(&widths));
    }

    #[test]
    fn adding_to_three_columns() {
        let widths = add_column(&[25.0, 25.0, 50.0], 20.0).unwrap();
        assert_close(&widths, &[20.0, 20.0, 40.0, 20.0]);
        assert!(sums_to_full_width(&widths));
    }

    #[test]
    fn repeated_additions_stay_at_100() {
        let mut widths = vec![100.0];
        for new in [10.0, 33.3, 7.25, 50.0, 1.0] {
            widths = add_column(&widths, new).unwrap();
            assert!(sums_to_full_width(&widths), "{widths:?}");
        }
        assert_eq!(widths.len(), 6);
    }

    #[test]
    fn removing_undoes_adding() {
        let added = add_column(&[30.0, 70.0], 25.0).unwrap();
        let removed = remove_column(&added, 2).unwrap();
        assert_close(&removed, &[30.0, 70.0]);
    }

    #[test]
    fn removing_middle_column() {
        let widths = remove_column(&[20.0, 60.0, 20.0], 1).unwrap();
        assert_close(&widths, &[50.0, 50.0]);
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(add_column(&[], 10.0).is_err());
        assert!(add_column(&[40.0, 40.0], 10.0).is_err());
        assert!(add_column(&[30.0, 70.0], 0.0).is_err());
        assert!(add_column(&[30.0, 70.0], 100.0).is_err());
        assert!(add_column(&[30.0, 70.0], f64::NAN).is_err());
        assert!(remove_column(&[100.0], 0).is_err());
        assert!(remove_column(&[30.0, 70.0], 5).is_err());
    }
}
