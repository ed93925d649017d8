//! Axis helpers shared by the chart types.

use chrono::{DateTime, NaiveDateTime};
use plotters::style::RGBColor;
use std::ops::Range;

/// Series colours, cycled by index.
pub const PALETTE: [RGBColor; 8] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
    RGBColor(218, 139, 195),
    RGBColor(140, 140, 140),
];

pub fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

pub const FONT: &str = "sans-serif";

/// Timestamp as fractional days since the Unix epoch.
pub fn date_to_axis(ts: &NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / 86_400.0
}

/// Inverse of [`date_to_axis`], truncated to whole seconds.
pub fn axis_to_date(x: f64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp((x * 86_400.0).round() as i64, 0).map(|d| d.naive_utc())
}

/// `YYYY-MM` tick label for a date axis.
pub fn date_label(x: &f64) -> String {
    axis_to_date(*x)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// Categories sit at integer positions `0..n`.
pub fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Tick label for a category axis; blank between categories.
pub fn category_label(categories: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    categories.get(nearest as usize).cloned().unwrap_or_default()
}

/// `[min, max]` of the finite values, padded by `pad` of the span on each side.
pub fn padded_range(values: impl IntoIterator<Item = f64>, pad: f64) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let span = if hi > lo { hi - lo } else { lo.abs().max(1.0) };
    (lo - pad * span)..(hi + pad * span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn date_axis_round_trips() {
        let ts = NaiveDate::from_ymd_opt(2017, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(axis_to_date(date_to_axis(&ts)), Some(ts));
        assert_eq!(date_label(&date_to_axis(&ts)), "2017-03");
    }

    #[test]
    fn category_labels_only_on_integers() {
        let cats = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(category_label(&cats, 1.0), "Tue");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_range(2), -0.5..1.5);
    }

    #[test]
    fn padded_range_handles_flat_and_empty() {
        assert_eq!(padded_range([1.0, 3.0], 0.5), 0.0..4.0);
        assert_eq!(padded_range([f64::NAN], 0.1), 0.0..1.0);
        let flat = padded_range([5.0, 5.0], 0.1);
        assert!(flat.start < 5.0 && flat.end > 5.0);
    }
}
