//! CSV and JSON renderings of a [`ChartResult`].
//!
//! CSV carries only the data series: a header row (`x,y`, or `x,value` for
//! bar charts) followed by one row per point, numbers written with six
//! significant digits the way C's `%.6g` does.

use crate::error::Result;
use crate::extractors::ChartType;
use crate::pipeline::ChartResult;
use std::io::Write;

/// Significant digits of exported numbers.
const SIGNIFICANT_DIGITS: i32 = 6;

/// Format a number like `%.6g`.
///
/// # Examples
///
/// ```
/// use chart_oxide::export::format_general;
///
/// assert_eq!(format_general(3.14159265), "3.14159");
/// assert_eq!(format_general(1234567.0), "1.23457e+06");
/// assert_eq!(format_general(0.0001), "0.0001");
/// assert_eq!(format_general(0.00001), "1e-05");
/// assert_eq!(format_general(-2.5), "-2.5");
/// ```
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Rounding to the target precision can carry into the next decade, so
    // the exponent is read back from the rounded scientific form.
    let scientific = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// CSV header row for a chart type.
pub fn csv_header(chart_type: ChartType) -> &'static str {
    match chart_type {
        ChartType::Bar => "x,value",
        ChartType::Scatter | ChartType::Line => "x,y",
    }
}

/// Write the data series as CSV.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_csv<W: Write>(result: &ChartResult, mut writer: W) -> Result<()> {
    writeln!(writer, "{}", csv_header(result.chart_type))?;
    for point in &result.data {
        writeln!(writer, "{},{}", format_general(point.x), format_general(point.y))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the data series as a CSV string.
pub fn to_csv(result: &ChartResult) -> String {
    let mut out = String::with_capacity(16 + result.data.len() * 16);
    out.push_str(csv_header(result.chart_type));
    out.push('\n');
    for point in &result.data {
        out.push_str(&format_general(point.x));
        out.push(',');
        out.push_str(&format_general(point.y));
        out.push('\n');
    }
    out
}

/// Render the full result as pretty-printed JSON.
///
/// The overlay image is not part of the JSON form.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if serialization fails.
pub fn to_json(result: &ChartResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DataPoint;
    use crate::pipeline::{ResultSource, Warning, WarningCode};

    fn result(chart_type: ChartType, data: Vec<DataPoint>) -> ChartResult {
        ChartResult {
            chart_type,
            data,
            confidence: 0.8,
            stages: None,
            warnings: vec![Warning::new(WarningCode::HighFitError, "fit error 0.2")],
            x_label: Some("year".to_string()),
            y_label: None,
            source: ResultSource::Pipeline,
            crop: None,
            axes: None,
            transform: None,
            scale: 1.0,
            overlay: None,
        }
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(1.0), "1");
        assert_eq!(format_general(100.0), "100");
        assert_eq!(format_general(123456.0), "123456");
        assert_eq!(format_general(999999.7), "1e+06");
        assert_eq!(format_general(0.000123456789), "0.000123457");
        assert_eq!(format_general(1.5e-7), "1.5e-07");
        assert_eq!(format_general(-0.5), "-0.5");
        assert_eq!(format_general(2.0e100), "2e+100");
    }

    #[test]
    fn test_csv_rows() {
        let r = result(
            ChartType::Scatter,
            vec![DataPoint::new(1.0, 2.5), DataPoint::new(2.0, 1.0 / 3.0)],
        );
        assert_eq!(to_csv(&r), "x,y\n1,2.5\n2,0.333333\n");
    }

    #[test]
    fn test_bar_header() {
        let r = result(ChartType::Bar, vec![DataPoint::new(0.0, 10.0)]);
        assert_eq!(to_csv(&r), "x,value\n0,10\n");
    }

    #[test]
    fn test_write_csv_matches_string() {
        let r = result(ChartType::Line, vec![DataPoint::new(0.25, 4.0)]);
        let mut buf = Vec::new();
        write_csv(&r, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), to_csv(&r));
    }

    #[test]
    fn test_json_carries_result_fields() {
        let r = result(ChartType::Line, vec![DataPoint::new(0.0, 1.0)]);
        let json = to_json(&r).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["chart_type"], "line");
        assert_eq!(value["data"][0]["y"], 1.0);
        assert_eq!(value["warnings"][0]["code"], "HIGH_FIT_ERROR");
        assert_eq!(value["x_label"], "year");
        assert!(value.get("overlay").is_none());
    }
}
