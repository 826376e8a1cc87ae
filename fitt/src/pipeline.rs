//! Derived fields computed once over the fully ingested series. Stage order
//! is fixed: `time` feeds smoothing and speed, `distance` feeds speed and
//! grade, `smooth_altitude` feeds grade.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::fields::*;
use crate::geo::geo_distance;
use crate::store::TimeSeries;
use crate::window::windows_by_field;
use crate::Params;

const POWER_WINDOWS: [(&str, i64); 3] = [(POWER_3S, 3), (POWER_10S, 10), (POWER_30S, 30)];

pub fn derive_fields(series: &mut TimeSeries, params: &Params) {
    calculate_activity_time(series);
    calculate_distance(series);
    calculate_smooth_altitude(series, params);
    calculate_speed(series);
    calculate_power_rolling_averages(series);
    calculate_grade(series, params);
    calculate_vertical_speed(series);
}

fn elapsed_seconds(start: DateTime<Utc>, timestamp: DateTime<Utc>) -> f64 {
    (timestamp - start).num_milliseconds() as f64 / 1000.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn calculate_activity_time(series: &mut TimeSeries) {
    debug!("Calculating activity time");

    let mut start: Option<DateTime<Utc>> = None;
    for record in series.records_mut() {
        let base = *start.get_or_insert(record.timestamp());
        record.set(TIME, elapsed_seconds(base, record.timestamp()));
    }
}

fn calculate_distance(series: &mut TimeSeries) {
    debug!("Calculating distance");

    let mut last: Option<(f64, f64)> = None;
    let mut total = 0.0;
    for record in series.records_mut() {
        if let (Some(lat), Some(lon)) = (record.get_f64(POSITION_LAT), record.get_f64(POSITION_LONG)) {
            if let Some((last_lat, last_lon)) = last {
                total += geo_distance(last_lat, last_lon, lat, lon);
            }
            last = Some((lat, lon));
        }

        record.set(TRACK_DISTANCE, total);
        if !record.contains(DISTANCE) {
            record.set(DISTANCE, total);
        }
    }
}

fn calculate_smooth_altitude(series: &mut TimeSeries, params: &Params) {
    debug!("Calculating smooth altitude");

    let windows = windows_by_field(series, TIME, params.smooth_altitude_window_s);
    let altitudes: Vec<Option<f64>> = series.records().map(|r| r.get_f64(ALTITUDE)).collect();

    let mut smoothed = vec![None; altitudes.len()];
    for window in windows {
        let in_window: Vec<f64> = altitudes[window.members].iter().flatten().copied().collect();
        smoothed[window.center] = mean(&in_window);
    }

    for (record, value) in series.records_mut().zip(smoothed) {
        if let Some(value) = value {
            record.set(SMOOTH_ALTITUDE, value);
        }
    }
}

fn calculate_speed(series: &mut TimeSeries) {
    debug!("Calculating speed");

    let mut last: Option<(f64, f64)> = None;
    for record in series.records_mut() {
        let (Some(distance), Some(time)) = (record.get_f64(DISTANCE), record.get_f64(TIME)) else {
            continue;
        };
        if let Some((last_time, last_distance)) = last {
            let time_delta = time - last_time;
            if time_delta > 0.0 {
                let speed = (distance - last_distance) / time_delta;
                record.set(TRACK_SPEED, speed);
                if !record.contains(SPEED) {
                    record.set(SPEED, speed);
                }
            }
        }
        last = Some((time, distance));
    }
}

fn calculate_power_rolling_averages(series: &mut TimeSeries) {
    debug!("Calculating power rolling averages (3s, 10s, 30s)");

    let longest = POWER_WINDOWS
        .iter()
        .map(|(_, secs)| *secs)
        .max()
        .unwrap_or_default();
    let mut recent: VecDeque<(DateTime<Utc>, f64)> = VecDeque::new();
    for record in series.records_mut() {
        let timestamp = record.timestamp();
        if let Some(power) = record.get_f64(POWER) {
            recent.push_back((timestamp, power));
        }

        for (field, secs) in POWER_WINDOWS {
            let lower = timestamp - Duration::seconds(secs);
            let in_window: Vec<f64> = recent
                .iter()
                .filter(|(t, _)| *t > lower)
                .map(|(_, p)| *p)
                .collect();
            if let Some(avg) = mean(&in_window) {
                record.set(field, avg);
            }
        }

        let lower = timestamp - Duration::seconds(longest);
        while recent.front().is_some_and(|(t, _)| *t <= lower) {
            recent.pop_front();
        }
    }
}

/// Slope in percent of the chord spanning `distance_delta` along the ground
/// track and climbing `altitude_delta`. `None` when the chord is vertical or
/// steeper than the track length allows.
pub fn chord_grade(distance_delta: f64, altitude_delta: f64) -> Option<f64> {
    let radicand = distance_delta * distance_delta - altitude_delta * altitude_delta;
    if !radicand.is_finite() || radicand <= 0.0 {
        return None;
    }
    Some(altitude_delta / radicand.sqrt() * 100.0)
}

fn calculate_grade(series: &mut TimeSeries, params: &Params) {
    debug!("Calculating grade");

    let windows = windows_by_field(series, DISTANCE, params.grade_window_m);
    let points: Vec<Option<(f64, f64)>> = series
        .records()
        .map(|r| Some((r.get_f64(DISTANCE)?, r.get_f64(SMOOTH_ALTITUDE)?)))
        .collect();

    let mut grades = vec![None; points.len()];
    for window in windows {
        let Some((dist, _)) = points[window.center] else {
            continue;
        };
        let mut members = points[window.members].iter().flatten();
        let Some(&(z1, y1)) = members.next() else {
            continue;
        };
        let (z2, y2) = members.last().copied().unwrap_or((z1, y1));

        // near the start or end of the activity the window is truncated
        if dist - z1 < params.grade_edge_margin_m || z2 - dist < params.grade_edge_margin_m {
            continue;
        }
        grades[window.center] = chord_grade(z2 - z1, y2 - y1);
    }

    for (record, grade) in series.records_mut().zip(grades) {
        if let Some(grade) = grade {
            record.set(GRADE, grade);
        }
    }
}

fn calculate_vertical_speed(series: &mut TimeSeries) {
    debug!("Calculating vertical speed");

    let mut last: Option<(f64, f64)> = None;
    for record in series.records_mut() {
        let (Some(altitude), Some(time)) = (record.get_f64(ALTITUDE), record.get_f64(TIME)) else {
            continue;
        };
        if let Some((last_time, last_altitude)) = last {
            let time_delta = time - last_time;
            if !record.contains(VERTICAL_SPEED) && time_delta > 0.0 {
                record.set(VERTICAL_SPEED, (altitude - last_altitude) / time_delta);
            }
        }
        last = Some((time, altitude));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn get(series: &TimeSeries, secs: i64, field: &str) -> Option<f64> {
        series.get(&at(secs)).and_then(|r| r.get_f64(field))
    }

    #[test]
    fn test_activity_time_from_first_record() {
        let mut series = TimeSeries::new();
        for secs in [10, 11, 13] {
            series.entry(at(secs));
        }
        series.entry(at(10) + Duration::milliseconds(500));
        calculate_activity_time(&mut series);
        assert_eq!(get(&series, 10, TIME), Some(0.0));
        assert_eq!(get(&series, 11, TIME), Some(1.0));
        assert_eq!(get(&series, 13, TIME), Some(3.0));
        let half = series.get(&(at(10) + Duration::milliseconds(500))).unwrap();
        assert_eq!(half.get_f64(TIME), Some(0.5));
    }

    #[test]
    fn test_distance_accumulates_between_positions() {
        let mut series = TimeSeries::new();
        series.entry(at(0)).set(POSITION_LAT, 0.0);
        series.entry(at(0)).set(POSITION_LONG, 0.0);
        series.entry(at(1)).set(HEART_RATE, 100_i64);
        series.entry(at(2)).set(POSITION_LAT, 0.0);
        series.entry(at(2)).set(POSITION_LONG, 0.001);
        series.entry(at(2)).set(DISTANCE, 42.0);
        calculate_distance(&mut series);

        let step = geo_distance(0.0, 0.0, 0.0, 0.001);
        assert_eq!(get(&series, 0, TRACK_DISTANCE), Some(0.0));
        assert_eq!(get(&series, 0, DISTANCE), Some(0.0));
        assert_eq!(get(&series, 1, TRACK_DISTANCE), Some(0.0));
        assert_eq!(get(&series, 2, TRACK_DISTANCE), Some(step));
        assert_eq!(get(&series, 2, DISTANCE), Some(42.0));
    }

    #[test]
    fn test_smooth_altitude_is_centered_mean() {
        let mut series = TimeSeries::new();
        for secs in 0..10 {
            series.entry(at(secs)).set(ALTITUDE, secs as f64);
        }
        series.entry(at(10));
        derive_fields(&mut series, &Params::default());

        assert_eq!(get(&series, 0, SMOOTH_ALTITUDE), Some(1.0));
        assert_eq!(get(&series, 5, SMOOTH_ALTITUDE), Some(5.0));
        assert_eq!(get(&series, 9, SMOOTH_ALTITUDE), Some(8.0));
        assert_eq!(get(&series, 10, SMOOTH_ALTITUDE), Some(8.5));
    }

    #[test]
    fn test_smooth_altitude_needs_altitude_in_window() {
        let mut series = TimeSeries::new();
        series.entry(at(0)).set(ALTITUDE, 120.0);
        series.entry(at(10));
        derive_fields(&mut series, &Params::default());

        assert_eq!(get(&series, 0, SMOOTH_ALTITUDE), Some(120.0));
        assert_eq!(get(&series, 10, TIME), Some(10.0));
        assert_eq!(get(&series, 10, SMOOTH_ALTITUDE), None);
    }

    #[test]
    fn test_speed_respects_supplied_value() {
        let mut series = TimeSeries::new();
        series.entry(at(0)).set(DISTANCE, 0.0);
        series.entry(at(2)).set(DISTANCE, 10.0);
        series.entry(at(4)).set(DISTANCE, 30.0);
        series.entry(at(4)).set(SPEED, 9.5);
        calculate_activity_time(&mut series);
        calculate_speed(&mut series);

        assert_eq!(get(&series, 0, TRACK_SPEED), None);
        assert_eq!(get(&series, 0, SPEED), None);
        assert_eq!(get(&series, 2, TRACK_SPEED), Some(5.0));
        assert_eq!(get(&series, 2, SPEED), Some(5.0));
        assert_eq!(get(&series, 4, TRACK_SPEED), Some(10.0));
        assert_eq!(get(&series, 4, SPEED), Some(9.5));
    }

    #[test]
    fn test_power_window_lower_bound_is_strict() {
        let mut series = TimeSeries::new();
        for secs in 0..=10 {
            series.entry(at(secs)).set(POWER, Value::Int(10 * secs));
        }
        calculate_power_rolling_averages(&mut series);

        assert_eq!(get(&series, 10, POWER_3S), Some(90.0));
        assert_eq!(get(&series, 10, POWER_10S), Some(55.0));
        assert_eq!(get(&series, 10, POWER_30S), Some(50.0));
        assert_eq!(get(&series, 0, POWER_3S), Some(0.0));
    }

    #[test]
    fn test_power_window_needs_a_sample() {
        let mut series = TimeSeries::new();
        series.entry(at(0)).set(POWER, 300.0);
        series.entry(at(5));
        series.entry(at(40));
        calculate_power_rolling_averages(&mut series);

        assert_eq!(get(&series, 5, POWER_3S), None);
        assert_eq!(get(&series, 5, POWER_10S), Some(300.0));
        assert_eq!(get(&series, 5, POWER_30S), Some(300.0));
        assert_eq!(get(&series, 40, POWER_30S), None);
    }

    fn climb_series(samples: i64) -> TimeSeries {
        // 5 m per second along a 10 % chord slope
        let mut series = TimeSeries::new();
        for secs in 0..samples {
            let distance = 5.0 * secs as f64;
            series.entry(at(secs)).set(DISTANCE, distance);
            series.entry(at(secs)).set(ALTITUDE, 0.1 * distance);
        }
        series
    }

    #[test]
    fn test_grade_is_chord_slope() {
        let mut series = climb_series(41);
        derive_fields(&mut series, &Params::default());

        let expected = 5.0 / (50.0_f64 * 50.0 - 5.0 * 5.0).sqrt() * 100.0;
        let grade = get(&series, 20, GRADE).unwrap();
        assert!((grade - expected).abs() < 1e-6, "grade {grade}");
    }

    #[test]
    fn test_grade_excluded_near_edges() {
        let mut series = climb_series(41);
        derive_fields(&mut series, &Params::default());

        for (_, record) in series.iter() {
            let distance = record.get_f64(DISTANCE).unwrap();
            if distance < 10.0 || distance > 190.0 {
                assert!(!record.contains(GRADE), "grade set at {distance} m");
            }
        }
        assert!(get(&series, 3, GRADE).is_some());
    }

    #[test]
    fn test_chord_grade_domain() {
        assert_eq!(chord_grade(10.0, 10.0), None);
        assert_eq!(chord_grade(10.0, -12.0), None);
        assert_eq!(chord_grade(0.0, 0.0), None);
        let down = chord_grade(50.0, -3.0).unwrap();
        assert!(down < 0.0);
    }

    #[test]
    fn test_vertical_speed_keeps_supplied_value() {
        let mut series = TimeSeries::new();
        series.entry(at(0)).set(ALTITUDE, 100.0);
        series.entry(at(1)).set(HEART_RATE, 90_i64);
        series.entry(at(2)).set(ALTITUDE, 104.0);
        series.entry(at(3)).set(ALTITUDE, 106.0);
        series.entry(at(3)).set(VERTICAL_SPEED, 0.25);
        series.entry(at(4)).set(ALTITUDE, 105.0);
        calculate_activity_time(&mut series);
        calculate_vertical_speed(&mut series);

        assert_eq!(get(&series, 0, VERTICAL_SPEED), None);
        assert_eq!(get(&series, 1, VERTICAL_SPEED), None);
        assert_eq!(get(&series, 2, VERTICAL_SPEED), Some(2.0));
        assert_eq!(get(&series, 3, VERTICAL_SPEED), Some(0.25));
        assert_eq!(get(&series, 4, VERTICAL_SPEED), Some(-1.0));
    }
}
