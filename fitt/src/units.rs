use crate::fields::*;

/// Presentation units for every field the reader can produce. `None` marks
/// unitless values.
pub const UNITS: &[(&str, Option<&str>)] = &[
    (TIME, Some("s")),
    (TIMESTAMP, None),
    (POSITION_LAT, Some("°")),
    (POSITION_LONG, Some("°")),
    (ALTITUDE, Some("m")),
    (SMOOTH_ALTITUDE, Some("m")),
    (HEART_RATE, Some("bpm")),
    (CADENCE, Some("rpm")),
    (DISTANCE, Some("m")),
    (TRACK_DISTANCE, Some("m")),
    (SPEED, Some("m/s")),
    (TRACK_SPEED, Some("m/s")),
    (POWER, Some("W")),
    (POWER_3S, Some("W")),
    (POWER_10S, Some("W")),
    (POWER_30S, Some("W")),
    (GRADE, Some("%")),
    (TEMPERATURE, Some("°C")),
    (ACCUMULATED_POWER, Some("W")),
    (LEFT_RIGHT_BALANCE, None),
    (GPS_ACCURACY, Some("m")),
    (VERTICAL_SPEED, Some("m/s")),
    (CALORIES, Some("kcal")),
    (LEFT_TORQUE_EFFECTIVENESS, Some("%")),
    (RIGHT_TORQUE_EFFECTIVENESS, Some("%")),
    (LEFT_PEDAL_SMOOTHNESS, Some("%")),
    (RIGHT_PEDAL_SMOOTHNESS, Some("%")),
    (COMBINED_PEDAL_SMOOTHNESS, Some("%")),
    (RESPIRATION_RATE, Some("bpm")),
    (GRIT, None),
    (FLOW, None),
    (CORE_TEMPERATURE, Some("°C")),
    (FRONT_GEAR_NUM, None),
    (FRONT_GEAR, Some("teeth")),
    (REAR_GEAR_NUM, None),
    (REAR_GEAR, Some("teeth")),
    (ACTIVE_CLIMB, None),
];

pub fn unit_for(field: &str) -> Option<&'static str> {
    UNITS
        .iter()
        .find(|(name, _)| *name == field)
        .and_then(|(_, unit)| *unit)
}

pub fn is_known_field(field: &str) -> bool {
    UNITS.iter().any(|(name, _)| *name == field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(unit_for(GRADE), Some("%"));
        assert_eq!(unit_for(REAR_GEAR), Some("teeth"));
        assert_eq!(unit_for(ACTIVE_CLIMB), None);
        assert!(is_known_field(ACTIVE_CLIMB));
        assert!(!is_known_field("unknown_field_90"));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = UNITS.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), UNITS.len());
    }
}
