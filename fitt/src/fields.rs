//! Field names carried by reconstructed records.

pub const TIMESTAMP: &str = "timestamp";
pub const TIME: &str = "time";
pub const POSITION_LAT: &str = "position_lat";
pub const POSITION_LONG: &str = "position_long";
pub const ALTITUDE: &str = "altitude";
pub const SMOOTH_ALTITUDE: &str = "smooth_altitude";
pub const HEART_RATE: &str = "heart_rate";
pub const CADENCE: &str = "cadence";
pub const DISTANCE: &str = "distance";
pub const TRACK_DISTANCE: &str = "track_distance";
pub const SPEED: &str = "speed";
pub const TRACK_SPEED: &str = "track_speed";
pub const POWER: &str = "power";
pub const POWER_3S: &str = "power3s";
pub const POWER_10S: &str = "power10s";
pub const POWER_30S: &str = "power30s";
pub const GRADE: &str = "grade";
pub const TEMPERATURE: &str = "temperature";
pub const ACCUMULATED_POWER: &str = "accumulated_power";
pub const LEFT_RIGHT_BALANCE: &str = "left_right_balance";
pub const GPS_ACCURACY: &str = "gps_accuracy";
pub const VERTICAL_SPEED: &str = "vertical_speed";
pub const CALORIES: &str = "calories";
pub const LEFT_TORQUE_EFFECTIVENESS: &str = "left_torque_effectiveness";
pub const RIGHT_TORQUE_EFFECTIVENESS: &str = "right_torque_effectiveness";
pub const LEFT_PEDAL_SMOOTHNESS: &str = "left_pedal_smoothness";
pub const RIGHT_PEDAL_SMOOTHNESS: &str = "right_pedal_smoothness";
pub const COMBINED_PEDAL_SMOOTHNESS: &str = "combined_pedal_smoothness";
pub const RESPIRATION_RATE: &str = "respiration_rate";
pub const GRIT: &str = "grit";
pub const FLOW: &str = "flow";
pub const CORE_TEMPERATURE: &str = "core_temperature";
pub const FRONT_GEAR_NUM: &str = "front_gear_num";
pub const FRONT_GEAR: &str = "front_gear";
pub const REAR_GEAR_NUM: &str = "rear_gear_num";
pub const REAR_GEAR: &str = "rear_gear";
pub const ACTIVE_CLIMB: &str = "active_climb";
