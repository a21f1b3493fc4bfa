//! Study progress derivations shared by controllers and FFI snapshots.

/// Parses a goal-hours text field.
///
/// Blank, non-numeric and non-finite input falls back to `1.0`. Zero and
/// negative numbers are returned as typed so validation can see them.
pub fn parse_goal_hours(input: &str) -> f32 {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(1.0)
}

/// Fraction of the goal reached, clamped to `[0, 1]`.
///
/// A zero goal is treated as one hour.
pub fn progress(studied_hours: f32, goal_hours: f32) -> f32 {
    let goal = if goal_hours == 0.0 { 1.0 } else { goal_hours };
    let ratio = studied_hours / goal;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Progress straight from the goal text field.
pub fn progress_from_input(studied_hours: f32, goal_input: &str) -> f32 {
    progress(studied_hours, parse_goal_hours(goal_input))
}

/// Converts seconds to hours, rounded to two decimals.
pub fn seconds_to_hours(seconds: i64) -> f32 {
    let hours = seconds as f64 / 3600.0;
    ((hours * 100.0).round() / 100.0) as f32
}
