/// Power gauge that bounces between 0 and `max` while the player holds it.
use std::time::Duration;

/// Triangle wave: rises from 0 to `length`, falls back to 0, repeats.
pub fn ping_pong(t: f32, length: f32) -> f32 {
    if length <= 0.0 || !t.is_finite() {
        return 0.0;
    }
    let period = length * 2.0;
    let phase = t.rem_euclid(period);
    length - (phase - length).abs()
}

/// Gauge reading after `elapsed` at `speed` units per second.
pub fn reading(elapsed: Duration, speed: f32, max: f32) -> f32 {
    ping_pong(elapsed.as_secs_f32() * speed, max)
}
