use serde::Deserialize;

use crate::control::phase::LightOutput;
use crate::error::SchedulingError;
use crate::util::clock::ClockTime;

/// fixed output anchored at a time of day
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Scene {
    pub time: ClockTime,
    /// from 0 to 1
    pub brightness: f64,
    /// from 0 (warm) to 1 (cool)
    #[serde(alias = "cool")]
    pub coolness: f64,
}

/// average of the first scene after `now` and the one right before it.
/// both lookups wrap around midnight, `scenes` has to be sorted by time.
pub fn blend(scenes: &[Scene], now: ClockTime) -> Result<LightOutput, SchedulingError> {
    if scenes.len() < 2 {
        return Err(SchedulingError::NotEnoughScenes(scenes.len()));
    }

    let next_index = scenes.iter()
        .position(|scene| scene.time > now)
        .unwrap_or(0);
    let prev_index = next_index.checked_sub(1).unwrap_or(scenes.len() - 1);

    // both indices are below `scenes.len()`, which is at least 2 here
    let (next, prev) = (&scenes[next_index], &scenes[prev_index]);

    Ok(LightOutput {
        brightness: (prev.brightness + next.brightness) / 2.0,
        coolness: (prev.coolness + next.coolness) / 2.0,
    })
}
