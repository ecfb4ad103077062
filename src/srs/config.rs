use crate::config::SrsEnvConfig;

/// SM-2 ease factor floor. Canonical to the algorithm, not configurable.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Canonical SM-2 base intervals for the first two successful repetitions.
pub const FIRST_INTERVAL_DAYS: u32 = 1;
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Product-policy constants layered on top of SM-2. The defaults mirror the
/// original platform; each is overridable through the environment because
/// none of them is part of the canonical algorithm.
#[derive(Debug, Clone)]
pub struct SrsConfig {
    pub default_ease_factor: f64,
    pub learned_min_repetitions: u32,
    pub learned_min_ease: f64,
    pub mastered_min_repetitions: u32,
    pub mastered_min_ease: f64,
    pub known_repetitions: u32,
    pub known_ease: f64,
    pub known_interval_days: u32,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            default_ease_factor: 2.5,
            learned_min_repetitions: 3,
            learned_min_ease: 2.5,
            mastered_min_repetitions: 5,
            mastered_min_ease: 3.0,
            known_repetitions: 10,
            known_ease: 3.0,
            known_interval_days: 180,
        }
    }
}

impl SrsConfig {
    pub fn from_env(env: &SrsEnvConfig) -> Self {
        Self {
            // 低于 SM-2 下限的配置值直接夹回，避免调度被配置破坏
            default_ease_factor: env.default_ease_factor.max(MIN_EASE_FACTOR),
            learned_min_ease: env.learned_ease_threshold.max(MIN_EASE_FACTOR),
            mastered_min_ease: env.mastered_ease_threshold.max(MIN_EASE_FACTOR),
            known_interval_days: env.known_interval_days.max(1),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values_override_defaults() {
        let cfg = SrsConfig::from_env(&SrsEnvConfig {
            default_ease_factor: 2.2,
            learned_ease_threshold: 2.4,
            mastered_ease_threshold: 3.2,
            known_interval_days: 90,
        });
        assert_eq!(cfg.default_ease_factor, 2.2);
        assert_eq!(cfg.learned_min_ease, 2.4);
        assert_eq!(cfg.mastered_min_ease, 3.2);
        assert_eq!(cfg.known_interval_days, 90);
        assert_eq!(cfg.learned_min_repetitions, 3);
    }

    #[test]
    fn sub_floor_ease_is_clamped() {
        let cfg = SrsConfig::from_env(&SrsEnvConfig {
            default_ease_factor: 0.5,
            learned_ease_threshold: 2.5,
            mastered_ease_threshold: 3.0,
            known_interval_days: 0,
        });
        assert_eq!(cfg.default_ease_factor, MIN_EASE_FACTOR);
        assert_eq!(cfg.known_interval_days, 1);
    }
}
