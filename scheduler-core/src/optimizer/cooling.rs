//! Temperature trajectories for the annealing loop.
//!
//! Every schedule recomputes the temperature from the base `t0` and the
//! zero-based iteration on each call; nothing here carries a running
//! temperature. The adaptive variant mutates only its cooling rate, driven
//! by acceptance-rate feedback from the optimizer.

use log::warn;

use crate::models::{CoolingScheduleConfig, OptimizationConfig};

/// Bounds for the adaptive cooling rate.
const ADAPTIVE_RATE_MIN: f64 = 0.8;
const ADAPTIVE_RATE_MAX: f64 = 0.999;

/// A cooling schedule: maps `(t0, iteration)` to a temperature.
#[derive(Debug, Clone, PartialEq)]
pub enum CoolingSchedule {
    /// `T = t0 * rate^i`
    Exponential { rate: f64 },
    /// `T = max(0, t0 - rate * i)`
    Linear { rate: f64 },
    /// `T = t0 / (scaling * ln(1 + i))`, with `T = t0` at `i = 0`.
    Logarithmic { scaling: f64 },
    /// Exponential decay with a periodic upward kick to escape local optima:
    /// at `i > 0` with `i % period == 0` the freshly computed value is
    /// multiplied by `reheat_factor` once.
    Geometric {
        rate: f64,
        reheat_factor: f64,
        reheat_period: u64,
    },
    /// Exponential decay whose rate tracks an acceptance target: too many
    /// acceptances cool faster, too few cool slower. The rate stays within
    /// [0.8, 0.999].
    Adaptive {
        rate: f64,
        acceptance_target: f64,
        adaptation_factor: f64,
    },
    /// Weighted mean of other schedules' outputs.
    ///
    /// # Panics
    ///
    /// `next` panics when the weight count does not match the schedule
    /// count.
    Combined {
        schedules: Vec<CoolingSchedule>,
        weights: Vec<f64>,
    },
}

impl CoolingSchedule {
    /// Temperature for the zero-based iteration `i`, recomputed from `t0`.
    pub fn next(&self, t0: f64, i: u64) -> f64 {
        match self {
            CoolingSchedule::Exponential { rate } => t0 * rate.powf(i as f64),
            CoolingSchedule::Linear { rate } => (t0 - rate * i as f64).max(0.0),
            CoolingSchedule::Logarithmic { scaling } => {
                if i == 0 {
                    t0
                } else {
                    t0 / (scaling * (1.0 + i as f64).ln())
                }
            }
            CoolingSchedule::Geometric {
                rate,
                reheat_factor,
                reheat_period,
            } => {
                let mut t = t0 * rate.powf(i as f64);
                if i > 0 && *reheat_period > 0 && i % reheat_period == 0 {
                    t *= reheat_factor;
                }
                t
            }
            CoolingSchedule::Adaptive { rate, .. } => t0 * rate.powf(i as f64),
            CoolingSchedule::Combined { schedules, weights } => {
                assert_eq!(
                    schedules.len(),
                    weights.len(),
                    "combined schedule needs one weight per schedule"
                );
                let total: f64 = weights.iter().sum();
                if total == 0.0 {
                    return 0.0;
                }
                schedules
                    .iter()
                    .zip(weights)
                    .map(|(s, w)| w * s.next(t0, i))
                    .sum::<f64>()
                    / total
            }
        }
    }

    /// Feeds the observed acceptance rate back into the schedule. Only the
    /// adaptive variant (directly or inside a combination) reacts: a rate
    /// above target shrinks the cooling rate, a rate below target grows it,
    /// clamped to [0.8, 0.999].
    pub fn observe_acceptance(&mut self, acceptance_rate: f64) {
        match self {
            CoolingSchedule::Adaptive {
                rate,
                acceptance_target,
                adaptation_factor,
            } => {
                if acceptance_rate > *acceptance_target {
                    *rate *= 1.0 - *adaptation_factor;
                } else if acceptance_rate < *acceptance_target {
                    *rate *= 1.0 + *adaptation_factor;
                }
                *rate = rate.clamp(ADAPTIVE_RATE_MIN, ADAPTIVE_RATE_MAX);
            }
            CoolingSchedule::Combined { schedules, .. } => {
                for s in schedules {
                    s.observe_acceptance(acceptance_rate);
                }
            }
            _ => {}
        }
    }

    /// Maps a cooling configuration record to a schedule. Unknown types fall
    /// back to exponential cooling at rate 0.99.
    pub fn from_config(cfg: &CoolingScheduleConfig) -> Self {
        match cfg.schedule_type.as_str() {
            "exponential" => CoolingSchedule::Exponential {
                rate: cfg.cooling_rate,
            },
            "linear" => CoolingSchedule::Linear {
                rate: cfg.cooling_rate,
            },
            "logarithmic" => CoolingSchedule::Logarithmic {
                scaling: cfg.scaling_factor,
            },
            "geometric" => CoolingSchedule::Geometric {
                rate: cfg.cooling_rate,
                reheat_factor: cfg.reheat_factor,
                reheat_period: cfg.reheat_period,
            },
            "adaptive" => CoolingSchedule::Adaptive {
                rate: cfg.cooling_rate,
                acceptance_target: cfg.acceptance_target,
                adaptation_factor: cfg.adaptation_factor,
            },
            other => {
                warn!("unknown cooling schedule type {other:?}, falling back to exponential");
                CoolingSchedule::Exponential { rate: 0.99 }
            }
        }
    }

    /// Schedule for an optimization config: the embedded cooling record when
    /// present, otherwise exponential cooling at the top-level rate.
    pub fn from_optimization_config(cfg: &OptimizationConfig) -> Self {
        match &cfg.cooling_schedule {
            Some(schedule) => Self::from_config(schedule),
            None => CoolingSchedule::Exponential {
                rate: cfg.cooling_rate,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 100.0;

    #[test]
    fn all_schedules_return_t0_at_iteration_zero() {
        let schedules = [
            CoolingSchedule::Exponential { rate: 0.95 },
            CoolingSchedule::Linear { rate: 0.5 },
            CoolingSchedule::Logarithmic { scaling: 2.0 },
            CoolingSchedule::Geometric {
                rate: 0.95,
                reheat_factor: 1.5,
                reheat_period: 10,
            },
            CoolingSchedule::Adaptive {
                rate: 0.95,
                acceptance_target: 0.3,
                adaptation_factor: 0.05,
            },
        ];
        for s in schedules {
            assert_eq!(s.next(T0, 0), T0, "{s:?} must start at t0");
        }
    }

    #[test]
    fn exponential_decays_geometrically() {
        let s = CoolingSchedule::Exponential { rate: 0.9 };
        assert!((s.next(T0, 1) - 90.0).abs() < 1e-9);
        assert!((s.next(T0, 2) - 81.0).abs() < 1e-9);
        // Recomputed from the base: the same i always yields the same value.
        assert_eq!(s.next(T0, 2), s.next(T0, 2));
    }

    #[test]
    fn linear_floors_at_zero() {
        let s = CoolingSchedule::Linear { rate: 30.0 };
        assert_eq!(s.next(T0, 2), 40.0);
        assert_eq!(s.next(T0, 4), 0.0);
        assert_eq!(s.next(T0, 100), 0.0);
    }

    #[test]
    fn logarithmic_divides_by_log() {
        let s = CoolingSchedule::Logarithmic { scaling: 2.0 };
        let expected = T0 / (2.0 * (3.0f64).ln());
        assert!((s.next(T0, 2) - expected).abs() < 1e-9);
    }

    #[test]
    fn geometric_reheats_on_period_multiples() {
        let s = CoolingSchedule::Geometric {
            rate: 0.99,
            reheat_factor: 2.0,
            reheat_period: 50,
        };
        // At i = k * period the kick applies exactly once.
        let base = T0 * 0.99f64.powf(50.0);
        assert!((s.next(T0, 50) - base * 2.0).abs() < 1e-9);
        let base100 = T0 * 0.99f64.powf(100.0);
        assert!((s.next(T0, 100) - base100 * 2.0).abs() < 1e-9);
        // Off the period there is no kick.
        let base51 = T0 * 0.99f64.powf(51.0);
        assert!((s.next(T0, 51) - base51).abs() < 1e-9);
    }

    #[test]
    fn adaptive_tracks_the_acceptance_target() {
        let mut s = CoolingSchedule::Adaptive {
            rate: 0.95,
            acceptance_target: 0.3,
            adaptation_factor: 0.1,
        };
        // Too many acceptances: cool faster (smaller rate).
        s.observe_acceptance(0.9);
        let CoolingSchedule::Adaptive { rate, .. } = s else {
            unreachable!()
        };
        assert!((rate - 0.855).abs() < 1e-9);

        // Too few acceptances: cool slower, clamped at the ceiling.
        let mut s = CoolingSchedule::Adaptive {
            rate: 0.998,
            acceptance_target: 0.3,
            adaptation_factor: 0.1,
        };
        s.observe_acceptance(0.0);
        let CoolingSchedule::Adaptive { rate, .. } = s else {
            unreachable!()
        };
        assert_eq!(rate, ADAPTIVE_RATE_MAX);

        // The floor clamps the other direction.
        let mut s = CoolingSchedule::Adaptive {
            rate: 0.81,
            acceptance_target: 0.3,
            adaptation_factor: 0.1,
        };
        s.observe_acceptance(1.0);
        let CoolingSchedule::Adaptive { rate, .. } = s else {
            unreachable!()
        };
        assert_eq!(rate, ADAPTIVE_RATE_MIN);

        // On target: unchanged.
        let mut s = CoolingSchedule::Adaptive {
            rate: 0.95,
            acceptance_target: 0.3,
            adaptation_factor: 0.1,
        };
        s.observe_acceptance(0.3);
        let CoolingSchedule::Adaptive { rate, .. } = s else {
            unreachable!()
        };
        assert_eq!(rate, 0.95);
    }

    #[test]
    fn combined_takes_the_weighted_mean() {
        let s = CoolingSchedule::Combined {
            schedules: vec![
                CoolingSchedule::Exponential { rate: 0.9 },
                CoolingSchedule::Linear { rate: 10.0 },
            ],
            weights: vec![1.0, 3.0],
        };
        // i = 1: exponential 90, linear 90 -> mean 90.
        assert!((s.next(T0, 1) - 90.0).abs() < 1e-9);
        // i = 2: exponential 81, linear 80 -> (81 + 240) / 4 = 80.25.
        assert!((s.next(T0, 2) - 80.25).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "one weight per schedule")]
    fn combined_panics_on_weight_mismatch() {
        let s = CoolingSchedule::Combined {
            schedules: vec![CoolingSchedule::Exponential { rate: 0.9 }],
            weights: vec![1.0, 2.0],
        };
        s.next(T0, 0);
    }

    #[test]
    fn config_mapping_covers_the_catalogue() {
        let mut cfg = CoolingScheduleConfig::default();
        assert_eq!(
            CoolingSchedule::from_config(&cfg),
            CoolingSchedule::Exponential { rate: 0.99 }
        );

        cfg.schedule_type = "geometric".into();
        cfg.cooling_rate = 0.95;
        cfg.reheat_factor = 1.2;
        cfg.reheat_period = 500;
        assert_eq!(
            CoolingSchedule::from_config(&cfg),
            CoolingSchedule::Geometric {
                rate: 0.95,
                reheat_factor: 1.2,
                reheat_period: 500,
            }
        );

        cfg.schedule_type = "does_not_exist".into();
        assert_eq!(
            CoolingSchedule::from_config(&cfg),
            CoolingSchedule::Exponential { rate: 0.99 }
        );
    }

    #[test]
    fn optimization_config_falls_back_to_top_level_rate() {
        let cfg = OptimizationConfig {
            cooling_rate: 0.97,
            ..Default::default()
        };
        assert_eq!(
            CoolingSchedule::from_optimization_config(&cfg),
            CoolingSchedule::Exponential { rate: 0.97 }
        );
    }
}
