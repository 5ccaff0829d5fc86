//! Parameterised distance instances.
//!
//! An [`Elastic`] value names a measure and carries its parameters; a
//! [`DistanceInstance`] binds it into an evaluator with any precomputed state
//! (WDTW weights) and a reusable per-thread scratch buffer, so the hot loop
//! stays allocation-free.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::instrument;

use crate::adtw::adtw_univariate;
use crate::cdtw::cdtw_univariate;
use crate::direct::{directa_univariate, lorentzian, minkowski};
use crate::dtw::dtw_univariate;
use crate::erp::erp_univariate;
use crate::error::DistError;
use crate::lcss::lcss_univariate;
use crate::msm::msm_univariate;
use crate::series::TimeSeriesView;
use crate::twe::twe_univariate;
use crate::wdtw::{generate_weights, wdtw_univariate};

thread_local! {
    static SCRATCH: RefCell<Vec<f64>> = const { RefCell::new(Vec::new()) };
}

/// Warping window constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// No constraint.
    Full,
    /// Cells with `|i - j| > w` are unreachable.
    Window(usize),
}

impl Band {
    fn raw(self, nblines: usize) -> usize {
        match self {
            Band::Full => nblines,
            Band::Window(w) => w,
        }
    }
}

/// A distance measure with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Elastic {
    /// Direct alignment with cost exponent `exponent`.
    Direct { exponent: f64 },
    /// Modified Minkowski (no e-th root).
    Minkowski { exponent: f64 },
    /// Lorentzian.
    Lorentzian,
    /// DTW, optionally windowed.
    Dtw { exponent: f64, window: Band },
    /// Amerced DTW with penalty `penalty` on non-diagonal steps.
    Adtw { exponent: f64, penalty: f64 },
    /// Weighted DTW with sigmoid weight factor `g`.
    Wdtw { exponent: f64, g: f64 },
    /// Edit distance with Real Penalty against gap value `gap_value`.
    Erp {
        exponent: f64,
        gap_value: f64,
        window: Band,
    },
    /// Longest Common SubSequence with tolerance `epsilon`.
    Lcss { epsilon: f64, window: Band },
    /// Move-Split-Merge with split/merge cost `cost`.
    Msm { cost: f64 },
    /// Time Warp Edit with stiffness `nu` and deletion penalty `lambda`.
    Twe { exponent: f64, nu: f64, lambda: f64 },
}

fn parse_f64(spec: &str, field: &str) -> Result<f64, DistError> {
    field.parse().map_err(|_| DistError::MalformedSpec {
        spec: spec.to_string(),
    })
}

fn parse_window(spec: &str, field: &str) -> Result<Band, DistError> {
    let w: i64 = field.parse().map_err(|_| DistError::MalformedSpec {
        spec: spec.to_string(),
    })?;
    if w < 0 {
        Ok(Band::Full)
    } else {
        Ok(Band::Window(w as usize))
    }
}

impl Elastic {
    /// Parse a colon-packed distance specification, e.g. `dtw:2:10`,
    /// `erp:2:0.5:-1` (negative window means unconstrained), `msm:0.5`.
    ///
    /// # Errors
    ///
    /// [`DistError::UnknownDistance`] for an unrecognised name,
    /// [`DistError::MalformedSpec`] for a wrong field count or an
    /// unparseable number.
    pub fn parse(spec: &str) -> Result<Self, DistError> {
        let v: Vec<&str> = spec.split(':').collect();
        let malformed = || DistError::MalformedSpec {
            spec: spec.to_string(),
        };
        match v[0] {
            "directa" => match v.as_slice() {
                [_, e] => Ok(Elastic::Direct {
                    exponent: parse_f64(spec, e)?,
                }),
                _ => Err(malformed()),
            },
            "modminkowski" => match v.as_slice() {
                [_, e] => Ok(Elastic::Minkowski {
                    exponent: parse_f64(spec, e)?,
                }),
                _ => Err(malformed()),
            },
            "lorentzian" => match v.as_slice() {
                [_] => Ok(Elastic::Lorentzian),
                _ => Err(malformed()),
            },
            "dtw" => match v.as_slice() {
                [_, e, w] => Ok(Elastic::Dtw {
                    exponent: parse_f64(spec, e)?,
                    window: parse_window(spec, w)?,
                }),
                _ => Err(malformed()),
            },
            "adtw" => match v.as_slice() {
                [_, e, omega] => Ok(Elastic::Adtw {
                    exponent: parse_f64(spec, e)?,
                    penalty: parse_f64(spec, omega)?,
                }),
                _ => Err(malformed()),
            },
            "wdtw" => match v.as_slice() {
                [_, e, g] => Ok(Elastic::Wdtw {
                    exponent: parse_f64(spec, e)?,
                    g: parse_f64(spec, g)?,
                }),
                _ => Err(malformed()),
            },
            "erp" => match v.as_slice() {
                [_, e, gv, w] => Ok(Elastic::Erp {
                    exponent: parse_f64(spec, e)?,
                    gap_value: parse_f64(spec, gv)?,
                    window: parse_window(spec, w)?,
                }),
                _ => Err(malformed()),
            },
            "lcss" => match v.as_slice() {
                [_, eps, w] => Ok(Elastic::Lcss {
                    epsilon: parse_f64(spec, eps)?,
                    window: parse_window(spec, w)?,
                }),
                _ => Err(malformed()),
            },
            "msm" => match v.as_slice() {
                [_, c] => Ok(Elastic::Msm {
                    cost: parse_f64(spec, c)?,
                }),
                _ => Err(malformed()),
            },
            "twe" => match v.as_slice() {
                [_, e, nu, lambda] => Ok(Elastic::Twe {
                    exponent: parse_f64(spec, e)?,
                    nu: parse_f64(spec, nu)?,
                    lambda: parse_f64(spec, lambda)?,
                }),
                _ => Err(malformed()),
            },
            name => Err(DistError::UnknownDistance {
                name: name.to_string(),
            }),
        }
    }

    /// Printable name with parameters, in the same syntax [`parse`] accepts.
    ///
    /// [`parse`]: Elastic::parse
    #[must_use]
    pub fn name(&self) -> String {
        let win = |w: &Band| match w {
            Band::Full => "-1".to_string(),
            Band::Window(w) => w.to_string(),
        };
        match self {
            Elastic::Direct { exponent } => format!("directa:{exponent}"),
            Elastic::Minkowski { exponent } => format!("modminkowski:{exponent}"),
            Elastic::Lorentzian => "lorentzian".to_string(),
            Elastic::Dtw { exponent, window } => format!("dtw:{exponent}:{}", win(window)),
            Elastic::Adtw { exponent, penalty } => format!("adtw:{exponent}:{penalty}"),
            Elastic::Wdtw { exponent, g } => format!("wdtw:{exponent}:{g}"),
            Elastic::Erp {
                exponent,
                gap_value,
                window,
            } => format!("erp:{exponent}:{gap_value}:{}", win(window)),
            Elastic::Lcss { epsilon, window } => format!("lcss:{epsilon}:{}", win(window)),
            Elastic::Msm { cost } => format!("msm:{cost}"),
            Elastic::Twe {
                exponent,
                nu,
                lambda,
            } => format!("twe:{exponent}:{nu}:{lambda}"),
        }
    }

    fn validate(&self) -> Result<(), DistError> {
        let positive = |param, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(DistError::InvalidParameter { param, value })
            }
        };
        let non_negative = |param, value: f64| {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(DistError::InvalidParameter { param, value })
            }
        };
        match *self {
            Elastic::Direct { exponent }
            | Elastic::Minkowski { exponent }
            | Elastic::Dtw { exponent, .. } => positive("exponent", exponent),
            Elastic::Lorentzian => Ok(()),
            Elastic::Adtw { exponent, penalty } => {
                positive("exponent", exponent)?;
                non_negative("penalty", penalty)
            }
            Elastic::Wdtw { exponent, g } => {
                positive("exponent", exponent)?;
                non_negative("g", g)
            }
            Elastic::Erp {
                exponent,
                gap_value,
                ..
            } => {
                positive("exponent", exponent)?;
                if gap_value.is_finite() {
                    Ok(())
                } else {
                    Err(DistError::InvalidParameter {
                        param: "gap_value",
                        value: gap_value,
                    })
                }
            }
            Elastic::Lcss { epsilon, .. } => non_negative("epsilon", epsilon),
            Elastic::Msm { cost } => non_negative("cost", cost),
            Elastic::Twe {
                exponent,
                nu,
                lambda,
            } => {
                positive("exponent", exponent)?;
                non_negative("nu", nu)?;
                non_negative("lambda", lambda)
            }
        }
    }
}

/// A validated, evaluation-ready distance: measure, parameters, and any
/// precomputed state. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct DistanceInstance {
    elastic: Elastic,
    weights: Option<Arc<Vec<f64>>>,
}

impl DistanceInstance {
    /// Validate the parameters and bind the measure. `length_max` must cover
    /// the longest series this instance will see; WDTW precomputes its weight
    /// vector to that length.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::InvalidParameter`] when a parameter is outside
    /// its valid range.
    #[instrument(level = "debug", skip(elastic), fields(distance = %elastic.name()))]
    pub fn new(elastic: Elastic, length_max: usize) -> Result<Self, DistError> {
        elastic.validate()?;
        let weights = match elastic {
            Elastic::Wdtw { g, .. } => Some(Arc::new(generate_weights(g, length_max))),
            _ => None,
        };
        Ok(Self { elastic, weights })
    }

    /// Return the bound measure.
    #[must_use]
    pub fn elastic(&self) -> &Elastic {
        &self.elastic
    }

    /// Printable name with parameters.
    #[must_use]
    pub fn name(&self) -> String {
        self.elastic.name()
    }

    /// Evaluate the distance between two univariate series with an upper
    /// bound: a finite `cutoff` prunes and abandons (returning `+∞` past it),
    /// `+∞` prunes against the internal diagonal bound, `NaN` computes the
    /// full dynamic program.
    #[must_use]
    #[instrument(level = "trace", skip_all)]
    pub fn eval(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>, cutoff: f64) -> f64 {
        debug_assert_eq!(a.dim(), 1);
        debug_assert_eq!(b.dim(), 1);
        let x = a.as_slice();
        let y = b.as_slice();
        let nblines = x.len().max(y.len());
        SCRATCH.with(|scratch| {
            let buffer = &mut *scratch.borrow_mut();
            match &self.elastic {
                Elastic::Direct { exponent } => directa_univariate(x, y, *exponent, cutoff),
                Elastic::Minkowski { exponent } => minkowski(x, y, *exponent),
                Elastic::Lorentzian => lorentzian(x, y),
                Elastic::Dtw {
                    exponent,
                    window: Band::Full,
                } => dtw_univariate(x, y, *exponent, cutoff, buffer),
                Elastic::Dtw { exponent, window } => {
                    cdtw_univariate(x, y, *exponent, window.raw(nblines), cutoff, buffer)
                }
                Elastic::Adtw { exponent, penalty } => {
                    adtw_univariate(x, y, *exponent, *penalty, cutoff, buffer)
                }
                Elastic::Wdtw { exponent, .. } => {
                    let weights = self.weights.as_ref().expect("weights precomputed for WDTW");
                    wdtw_univariate(x, y, *exponent, weights, cutoff, buffer)
                }
                Elastic::Erp {
                    exponent,
                    gap_value,
                    window,
                } => erp_univariate(
                    x,
                    y,
                    *exponent,
                    *gap_value,
                    window.raw(nblines),
                    cutoff,
                    buffer,
                ),
                Elastic::Lcss { epsilon, window } => {
                    lcss_univariate(x, y, *epsilon, window.raw(nblines), cutoff)
                }
                Elastic::Msm { cost } => msm_univariate(x, y, *cost, cutoff, buffer),
                Elastic::Twe {
                    exponent,
                    nu,
                    lambda,
                } => twe_univariate(x, y, *exponent, *nu, *lambda, cutoff, buffer),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;

    #[test]
    fn parse_roundtrip() {
        for spec in [
            "directa:2",
            "modminkowski:1.5",
            "lorentzian",
            "dtw:2:10",
            "dtw:2:-1",
            "adtw:2:0.5",
            "wdtw:2:0.25",
            "erp:2:0.5:-1",
            "lcss:0.1:5",
            "msm:0.5",
            "twe:2:0.001:0.25",
        ] {
            let e = Elastic::parse(spec).unwrap();
            assert_eq!(e.name(), spec);
        }
    }

    #[test]
    fn parse_rejects_unknown_name() {
        assert!(matches!(
            Elastic::parse("frobnicate:2"),
            Err(DistError::UnknownDistance { .. })
        ));
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(matches!(
            Elastic::parse("dtw:2"),
            Err(DistError::MalformedSpec { .. })
        ));
        assert!(matches!(
            Elastic::parse("msm:abc"),
            Err(DistError::MalformedSpec { .. })
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(DistanceInstance::new(
            Elastic::Dtw {
                exponent: 0.0,
                window: Band::Full
            },
            10
        )
        .is_err());
        assert!(DistanceInstance::new(
            Elastic::Adtw {
                exponent: 2.0,
                penalty: -1.0
            },
            10
        )
        .is_err());
    }

    #[test]
    fn eval_matches_kernel() {
        let a = TimeSeries::new(vec![1.0, 2.0, 3.0]).unwrap();
        let b = TimeSeries::new(vec![2.0, 3.0, 4.0]).unwrap();
        let inst = DistanceInstance::new(
            Elastic::Dtw {
                exponent: 2.0,
                window: Band::Full,
            },
            3,
        )
        .unwrap();
        assert_eq!(inst.eval(a.as_view(), b.as_view(), f64::INFINITY), 2.0);
    }

    #[test]
    fn lcss_ignores_nan_cutoff_mode() {
        let a = TimeSeries::new(vec![1.0, 2.0]).unwrap();
        let inst = DistanceInstance::new(
            Elastic::Lcss {
                epsilon: 0.5,
                window: Band::Full,
            },
            2,
        )
        .unwrap();
        assert_eq!(inst.eval(a.as_view(), a.as_view(), f64::NAN), 0.0);
    }
}
