//! Channel hit decoding.
//!
//! Turns one [`RawFragment`] into exactly one [`DetectorHit`]: calibrates
//! energy and time with the channel's constants and, when waveform fitting is
//! enabled, refines amplitude and timing from the trace. Fit failures are
//! logged and leave the refined fields empty.
#![allow(clippy::cast_precision_loss)]

use crate::error::FitError;
use hitbuilder_core::{
    AnalysisOptions, ChannelInfo, ChannelRole, DetectorHit, HitCore, RawFragment, WaveformFit,
};

/// Opaque waveform fit producing amplitude and timing.
pub trait WaveformFitter: Send + Sync {
    /// Fitter name.
    fn name(&self) -> &'static str;

    /// Fits a trace.
    ///
    /// # Errors
    /// Returns a [`FitError`] if the trace cannot be fitted.
    fn fit(&self, samples: &[i16]) -> Result<WaveformFit, FitError>;
}

/// Configuration for [`PulseShapeFitter`].
#[derive(Clone, Debug)]
pub struct PulseShapeConfig {
    /// Number of leading samples averaged into the baseline.
    pub baseline_samples: usize,
    /// Smallest pulse height accepted as a pulse (ADC units).
    pub min_amplitude: f64,
}

impl Default for PulseShapeConfig {
    fn default() -> Self {
        Self {
            baseline_samples: 8,
            min_amplitude: 2.0,
        }
    }
}

/// Baseline-subtracted leading-edge fitter.
///
/// 1. Baseline: mean of the first `baseline_samples` samples
/// 2. Peak: largest deviation from the baseline after the baseline region
/// 3. Time: interpolated 50% crossing on the leading edge
/// 4. Rise time: 10% to 90% crossings
///
/// Works for either pulse polarity.
#[derive(Clone, Debug, Default)]
pub struct PulseShapeFitter {
    config: PulseShapeConfig,
}

impl PulseShapeFitter {
    /// Creates a fitter with the given configuration.
    #[must_use]
    pub fn new(config: PulseShapeConfig) -> Self {
        Self { config }
    }
}

impl WaveformFitter for PulseShapeFitter {
    fn name(&self) -> &'static str {
        "PulseShape"
    }

    fn fit(&self, samples: &[i16]) -> Result<WaveformFit, FitError> {
        let n_base = self.config.baseline_samples.max(1);
        let needed = n_base + 2;
        if samples.len() < needed {
            return Err(FitError::InsufficientSamples {
                got: samples.len(),
                needed,
            });
        }

        let baseline =
            samples[..n_base].iter().map(|&s| f64::from(s)).sum::<f64>() / n_base as f64;

        let (peak_idx, peak_dev) = samples
            .iter()
            .enumerate()
            .skip(n_base)
            .map(|(i, &s)| (i, f64::from(s) - baseline))
            .fold((n_base, 0.0_f64), |best, (i, dev)| {
                if dev.abs() > best.1.abs() {
                    (i, dev)
                } else {
                    best
                }
            });

        let amplitude = peak_dev.abs();
        if amplitude < self.config.min_amplitude {
            return Err(FitError::FlatTrace { amplitude });
        }
        let polarity = peak_dev.signum();

        // Signed deviation along the pulse direction, so both polarities rise.
        let dev = |i: usize| (f64::from(samples[i]) - baseline) * polarity;
        let crossing = |fraction: f64| -> f64 {
            let level = fraction * amplitude;
            for i in n_base..=peak_idx {
                let d = dev(i);
                if d >= level {
                    if i == 0 {
                        return 0.0;
                    }
                    let prev = dev(i - 1);
                    if d == prev {
                        return i as f64;
                    }
                    return (i - 1) as f64 + (level - prev) / (d - prev);
                }
            }
            peak_idx as f64
        };

        let t10 = crossing(0.1);
        let t50 = crossing(0.5);
        let t90 = crossing(0.9);

        Ok(WaveformFit {
            amplitude,
            time: t50,
            rise_time: (t90 - t10).max(0.0),
            baseline,
        })
    }
}

/// Decodes fragments into hits.
pub struct ChannelHitDecoder {
    fitter: Box<dyn WaveformFitter>,
}

impl Default for ChannelHitDecoder {
    fn default() -> Self {
        Self::new(PulseShapeFitter::default())
    }
}

impl ChannelHitDecoder {
    /// Creates a decoder using the given waveform fitter.
    pub fn new<F: WaveformFitter + 'static>(fitter: F) -> Self {
        Self {
            fitter: Box::new(fitter),
        }
    }

    /// Name of the waveform fitter in use.
    #[must_use]
    pub fn fitter_name(&self) -> &'static str {
        self.fitter.name()
    }

    /// Decodes one fragment.
    ///
    /// `channel` is the identity/calibration record supplied with the
    /// fragment; without it the hit keeps the raw charge as energy and has no
    /// array address.
    #[must_use]
    pub fn decode(
        &self,
        fragment: &RawFragment,
        channel: Option<&ChannelInfo>,
        options: &AnalysisOptions,
    ) -> DetectorHit {
        let core = match channel {
            Some(info) => HitCore {
                channel: fragment.channel,
                address: Some(info.address),
                role: info.role,
                energy: info.calibrate_energy(fragment.charge),
                timestamp: info.calibrate_timestamp(fragment.timestamp),
                charge: fragment.charge,
            },
            None => HitCore {
                channel: fragment.channel,
                address: None,
                role: ChannelRole::Detector,
                energy: fragment.charge,
                timestamp: fragment.timestamp,
                charge: fragment.charge,
            },
        };

        let mut hit = DetectorHit::new(core);
        if options.waveform_fitting() {
            if let Some(samples) = fragment.waveform.as_deref() {
                match self.fitter.fit(samples) {
                    Ok(fit) => hit.transients_mut().fit = Some(fit),
                    Err(e) => log::debug!(
                        "{} fit failed for channel {} at {}: {e}",
                        self.fitter.name(),
                        fragment.channel,
                        fragment.timestamp
                    ),
                }
            }
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hitbuilder_core::{ArrayKind, ChannelAddress};

    fn pulse() -> Vec<i16> {
        // Baseline 100, linear rise to 200 over 4 samples, then decay.
        vec![
            100, 100, 100, 100, 100, 100, 100, 100, 125, 150, 175, 200, 180, 160, 140,
        ]
    }

    #[test]
    fn test_fit_positive_pulse() {
        let fit = PulseShapeFitter::default().fit(&pulse()).unwrap();
        assert_relative_eq!(fit.baseline, 100.0);
        assert_relative_eq!(fit.amplitude, 100.0);
        // 50% (150) is reached exactly at sample 9.
        assert_relative_eq!(fit.time, 9.0);
        // 10% at 7.4, 90% at 10.6
        assert_relative_eq!(fit.rise_time, 3.2, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_negative_pulse() {
        let inverted: Vec<i16> = pulse().iter().map(|s| 200 - s).collect();
        let fit = PulseShapeFitter::default().fit(&inverted).unwrap();
        assert_relative_eq!(fit.amplitude, 100.0);
        assert_relative_eq!(fit.time, 9.0);
    }

    #[test]
    fn test_fit_too_short() {
        let err = PulseShapeFitter::default().fit(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, FitError::InsufficientSamples { got: 3, needed: 10 });
    }

    #[test]
    fn test_fit_flat_trace() {
        let err = PulseShapeFitter::default().fit(&[50; 20]).unwrap_err();
        assert!(matches!(err, FitError::FlatTrace { .. }));
    }

    #[test]
    fn test_decode_calibrates() {
        let info = ChannelInfo::new(4, ChannelAddress::new(3, 0))
            .with_energy_coefficients(vec![1.0, 2.0])
            .with_time_offset(10);
        let fragment = RawFragment::new(ArrayKind::Sceptar, 4, 1000, 50.0);
        let hit = ChannelHitDecoder::default().decode(
            &fragment,
            Some(&info),
            &AnalysisOptions::default(),
        );
        assert_relative_eq!(hit.energy(), 101.0);
        assert_eq!(hit.timestamp(), 1010);
        assert_eq!(hit.address(), Some(ChannelAddress::new(3, 0)));
        assert_relative_eq!(hit.core().charge, 50.0);
    }

    #[test]
    fn test_decode_unknown_channel_keeps_hit() {
        let fragment = RawFragment::new(ArrayKind::Descant, 999, 42, 7.5);
        let hit = ChannelHitDecoder::default().decode(&fragment, None, &AnalysisOptions::default());
        assert_eq!(hit.channel(), 999);
        assert!(hit.address().is_none());
        assert_relative_eq!(hit.energy(), 7.5);
    }

    #[test]
    fn test_waveform_fit_only_when_enabled() {
        let fragment = RawFragment::new(ArrayKind::Descant, 1, 0, 10.0).with_waveform(pulse());
        let decoder = ChannelHitDecoder::default();

        let off = decoder.decode(&fragment, None, &AnalysisOptions::default());
        assert!(off.transients().fit.is_none());

        let options = AnalysisOptions::default().with_waveform_fitting(true);
        let on = decoder.decode(&fragment, None, &options);
        assert!(on.transients().fit.is_some());
        assert_eq!(fragment.waveform.as_deref(), Some(pulse().as_slice()));
    }

    #[test]
    fn test_failed_fit_does_not_fail_decode() {
        let fragment = RawFragment::new(ArrayKind::Descant, 1, 5, 10.0).with_waveform(vec![1, 2]);
        let options = AnalysisOptions::default().with_waveform_fitting(true);
        let hit = ChannelHitDecoder::default().decode(&fragment, None, &options);
        assert!(hit.transients().fit.is_none());
        assert_eq!(hit.timestamp(), 5);
    }
}
