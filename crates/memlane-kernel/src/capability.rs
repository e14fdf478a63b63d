//! [`CapabilityDetector`] – one-shot render-mode decision.
//!
//! The host tells us, once, whether it can present an immersive scene.  The
//! detector turns that signal into a [`RenderMode`] and then refuses to change
//! its mind for the rest of the session: interaction machines built for one
//! mode have different timer semantics than the other, so a live switch would
//! strand their timers.  Anything short of a clear "supported" picks
//! [`RenderMode::Flat`].

use std::fmt;

use tracing::{debug, info};

/// The two mutually exclusive presentation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Gaze- or pointer-driven 3-D scene with dwell-to-expand.
    Immersive,
    /// 2-D fallback; hover expands immediately.
    Flat,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Immersive => f.write_str("immersive"),
            RenderMode::Flat => f.write_str("flat"),
        }
    }
}

/// The host's immersive-support signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmersiveSignal {
    Supported,
    Unsupported,
    /// Absent, unparsable, or the probe could not tell.
    Indeterminate,
}

impl ImmersiveSignal {
    /// From an optional host flag; `None` is indeterminate.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => ImmersiveSignal::Supported,
            Some(false) => ImmersiveSignal::Unsupported,
            None => ImmersiveSignal::Indeterminate,
        }
    }

    /// From a boolean-ish string such as an environment variable.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "immersive" | "immersive-vr" | "immersive-ar" => {
                ImmersiveSignal::Supported
            }
            "0" | "false" | "no" | "off" | "flat" | "inline" => ImmersiveSignal::Unsupported,
            _ => ImmersiveSignal::Indeterminate,
        }
    }
}

/// Resolves the session's [`RenderMode`] exactly once.
///
/// # Example
///
/// ```
/// use memlane_kernel::capability::{CapabilityDetector, ImmersiveSignal, RenderMode};
///
/// let mut detector = CapabilityDetector::new();
/// assert_eq!(detector.detect(ImmersiveSignal::Supported), RenderMode::Immersive);
///
/// // Later signals are ignored for the rest of the session.
/// assert_eq!(detector.detect(ImmersiveSignal::Unsupported), RenderMode::Immersive);
/// ```
#[derive(Debug, Default)]
pub struct CapabilityDetector {
    decided: Option<RenderMode>,
}

impl CapabilityDetector {
    /// Create a detector that has not decided yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session's mode, deciding from `signal` on the first call.
    pub fn detect(&mut self, signal: ImmersiveSignal) -> RenderMode {
        if let Some(mode) = self.decided {
            debug!(?signal, %mode, "render mode already fixed for this session; signal ignored");
            return mode;
        }
        let mode = match signal {
            ImmersiveSignal::Supported => RenderMode::Immersive,
            ImmersiveSignal::Unsupported | ImmersiveSignal::Indeterminate => RenderMode::Flat,
        };
        info!(?signal, %mode, "render mode selected");
        self.decided = Some(mode);
        mode
    }

    /// The decision, if one has been made.
    pub fn decided(&self) -> Option<RenderMode> {
        self.decided
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_selects_immersive() {
        let mut d = CapabilityDetector::new();
        assert_eq!(d.detect(ImmersiveSignal::Supported), RenderMode::Immersive);
    }

    #[test]
    fn absent_or_false_selects_flat() {
        let mut d = CapabilityDetector::new();
        assert_eq!(d.detect(ImmersiveSignal::from_flag(None)), RenderMode::Flat);
        let mut d = CapabilityDetector::new();
        assert_eq!(d.detect(ImmersiveSignal::from_flag(Some(false))), RenderMode::Flat);
    }

    #[test]
    fn decision_is_fixed_after_first_call() {
        let mut d = CapabilityDetector::new();
        assert_eq!(d.decided(), None);
        assert_eq!(d.detect(ImmersiveSignal::Unsupported), RenderMode::Flat);
        assert_eq!(d.detect(ImmersiveSignal::Supported), RenderMode::Flat);
        assert_eq!(d.decided(), Some(RenderMode::Flat));
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(ImmersiveSignal::parse("TRUE"), ImmersiveSignal::Supported);
        assert_eq!(ImmersiveSignal::parse(" immersive-vr "), ImmersiveSignal::Supported);
        assert_eq!(ImmersiveSignal::parse("0"), ImmersiveSignal::Unsupported);
        assert_eq!(ImmersiveSignal::parse("no"), ImmersiveSignal::Unsupported);
    }

    #[test]
    fn parse_garbage_is_indeterminate_and_fails_safe() {
        let signal = ImmersiveSignal::parse("maybe?");
        assert_eq!(signal, ImmersiveSignal::Indeterminate);
        assert_eq!(CapabilityDetector::new().detect(signal), RenderMode::Flat);
    }
}
