//! Alert banner controller: one overwritable slot at the top of the dashboard.

use serde::{Deserialize, Serialize};

use crate::intelligence::thresholds::classify;
use crate::intelligence::{Condition, Tier};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    #[default]
    None,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertBanner {
    pub kind: BannerKind,
    pub title: String,
    pub detail: String,
}

impl AlertBanner {
    pub fn is_visible(&self) -> bool {
        self.kind != BannerKind::None
    }
}

/// Banner content for the signed-in user's BMI. `None` below 25 or when
/// BMI is unavailable.
pub fn bmi_banner(bmi: Option<f64>) -> Option<AlertBanner> {
    let banner = match classify(Condition::Bmi, bmi?)? {
        Tier::High => AlertBanner {
            kind: BannerKind::Danger,
            title: "Atención: IMC Alto".into(),
            detail: "Tu IMC está en rango de obesidad. Agenda control y refuerza hábitos.".into(),
        },
        Tier::Elevated => AlertBanner {
            kind: BannerKind::Warning,
            title: "Aviso: IMC Elevado".into(),
            detail: "Tu IMC está en sobrepeso. Revisa pausas activas y alimentación.".into(),
        },
        Tier::Normal => return None,
    };
    Some(banner)
}

/// Holds the single visible banner.
///
/// `show` overwrites unconditionally. `raise` is what the load pipeline
/// uses: within one cycle it never replaces a banner with a less severe one.
#[derive(Debug, Default)]
pub struct AlertBannerController {
    current: AlertBanner,
}

impl AlertBannerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &AlertBanner {
        &self.current
    }

    pub fn show(&mut self, kind: BannerKind, title: &str, detail: &str) {
        self.current = AlertBanner {
            kind,
            title: title.into(),
            detail: detail.into(),
        };
    }

    /// Replace the banner unless the visible one is more severe.
    /// Returns whether the banner changed.
    pub fn raise(&mut self, banner: AlertBanner) -> bool {
        if banner.kind < self.current.kind {
            return false;
        }
        self.current = banner;
        true
    }

    /// Start a new rendering cycle with no banner.
    pub fn begin_cycle(&mut self) {
        self.current = AlertBanner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_banner_tiers() {
        assert_eq!(bmi_banner(Some(31.1)).unwrap().kind, BannerKind::Danger);
        assert_eq!(bmi_banner(Some(30.0)).unwrap().kind, BannerKind::Danger);
        assert_eq!(bmi_banner(Some(25.0)).unwrap().kind, BannerKind::Warning);
        assert!(bmi_banner(Some(24.9)).is_none());
        assert!(bmi_banner(None).is_none());
    }

    #[test]
    fn show_overwrites_everything() {
        let mut c = AlertBannerController::new();
        c.show(BannerKind::Danger, "A", "a");
        c.show(BannerKind::Warning, "B", "b");
        assert_eq!(c.current().kind, BannerKind::Warning);
        assert_eq!(c.current().title, "B");
    }

    #[test]
    fn raise_never_downgrades_within_cycle() {
        let mut c = AlertBannerController::new();
        assert!(c.raise(bmi_banner(Some(32.0)).unwrap()));
        assert!(!c.raise(bmi_banner(Some(26.0)).unwrap()));
        assert_eq!(c.current().kind, BannerKind::Danger);

        c.begin_cycle();
        assert!(!c.current().is_visible());
        assert!(c.raise(bmi_banner(Some(26.0)).unwrap()));
        assert_eq!(c.current().kind, BannerKind::Warning);
    }
}
