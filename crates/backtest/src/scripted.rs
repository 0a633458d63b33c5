//! Signal provider replaying a fixed action sequence.

use galaxy_core::{Action, Error, PriceBar, Result, Signal, SignalProvider};

/// Replays `actions[i]` at step `i`; steps past the end are Hold.
///
/// Useful for precomputed signals and for exercising the engine with a
/// known decision sequence.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    actions: Vec<Action>,
}

impl ScriptedProvider {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Build from signal names ("buy", "sell", "hold", "" or "none").
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let actions = names
            .iter()
            .map(|name| Action::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(actions))
    }

    /// Like [`from_names`](Self::from_names), but requires exactly one name
    /// per bar.
    pub fn aligned<S: AsRef<str>>(names: &[S], bar_count: usize) -> Result<Self> {
        if names.len() != bar_count {
            return Err(Error::invalid_input(format!(
                "got {} signals for {} bars",
                names.len(),
                bar_count
            )));
        }
        Self::from_names(names)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl SignalProvider for ScriptedProvider {
    fn generate(&self, prefix: &[PriceBar], sentiment_score: f64) -> Result<Signal> {
        let step = prefix.len().saturating_sub(1);
        let action = self.actions.get(step).copied().unwrap_or_default();
        Ok(Signal::new(action).with_sentiment(sentiment_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_rejects_length_mismatch() {
        let names = ["buy", "hold", "sell"];

        assert_eq!(ScriptedProvider::aligned(&names, 3).unwrap().len(), 3);
        assert!(matches!(ScriptedProvider::aligned(&names, 4), Err(Error::InvalidInput(_))));
        assert!(matches!(ScriptedProvider::aligned(&names, 2), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_replays_by_prefix_length() {
        let provider = ScriptedProvider::new(vec![Action::Buy, Action::Hold, Action::Sell]);
        let bars: Vec<PriceBar> = (0..4).map(|i| PriceBar::from_close(i, 100.0)).collect();

        assert_eq!(provider.generate(&bars[..1], 0.0).unwrap().action, Action::Buy);
        assert_eq!(provider.generate(&bars[..2], 0.0).unwrap().action, Action::Hold);
        assert_eq!(provider.generate(&bars[..3], 0.0).unwrap().action, Action::Sell);
        // Past the script
        assert_eq!(provider.generate(&bars[..4], 0.0).unwrap().action, Action::Hold);
    }

    #[test]
    fn test_from_names() {
        let provider = ScriptedProvider::from_names(&["buy", "", "sell"]).unwrap();
        assert_eq!(provider.len(), 3);
        assert!(ScriptedProvider::from_names(&["moon"]).is_err());
    }
}
