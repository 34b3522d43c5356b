//! Trigger resolution
//!
//! Resolved once at bind time and immutable thereafter.

use crate::vocab::ActionKind;

/// The interaction that invokes a bound action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Run during the dispatch pass
    Load,
    /// Run when the named interaction fires on (or under) the element
    Event(String),
}

impl Trigger {
    /// Resolve an element's trigger
    ///
    /// An explicit trigger attribute wins verbatim. Otherwise
    /// data-dependent actions default to Load and fetches to click.
    pub fn resolve(explicit: Option<&str>, action: ActionKind) -> Trigger {
        match explicit {
            Some("load") => Trigger::Load,
            Some(name) => Trigger::Event(name.to_string()),
            None => {
                if action.is_data_dependent() {
                    Trigger::Load
                } else {
                    Trigger::Event("click".to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_trigger_wins() {
        assert_eq!(
            Trigger::resolve(Some("mouseover"), ActionKind::Data),
            Trigger::Event("mouseover".into())
        );
        assert_eq!(Trigger::resolve(Some("load"), ActionKind::Get), Trigger::Load);
        assert_eq!(
            Trigger::resolve(Some("click"), ActionKind::If),
            Trigger::Event("click".into())
        );
    }

    #[test]
    fn test_data_dependent_defaults_to_load() {
        assert_eq!(Trigger::resolve(None, ActionKind::If), Trigger::Load);
        assert_eq!(Trigger::resolve(None, ActionKind::Render), Trigger::Load);
        assert_eq!(Trigger::resolve(None, ActionKind::Data), Trigger::Load);
    }

    #[test]
    fn test_fetches_default_to_click() {
        assert_eq!(
            Trigger::resolve(None, ActionKind::Get),
            Trigger::Event("click".into())
        );
        assert_eq!(
            Trigger::resolve(None, ActionKind::Post),
            Trigger::Event("click".into())
        );
    }
}
