//! Circle screen-transition triggers
//!
//! The transition lives somewhere in the scene; when it cannot be found the
//! request is reported and dropped.

/// Full-screen circle wipe owned by the host
pub trait ScreenTransition {
    /// Open the circle, revealing the scene
    fn fade_in(&mut self);
    /// Close the circle, hiding the scene
    fn fade_out(&mut self);
    /// Close immediately
    fn fast_fade_out(&mut self);
}

/// Reveal the scene. Returns false if there is no transition.
pub fn fade_in_transition(transition: Option<&mut dyn ScreenTransition>) -> bool {
    match transition {
        Some(t) => {
            t.fade_in();
            true
        }
        None => {
            log::error!("Circle transition not found in the scene (fade in)");
            false
        }
    }
}

/// Hide the scene. Returns false if there is no transition.
pub fn fade_out_transition(transition: Option<&mut dyn ScreenTransition>) -> bool {
    match transition {
        Some(t) => {
            t.fade_out();
            true
        }
        None => {
            log::error!("Circle transition not found in the scene (fade out)");
            false
        }
    }
}

/// Hide the scene without animating. Returns false if there is no transition.
pub fn cut_transition(transition: Option<&mut dyn ScreenTransition>) -> bool {
    match transition {
        Some(t) => {
            t.fast_fade_out();
            true
        }
        None => {
            log::error!("Circle transition not found in the scene (cut)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sandbox::SandboxTransition;

    #[test]
    fn test_triggers_reach_transition() {
        let mut ct = SandboxTransition::default();
        assert!(fade_out_transition(Some(&mut ct)));
        assert!(fade_in_transition(Some(&mut ct)));
        assert!(cut_transition(Some(&mut ct)));
        assert_eq!(
            ct,
            SandboxTransition {
                fade_ins: 1,
                fade_outs: 1,
                cuts: 1
            }
        );
    }

    #[test]
    fn test_missing_transition_is_not_fatal() {
        assert!(!fade_in_transition(None));
        assert!(!fade_out_transition(None));
        assert!(!cut_transition(None));
    }
}
