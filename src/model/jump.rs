/// Cosmetic jump animation state. Time values are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JumpState {
    #[default]
    Inactive,
    Active { start: f64 },
}

impl JumpState {
    pub fn is_active(&self) -> bool {
        matches!(self, JumpState::Active { .. })
    }

    /// Advance the animation to `now` and return the vertical offset to apply,
    /// or `None` when the offset is left untouched this frame.
    ///
    /// An active jump follows `sin(progress * PI) * height` and lands at exactly
    /// zero once `progress >= 1`. A new jump only starts from the inactive state,
    /// so holding the key neither extends nor re-triggers a running jump.
    pub fn advance(&mut self, now: f64, jump_pressed: bool, height: f32, duration: f64) -> Option<f32> {
        match *self {
            JumpState::Active { start } => {
                let progress = if duration > 0.0 { (now - start) / duration } else { 1.0 };
                if progress < 1.0 {
                    Some((progress * std::f64::consts::PI).sin() as f32 * height)
                } else {
                    *self = JumpState::Inactive;
                    Some(0.0)
                }
            }
            JumpState::Inactive => {
                if jump_pressed {
                    *self = JumpState::Active { start: now };
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_peaks_halfway_and_lands_at_duration() {
        let mut jump = JumpState::Inactive;
        assert_eq!(jump.advance(0.0, true, 1.2, 600.0), None);
        assert_eq!(jump, JumpState::Active { start: 0.0 });

        let peak = jump.advance(300.0, false, 1.2, 600.0).unwrap();
        assert!((peak - 1.2).abs() < 1e-6);

        assert_eq!(jump.advance(600.0, false, 1.2, 600.0), Some(0.0));
        assert!(!jump.is_active());
    }

    #[test]
    fn test_holding_key_does_not_retrigger() {
        let mut jump = JumpState::Inactive;
        jump.advance(100.0, true, 1.0, 600.0);
        jump.advance(400.0, true, 1.0, 600.0);
        assert_eq!(jump, JumpState::Active { start: 100.0 });

        // lands on the frame after expiry even while held
        assert_eq!(jump.advance(800.0, true, 1.0, 600.0), Some(0.0));
        assert!(!jump.is_active());

        // next frame with the key still held starts a fresh jump
        assert_eq!(jump.advance(816.0, true, 1.0, 600.0), None);
        assert_eq!(jump, JumpState::Active { start: 816.0 });
    }

    #[test]
    fn test_offset_is_zero_at_start() {
        let mut jump = JumpState::Active { start: 50.0 };
        let y = jump.advance(50.0, false, 2.0, 600.0).unwrap();
        assert!(y.abs() < 1e-6);
    }
}
