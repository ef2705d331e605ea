//! Keyboard control of the ball: F kicks, R puts it back on the spot.

use log::debug;
use winit::keyboard::KeyCode;

use crate::ball::{Ball, LaunchParams};
use crate::input::Input;

/// When a held key counts as a fresh command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Every frame the key is held. Holding kick is harmless since a kick
    /// only starts once; holding reset pins the ball to its spot.
    #[default]
    Level,
    /// Only the frame the key goes down.
    Edge,
}

/// Maps kick/reset keys onto the ball.
#[derive(Clone, Debug)]
pub struct BallControls {
    pub kick_key: KeyCode,
    pub reset_key: KeyCode,
    pub mode: TriggerMode,
}

impl Default for BallControls {
    fn default() -> Self {
        Self {
            kick_key: KeyCode::KeyF,
            reset_key: KeyCode::KeyR,
            mode: TriggerMode::Level,
        }
    }
}

impl BallControls {
    pub fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn triggered(&self, input: &Input, key: KeyCode) -> bool {
        match self.mode {
            TriggerMode::Level => input.key_down(key),
            TriggerMode::Edge => input.key_pressed(key),
        }
    }

    /// Apply this frame's kick and reset commands. Kick is evaluated first.
    pub fn apply(&self, input: &Input, ball: &mut Ball, launch: &LaunchParams) {
        if self.triggered(input, self.kick_key) && ball.kick() {
            debug!("ball kicked: {:?}", launch);
        }
        if self.triggered(input, self.reset_key) {
            if ball.is_kicked() {
                debug!("ball reset after {:.2}s of flight", ball.elapsed());
            }
            ball.reset(*launch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(key: KeyCode) -> Input {
        let mut input = Input::new();
        input.press(key);
        input
    }

    #[test]
    fn holding_kick_does_not_restart_flight() {
        let launch = LaunchParams::default();
        let mut ball = Ball::new(launch);
        let controls = BallControls::default();

        let mut input = held(KeyCode::KeyF);
        controls.apply(&input, &mut ball, &launch);
        ball.position_at(0.25);

        input.begin_frame();
        controls.apply(&input, &mut ball, &launch);
        ball.position_at(0.25);

        assert!(ball.is_kicked());
        assert_eq!(ball.elapsed(), 0.5);
    }

    #[test]
    fn level_reset_fires_every_held_frame() {
        let launch = LaunchParams::default();
        let mut ball = Ball::new(launch);
        let controls = BallControls::new(TriggerMode::Level);

        let mut input = held(KeyCode::KeyR);
        input.begin_frame();
        ball.kick();
        controls.apply(&input, &mut ball, &launch);
        assert!(!ball.is_kicked());
    }

    #[test]
    fn edge_reset_fires_only_on_press() {
        let launch = LaunchParams::default();
        let mut ball = Ball::new(launch);
        let controls = BallControls::new(TriggerMode::Edge);

        let mut input = held(KeyCode::KeyR);
        ball.kick();
        controls.apply(&input, &mut ball, &launch);
        assert!(!ball.is_kicked());

        input.begin_frame();
        ball.kick();
        controls.apply(&input, &mut ball, &launch);
        assert!(ball.is_kicked());
    }

    #[test]
    fn reset_restores_configured_launch() {
        let launch = LaunchParams::default();
        let mut ball = Ball::new(LaunchParams {
            speed: 1.0,
            ..launch
        });
        BallControls::default().apply(&held(KeyCode::KeyR), &mut ball, &launch);
        assert_eq!(*ball.launch(), launch);
    }
}
