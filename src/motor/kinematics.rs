// Skid-steer mapping for the four-wheel base
// Converts a whole-vehicle motion into one command per wheel.
//
// Wiring contract: a left turn reverses the left side and drives the right
// side forward. A harness wired the other way round swaps the `a`/`b`
// identifiers of its wheels in the pin config rather than this table.

use serde::{Deserialize, Serialize};

use crate::config::{SPEED_NORMAL, SPEED_TURN_INNER};

/// Wheel positions, in the order commands are written to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wheel {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

impl Wheel {
    pub const ALL: [Wheel; 4] = [
        Wheel::FrontLeft,
        Wheel::FrontRight,
        Wheel::BackLeft,
        Wheel::BackRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_left(self) -> bool {
        matches!(self, Wheel::FrontLeft | Wheel::BackLeft)
    }
}

/// Set-point for a single motor; speeds are percent duty
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelCommand {
    Forward(f32),
    Reverse(f32),
    #[default]
    Stop,
}

impl WheelCommand {
    pub fn is_stopped(&self) -> bool {
        matches!(self, WheelCommand::Stop)
    }
}

/// Whole-vehicle motion vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
    Stop,
}

impl Motion {
    pub const ALL: [Motion; 9] = [
        Motion::Forward,
        Motion::Backward,
        Motion::TurnLeft,
        Motion::TurnRight,
        Motion::ForwardLeft,
        Motion::ForwardRight,
        Motion::BackwardLeft,
        Motion::BackwardRight,
        Motion::Stop,
    ];

    /// Combined move+turn motions only make sense with speed control
    pub fn needs_speed_control(self) -> bool {
        matches!(
            self,
            Motion::ForwardLeft | Motion::ForwardRight | Motion::BackwardLeft | Motion::BackwardRight
        )
    }

    /// Per-wheel commands, indexed by [`Wheel::index`]
    pub fn plan(self) -> [WheelCommand; 4] {
        use WheelCommand::{Forward, Reverse, Stop};

        let side = |left: WheelCommand, right: WheelCommand| {
            Wheel::ALL.map(|wheel| if wheel.is_left() { left } else { right })
        };

        match self {
            Motion::Forward => side(Forward(SPEED_NORMAL), Forward(SPEED_NORMAL)),
            Motion::Backward => side(Reverse(SPEED_NORMAL), Reverse(SPEED_NORMAL)),
            Motion::TurnLeft => side(Reverse(SPEED_NORMAL), Forward(SPEED_NORMAL)),
            Motion::TurnRight => side(Forward(SPEED_NORMAL), Reverse(SPEED_NORMAL)),
            Motion::ForwardLeft => side(Forward(SPEED_TURN_INNER), Forward(SPEED_NORMAL)),
            Motion::ForwardRight => side(Forward(SPEED_NORMAL), Forward(SPEED_TURN_INNER)),
            Motion::BackwardLeft => side(Reverse(SPEED_TURN_INNER), Reverse(SPEED_NORMAL)),
            Motion::BackwardRight => side(Reverse(SPEED_NORMAL), Reverse(SPEED_TURN_INNER)),
            Motion::Stop => [Stop; 4],
        }
    }
}
