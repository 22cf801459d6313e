//! Session state tracking
//!
//! A run is `Running` until the player touches traffic or a wall, then it is
//! `GameOver` for good. Only a full restart starts a new run.

use glam::Vec3;
use log::{info, warn};

use super::context::SimulationContext;
use super::physics::CollisionEvent;
use super::types::BodyClass;
use super::vehicle::PlayerVehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Running,
    GameOver,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    pub state: SessionState,
    /// Displayed score captured at the moment of the crash
    pub final_score: Option<u64>,
    /// What the player hit
    pub crashed_into: Option<BodyClass>,
    /// Set on transition; read by the game-over overlay
    pub show_game_over: bool,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Look through this frame's collisions for one that ends the run
    ///
    /// Returns true only on the frame the transition happens.
    pub fn reconcile(
        &mut self,
        events: &[CollisionEvent],
        player: &mut PlayerVehicle,
        ctx: &mut SimulationContext,
    ) -> bool {
        if !self.is_running() {
            return false;
        }

        let hit = events.iter().find_map(|event| {
            let other = if event.body == player.body {
                event.other
            } else if event.other == player.body {
                event.body
            } else {
                return None;
            };
            let class = ctx.bodies.class_of(other)?;
            (class.is_terminal() && ctx.is_watched(player.body, class)).then_some(class)
        });

        match hit {
            Some(class) => {
                self.trigger_game_over(class, player, ctx);
                true
            }
            None => false,
        }
    }

    fn trigger_game_over(
        &mut self,
        class: BodyClass,
        player: &mut PlayerVehicle,
        ctx: &mut SimulationContext,
    ) {
        if let Err(e) = ctx.physics.set_linear_velocity(player.body, Vec3::ZERO) {
            warn!("Failed to stop player body: {:#}", e);
        }
        if let Err(e) = ctx.physics.set_angular_velocity(player.body, Vec3::ZERO) {
            warn!("Failed to stop player body: {:#}", e);
        }

        let final_score = player.displayed_score(&ctx.config);
        self.state = SessionState::GameOver;
        self.final_score = Some(final_score);
        self.crashed_into = Some(class);
        self.show_game_over = true;

        info!(
            "Game over: hit {:?} at t={:.2}s, final score {}",
            class, ctx.time, final_score
        );
    }
}
