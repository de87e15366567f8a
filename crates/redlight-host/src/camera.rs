use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use redlight_core::collaborator::FrameSource;
use redlight_core::config::{CameraFacing, GameSettings};
use redlight_core::frame::Frame;
use redlight_core::zone::Zone;

use crate::config::VideoConfig;

/// Backdrop colour per zone, cycled when there are more players.
const BACKDROPS: [[u8; 4]; 6] = [
    [40, 60, 90, 255],
    [60, 90, 40, 255],
    [90, 60, 40, 255],
    [70, 40, 90, 255],
    [40, 90, 90, 255],
    [90, 90, 40, 255],
];
const BODY: [u8; 4] = [200, 170, 140, 255];
/// Fidgeting bodies flash between these on alternate frames.
const FIDGET: [[u8; 4]; 2] = [[230, 40, 40, 255], [40, 40, 230, 255]];

/// Deterministic stand-in for a webcam: one still figure per zone, except
/// fidgeting players, who jitter and change colour every frame.
#[derive(Debug)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    players: usize,
    facing: CameraFacing,
    fidgeting: Vec<usize>,
    frames: u64,
    rng: StdRng,
}

impl SyntheticCamera {
    pub fn new(video: &VideoConfig, game: &GameSettings) -> Self {
        Self {
            width: video.width,
            height: video.height,
            players: game.player_count,
            facing: game.camera_facing,
            fidgeting: video.fidgeting.clone(),
            frames: 0,
            rng: match game.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            },
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Raw sensor output. A user-facing camera sees the players flipped, so
    /// player 0 lands on the right edge.
    fn sensor_frame(&mut self) -> Frame {
        let mut frame = Frame::filled(self.width, self.height, [0, 0, 0, 255]);
        let parity = (self.frames % 2) as usize;
        let flipped = self.facing == CameraFacing::User;
        let width = self.width;
        let place = |x: u32, w: u32| if flipped { width - x - w } else { x };

        for zone in Zone::layout(self.width, self.height, self.players) {
            let backdrop = BACKDROPS[zone.index % BACKDROPS.len()];
            frame.fill_rect(place(zone.x, zone.width), 0, zone.width, zone.height, backdrop);

            let body_w = zone.width / 2;
            let body_h = zone.height * 3 / 5;
            let mut body_x = zone.x + zone.width / 4;
            let body_y = zone.height * 3 / 10;
            let mut colour = BODY;
            if self.fidgeting.contains(&zone.index) {
                let sway = zone.width / 8;
                body_x = body_x - sway + self.rng.random_range(0..=sway * 2);
                colour = FIDGET[parity];
            }
            frame.fill_rect(place(body_x, body_w), body_y, body_w, body_h, colour);
        }
        self.frames += 1;
        frame
    }
}

impl FrameSource for SyntheticCamera {
    /// Sensor output oriented for display, so zone 0 is the leftmost player
    /// as they see themselves.
    fn current_frame(&mut self) -> Option<Frame> {
        let raw = self.sensor_frame();
        Some(match self.facing {
            CameraFacing::User => raw.mirrored(),
            CameraFacing::Environment => raw,
        })
    }
}
