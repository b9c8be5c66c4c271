pub mod commands;
pub mod config;
pub mod decode;
pub mod error;
pub mod fade;
pub mod motion;
pub mod platform {
    pub mod display_power;
    pub mod gpio;
    pub mod lirc;
}
pub mod playback;
pub mod prefetch;
pub mod queue;
pub mod render;
