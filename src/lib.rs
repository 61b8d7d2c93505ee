// Library exports for the light-cycle bot
// This allows the replay and self-play tools to use the core decision logic

pub mod agent;
pub mod arena;
pub mod backprop;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod expand;
pub mod flood_fill;
pub mod grid;
pub mod replay;
pub mod search;
pub mod simple_profiler;
pub mod tree;
pub mod types;
pub mod world;
