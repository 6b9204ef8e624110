pub mod board;
pub mod commands;
pub mod config;
pub mod controller;
pub mod input;
pub mod router;
pub mod shortcuts;
pub mod threshold;
pub mod tools;

pub use board::{Board, CommitAction, CommitEvent, DrawingMutation};
pub use commands::CommandStack;
pub use config::InteractionConfig;
pub use controller::{GestureEnd, GestureMode, InteractionController, magnet_snap};
pub use input::{InputEvent, KeyboardState, Modifiers, Pointer};
pub use router::InputRouter;
pub use tools::{Tool, ToolContext, ToolKind};
