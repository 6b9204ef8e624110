pub mod handles;
pub mod hit;
pub mod project;

pub use handles::{Cursor, Handle, HandleName, HandleRole, HandleShape, SnapMode, cursor_for, handles_for, snap_mode_for};
pub use hit::{Hit, HitConfig, HitTarget, hit_test};
pub use project::{Projected, ScreenShape, project_drawing};
