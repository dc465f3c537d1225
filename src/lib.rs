pub mod accel;
pub mod geometry;
pub mod scene;
pub mod scheduler;
mod settings;
mod util;

pub use accel::{BuildError, LeafAccel};
pub use scene::Scene;
pub use settings::AccelSettings;
pub use util::Stats;
