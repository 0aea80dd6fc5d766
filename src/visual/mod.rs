pub mod gradient;
pub mod marquee;
pub mod particles;
pub mod shader;

pub use gradient::{Degradation, GradientMode, GradientParams, MeshGradient};
pub use marquee::{CouplerParams, MarqueeBand, VelocityCoupler};
pub use particles::{FieldParams, Particle, ParticleCanvas, ParticleField};
pub use shader::{ShaderBackend, ShaderContext, ShaderError, SoftwareBackend, UnavailableBackend};
