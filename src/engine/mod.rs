mod sampler;
pub use sampler::*;

mod stroke;
pub use stroke::*;

mod registry;
pub use registry::*;

mod activation;
pub use activation::*;

mod spray_can;
pub use spray_can::*;
