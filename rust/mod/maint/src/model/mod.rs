mod device;
mod fault;

pub use device::*;
pub use fault::*;
