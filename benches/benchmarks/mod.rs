pub mod fock_state;
pub mod matrix;
pub mod sampler;
