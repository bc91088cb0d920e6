// Test modules for all components
mod common;

pub mod test_activations;
