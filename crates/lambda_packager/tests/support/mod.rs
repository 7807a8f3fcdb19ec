pub mod installer;
pub mod workspace;
