pub mod act;
pub mod belief;
pub mod domain;
pub mod slot;
