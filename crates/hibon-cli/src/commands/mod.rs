pub mod dart_index;
pub mod envelope;
pub mod keygen;
pub mod sender;
pub mod sign;
pub mod text;
pub mod validate;
