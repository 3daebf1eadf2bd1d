pub mod add;
pub mod sync;
