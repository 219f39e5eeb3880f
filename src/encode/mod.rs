/// Final chapter video assembly.
pub mod compose;
