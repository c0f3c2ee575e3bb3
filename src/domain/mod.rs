// Domain layer for VarFlow.

pub mod flowgraph;
pub mod index;
pub mod locate;
pub mod occurrence;
pub mod trace;
