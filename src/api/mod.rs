// API surface for VarFlow: the render DTO contract and the line-protocol
// server.

pub mod dto;
pub mod server;
