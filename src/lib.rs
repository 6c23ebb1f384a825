//! Freight Simulation Library
//!
//! A tick-driven freight traffic simulation over a road network with bridges
//! that may fail and delay the vehicles crossing them.

pub mod simulation;
