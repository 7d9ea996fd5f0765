//! Core entity and hierarchy functionality

pub mod entity;
