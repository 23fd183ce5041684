//! Contains a set of useful utilities

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod ready_buffer;
