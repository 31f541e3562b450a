/*
This library is part of the StreamGravel fluvial grain size tools.
License: MIT
*/

pub mod errors;
pub mod tools;
