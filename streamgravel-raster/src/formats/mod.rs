pub mod arcascii;
pub mod prj;
