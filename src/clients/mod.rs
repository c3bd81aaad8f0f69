//! Tools that sit on the far side of the query boundary. Each runs as an
//! ordinary process and reaches kernel state only through syscalls.

pub mod calc;
pub mod procmon;
pub mod programs;
pub mod scheddemo;
pub mod status;
