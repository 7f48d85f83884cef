mod basic;
mod level;
mod logger;
mod r#macro;
mod nop;
mod tag;
mod tracker;

#[cfg(test)]
mod test;

pub(crate) use basic::*;
pub(crate) use level::*;
pub(crate) use logger::*;
pub(crate) use nop::*;
pub(crate) use tag::*;
pub(crate) use tracker::*;
