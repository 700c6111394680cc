pub mod debug;
pub mod generate;
pub mod validate;

mod util;

pub(crate) use util::{fail, read_source};
