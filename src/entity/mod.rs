//! Entity values and their stored encoding

mod codec;
#[allow(clippy::module_inception)]
mod entity;
mod value;

pub use codec::{EntityCodec, JsonCodec};
pub use entity::Entity;
pub use value::Value;
