// JSON codec over the type registry.

pub mod codec;
pub mod writer;

pub use codec::{deserialize, load_from_file, save_to_file, serialize, serialize_compact, value_from_json};
