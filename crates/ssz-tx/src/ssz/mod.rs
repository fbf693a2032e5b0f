//! A schema-driven SSZ engine.
//!
//! Values are described at runtime by a [`Schema`] and held as dynamic [`Value`]s. The engine
//! merkleizes them ([`hash_tree_root`]), encodes them ([`serialize`], [`deserialize`]) and
//! produces partial views of stable containers ([`summarize`], [`expand`], [`field_proof`]).

mod codec;
mod error;
mod merkle;
mod schema;
mod stable;
mod value;

pub use codec::{deserialize, serialize};
pub use error::{MalformedEncoding, SchemaViolation, SszError};
pub use merkle::{
    hash_pair, hash_tree_root, merkleize, mix_in_aux, mix_in_length, pack, stable_root, tree_depth,
    zero_hash,
};
pub use schema::{field, Field, Schema, StableSchema};
pub use stable::{expand, field_proof, summarize, FieldProof, Summary};
pub use value::{ActiveFields, StableValue, Value};
