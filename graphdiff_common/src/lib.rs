pub mod config;
pub mod defaults;
pub mod error;
pub mod options;
pub mod types;
pub mod value;

pub use config::*;
pub use defaults::*;
pub use error::*;
pub use options::*;
pub use types::*;
pub use value::{
    Collection, Diffable, EnumValue, KeyValue, MemberAccess, ObjectId, ObjectRef, Value,
};
